//! The game controller: roster, round counter, solvency and winners.
//!
//! An [`Arena`] owns the players for one game. Each call to
//! [`Arena::play_round`] runs a [`Referee`] over the roster and then checks
//! whether the game has ended:
//!
//! - any player at or below zero coins is clamped to zero and marked dead,
//!   which ends the game immediately;
//! - reaching `max_rounds` ends the game.
//!
//! When the game ends every player tied for the highest balance is marked
//! a winner. The round counter only advances while the game continues, so
//! after the last round it still names the round that was played.

use chrono::Utc;
use outsmart_types::{Coins, GameId, GameRecord, Standing, rank_standings};
use rand::Rng;
use rand::seq::SliceRandom as _;
use tracing::{info, warn};

use crate::config::RulesConfig;
use crate::error::ArenaError;
use crate::player::Player;
use crate::progress::ProgressSink;
use crate::prompt::PromptEngine;
use crate::referee::{Referee, RefereeSettings, RoundSummary, validate_roster};
use crate::source::MoveSource;

/// A single game of Outsmart.
#[derive(Debug)]
pub struct Arena<S> {
    id: GameId,
    players: Vec<Player<S>>,
    rules: RulesConfig,
    prompts: PromptEngine,
    round: u32,
    is_game_over: bool,
}

impl<S: MoveSource> Arena<S> {
    /// Set up a game with a randomly shuffled view of the table for each
    /// player.
    ///
    /// Every player's balance is reset to `rules.starting_coins`.
    ///
    /// # Errors
    ///
    /// Returns an [`ArenaError`] if the roster or rules cannot make a game.
    pub fn new(players: Vec<Player<S>>, rules: RulesConfig) -> Result<Self, ArenaError> {
        Self::with_rng(players, rules, &mut rand::rng())
    }

    /// Like [`Arena::new`], drawing the seating order from `rng`.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::TooFewPlayers`], [`ArenaError::EmptyName`] or
    /// [`ArenaError::DuplicateName`] for an unusable roster,
    /// [`ArenaError::NoRounds`] if `max_rounds` is zero, and
    /// [`ArenaError::Prompt`] if the prompt templates fail to compile.
    pub fn with_rng<R: Rng + ?Sized>(
        mut players: Vec<Player<S>>,
        rules: RulesConfig,
        rng: &mut R,
    ) -> Result<Self, ArenaError> {
        validate_roster(&players)?;
        if rules.max_rounds == 0 {
            return Err(ArenaError::NoRounds);
        }
        let prompts = PromptEngine::new(&rules).map_err(|e| ArenaError::Prompt(e.to_string()))?;

        let names: Vec<String> = players.iter().map(|p| p.name.clone()).collect();
        for player in &mut players {
            let mut others: Vec<String> = names.iter().filter(|n| **n != player.name).cloned().collect();
            others.shuffle(rng);
            player.other_names = others;
            player.reset(rules.starting_coins);
        }

        let id = GameId::new();
        info!(
            game_id = %id,
            players = players.len(),
            starting_coins = rules.starting_coins,
            max_rounds = rules.max_rounds,
            "game created"
        );

        Ok(Self {
            id,
            players,
            rules,
            prompts,
            round: 1,
            is_game_over: false,
        })
    }

    /// This game's identifier.
    pub const fn id(&self) -> GameId {
        self.id
    }

    /// The round to be played next, or the final round once the game is
    /// over.
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// Whether the game has ended.
    pub const fn is_game_over(&self) -> bool {
        self.is_game_over
    }

    /// The rules this game is played under.
    pub const fn rules(&self) -> &RulesConfig {
        &self.rules
    }

    /// The roster, in turn order.
    pub fn players(&self) -> &[Player<S>] {
        &self.players
    }

    /// Look up a player by name.
    pub fn player(&self, name: &str) -> Option<&Player<S>> {
        self.players.iter().find(|p| p.name == name)
    }

    /// Names of the winners; empty until the game is over.
    pub fn winners(&self) -> Vec<&str> {
        self.players
            .iter()
            .filter(|p| p.is_winner)
            .map(|p| p.name.as_str())
            .collect()
    }

    /// Number of rounds that have been settled.
    pub fn rounds_played(&self) -> u32 {
        self.players
            .first()
            .map_or(0, |p| u32::try_from(p.records.len()).unwrap_or(u32::MAX))
    }

    /// Play one round and update the game state.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::GameOver`] if the game has already ended.
    /// Roster errors from [`Referee::new`] cannot occur for a roster that
    /// passed construction.
    pub async fn play_round(
        &mut self,
        progress: &mut dyn ProgressSink,
    ) -> Result<RoundSummary, ArenaError> {
        if self.is_game_over {
            return Err(ArenaError::GameOver);
        }

        for player in &mut self.players {
            player.prior_coins = player.coins;
        }

        info!(game_id = %self.id, round = self.round, "round started");
        let settings = RefereeSettings::from(&self.rules);
        let summary = Referee::new(&mut self.players, self.round, &self.prompts, settings)?
            .do_turn(progress)
            .await;

        for player in &mut self.players {
            player.coin_history.push(player.coins);
        }

        self.post_round_solvency_check();
        if self.is_game_over {
            return Ok(summary);
        }
        if self.round >= self.rules.max_rounds {
            self.handle_game_over();
        } else {
            self.round = self.round.saturating_add(1);
        }

        Ok(summary)
    }

    /// Play rounds until the game ends.
    ///
    /// # Errors
    ///
    /// Returns [`ArenaError::GameOver`] if the game had already ended.
    pub async fn play_to_end(
        &mut self,
        progress: &mut dyn ProgressSink,
    ) -> Result<Vec<RoundSummary>, ArenaError> {
        if self.is_game_over {
            return Err(ArenaError::GameOver);
        }
        let mut summaries = Vec::new();
        while !self.is_game_over {
            summaries.push(self.play_round(progress).await?);
        }
        Ok(summaries)
    }

    /// Bankrupt players are clamped to zero and end the game.
    fn post_round_solvency_check(&mut self) {
        let mut bankrupt = false;
        for player in &mut self.players {
            if player.coins <= 0 {
                warn!(
                    game_id = %self.id,
                    round = self.round,
                    player = %player.name,
                    coins = player.coins,
                    "player ran out of coins"
                );
                player.coins = 0;
                player.kill();
                bankrupt = true;
            }
        }
        if bankrupt {
            self.handle_game_over();
        }
    }

    fn handle_game_over(&mut self) {
        self.is_game_over = true;
        let best: Coins = self.players.iter().map(|p| p.coins).max().unwrap_or(0);
        for player in &mut self.players {
            player.is_winner = player.coins == best;
        }
        info!(
            game_id = %self.id,
            round = self.round,
            winners = ?self.winners(),
            coins = best,
            "game over"
        );
    }

    /// Current standings in roster order; rank 0 is the leader.
    pub fn standings(&self) -> Vec<Standing> {
        rank_standings(
            self.players
                .iter()
                .map(|p| (p.name.clone(), p.model.clone(), p.coins))
                .collect(),
        )
    }

    /// A snapshot of the game for persistence.
    pub fn game_record(&self) -> GameRecord {
        GameRecord {
            id: self.id,
            run_date: Utc::now(),
            rounds_played: self.rounds_played(),
            results: self.standings(),
        }
    }

    /// Start the same roster over from round 1 under a fresh game id.
    ///
    /// Seating order is kept.
    pub fn reset(&mut self) {
        for player in &mut self.players {
            player.reset(self.rules.starting_coins);
        }
        self.round = 1;
        self.is_game_over = false;
        self.id = GameId::new();
        info!(game_id = %self.id, "game reset");
    }
}
