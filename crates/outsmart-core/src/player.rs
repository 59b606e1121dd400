//! The per-participant handle the engine works with.

use outsmart_types::{Coins, TurnRecord};

use crate::source::MoveSource;

/// A participant in the game, backed by some [`MoveSource`].
///
/// Owned by the [`Arena`](crate::Arena). Players are never removed once a
/// game starts; a bankrupt player is marked dead and kept for the record.
#[derive(Debug)]
pub struct Player<S> {
    /// The name the other players address this player by. Unique per game.
    pub name: String,
    /// Identifier of the model behind `source`, for standings.
    pub model: String,
    /// Current coin balance.
    pub coins: Coins,
    /// Balance at the start of the current round.
    pub prior_coins: Coins,
    /// Set once the player's balance reached zero.
    pub is_dead: bool,
    /// Set at game end for every player tied for the most coins.
    pub is_winner: bool,
    /// The other players' names, in the order this player is shown them.
    pub other_names: Vec<String>,
    /// One ledger entry per completed round.
    pub records: Vec<TurnRecord>,
    /// Balance after each completed round.
    pub coin_history: Vec<Coins>,
    source: S,
}

impl<S: MoveSource> Player<S> {
    /// Create a player with an empty history and no coins.
    ///
    /// The starting balance is dealt when the player is seated in an
    /// [`Arena`](crate::Arena).
    pub fn new(name: impl Into<String>, model: impl Into<String>, source: S) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            coins: 0,
            prior_coins: 0,
            is_dead: false,
            is_winner: false,
            other_names: Vec::new(),
            records: Vec::new(),
            coin_history: Vec::new(),
            source,
        }
    }

    /// The move source backing this player.
    pub const fn source(&self) -> &S {
        &self.source
    }

    /// Coin change since the start of the current round.
    pub const fn delta(&self) -> Coins {
        self.coins.saturating_sub(self.prior_coins)
    }

    /// The most recent completed round's record.
    pub fn last_record(&self) -> Option<&TurnRecord> {
        self.records.last()
    }

    /// Put the player back to its starting state.
    pub fn reset(&mut self, coins: Coins) {
        self.coins = coins;
        self.prior_coins = coins;
        self.is_dead = false;
        self.is_winner = false;
        self.records.clear();
        self.coin_history.clear();
    }

    pub(crate) const fn kill(&mut self) {
        self.is_dead = true;
    }
}
