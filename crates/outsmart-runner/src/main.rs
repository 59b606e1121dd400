//! Game runner for Outsmart.
//!
//! Plays one game between LLM-backed players and reports the result. The
//! roster and rules come from a YAML file (or the classic four-player
//! game); API keys and output paths come from the environment.
//!
//! # Architecture
//!
//! ```text
//! GameConfig --> ModelRegistry --> LlmBackend per player --> Arena --> standings / results file
//! ```
//!
//! A player whose model fails or answers badly loses its move for that
//! round; the game carries on.

mod config;
mod error;
mod llm;
mod results;

use outsmart_core::{Arena, LogProgress, Player};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::RunnerConfig;
use crate::error::RunnerError;
use crate::llm::{LlmBackend, ModelRegistry};

/// Application entry point.
///
/// Initializes logging, loads configuration, builds one backend per
/// player, plays the game to the end, then logs the standings and
/// appends the game to the results file if one is configured.
///
/// # Errors
///
/// Returns an error if configuration is unusable or a player's model
/// cannot be served.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(true)
        .init();

    info!("outsmart-runner starting");

    let config = RunnerConfig::from_env()?;
    let game = config.load_game()?;
    info!(
        config_path = ?config.game_config_path,
        results_path = ?config.results_path,
        players = game.players.len(),
        max_rounds = game.rules.max_rounds,
        starting_coins = game.rules.starting_coins,
        "configuration loaded"
    );

    let registry = ModelRegistry::builtin();
    let players = game
        .players
        .iter()
        .map(|seat| {
            let backend = registry.create(&seat.model, seat.temperature, &config)?;
            info!(
                player = %seat.name,
                model = %seat.model,
                backend = backend.name(),
                provider = backend.config().provider.name(),
                "player configured"
            );
            Ok(Player::new(seat.name.as_str(), seat.model.as_str(), backend))
        })
        .collect::<Result<Vec<Player<LlmBackend>>, RunnerError>>()?;

    let mut arena = Arena::new(players, game.rules)?;
    while !arena.is_game_over() {
        let summary = arena.play_round(&mut LogProgress).await?;
        info!(
            round = summary.round,
            invalid = ?summary.invalid,
            alliances = summary.alliances.len(),
            coins = summary.coins_after,
            "round complete"
        );
    }

    let mut standings = arena.standings();
    standings.sort_by_key(|s| s.rank);
    for standing in &standings {
        info!(
            rank = standing.rank,
            player = %standing.name,
            model = %standing.model,
            coins = standing.coins,
            "final standing"
        );
    }
    info!(winners = ?arena.winners(), rounds = arena.rounds_played(), "game finished");

    if let Some(path) = &config.results_path {
        match results::append_record(path, &arena.game_record()) {
            Ok(()) => info!(path = %path.display(), "results saved"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to save results"),
        }
    }

    Ok(())
}
