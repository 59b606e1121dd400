//! Shared type definitions for the Outsmart negotiation game.
//!
//! This crate holds the data that flows between the turn resolution engine,
//! the game controller, and anything that records finished games.
//!
//! # Modules
//!
//! - [`moves`] -- The validated [`Move`] an agent submits for a round
//! - [`record`] -- The per-agent, per-round [`TurnRecord`] ledger entry
//! - [`standing`] -- Final [`Standing`]s and the [`GameRecord`] hand-off

pub mod moves;
pub mod record;
pub mod standing;

// Re-export all public types at crate root for convenience.
pub use moves::{Move, fields};
pub use record::TurnRecord;
pub use standing::{GameId, GameRecord, Standing, rank_standings};

/// A coin balance.
///
/// Signed because balances may dip below zero while a round is being
/// settled; the game controller clamps them back to zero afterwards.
pub type Coins = i64;
