//! Turn resolution engine and game controller for the Outsmart game.
//!
//! Each round every player gives one coin away, takes one coin from
//! someone else, and sends private messages. This crate collects those
//! moves from unreliable language-model agents and settles them.
//!
//! # Modules
//!
//! - [`arena`] -- The [`Arena`] game controller: roster, round counter,
//!   solvency check, winners.
//! - [`config`] -- Configuration loading from `outsmart-config.yaml`.
//! - [`error`] -- Error types ([`MoveError`], [`ArenaError`],
//!   [`TransportError`]).
//! - [`parse`] -- Extracting and validating a [`Move`] from raw agent text.
//! - [`player`] -- The per-participant [`Player`] handle.
//! - [`progress`] -- The [`ProgressSink`] observability hook.
//! - [`prompt`] -- Rendering the instructions sent to each agent.
//! - [`referee`] -- The [`Referee`]: concurrent collection and the four
//!   settlement phases.
//! - [`source`] -- The [`MoveSource`] trait and [`ScriptedSource`].
//!
//! [`Move`]: outsmart_types::Move

pub mod arena;
pub mod config;
pub mod error;
pub mod parse;
pub mod player;
pub mod progress;
pub mod prompt;
pub mod referee;
pub mod source;

pub use arena::Arena;
pub use config::{GameConfig, PlayerConfig, RulesConfig};
pub use error::{ArenaError, ConfigError, MoveError, TransportError};
pub use player::Player;
pub use progress::{LogProgress, NoProgress, ProgressSink};
pub use prompt::{Instructions, PromptEngine};
pub use referee::{Alliance, Referee, RefereeSettings, RoundSummary};
pub use source::{MoveSource, ScriptedReply, ScriptedSource};
