//! Error types for the `outsmart-core` crate.
//!
//! Per-agent failures ([`TransportError`], [`MoveError`]) never escape a
//! round: the referee turns them into an invalid turn record and logs the
//! variant. Only [`ArenaError`] and [`ConfigError`] reach callers, and both
//! describe problems with how the game was set up.

/// An agent's move source failed to produce any text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("transport failure: {message}")]
pub struct TransportError {
    /// What went wrong, for logs.
    pub message: String,
}

impl TransportError {
    /// Build a transport error from any displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Why a single agent's move was not processed this round.
#[derive(Debug, thiserror::Error)]
pub enum MoveError {
    /// The move source could not be reached or returned an error.
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// The move source did not answer within the decision deadline.
    #[error("no response within {deadline_ms}ms")]
    Timeout {
        /// The deadline in milliseconds.
        deadline_ms: u128,
    },

    /// The instructions for the agent could not be rendered.
    #[error("prompt render error: {0}")]
    Prompt(String),

    /// The agent replied, but not with a usable JSON object.
    #[error("malformed response: {0}")]
    Malformed(String),

    /// The agent replied with a well-formed but illegal move.
    #[error("illegal move: {0}")]
    Illegal(String),
}

/// Errors raised by the game controller.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ArenaError {
    /// A game needs at least two players.
    #[error("a game needs at least 2 players, got {count}")]
    TooFewPlayers {
        /// Number of players supplied.
        count: usize,
    },

    /// Two players share a name.
    #[error("duplicate player name: {0}")]
    DuplicateName(String),

    /// A player has an empty name.
    #[error("player names must not be empty")]
    EmptyName,

    /// The rules allow no rounds at all.
    #[error("max_rounds must be at least 1")]
    NoRounds,

    /// The prompt templates could not be prepared.
    #[error("prompt setup failed: {0}")]
    Prompt(String),

    /// A round was requested after the game ended.
    #[error("the game is already over")]
    GameOver,
}

/// Errors that can occur when loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read the configuration file from disk.
    #[error("failed to read config file: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Failed to parse YAML content.
    #[error("failed to parse config YAML: {source}")]
    Yaml {
        /// The underlying YAML parse error.
        source: serde_yml::Error,
    },

    /// A prompt template failed to compile.
    #[error("template error: {0}")]
    Template(String),
}

impl From<serde_yml::Error> for ConfigError {
    fn from(source: serde_yml::Error) -> Self {
        Self::Yaml { source }
    }
}
