//! Error types for the game runner.
//!
//! Uses `thiserror` for typed errors covering everything the runner does
//! around a game: reading configuration, reaching LLM backends, and
//! writing results. The game itself never fails on a bad agent; see
//! [`outsmart_core::MoveError`].

/// Errors that can occur while setting up or running a game.
#[derive(Debug, thiserror::Error)]
pub enum RunnerError {
    /// An LLM backend returned an error or was unreachable.
    #[error("LLM backend error: {0}")]
    LlmBackend(String),

    /// Configuration is invalid or missing.
    #[error("config error: {0}")]
    Config(String),

    /// The game configuration file could not be loaded.
    #[error(transparent)]
    GameConfig(#[from] outsmart_core::ConfigError),

    /// No provider serves the requested model.
    #[error("unknown model: {0}")]
    UnknownModel(String),

    /// The game could not be set up or continued.
    #[error("arena error: {0}")]
    Arena(#[from] outsmart_core::ArenaError),

    /// Reading or writing a file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization or deserialization failure.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
}
