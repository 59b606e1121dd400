//! Configuration loading and typed config structures for a game.
//!
//! The canonical configuration lives in `outsmart-config.yaml`. Every
//! field has a default, so an empty file (or no file at all) describes the
//! classic four-player game over ten rounds.
//!
//! ```yaml
//! rules:
//!   starting_coins: 12
//!   max_rounds: 10
//!   max_tokens: 400
//!   decision_timeout_ms: 60000
//! players:
//!   - name: Alex
//!     model: gpt-4o-mini
//!     temperature: 0.7
//! ```

use std::path::Path;
use std::time::Duration;

use outsmart_types::Coins;
use serde::Deserialize;

use crate::error::ConfigError;

/// Top-level game configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct GameConfig {
    /// Game rules.
    #[serde(default)]
    pub rules: RulesConfig,

    /// The roster, in turn order.
    #[serde(default = "default_players")]
    pub players: Vec<PlayerConfig>,
}

impl GameConfig {
    /// Load configuration from a YAML file at the given path.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read, or
    /// [`ConfigError::Yaml`] if the content is not valid YAML.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    /// Parse configuration from a YAML string.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Yaml`] if the string is not valid YAML.
    pub fn parse(yaml: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yml::from_str(yaml)?;
        Ok(config)
    }

    /// The classic game: default rules and the default roster.
    pub fn classic() -> Self {
        Self {
            rules: RulesConfig::default(),
            players: default_players(),
        }
    }
}

/// Rules of the game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct RulesConfig {
    /// Coins each player starts with.
    #[serde(default = "default_starting_coins")]
    pub starting_coins: Coins,

    /// The game ends after this round even if nobody went bankrupt.
    #[serde(default = "default_max_rounds")]
    pub max_rounds: u32,

    /// Token budget passed to each agent's move source.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Per-agent deadline for producing a move, one minute unless set.
    /// An explicit `null` waits indefinitely and leaves timeouts to the
    /// move source.
    #[serde(default = "default_decision_timeout_ms")]
    pub decision_timeout_ms: Option<u64>,
}

impl RulesConfig {
    /// The per-agent decision deadline, if any.
    pub fn decision_timeout(&self) -> Option<Duration> {
        self.decision_timeout_ms.map(Duration::from_millis)
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            starting_coins: default_starting_coins(),
            max_rounds: default_max_rounds(),
            max_tokens: default_max_tokens(),
            decision_timeout_ms: default_decision_timeout_ms(),
        }
    }
}

/// One seat at the table.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlayerConfig {
    /// The name the other players address this player by.
    pub name: String,
    /// Model identifier; resolved through the runner's model registry.
    pub model: String,
    /// Sampling temperature for the model.
    #[serde(default = "default_temperature")]
    pub temperature: f64,
}

const fn default_starting_coins() -> Coins {
    12
}

const fn default_max_rounds() -> u32 {
    10
}

const fn default_max_tokens() -> u32 {
    400
}

const fn default_decision_timeout_ms() -> Option<u64> {
    Some(60_000)
}

const fn default_temperature() -> f64 {
    0.7
}

fn default_players() -> Vec<PlayerConfig> {
    [
        ("Alex", "gpt-3.5-turbo"),
        ("Blake", "claude-3-haiku-20240307"),
        ("Charlie", "gemini-2.0-flash"),
        ("Drew", "gpt-4o-mini"),
    ]
    .into_iter()
    .map(|(name, model)| PlayerConfig {
        name: name.to_owned(),
        model: model.to_owned(),
        temperature: default_temperature(),
    })
    .collect()
}
