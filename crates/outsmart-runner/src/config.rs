//! Configuration types for the game runner.
//!
//! Secrets and paths come from environment variables. The game itself
//! (rules and roster) comes from the YAML file named by `OUTSMART_CONFIG`,
//! or the classic four-player game when that is unset.

use std::collections::BTreeMap;
use std::path::PathBuf;

use outsmart_core::GameConfig;

use crate::error::RunnerError;

/// Complete runner configuration loaded from the environment.
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Path to the game YAML; `None` plays the classic game.
    pub game_config_path: Option<PathBuf>,
    /// File that finished games are appended to, one JSON object per line.
    pub results_path: Option<PathBuf>,
    /// How to reach each provider.
    pub endpoints: BTreeMap<Provider, Endpoint>,
}

/// Where a provider lives and how to authenticate with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Base API URL (e.g. `https://api.openai.com/v1`).
    pub api_url: String,
    /// API key, if one was provided.
    pub api_key: Option<String>,
}

/// The wire protocol a provider speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendType {
    /// `OpenAI`-compatible chat completions.
    OpenAi,
    /// Anthropic Messages API (different request format).
    Anthropic,
}

/// A hosted (or local) LLM provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Provider {
    /// `OpenAI`.
    OpenAi,
    /// Anthropic.
    Anthropic,
    /// x.ai Grok.
    Grok,
    /// Google Gemini, through its `OpenAI`-compatible endpoint.
    Gemini,
    /// Groq.
    Groq,
    /// `DeepSeek`.
    DeepSeek,
    /// `OpenRouter`.
    OpenRouter,
    /// A local Ollama server.
    Ollama,
}

impl Provider {
    /// Every supported provider.
    pub const ALL: [Self; 8] = [
        Self::OpenAi,
        Self::Anthropic,
        Self::Grok,
        Self::Gemini,
        Self::Groq,
        Self::DeepSeek,
        Self::OpenRouter,
        Self::Ollama,
    ];

    /// Human-readable name for logging.
    pub const fn name(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
            Self::Grok => "grok",
            Self::Gemini => "gemini",
            Self::Groq => "groq",
            Self::DeepSeek => "deepseek",
            Self::OpenRouter => "openrouter",
            Self::Ollama => "ollama",
        }
    }

    /// Default base URL for the provider's API.
    pub const fn default_api_url(self) -> &'static str {
        match self {
            Self::OpenAi => "https://api.openai.com/v1",
            Self::Anthropic => "https://api.anthropic.com/v1",
            Self::Grok => "https://api.x.ai/v1",
            Self::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            Self::Groq => "https://api.groq.com/openai/v1",
            Self::DeepSeek => "https://api.deepseek.com/v1",
            Self::OpenRouter => "https://openrouter.ai/api/v1",
            Self::Ollama => "http://localhost:11434/v1",
        }
    }

    /// Prefix of the provider's environment variables, e.g. `GROQ` for
    /// `GROQ_API_KEY` and `GROQ_BASE_URL`.
    pub const fn env_prefix(self) -> &'static str {
        match self {
            Self::OpenAi => "OPENAI",
            Self::Anthropic => "ANTHROPIC",
            Self::Grok => "GROK",
            Self::Gemini => "GOOGLE",
            Self::Groq => "GROQ",
            Self::DeepSeek => "DEEPSEEK",
            Self::OpenRouter => "OPENROUTER",
            Self::Ollama => "OLLAMA",
        }
    }

    /// Whether requests must carry an API key.
    pub const fn needs_api_key(self) -> bool {
        !matches!(self, Self::Ollama)
    }

    /// The wire protocol this provider speaks.
    pub const fn backend_type(self) -> BackendType {
        match self {
            Self::Anthropic => BackendType::Anthropic,
            _ => BackendType::OpenAi,
        }
    }

    /// Whether the provider accepts `response_format: json_object`.
    pub const fn supports_json_mode(self) -> bool {
        !matches!(self, Self::Grok | Self::Anthropic)
    }
}

impl RunnerConfig {
    /// Load configuration from environment variables.
    ///
    /// Optional variables:
    /// - `OUTSMART_CONFIG` -- path to the game YAML (default: classic game)
    /// - `RESULTS_PATH` -- append finished games here as JSON lines
    /// - `<PROVIDER>_API_KEY` -- API key per provider (`OPENAI`,
    ///   `ANTHROPIC`, `GROK`, `GOOGLE`, `GROQ`, `DEEPSEEK`, `OPENROUTER`)
    /// - `<PROVIDER>_BASE_URL` -- override a provider's base URL
    ///
    /// Missing keys are only an error once a player needs that provider.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] if a variable is set but unusable.
    pub fn from_env() -> Result<Self, RunnerError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] if a variable is set but unusable.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, RunnerError> {
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let game_config_path = non_empty("OUTSMART_CONFIG").map(PathBuf::from);
        let results_path = non_empty("RESULTS_PATH").map(PathBuf::from);

        let mut endpoints = BTreeMap::new();
        for provider in Provider::ALL {
            let prefix = provider.env_prefix();
            let api_url = non_empty(&format!("{prefix}_BASE_URL"))
                .unwrap_or_else(|| provider.default_api_url().to_owned());
            if !api_url.starts_with("http://") && !api_url.starts_with("https://") {
                return Err(RunnerError::Config(format!(
                    "invalid {prefix}_BASE_URL: {api_url}"
                )));
            }
            let api_key = non_empty(&format!("{prefix}_API_KEY"));
            endpoints.insert(
                provider,
                Endpoint {
                    api_url: api_url.trim_end_matches('/').to_owned(),
                    api_key,
                },
            );
        }

        Ok(Self {
            game_config_path,
            results_path,
            endpoints,
        })
    }

    /// Load the game to play.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::GameConfig`] if the YAML file cannot be read
    /// or parsed.
    pub fn load_game(&self) -> Result<GameConfig, RunnerError> {
        match &self.game_config_path {
            Some(path) => Ok(GameConfig::from_file(path)?),
            None => Ok(GameConfig::classic()),
        }
    }

    /// The endpoint for `provider`, checked for a key if one is needed.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::Config`] if the provider needs an API key and
    /// none was configured.
    pub fn endpoint(&self, provider: Provider) -> Result<&Endpoint, RunnerError> {
        let endpoint = self.endpoints.get(&provider).ok_or_else(|| {
            RunnerError::Config(format!("no endpoint for provider {}", provider.name()))
        })?;
        if provider.needs_api_key() && endpoint.api_key.is_none() {
            return Err(RunnerError::Config(format!(
                "missing required env var {}_API_KEY",
                provider.env_prefix()
            )));
        }
        Ok(endpoint)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> Result<RunnerConfig, RunnerError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        RunnerConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults_without_env() {
        let config = config(&[]).unwrap();
        assert!(config.game_config_path.is_none());
        assert!(config.results_path.is_none());
        assert_eq!(config.endpoints.len(), Provider::ALL.len());
        let groq = config.endpoints.get(&Provider::Groq).unwrap();
        assert_eq!(groq.api_url, "https://api.groq.com/openai/v1");
        assert!(groq.api_key.is_none());
        assert_eq!(config.load_game().unwrap(), GameConfig::classic());
    }

    #[test]
    fn reads_keys_paths_and_overrides() {
        let config = config(&[
            ("OUTSMART_CONFIG", "games/duel.yaml"),
            ("RESULTS_PATH", "results.jsonl"),
            ("GOOGLE_API_KEY", "g-key"),
            ("OLLAMA_BASE_URL", "http://gpu-box:11434/v1/"),
        ])
        .unwrap();
        assert_eq!(config.game_config_path, Some(PathBuf::from("games/duel.yaml")));
        assert_eq!(config.results_path, Some(PathBuf::from("results.jsonl")));
        let gemini = config.endpoint(Provider::Gemini).unwrap();
        assert_eq!(gemini.api_key.as_deref(), Some("g-key"));
        let ollama = config.endpoint(Provider::Ollama).unwrap();
        assert_eq!(ollama.api_url, "http://gpu-box:11434/v1");
    }

    #[test]
    fn missing_key_fails_only_when_needed() {
        let config = config(&[]).unwrap();
        let err = config.endpoint(Provider::Anthropic).unwrap_err();
        assert!(err.to_string().contains("ANTHROPIC_API_KEY"));
        assert!(config.endpoint(Provider::Ollama).is_ok());
    }

    #[test]
    fn blank_values_are_ignored() {
        let config = config(&[("OPENAI_API_KEY", "  "), ("RESULTS_PATH", "")]).unwrap();
        assert!(config.results_path.is_none());
        assert!(config.endpoint(Provider::OpenAi).is_err());
    }

    #[test]
    fn rejects_non_http_base_url() {
        let err = config(&[("GROK_BASE_URL", "api.x.ai/v1")]).unwrap_err();
        assert!(matches!(err, RunnerError::Config(_)));
    }

    #[test]
    fn only_anthropic_speaks_messages_api() {
        for provider in Provider::ALL {
            let expected = if provider == Provider::Anthropic {
                BackendType::Anthropic
            } else {
                BackendType::OpenAi
            };
            assert_eq!(provider.backend_type(), expected, "{}", provider.name());
        }
    }
}
