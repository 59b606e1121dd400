//! LLM backend abstraction and implementations.
//!
//! Defines an enum-based dispatch for LLM backends, avoiding the
//! dyn-compatibility issues with async trait methods. Concrete
//! implementations exist for OpenAI-compatible APIs and the Anthropic
//! Messages API. All backends communicate over HTTP via `reqwest`.
//!
//! Backends know nothing about the game: they send the rendered
//! instructions and return whatever text comes back. Parsing happens in
//! the engine.
//!
//! [`ModelRegistry`] maps model identifiers to the provider serving them.

use std::collections::BTreeMap;
use std::time::Duration;

use outsmart_core::{Instructions, MoveSource, TransportError};

use crate::config::{BackendType, Provider, RunnerConfig};
use crate::error::RunnerError;

/// Upper bound on a single HTTP exchange with a provider.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Everything needed to build one backend.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendConfig {
    /// The provider serving the model.
    pub provider: Provider,
    /// Base API URL.
    pub api_url: String,
    /// API key; empty for providers that need none.
    pub api_key: String,
    /// Model identifier as the provider knows it.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f64,
}

// ---------------------------------------------------------------------------
// Unified backend enum (dyn-compatible alternative to async trait)
// ---------------------------------------------------------------------------

/// An LLM backend that can process instructions and return a response.
///
/// Uses enum dispatch instead of trait objects because async methods
/// are not dyn-compatible in Rust.
#[derive(Debug)]
pub enum LlmBackend {
    /// OpenAI-compatible chat completions API.
    OpenAi(OpenAiBackend),
    /// Anthropic Messages API.
    Anthropic(AnthropicBackend),
}

impl LlmBackend {
    /// Build the backend matching the provider's wire protocol.
    pub fn new(config: BackendConfig) -> Self {
        match config.provider.backend_type() {
            BackendType::OpenAi => Self::OpenAi(OpenAiBackend::new(config)),
            BackendType::Anthropic => Self::Anthropic(AnthropicBackend::new(config)),
        }
    }

    /// Send instructions to the LLM and return the response text.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::LlmBackend`] if the HTTP call fails or the
    /// response cannot be extracted.
    pub async fn complete(
        &self,
        instructions: &Instructions,
        max_tokens: u32,
    ) -> Result<String, RunnerError> {
        match self {
            Self::OpenAi(backend) => backend.complete(instructions, max_tokens).await,
            Self::Anthropic(backend) => backend.complete(instructions, max_tokens).await,
        }
    }

    /// Human-readable name for logging.
    pub const fn name(&self) -> &str {
        match self {
            Self::OpenAi(_) => "openai-compatible",
            Self::Anthropic(_) => "anthropic",
        }
    }

    /// The configuration this backend was built from.
    pub const fn config(&self) -> &BackendConfig {
        match self {
            Self::OpenAi(backend) => &backend.config,
            Self::Anthropic(backend) => &backend.config,
        }
    }
}

impl MoveSource for LlmBackend {
    async fn send(
        &self,
        instructions: &Instructions,
        max_tokens: u32,
    ) -> Result<String, TransportError> {
        self.complete(instructions, max_tokens)
            .await
            .map_err(|e| TransportError::new(e.to_string()))
    }
}

/// Read the error body of a failed response for the error message.
async fn failure(provider: &str, response: reqwest::Response) -> RunnerError {
    let status = response.status();
    let error_body = response
        .text()
        .await
        .unwrap_or_else(|_| "unable to read error body".to_owned());
    RunnerError::LlmBackend(format!("{provider} returned {status}: {error_body}"))
}

// ---------------------------------------------------------------------------
// OpenAI-compatible backend
// ---------------------------------------------------------------------------

/// Backend for OpenAI-compatible chat completions APIs.
///
/// Works with `OpenAI`, Grok, Gemini, Groq, `DeepSeek`, `OpenRouter` and
/// Ollama endpoints. Sends requests to `{api_url}/chat/completions`.
#[derive(Debug)]
pub struct OpenAiBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl OpenAiBackend {
    /// Create a new `OpenAI`-compatible backend.
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: http_client(),
            config,
        }
    }

    /// Reasoning models reject `temperature` and spend part of any token
    /// cap on hidden reasoning.
    fn is_reasoning_model(&self) -> bool {
        self.config.provider == Provider::OpenAi
            && ["gpt-5", "o1", "o3", "o4"]
                .iter()
                .any(|prefix| self.config.model.starts_with(prefix))
    }

    fn request_body(&self, instructions: &Instructions, max_tokens: u32) -> serde_json::Value {
        let mut body = serde_json::Map::new();
        body.insert("model".to_owned(), serde_json::json!(self.config.model));
        body.insert(
            "messages".to_owned(),
            serde_json::json!([
                {"role": "system", "content": instructions.system},
                {"role": "user", "content": instructions.user}
            ]),
        );
        if self.is_reasoning_model() {
            body.insert("reasoning_effort".to_owned(), serde_json::json!("low"));
        } else {
            body.insert("temperature".to_owned(), serde_json::json!(self.config.temperature));
            body.insert("max_tokens".to_owned(), serde_json::json!(max_tokens));
        }
        if self.config.provider.supports_json_mode() {
            body.insert(
                "response_format".to_owned(),
                serde_json::json!({"type": "json_object"}),
            );
        }
        serde_json::Value::Object(body)
    }

    /// Send instructions and return the response text.
    async fn complete(
        &self,
        instructions: &Instructions,
        max_tokens: u32,
    ) -> Result<String, RunnerError> {
        let url = format!("{}/chat/completions", self.config.api_url);
        let provider = self.config.provider.name();

        let mut request = self
            .client
            .post(&url)
            .header("Content-Type", "application/json")
            .json(&self.request_body(instructions, max_tokens));
        if !self.config.api_key.is_empty() {
            request = request.header("Authorization", format!("Bearer {}", self.config.api_key));
        }

        let response = request
            .send()
            .await
            .map_err(|e| RunnerError::LlmBackend(format!("{provider} request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(failure(provider, response).await);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RunnerError::LlmBackend(format!("{provider} response parse failed: {e}")))?;

        extract_openai_content(&json)
    }
}

/// Extract the text content from an `OpenAI` chat completions response.
fn extract_openai_content(json: &serde_json::Value) -> Result<String, RunnerError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            RunnerError::LlmBackend(
                "response missing choices[0].message.content".to_owned(),
            )
        })
}

// ---------------------------------------------------------------------------
// Anthropic Messages API backend
// ---------------------------------------------------------------------------

/// Backend for the Anthropic Messages API.
///
/// Anthropic uses a different request format from `OpenAI`:
/// - Uses `x-api-key` header instead of `Authorization: Bearer`
/// - Messages array does not include system (system is a top-level field)
/// - Response structure differs: `content[0].text`
#[derive(Debug)]
pub struct AnthropicBackend {
    client: reqwest::Client,
    config: BackendConfig,
}

impl AnthropicBackend {
    /// Create a new Anthropic Messages API backend.
    pub fn new(config: BackendConfig) -> Self {
        Self {
            client: http_client(),
            config,
        }
    }

    fn request_body(&self, instructions: &Instructions, max_tokens: u32) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "max_tokens": max_tokens,
            "temperature": self.config.temperature,
            "system": instructions.system,
            "messages": [
                {"role": "user", "content": instructions.user}
            ]
        })
    }

    /// Send instructions and return the response text.
    async fn complete(
        &self,
        instructions: &Instructions,
        max_tokens: u32,
    ) -> Result<String, RunnerError> {
        let url = format!("{}/messages", self.config.api_url);

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", "2023-06-01")
            .header("Content-Type", "application/json")
            .json(&self.request_body(instructions, max_tokens))
            .send()
            .await
            .map_err(|e| RunnerError::LlmBackend(format!("Anthropic request failed: {e}")))?;

        if !response.status().is_success() {
            return Err(failure("Anthropic", response).await);
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| {
                RunnerError::LlmBackend(format!("Anthropic response parse failed: {e}"))
            })?;

        extract_anthropic_content(&json)
    }
}

/// Extract the text content from an Anthropic Messages API response.
fn extract_anthropic_content(json: &serde_json::Value) -> Result<String, RunnerError> {
    json.get("content")
        .and_then(|c| c.get(0))
        .and_then(|b| b.get("text"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| {
            RunnerError::LlmBackend("Anthropic response missing content[0].text".to_owned())
        })
}

// ---------------------------------------------------------------------------
// Model registry
// ---------------------------------------------------------------------------

const BUILTIN_MODELS: &[(Provider, &[&str])] = &[
    (
        Provider::OpenAi,
        &[
            "gpt-3.5-turbo",
            "gpt-4-turbo",
            "gpt-4o",
            "gpt-4o-mini",
            "gpt-4.1",
            "o4-mini",
            "gpt-5",
            "gpt-5-nano",
            "gpt-5-mini",
        ],
    ),
    (
        Provider::Anthropic,
        &[
            "claude-3-5-sonnet-latest",
            "claude-3-haiku-20240307",
            "claude-4-sonnet-latest",
            "claude-sonnet-4-0",
            "claude-opus-4-1-20250805",
            "claude-sonnet-4-5",
            "claude-haiku-4-5",
        ],
    ),
    (Provider::Grok, &["grok-3", "grok-4", "grok-4-fast"]),
    (
        Provider::Gemini,
        &[
            "gemini-1.0-pro",
            "gemini-1.5-flash",
            "gemini-2.0-flash",
            "gemini-2.5-flash",
            "gemini-2.5-pro",
        ],
    ),
    (
        Provider::Groq,
        &[
            "deepseek-r1-distill-llama-70b",
            "llama-3.3-70b-versatile",
            "mixtral-8x7b-32768",
            "openai/gpt-oss-120b",
        ],
    ),
    (Provider::DeepSeek, &["deepseek-chat", "deepseek-reasoner"]),
];

/// Maps model identifiers to the provider that serves them.
///
/// Besides exact entries, `ollama/<model>` and `openrouter/<model>` route
/// `<model>` to those providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRegistry {
    models: BTreeMap<String, Provider>,
}

impl ModelRegistry {
    /// A registry without any exact entries.
    pub const fn empty() -> Self {
        Self {
            models: BTreeMap::new(),
        }
    }

    /// The models supported out of the box.
    pub fn builtin() -> Self {
        let mut registry = Self::empty();
        for (provider, models) in BUILTIN_MODELS {
            for model in *models {
                registry.register(*model, *provider);
            }
        }
        registry
    }

    /// Route `model` to `provider`, replacing any previous entry.
    pub fn register(&mut self, model: impl Into<String>, provider: Provider) {
        self.models.insert(model.into(), provider);
    }

    /// The provider for `model` and the identifier to send it.
    pub fn resolve<'m>(&self, model: &'m str) -> Option<(Provider, &'m str)> {
        if let Some(provider) = self.models.get(model) {
            return Some((*provider, model));
        }
        for provider in [Provider::Ollama, Provider::OpenRouter] {
            if let Some(rest) = model
                .strip_prefix(provider.name())
                .and_then(|rest| rest.strip_prefix('/'))
                .filter(|rest| !rest.is_empty())
            {
                return Some((provider, rest));
            }
        }
        None
    }

    /// Build a backend for `model` at `temperature`.
    ///
    /// # Errors
    ///
    /// Returns [`RunnerError::UnknownModel`] if no provider serves the
    /// model, or [`RunnerError::Config`] if the provider's API key is
    /// missing.
    pub fn create(
        &self,
        model: &str,
        temperature: f64,
        config: &RunnerConfig,
    ) -> Result<LlmBackend, RunnerError> {
        let (provider, api_model) = self
            .resolve(model)
            .ok_or_else(|| RunnerError::UnknownModel(model.to_owned()))?;
        let endpoint = config.endpoint(provider)?;
        Ok(LlmBackend::new(BackendConfig {
            provider,
            api_url: endpoint.api_url.clone(),
            api_key: endpoint.api_key.clone().unwrap_or_default(),
            model: api_model.to_owned(),
            temperature,
        }))
    }
}

impl Default for ModelRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;

    fn instructions() -> Instructions {
        Instructions {
            system: String::from("rules"),
            user: String::from("your move"),
        }
    }

    fn backend_config(provider: Provider, model: &str) -> BackendConfig {
        BackendConfig {
            provider,
            api_url: provider.default_api_url().to_owned(),
            api_key: String::from("test"),
            model: model.to_owned(),
            temperature: 0.7,
        }
    }

    fn runner_config(vars: &[(&str, &str)]) -> RunnerConfig {
        let vars: BTreeMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        RunnerConfig::from_lookup(|name| vars.get(name).cloned()).unwrap()
    }

    #[test]
    fn extract_openai_content_valid() {
        let json = serde_json::json!({
            "choices": [{
                "message": {
                    "content": "{\"give coin to\": \"Blake\"}"
                }
            }]
        });
        let result = extract_openai_content(&json);
        assert!(result.unwrap_or_default().contains("Blake"));
    }

    #[test]
    fn extract_openai_content_missing_choices() {
        let json = serde_json::json!({"error": "rate_limit"});
        assert!(extract_openai_content(&json).is_err());
    }

    #[test]
    fn extract_anthropic_content_valid() {
        let json = serde_json::json!({
            "content": [{
                "type": "text",
                "text": "{\"take coin from\": \"Drew\"}"
            }]
        });
        let result = extract_anthropic_content(&json);
        assert!(result.unwrap_or_default().contains("Drew"));
    }

    #[test]
    fn extract_anthropic_content_missing() {
        let json = serde_json::json!({"content": []});
        assert!(extract_anthropic_content(&json).is_err());
    }

    #[test]
    fn openai_body_uses_json_mode_and_budget() {
        let backend = OpenAiBackend::new(backend_config(Provider::Groq, "llama-3.3-70b-versatile"));
        let body = backend.request_body(&instructions(), 400);
        assert_eq!(body["max_tokens"], 400);
        assert_eq!(body["response_format"]["type"], "json_object");
        assert_eq!(body["messages"][0]["content"], "rules");
        assert_eq!(body["messages"][1]["role"], "user");
    }

    #[test]
    fn reasoning_models_skip_temperature() {
        let backend = OpenAiBackend::new(backend_config(Provider::OpenAi, "gpt-5-mini"));
        let body = backend.request_body(&instructions(), 400);
        assert_eq!(body["reasoning_effort"], "low");
        assert!(body.get("temperature").is_none());
        assert!(body.get("max_tokens").is_none());
    }

    #[test]
    fn grok_body_has_no_json_mode() {
        let backend = OpenAiBackend::new(backend_config(Provider::Grok, "grok-4"));
        let body = backend.request_body(&instructions(), 400);
        assert!(body.get("response_format").is_none());
    }

    #[test]
    fn anthropic_body_puts_system_on_top() {
        let backend = AnthropicBackend::new(backend_config(Provider::Anthropic, "claude-haiku-4-5"));
        let body = backend.request_body(&instructions(), 300);
        assert_eq!(body["system"], "rules");
        assert_eq!(body["max_tokens"], 300);
        assert_eq!(body["messages"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn registry_resolves_builtin_and_prefixed_models() {
        let registry = ModelRegistry::builtin();
        assert_eq!(
            registry.resolve("claude-3-haiku-20240307"),
            Some((Provider::Anthropic, "claude-3-haiku-20240307"))
        );
        assert_eq!(
            registry.resolve("openai/gpt-oss-120b"),
            Some((Provider::Groq, "openai/gpt-oss-120b"))
        );
        assert_eq!(registry.resolve("ollama/llama3.2"), Some((Provider::Ollama, "llama3.2")));
        assert_eq!(
            registry.resolve("openrouter/meta-llama/llama-3-70b"),
            Some((Provider::OpenRouter, "meta-llama/llama-3-70b"))
        );
        assert_eq!(registry.resolve("ollama/"), None);
        assert_eq!(registry.resolve("gpt-99"), None);
    }

    #[test]
    fn register_adds_models() {
        let mut registry = ModelRegistry::empty();
        assert!(registry.resolve("qwen-max").is_none());
        registry.register("qwen-max", Provider::OpenRouter);
        assert_eq!(registry.resolve("qwen-max"), Some((Provider::OpenRouter, "qwen-max")));
    }

    #[test]
    fn create_dispatches_by_provider() {
        let config = runner_config(&[("OPENAI_API_KEY", "sk"), ("ANTHROPIC_API_KEY", "ak")]);
        let registry = ModelRegistry::builtin();

        let backend = registry.create("gpt-4o-mini", 0.7, &config).unwrap();
        assert_eq!(backend.name(), "openai-compatible");
        assert_eq!(backend.config().api_key, "sk");

        let backend = registry.create("claude-haiku-4-5", 0.5, &config).unwrap();
        assert_eq!(backend.name(), "anthropic");
        assert!((backend.config().temperature - 0.5).abs() < f64::EPSILON);

        let backend = registry.create("ollama/llama3.2", 0.7, &config).unwrap();
        assert_eq!(backend.config().model, "llama3.2");
        assert!(backend.config().api_key.is_empty());
    }

    #[test]
    fn create_reports_unknown_models_and_missing_keys() {
        let config = runner_config(&[]);
        let registry = ModelRegistry::builtin();
        assert!(matches!(
            registry.create("gpt-99", 0.7, &config),
            Err(RunnerError::UnknownModel(_))
        ));
        assert!(matches!(
            registry.create("grok-4", 0.7, &config),
            Err(RunnerError::Config(_))
        ));
    }
}
