//! Chat-completions client for LM Studio and other OpenAI-compatible
//! servers.
//!
//! The defaults target a local LM Studio instance (no API key, generous
//! timeout for CPU inference); the same client speaks to any hosted
//! OpenAI-compatible endpoint by swapping the base URL and key.

use async_trait::async_trait;
use reqwest::{Client, Response};
use std::sync::Arc;
use std::time::Duration;

use crate::backend::{
    CompletionRequest, CompletionResponse, LlmBackend, Role, Usage, with_retry,
};
use crate::error::{LlmError, Result};

const DEFAULT_LMSTUDIO_BASE: &str = "http://127.0.0.1:1234/v1";
const DEFAULT_OPENAI_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_LMSTUDIO_MODEL: &str = "llama-3.2-3b-instruct";

/// Local inference can take a while on modest hardware; the client gives
/// up after this rather than hanging a routed query forever.
const DEFAULT_TIMEOUT_SECS: u64 = 100;

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// Connection settings for an OpenAI-compatible chat endpoint.
#[derive(Debug, Clone)]
pub struct LmStudioConfig {
    /// Bearer token. A local LM Studio server needs none.
    pub api_key: Option<String>,

    /// Base URL for the API.
    pub base_url: String,

    /// Model to use (overrides the per-request model when set).
    pub model: Option<String>,

    /// Request timeout.
    pub timeout: Duration,

    /// Maximum retries for transient errors.
    pub max_retries: u32,

    /// Initial backoff duration for retries.
    pub retry_backoff: Duration,

    /// Name for this backend instance.
    pub name: String,
}

impl LmStudioConfig {
    /// Settings for a local LM Studio server.
    pub fn lmstudio() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_LMSTUDIO_BASE.to_string(),
            model: Some(DEFAULT_LMSTUDIO_MODEL.to_string()),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
            name: "lmstudio".to_string(),
        }
    }

    /// Settings for the hosted OpenAI API.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: DEFAULT_OPENAI_BASE.to_string(),
            model: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            max_retries: 3,
            retry_backoff: Duration::from_millis(500),
            name: "openai".to_string(),
        }
    }

    /// OpenAI settings with the key taken from `OPENAI_API_KEY`.
    pub fn openai_from_env() -> Result<Self> {
        match std::env::var("OPENAI_API_KEY") {
            Ok(key) => Ok(Self::openai(key)),
            Err(_) => Err(LlmError::Config(
                "OPENAI_API_KEY environment variable not set".to_string(),
            )),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the default model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Set the API key.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    /// Set the backend name.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Set the request timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the retry budget for transient failures.
    pub fn with_max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    /// Set the initial retry backoff.
    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }
}

impl Default for LmStudioConfig {
    fn default() -> Self {
        Self::lmstudio()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend
// ─────────────────────────────────────────────────────────────────────────────

/// LM Studio / OpenAI-compatible chat backend.
pub struct LmStudioBackend {
    client: Client,
    config: LmStudioConfig,
}

impl LmStudioBackend {
    /// Create a backend from the given settings.
    pub fn new(config: LmStudioConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    /// Create a backend with default local LM Studio settings.
    pub fn lmstudio() -> Result<Self> {
        Self::new(LmStudioConfig::lmstudio())
    }

    /// Create an OpenAI backend from environment.
    pub fn openai_from_env() -> Result<Self> {
        Self::new(LmStudioConfig::openai_from_env()?)
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.config.base_url)
    }

    // Health checks probe the models listing; it is cheap and needs no auth
    // on local servers.
    fn models_url(&self) -> String {
        format!("{}/models", self.config.base_url)
    }

    fn to_wire_request(&self, request: &CompletionRequest) -> WireChatRequest {
        WireChatRequest {
            // The config model, when set, pins every request to the locally
            // loaded model regardless of what the caller asked for
            model: self
                .config
                .model
                .as_deref()
                .unwrap_or(&request.model)
                .to_string(),
            messages: request
                .messages
                .iter()
                .map(|m| WireMessage {
                    role: match m.role {
                        Role::System => "system",
                        Role::User => "user",
                        Role::Assistant => "assistant",
                    },
                    content: m.content.clone(),
                })
                .collect(),
            max_tokens: Some(request.max_tokens),
            temperature: request.temperature,
        }
    }

    async fn handle_response(response: Response) -> Result<CompletionResponse> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(wire_error(status.as_u16(), &body));
        }

        let body = response.text().await?;
        let parsed: WireChatResponse =
            serde_json::from_str(&body).map_err(|e| LlmError::Serialization(e.to_string()))?;
        Ok(parsed.into())
    }
}

/// Map a non-success chat response onto the error taxonomy.
fn wire_error(status: u16, body: &str) -> LlmError {
    let message = serde_json::from_str::<WireErrorResponse>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| format!("HTTP {}: {}", status, body));

    match status {
        401 => LlmError::Auth(format!("Authentication failed: {}", message)),
        429 => LlmError::RateLimit(message),
        500..=599 => LlmError::Backend(format!("Server error: {}", message)),
        _ => LlmError::Backend(message),
    }
}

#[async_trait]
impl LlmBackend for LmStudioBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let wire_request = self.to_wire_request(&request);

        tracing::debug!(
            backend = %self.config.name,
            model = %wire_request.model,
            messages = wire_request.messages.len(),
            "Sending chat completion request"
        );

        with_retry(
            self.config.max_retries,
            self.config.retry_backoff,
            &self.config.name,
            || async {
                let mut builder = self.client.post(self.completions_url()).json(&wire_request);
                if let Some(key) = &self.config.api_key {
                    builder = builder.bearer_auth(key);
                }
                Self::handle_response(builder.send().await?).await
            },
        )
        .await
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    async fn health_check(&self) -> Result<()> {
        if self.config.api_key.is_none() {
            let response = self.client.get(self.models_url()).send().await?;
            return if response.status().is_success() {
                Ok(())
            } else {
                Err(LlmError::Backend(format!(
                    "Models endpoint returned HTTP {}",
                    response.status()
                )))
            };
        }

        // Hosted services gate /models behind auth; a one-token completion
        // settles reachability instead
        let model = self
            .config
            .model
            .clone()
            .unwrap_or_else(|| DEFAULT_LMSTUDIO_MODEL.to_string());
        match self.complete(CompletionRequest::prompt(model, "ping", 1)).await {
            Ok(_) => Ok(()),
            Err(LlmError::RateLimit(_)) => Ok(()), // Rate-limited means reachable
            Err(e) => Err(e),
        }
    }
}

/// Create a shared LM Studio-compatible backend.
pub fn create_shared_backend(config: LmStudioConfig) -> Result<Arc<dyn LlmBackend>> {
    Ok(Arc::new(LmStudioBackend::new(config)?))
}

// ─────────────────────────────────────────────────────────────────────────────
// Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, serde::Serialize)]
struct WireChatRequest {
    model: String,
    messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
}

#[derive(Debug, serde::Serialize)]
struct WireMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, serde::Deserialize)]
struct WireChatResponse {
    id: String,
    model: String,
    choices: Vec<WireChoice>,
    usage: Option<WireUsage>,
}

#[derive(Debug, serde::Deserialize)]
struct WireChoice {
    message: WireChoiceMessage,
}

#[derive(Debug, serde::Deserialize)]
struct WireChoiceMessage {
    content: Option<String>,
}

#[derive(Debug, serde::Deserialize)]
struct WireUsage {
    prompt_tokens: u32,
    completion_tokens: u32,
}

#[derive(Debug, serde::Deserialize)]
struct WireErrorResponse {
    error: WireError,
}

#[derive(Debug, serde::Deserialize)]
struct WireError {
    message: String,
}

impl From<WireChatResponse> for CompletionResponse {
    fn from(resp: WireChatResponse) -> Self {
        CompletionResponse {
            id: resp.id,
            model: resp.model,
            content: resp
                .choices
                .into_iter()
                .next()
                .and_then(|c| c.message.content)
                .unwrap_or_default(),
            usage: resp
                .usage
                .map(|u| Usage::new(u.prompt_tokens, u.completion_tokens))
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lmstudio_defaults() {
        let config = LmStudioConfig::lmstudio();
        assert!(config.api_key.is_none());
        assert_eq!(config.base_url, DEFAULT_LMSTUDIO_BASE);
        assert_eq!(config.model.as_deref(), Some(DEFAULT_LMSTUDIO_MODEL));
        assert_eq!(config.timeout, Duration::from_secs(100));
        assert_eq!(config.max_retries, 3);
        assert_eq!(config.name, "lmstudio");
    }

    #[test]
    fn test_openai_defaults() {
        let config = LmStudioConfig::openai("sk-test");
        assert_eq!(config.api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.base_url, DEFAULT_OPENAI_BASE);
        assert!(config.model.is_none());
        assert_eq!(config.name, "openai");
    }

    #[test]
    fn test_builders_override_defaults() {
        let config = LmStudioConfig::lmstudio()
            .with_base_url("http://inference.local/v1")
            .with_model("mistral-7b")
            .with_name("lab")
            .with_timeout(Duration::from_secs(15))
            .with_max_retries(1)
            .with_retry_backoff(Duration::from_millis(50));

        assert_eq!(config.base_url, "http://inference.local/v1");
        assert_eq!(config.model.as_deref(), Some("mistral-7b"));
        assert_eq!(config.name, "lab");
        assert_eq!(config.timeout, Duration::from_secs(15));
        assert_eq!(config.max_retries, 1);
        assert_eq!(config.retry_backoff, Duration::from_millis(50));
    }

    #[test]
    fn test_endpoint_urls() {
        let backend = LmStudioBackend::lmstudio().unwrap();
        assert_eq!(
            backend.completions_url(),
            "http://127.0.0.1:1234/v1/chat/completions"
        );
        assert_eq!(backend.models_url(), "http://127.0.0.1:1234/v1/models");
        assert_eq!(backend.name(), "lmstudio");
    }

    #[test]
    fn test_config_model_pins_requests() {
        let backend =
            LmStudioBackend::new(LmStudioConfig::lmstudio().with_model("qwen-2.5")).unwrap();

        let wire = backend.to_wire_request(&CompletionRequest::prompt("ignored", "Hi", 64));
        assert_eq!(wire.model, "qwen-2.5");
    }

    #[test]
    fn test_request_model_used_when_config_has_none() {
        let backend = LmStudioBackend::new(LmStudioConfig::openai("k")).unwrap();

        let wire = backend.to_wire_request(&CompletionRequest::prompt("gpt-4o-mini", "Hi", 64));
        assert_eq!(wire.model, "gpt-4o-mini");
    }

    #[test]
    fn test_wire_request_body() {
        let backend = LmStudioBackend::lmstudio().unwrap();
        let wire = backend.to_wire_request(&CompletionRequest::prompt("m", "What is aspirin?", 300));

        let json = serde_json::to_value(&wire).unwrap();
        assert_eq!(json["model"], "llama-3.2-3b-instruct");
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["messages"][0]["content"], "What is aspirin?");
        assert_eq!(json["max_tokens"], 300);
        // Unset temperature stays out of the body
        assert!(json.get("temperature").is_none());
    }

    #[test]
    fn test_response_conversion() {
        let body = r#"{
            "id": "chatcmpl-123",
            "model": "llama-3.2-3b-instruct",
            "choices": [{"message": {"role": "assistant", "content": "Hello!"}}],
            "usage": {"prompt_tokens": 10, "completion_tokens": 5}
        }"#;
        let parsed: WireChatResponse = serde_json::from_str(body).unwrap();

        let response: CompletionResponse = parsed.into();
        assert_eq!(response.id, "chatcmpl-123");
        assert_eq!(response.text(), "Hello!");
        assert_eq!(response.usage.input_tokens, 10);
        assert_eq!(response.usage.output_tokens, 5);
    }

    #[test]
    fn test_response_conversion_tolerates_missing_fields() {
        let body = r#"{"id": "x", "model": "m", "choices": []}"#;
        let parsed: WireChatResponse = serde_json::from_str(body).unwrap();

        let response: CompletionResponse = parsed.into();
        assert_eq!(response.text(), "");
        assert_eq!(response.usage.total(), 0);
    }

    #[test]
    fn test_error_mapping_by_status() {
        let body = r#"{"error": {"message": "bad key"}}"#;
        assert!(matches!(wire_error(401, body), LlmError::Auth(_)));
        assert!(matches!(wire_error(429, body), LlmError::RateLimit(_)));
        assert!(matches!(wire_error(503, body), LlmError::Backend(_)));
        // Unparseable bodies still produce a message
        let err = wire_error(418, "teapot");
        assert!(err.to_string().contains("HTTP 418"));
    }
}
