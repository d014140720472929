//! Backend seam and the request/response types shared by all providers.
//!
//! The routing layer only ever sees [`LlmBackend`]; whether a prompt goes
//! to a local LM Studio server, a hosted endpoint, or a scripted mock is
//! decided once at composition time.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LlmError, Result};

// ─────────────────────────────────────────────────────────────────────────────
// Chat Types
// ─────────────────────────────────────────────────────────────────────────────

/// Role of a chat message author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

/// A single chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    /// Create a system message.
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    /// Create a user message.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    /// Create an assistant message.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }
}

/// A request for text completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionRequest {
    /// Model identifier (e.g., "llama-3.2-3b-instruct").
    pub model: String,

    /// Conversation messages in chronological order.
    pub messages: Vec<ChatMessage>,

    /// Maximum tokens to generate.
    pub max_tokens: u32,

    /// Sampling temperature (0.0 to 2.0).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
}

impl CompletionRequest {
    /// Create a new completion request.
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            messages,
            max_tokens,
            temperature: None,
        }
    }

    /// Create a request carrying a single user message.
    ///
    /// This is the shape every routed tool uses: one prompt in, one text out.
    pub fn prompt(model: impl Into<String>, prompt: impl Into<String>, max_tokens: u32) -> Self {
        Self::new(model, vec![ChatMessage::user(prompt)], max_tokens)
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }
}

/// A completed response from the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletionResponse {
    /// Response ID assigned by the provider.
    pub id: String,

    /// Model that generated the response.
    pub model: String,

    /// Generated text.
    pub content: String,

    /// Token usage statistics.
    pub usage: Usage,
}

impl CompletionResponse {
    /// Create a new completion response.
    pub fn new(
        id: impl Into<String>,
        model: impl Into<String>,
        content: impl Into<String>,
        usage: Usage,
    ) -> Self {
        Self {
            id: id.into(),
            model: model.into(),
            content: content.into(),
            usage,
        }
    }

    /// The generated text.
    pub fn text(&self) -> &str {
        &self.content
    }
}

/// Token usage statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: u32,
    pub output_tokens: u32,
}

impl Usage {
    /// Create new usage statistics.
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Total tokens used.
    pub fn total(&self) -> u32 {
        self.input_tokens + self.output_tokens
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared Retry Logic
// ─────────────────────────────────────────────────────────────────────────────

/// Run an async operation, retrying transient failures with doubling
/// backoff. Non-retryable errors return immediately; the last error is
/// returned once the budget is spent.
pub async fn with_retry<F, Fut, T>(
    max_retries: u32,
    initial_backoff: Duration,
    backend_name: &str,
    mut f: F,
) -> Result<T>
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = Result<T>>,
{
    let mut backoff = initial_backoff;
    let mut attempt = 0;

    loop {
        let err = match f().await {
            Ok(result) => return Ok(result),
            Err(e) => e,
        };

        if !err.is_retryable() || attempt >= max_retries {
            return Err(err);
        }

        attempt += 1;
        tracing::warn!(
            backend = backend_name,
            attempt,
            max_retries,
            backoff_ms = backoff.as_millis() as u64,
            "Request failed, retrying"
        );
        tokio::time::sleep(backoff).await;
        backoff *= 2;
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM Backend Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A chat-completion provider.
#[async_trait]
pub trait LlmBackend: Send + Sync {
    /// Run one completion request to completion.
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Check that the backend is reachable and usable.
    async fn health_check(&self) -> Result<()>;
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock Backend
// ─────────────────────────────────────────────────────────────────────────────

/// Scripted backend for tests.
///
/// Serves its queued responses in order and logs every request, so tests
/// can assert both what the classifier asked and how often. An exhausted
/// queue turns further calls into backend errors, which doubles as a way
/// to script failures.
#[derive(Debug)]
pub struct MockBackend {
    name: String,
    responses: std::sync::Mutex<Vec<CompletionResponse>>,
    request_log: std::sync::Mutex<Vec<CompletionRequest>>,
}

impl MockBackend {
    /// Create a mock backend with the given response queue.
    pub fn new(responses: Vec<CompletionResponse>) -> Self {
        Self {
            name: "mock".to_string(),
            responses: std::sync::Mutex::new(responses),
            request_log: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Create a mock backend with a single text response.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self::new(vec![CompletionResponse::new(
            "mock_msg_1",
            "mock-model",
            text,
            Usage::new(10, 20),
        )])
    }

    /// Create a mock backend returning the given texts in order.
    pub fn with_texts<I, S>(texts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(
            texts
                .into_iter()
                .enumerate()
                .map(|(i, text)| {
                    CompletionResponse::new(
                        format!("mock_msg_{}", i + 1),
                        "mock-model",
                        text,
                        Usage::new(10, 20),
                    )
                })
                .collect(),
        )
    }

    /// Get all requests that were made to this backend.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.request_log.lock().unwrap().clone()
    }

    /// Get the number of requests made.
    pub fn request_count(&self) -> usize {
        self.request_log.lock().unwrap().len()
    }
}

#[async_trait]
impl LlmBackend for MockBackend {
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        // Log the request
        self.request_log.lock().unwrap().push(request);

        // Return the next response
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            return Err(LlmError::Backend(
                "MockBackend: no more responses available".to_string(),
            ));
        }
        Ok(responses.remove(0))
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn health_check(&self) -> Result<()> {
        Ok(())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Shared Backend Type
// ─────────────────────────────────────────────────────────────────────────────

/// A backend that can be shared across threads.
pub type SharedBackend = Arc<dyn LlmBackend>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_request_shape() {
        let request = CompletionRequest::prompt("test-model", "Hello", 100);
        assert_eq!(request.model, "test-model");
        assert_eq!(request.max_tokens, 100);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, Role::User);
        assert_eq!(request.messages[0].content, "Hello");
        assert!(request.temperature.is_none());
    }

    #[test]
    fn test_request_builder() {
        let request = CompletionRequest::prompt("m", "q", 50).with_temperature(0.2);
        assert_eq!(request.temperature, Some(0.2));
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&Role::User).unwrap(), "\"user\"");
        assert_eq!(
            serde_json::to_string(&Role::Assistant).unwrap(),
            "\"assistant\""
        );
        assert_eq!(serde_json::to_string(&Role::System).unwrap(), "\"system\"");
    }

    #[test]
    fn test_usage_total() {
        let usage = Usage::new(10, 20);
        assert_eq!(usage.total(), 30);
    }

    #[tokio::test]
    async fn test_mock_backend_returns_responses_in_order() {
        let backend = MockBackend::with_texts(["first", "second"]);

        let r1 = backend
            .complete(CompletionRequest::prompt("m", "a", 10))
            .await
            .unwrap();
        let r2 = backend
            .complete(CompletionRequest::prompt("m", "b", 10))
            .await
            .unwrap();

        assert_eq!(r1.text(), "first");
        assert_eq!(r2.text(), "second");
        assert_eq!(backend.request_count(), 2);
    }

    #[tokio::test]
    async fn test_mock_backend_exhausted() {
        let backend = MockBackend::with_text("only one");

        backend
            .complete(CompletionRequest::prompt("m", "a", 10))
            .await
            .unwrap();
        let err = backend
            .complete(CompletionRequest::prompt("m", "b", 10))
            .await
            .unwrap_err();

        assert!(matches!(err, LlmError::Backend(_)));
    }

    #[tokio::test]
    async fn test_mock_backend_logs_requests() {
        let backend = MockBackend::with_text("response");

        backend
            .complete(CompletionRequest::prompt("m", "the query", 10))
            .await
            .unwrap();

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].messages[0].content, "the query");
    }

    #[tokio::test]
    async fn test_with_retry_gives_up_on_non_retryable() {
        let mut calls = 0;
        let result: Result<()> = with_retry(3, Duration::from_millis(1), "test", || {
            calls += 1;
            async { Err(LlmError::Config("bad".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(LlmError::Config(_))));
        assert_eq!(calls, 1);
    }

    #[tokio::test]
    async fn test_with_retry_retries_network_errors() {
        let mut calls = 0;
        let result: Result<()> = with_retry(2, Duration::from_millis(1), "test", || {
            calls += 1;
            async { Err(LlmError::Network("down".to_string())) }
        })
        .await;

        assert!(matches!(result, Err(LlmError::Network(_))));
        // Initial attempt plus two retries.
        assert_eq!(calls, 3);
    }

    #[tokio::test]
    async fn test_with_retry_succeeds_after_failure() {
        let mut calls = 0;
        let result = with_retry(3, Duration::from_millis(1), "test", || {
            calls += 1;
            let attempt = calls;
            async move {
                if attempt < 2 {
                    Err(LlmError::Network("flaky".to_string()))
                } else {
                    Ok(attempt)
                }
            }
        })
        .await;

        assert_eq!(result.unwrap(), 2);
    }
}
