//! Error taxonomy for chat and embedding calls.

use thiserror::Error;

/// Result type alias using the LLM error type.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Failure modes of a completion or embedding call.
///
/// Timeouts and connection resets both land in [`LlmError::Network`]: the
/// routing layer treats every transport-level failure as one category and
/// does not distinguish how the call died.
#[derive(Debug, Error)]
pub enum LlmError {
    /// The provider answered with an error.
    #[error("Backend error: {0}")]
    Backend(String),

    /// Transport failure: timeout, refused connection, dropped socket.
    #[error("Network error: {0}")]
    Network(String),

    /// Unusable settings, such as a missing API key.
    #[error("Configuration error: {0}")]
    Config(String),

    /// The response body did not parse.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The provider asked us to slow down.
    #[error("Rate limit exceeded: {0}")]
    RateLimit(String),

    /// The provider rejected our credentials.
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl LlmError {
    /// Whether retrying the same call can plausibly succeed.
    ///
    /// Only transient conditions qualify; configuration and auth problems
    /// will fail the same way every time.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::RateLimit(_))
    }
}

impl From<reqwest::Error> for LlmError {
    fn from(err: reqwest::Error) -> Self {
        let detail = if err.is_timeout() {
            format!("Request timed out: {}", err)
        } else if err.is_connect() {
            format!("Connection failed: {}", err)
        } else {
            err.to_string()
        };
        LlmError::Network(detail)
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::Serialization(err.to_string())
    }
}
