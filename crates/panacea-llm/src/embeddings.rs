//! Query and document embeddings.
//!
//! The retrieval tools match queries against indexed chunks by vector
//! similarity, so the crate exposes an [`Embedder`] seam next to the chat
//! backend: [`HttpEmbedder`] talks to an OpenAI-compatible `/embeddings`
//! route (LM Studio serves one locally), and [`MockEmbedder`] produces
//! deterministic vectors for tests and offline runs.

use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{LlmError, Result};

/// Turns text into a dense vector of a fixed dimensionality.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed several texts at once.
    ///
    /// The default just loops over [`Embedder::embed`]; HTTP-backed
    /// implementations override this with a single batched request.
    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let mut out = Vec::with_capacity(texts.len());
        for text in texts {
            out.push(self.embed(text).await?);
        }
        Ok(out)
    }

    /// Dimensionality of the vectors this embedder produces.
    fn dimensions(&self) -> usize;

    /// Get the name of this embedder.
    fn name(&self) -> &str;
}

/// An embedder that can be shared across threads.
pub type SharedEmbedder = Arc<dyn Embedder>;

// ─────────────────────────────────────────────────────────────────────────────
// Mock Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// Deterministic embedder for tests.
///
/// Each text is expanded from its FNV-1a hash into a unit vector, so equal
/// texts always land on the same point and similarity search behaves
/// consistently without a model in the loop.
#[derive(Debug, Clone)]
pub struct MockEmbedder {
    dimensions: usize,
}

impl MockEmbedder {
    /// Create a mock embedder producing vectors of the given size.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    /// Create a mock embedder with 384 dimensions (same as all-MiniLM-L6-v2).
    pub fn default_dimensions() -> Self {
        Self::new(384)
    }
}

impl Default for MockEmbedder {
    fn default() -> Self {
        Self::default_dimensions()
    }
}

#[async_trait]
impl Embedder for MockEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut state = fnv1a(text);
        let mut vector: Vec<f32> = (0..self.dimensions)
            .map(|_| {
                state = splitmix(state);
                // Map the top bits onto [-1, 1)
                ((state >> 40) as f32 / 8_388_608.0) - 1.0
            })
            .collect();

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }

        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "mock"
    }
}

fn fnv1a(s: &str) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for byte in s.bytes() {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(0x0000_0100_0000_01b3);
    }
    hash
}

fn splitmix(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    state = (state ^ (state >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    state = (state ^ (state >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    state ^ (state >> 31)
}

// ─────────────────────────────────────────────────────────────────────────────
// HTTP Embedder
// ─────────────────────────────────────────────────────────────────────────────

/// Settings for an OpenAI-compatible `/embeddings` route.
#[derive(Debug, Clone)]
pub struct HttpEmbedderConfig {
    /// API key. Local servers accept unauthenticated requests.
    pub api_key: Option<String>,
    /// Base URL for the API.
    pub base_url: String,
    /// Embedding model identifier.
    pub model: String,
    /// Dimensionality the model produces. Must match the index.
    pub dimensions: usize,
    /// Request timeout.
    pub timeout: Duration,
}

impl HttpEmbedderConfig {
    /// Settings for a local LM Studio server.
    pub fn lmstudio() -> Self {
        Self {
            api_key: None,
            base_url: "http://127.0.0.1:1234/v1".to_string(),
            model: "text-embedding-nomic-embed-text-v1.5".to_string(),
            dimensions: 768,
            timeout: Duration::from_secs(60),
        }
    }

    /// Settings for the hosted OpenAI API.
    pub fn openai(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            base_url: "https://api.openai.com/v1".to_string(),
            model: "text-embedding-3-small".to_string(),
            dimensions: 1536,
            timeout: Duration::from_secs(60),
        }
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the model to use.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the embedding dimensionality.
    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions;
        self
    }
}

/// Client for an OpenAI-compatible embeddings endpoint.
pub struct HttpEmbedder {
    client: Client,
    config: HttpEmbedderConfig,
}

impl HttpEmbedder {
    /// Create an embedder from the given settings.
    pub fn new(config: HttpEmbedderConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| LlmError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }

    fn embeddings_url(&self) -> String {
        format!("{}/embeddings", self.config.base_url)
    }
}

#[async_trait]
impl Embedder for HttpEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut batch = self.embed_batch(&[text]).await?;
        if batch.is_empty() {
            return Err(LlmError::Internal("No embedding returned".to_string()));
        }
        Ok(batch.swap_remove(0))
    }

    async fn embed_batch(&self, texts: &[&str]) -> Result<Vec<Vec<f32>>> {
        let body = WireEmbeddingRequest {
            model: &self.config.model,
            input: texts,
        };

        let mut request = self.client.post(self.embeddings_url()).json(&body);
        if let Some(key) = &self.config.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(LlmError::Backend(format!(
                "Embedding request failed: HTTP {} - {}",
                status, detail
            )));
        }

        let mut parsed: WireEmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::Serialization(format!("Failed to parse response: {}", e)))?;

        // The API does not promise ordering; restore input order by index
        parsed.data.sort_by_key(|row| row.index);
        Ok(parsed.data.into_iter().map(|row| row.embedding).collect())
    }

    fn dimensions(&self) -> usize {
        self.config.dimensions
    }

    fn name(&self) -> &str {
        "http"
    }
}

#[derive(serde::Serialize)]
struct WireEmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [&'a str],
}

#[derive(serde::Deserialize)]
struct WireEmbeddingResponse {
    data: Vec<WireEmbeddingRow>,
}

#[derive(serde::Deserialize)]
struct WireEmbeddingRow {
    index: usize,
    embedding: Vec<f32>,
}

/// Cosine similarity of two vectors; 0.0 when lengths differ or either is
/// the zero vector.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a > 0.0 && norm_b > 0.0 {
        dot / (norm_a * norm_b)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_embedder_produces_unit_vectors() {
        let embedder = MockEmbedder::default();
        assert_eq!(embedder.dimensions(), 384);
        assert_eq!(embedder.name(), "mock");

        let vector = embedder.embed("aspirin dosage").await.unwrap();
        assert_eq!(vector.len(), 384);

        let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-3);
    }

    #[tokio::test]
    async fn test_mock_embedder_is_deterministic() {
        let embedder = MockEmbedder::new(16);
        let first = embedder.embed("ibuprofen interactions").await.unwrap();
        let second = embedder.embed("ibuprofen interactions").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_mock_embedder_separates_texts() {
        let embedder = MockEmbedder::new(16);
        let a = embedder.embed("aspirin").await.unwrap();
        let b = embedder.embed("paracetamol").await.unwrap();
        assert_ne!(a, b);
        assert!(cosine_similarity(&a, &b) < 0.999);
    }

    #[tokio::test]
    async fn test_default_batch_preserves_order() {
        let embedder = MockEmbedder::new(8);
        let batch = embedder
            .embed_batch(&["first", "second", "third"])
            .await
            .unwrap();

        assert_eq!(batch.len(), 3);
        assert_eq!(batch[0], embedder.embed("first").await.unwrap());
        assert_eq!(batch[2], embedder.embed("third").await.unwrap());
    }

    #[test]
    fn test_cosine_similarity_extremes() {
        let x = [1.0, 0.0];
        assert!((cosine_similarity(&x, &[1.0, 0.0]) - 1.0).abs() < 1e-6);
        assert!(cosine_similarity(&x, &[0.0, 1.0]).abs() < 1e-6);
        assert!((cosine_similarity(&x, &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        // Mismatched lengths and zero vectors are defined, not panics
        assert_eq!(cosine_similarity(&x, &[1.0]), 0.0);
        assert_eq!(cosine_similarity(&x, &[0.0, 0.0]), 0.0);
    }

    #[test]
    fn test_lmstudio_defaults() {
        let config = HttpEmbedderConfig::lmstudio();
        assert!(config.api_key.is_none());
        assert_eq!(config.model, "text-embedding-nomic-embed-text-v1.5");
        assert_eq!(config.dimensions, 768);
    }

    #[test]
    fn test_config_builders() {
        let config = HttpEmbedderConfig::openai("key")
            .with_base_url("http://custom.api/v1")
            .with_model("text-embedding-ada-002")
            .with_dimensions(1536);

        assert_eq!(config.base_url, "http://custom.api/v1");
        assert_eq!(config.model, "text-embedding-ada-002");
        assert_eq!(config.dimensions, 1536);
    }

    #[test]
    fn test_embeddings_url() {
        let embedder = HttpEmbedder::new(HttpEmbedderConfig::lmstudio()).unwrap();
        assert_eq!(
            embedder.embeddings_url(),
            "http://127.0.0.1:1234/v1/embeddings"
        );
    }
}
