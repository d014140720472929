//! Retrieval seam between the chunk index and the tools.

use std::sync::Arc;

use async_trait::async_trait;

use panacea_index::{ChunkIndex, DocChunk};
use panacea_llm::SharedEmbedder;

use crate::error::{AgentError, Result};

/// Trait for fetching document chunks relevant to a query.
#[async_trait]
pub trait Retriever: Send + Sync {
    /// Return up to `k` chunks relevant to the query, most relevant first.
    ///
    /// An empty result is not an error; it means nothing relevant is
    /// indexed. Errors are reserved for embedding or index failures.
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<DocChunk>>;

    /// Get the name of this retriever.
    fn name(&self) -> &str;
}

/// A retriever that can be shared across threads.
pub type SharedRetriever = Arc<dyn Retriever>;

/// Retriever backed by the vector index: embed the query, then search
/// by similarity.
pub struct VectorRetriever {
    index: Arc<ChunkIndex>,
    embedder: SharedEmbedder,
}

impl VectorRetriever {
    /// Create a retriever over an index and an embedder.
    pub fn new(index: Arc<ChunkIndex>, embedder: SharedEmbedder) -> Self {
        Self { index, embedder }
    }
}

#[async_trait]
impl Retriever for VectorRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<DocChunk>> {
        let embedding = self.embedder.embed(query).await?;
        let scored = self.index.search(&embedding, k)?;

        tracing::debug!(
            retriever = self.name(),
            requested = k,
            returned = scored.len(),
            "Retrieved chunks"
        );

        Ok(scored.into_iter().map(|s| s.chunk).collect())
    }

    fn name(&self) -> &str {
        "vector"
    }
}

/// A mock retriever that serves fixed chunks and records queries.
#[derive(Debug)]
pub struct MockRetriever {
    chunks: Vec<DocChunk>,
    fail_with: Option<String>,
    queries: std::sync::Mutex<Vec<(String, usize)>>,
}

impl MockRetriever {
    /// Create a mock retriever that serves the given chunks.
    pub fn new(chunks: Vec<DocChunk>) -> Self {
        Self {
            chunks,
            fail_with: None,
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Create a mock retriever with no chunks.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Create a mock retriever that fails every call.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            chunks: Vec::new(),
            fail_with: Some(message.into()),
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Queries received so far, with their `k`.
    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl Retriever for MockRetriever {
    async fn retrieve(&self, query: &str, k: usize) -> Result<Vec<DocChunk>> {
        self.queries
            .lock()
            .unwrap()
            .push((query.to_string(), k));

        if let Some(message) = &self.fail_with {
            return Err(AgentError::internal(message.clone()));
        }

        Ok(self.chunks.iter().take(k).cloned().collect())
    }

    fn name(&self) -> &str {
        "mock"
    }
}
