//! Recommendations grounded in retrieved documents.

use async_trait::async_trait;

use panacea_llm::{CompletionRequest, SharedBackend};

use crate::prompt::recommender_prompt;
use crate::retriever::SharedRetriever;
use crate::tool::{ToolAdapter, ToolName, ToolResult};

/// Chunks fetched per recommendation.
const DEFAULT_RETRIEVE_K: usize = 5;
/// Token ceiling for a generated recommendation.
const DEFAULT_MAX_TOKENS: u32 = 1000;

const EMPTY_RETRIEVAL_MESSAGE: &str = "No relevant documents found to provide a recommendation.";

/// Recommends alternatives based on indexed documents.
pub struct RecommenderTool {
    retriever: SharedRetriever,
    backend: SharedBackend,
    model: String,
    retrieve_k: usize,
    max_tokens: u32,
}

impl RecommenderTool {
    /// Create a recommender over a retriever and backend.
    pub fn new(
        retriever: SharedRetriever,
        backend: SharedBackend,
        model: impl Into<String>,
    ) -> Self {
        Self {
            retriever,
            backend,
            model: model.into(),
            retrieve_k: DEFAULT_RETRIEVE_K,
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set how many chunks are retrieved per recommendation.
    pub fn with_retrieve_k(mut self, k: usize) -> Self {
        self.retrieve_k = k;
        self
    }

    /// Set the token ceiling for recommendations.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

#[async_trait]
impl ToolAdapter for RecommenderTool {
    fn tool_name(&self) -> ToolName {
        ToolName::Recommender
    }

    async fn invoke(&self, query: &str) -> ToolResult {
        let chunks = match self.retriever.retrieve(query, self.retrieve_k).await {
            Ok(chunks) => chunks,
            Err(e) => return ToolResult::failure(ToolName::Recommender, e.to_string()),
        };

        if chunks.is_empty() {
            return ToolResult::answer(ToolName::Recommender, EMPTY_RETRIEVAL_MESSAGE);
        }

        tracing::debug!(chunks = chunks.len(), "Building recommendation");

        let request = CompletionRequest::prompt(
            &self.model,
            recommender_prompt(query, &chunks),
            self.max_tokens,
        );
        match self.backend.complete(request).await {
            Ok(response) => ToolResult::answer(ToolName::Recommender, response.text().trim()),
            Err(e) => ToolResult::failure(ToolName::Recommender, e.to_string()),
        }
    }
}
