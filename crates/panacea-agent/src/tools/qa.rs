//! Factual question answering over retrieved context.

use async_trait::async_trait;

use panacea_index::DocChunk;
use panacea_llm::{CompletionRequest, SharedBackend};

use crate::prompt::question_prompt;
use crate::retriever::SharedRetriever;
use crate::tool::{ToolAdapter, ToolName, ToolResult};

/// Chunks fetched per question.
const DEFAULT_RETRIEVE_K: usize = 5;
/// Token ceiling for an answer. Kept low; answers are expected to be
/// short and grounded, not essays.
const DEFAULT_MAX_TOKENS: u32 = 300;

/// Phrases in a model reply that signal it could not answer from the
/// provided context. Matched as case-sensitive substrings; the prompt
/// instructs the model to use the first phrase verbatim.
const REFUSAL_PHRASES: [&str; 2] = ["I don't know", "No relevant information found"];

/// Answers factual questions from indexed documents, citing sources.
///
/// This is the only tool with a no-answer outcome: an empty retrieval or
/// a refusing model reply produces [`ToolResult::NoAnswer`] so the
/// router can fall back to web search.
pub struct QuestionAnsweringTool {
    retriever: SharedRetriever,
    backend: SharedBackend,
    model: String,
    retrieve_k: usize,
    max_tokens: u32,
}

impl QuestionAnsweringTool {
    /// Create a question-answering tool over a retriever and backend.
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

    /// Set how many chunks are retrieved per question.
    pub fn with_retrieve_k(mut self, k: usize) -> Self {
        self.retrieve_k = k;
        self
    }

    /// Set the token ceiling for answers.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Append source citations to an answer, one line per chunk.
fn format_answer(answer: &str, chunks: &[DocChunk]) -> String {
    let mut out = String::from(answer);
    out.push_str("\n\nSources:");
    for chunk in chunks {
        out.push_str(&format!(
            "\n  - Section: {}, File: {}",
            chunk.metadata.section, chunk.metadata.file
        ));
    }
    out
}

#[async_trait]
impl ToolAdapter for QuestionAnsweringTool {
    fn tool_name(&self) -> ToolName {
        ToolName::QuestionAnswering
    }

    async fn invoke(&self, query: &str) -> ToolResult {
        let chunks = match self.retriever.retrieve(query, self.retrieve_k).await {
            Ok(chunks) => chunks,
            Err(e) => return ToolResult::failure(ToolName::QuestionAnswering, e.to_string()),
        };

        // Nothing to ground an answer in
        if chunks.is_empty() {
            return ToolResult::no_answer(ToolName::QuestionAnswering);
        }

        let request = CompletionRequest::prompt(
            &self.model,
            question_prompt(query, &chunks),
            self.max_tokens,
        );
        let answer = match self.backend.complete(request).await {
            Ok(response) => response.text().trim().to_string(),
            Err(e) => return ToolResult::failure(ToolName::QuestionAnswering, e.to_string()),
        };

        if REFUSAL_PHRASES.iter().any(|p| answer.contains(p)) {
            tracing::debug!("Model declined to answer from context");
            return ToolResult::no_answer(ToolName::QuestionAnswering);
        }

        ToolResult::answer(
            ToolName::QuestionAnswering,
            format_answer(&answer, &chunks),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use panacea_llm::MockBackend;

    use crate::retriever::MockRetriever;

    fn chunks() -> Vec<DocChunk> {
        vec![
            DocChunk::new("Ibuprofen is an NSAID.", "Overview", "ibuprofen.pdf"),
            DocChunk::new("May cause nausea.", "Side Effects", "ibuprofen.pdf"),
        ]
    }

    #[tokio::test]
    async fn test_answer_cites_sources() {
        let tool = QuestionAnsweringTool::new(
            Arc::new(MockRetriever::new(chunks())),
            Arc::new(MockBackend::with_text("It is an NSAID.")),
            "test-model",
        );

        let result = tool.invoke("What is ibuprofen?").await;

        match result {
            ToolResult::Answer { tool, content } => {
                assert_eq!(tool, ToolName::QuestionAnswering);
                assert!(content.starts_with("It is an NSAID."));
                assert!(content.contains("\n\nSources:"));
                assert!(content.contains("  - Section: Overview, File: ibuprofen.pdf"));
                assert!(content.contains("  - Section: Side Effects, File: ibuprofen.pdf"));
            }
            other => panic!("expected answer, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_retrieval_is_no_answer() {
        let tool = QuestionAnsweringTool::new(
            Arc::new(MockRetriever::empty()),
            Arc::new(MockBackend::with_text("unused")),
            "test-model",
        );

        let result = tool.invoke("What is ibuprofen?").await;
        assert_eq!(result, ToolResult::no_answer(ToolName::QuestionAnswering));
    }

    #[tokio::test]
    async fn test_refusal_phrase_is_no_answer() {
        for reply in [
            "I don't know the answer to that.",
            "No relevant information found in the context.",
        ] {
            let tool = QuestionAnsweringTool::new(
                Arc::new(MockRetriever::new(chunks())),
                Arc::new(MockBackend::with_text(reply)),
                "test-model",
            );

            let result = tool.invoke("What is the melting point?").await;
            assert_eq!(result, ToolResult::no_answer(ToolName::QuestionAnswering));
        }
    }

    #[tokio::test]
    async fn test_uses_qa_retrieval_depth_and_token_ceiling() {
        let retriever = Arc::new(MockRetriever::new(chunks()));
        let backend = Arc::new(MockBackend::with_text("An answer."));
        let tool = QuestionAnsweringTool::new(retriever.clone(), backend.clone(), "test-model");

        tool.invoke("What is ibuprofen?").await;

        assert_eq!(retriever.queries()[0].1, 5);
        assert_eq!(backend.requests()[0].max_tokens, 300);
    }

    #[tokio::test]
    async fn test_backend_failure_becomes_failure_result() {
        let tool = QuestionAnsweringTool::new(
            Arc::new(MockRetriever::new(chunks())),
            Arc::new(MockBackend::new(vec![])),
            "test-model",
        );

        let result = tool.invoke("What is ibuprofen?").await;
        assert!(result.is_failure());
        assert_eq!(result.tool(), ToolName::QuestionAnswering);
    }
}
