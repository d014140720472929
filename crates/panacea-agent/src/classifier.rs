//! Query classification: lexical rules first, model fallback second.

use panacea_llm::{CompletionRequest, SharedBackend};

use crate::error::Result;
use crate::prompt::classification_prompt;
use crate::tool::ToolName;

/// Maximum tokens requested from the classification model.
const DEFAULT_MAX_TOKENS: u32 = 1000;

/// Words that mark a query as a factual question when it starts with one.
pub const INTERROGATIVES: [&str; 16] = [
    "what", "how", "when", "where", "why", "who", "can", "is", "are", "do", "does", "did", "list",
    "which", "whom", "whose",
];

/// Apply the lexical routing rules. Pure; never touches a backend.
///
/// Rule 1: a query mentioning recommendations goes to the recommender.
/// Rule 2: a query starting with an interrogative word goes to question
/// answering. Both rules match on the lowercased query; rule 1 wins.
pub fn lexical_route(query: &str) -> Option<ToolName> {
    let lower = query.to_lowercase();

    // "recommendation" contains "recommend", one check covers both
    if lower.contains("recommend") {
        return Some(ToolName::Recommender);
    }

    if INTERROGATIVES.iter().any(|word| lower.starts_with(word)) {
        return Some(ToolName::QuestionAnswering);
    }

    None
}

/// Classifies queries into the tool that should handle them.
pub struct QueryClassifier {
    backend: SharedBackend,
    model: String,
    max_tokens: u32,
}

impl QueryClassifier {
    /// Create a classifier over a backend and model.
    pub fn new(backend: SharedBackend, model: impl Into<String>) -> Self {
        Self {
            backend,
            model: model.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Set the maximum tokens for classification replies.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Decide which tool should handle the query.
    ///
    /// The lexical rules are consulted first and short-circuit the model
    /// entirely. Otherwise the model's reply is trimmed and must match a
    /// tool label exactly; anything else falls back to question
    /// answering, the most conservative tool. A backend failure is
    /// returned as an error so the caller can decide the recovery.
    pub async fn classify(&self, query: &str) -> Result<ToolName> {
        if let Some(tool) = lexical_route(query) {
            tracing::debug!(tool = %tool, "Lexical rule matched");
            return Ok(tool);
        }

        let request =
            CompletionRequest::prompt(&self.model, classification_prompt(query), self.max_tokens);
        let response = self.backend.complete(request).await?;
        let label = response.text().trim().to_string();

        let tool = ToolName::from_label(&label).unwrap_or(ToolName::QuestionAnswering);
        tracing::debug!(label = %label, tool = %tool, "Model classification");
        Ok(tool)
    }
}

impl std::fmt::Debug for QueryClassifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryClassifier")
            .field("model", &self.model)
            .field("max_tokens", &self.max_tokens)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use panacea_llm::MockBackend;

    #[test]
    fn test_rule_one_matches_anywhere() {
        assert_eq!(
            lexical_route("Please recommend a painkiller"),
            Some(ToolName::Recommender)
        );
        assert_eq!(
            lexical_route("Any RECOMMENDATION for headaches?"),
            Some(ToolName::Recommender)
        );
        assert_eq!(
            lexical_route("I want a recommendation"),
            Some(ToolName::Recommender)
        );
    }

    #[test]
    fn test_rule_one_beats_rule_two() {
        // Starts with "can" but mentions recommendations
        assert_eq!(
            lexical_route("Can you recommend something for my headache?"),
            Some(ToolName::Recommender)
        );
    }

    #[test]
    fn test_rule_two_matches_prefix() {
        assert_eq!(
            lexical_route("What is Ibuprofen used for?"),
            Some(ToolName::QuestionAnswering)
        );
        assert_eq!(
            lexical_route("DOES aspirin thin blood"),
            Some(ToolName::QuestionAnswering)
        );
        assert_eq!(
            lexical_route("list the side effects"),
            Some(ToolName::QuestionAnswering)
        );
    }

    #[test]
    fn test_no_rule_matches() {
        assert_eq!(lexical_route("Tell me about Aspirin market trends"), None);
        assert_eq!(lexical_route("Summarize the trial results"), None);
    }

    #[tokio::test]
    async fn test_lexical_match_skips_backend() {
        let backend = Arc::new(MockBackend::with_text("Summarizer"));
        let classifier = QueryClassifier::new(backend.clone(), "test-model");

        let tool = classifier
            .classify("What is the recommended dose?")
            .await
            .unwrap();

        assert_eq!(tool, ToolName::Recommender);
        assert_eq!(backend.request_count(), 0);
    }

    #[tokio::test]
    async fn test_model_label_is_trimmed_and_mapped() {
        let backend = Arc::new(MockBackend::with_text("  Alternative Search\n"));
        let classifier = QueryClassifier::new(backend.clone(), "test-model");

        let tool = classifier
            .classify("Tell me about Aspirin market trends")
            .await
            .unwrap();

        assert_eq!(tool, ToolName::WebSearch);
        assert_eq!(backend.request_count(), 1);
    }

    #[tokio::test]
    async fn test_invalid_label_defaults_to_question_answering() {
        let backend = Arc::new(MockBackend::with_text("I think the Summarizer fits best"));
        let classifier = QueryClassifier::new(backend, "test-model");

        let tool = classifier
            .classify("Tell me about Aspirin market trends")
            .await
            .unwrap();

        assert_eq!(tool, ToolName::QuestionAnswering);
    }

    #[tokio::test]
    async fn test_classification_is_deterministic() {
        let backend = Arc::new(MockBackend::with_texts(["Summarizer", "Summarizer"]));
        let classifier = QueryClassifier::new(backend, "test-model");

        let first = classifier.classify("Aspirin overview please").await.unwrap();
        let second = classifier.classify("Aspirin overview please").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        // No queued responses, so the backend errors
        let backend = Arc::new(MockBackend::new(vec![]));
        let classifier = QueryClassifier::new(backend, "test-model");

        let err = classifier
            .classify("Tell me about Aspirin market trends")
            .await
            .unwrap_err();

        assert!(err.to_string().contains("LLM error"));
    }

    #[tokio::test]
    async fn test_prompt_contains_query_verbatim() {
        let backend = Arc::new(MockBackend::with_text("QA"));
        let classifier = QueryClassifier::new(backend.clone(), "test-model");

        classifier
            .classify("Tell me about Aspirin market trends")
            .await
            .unwrap();

        let requests = backend.requests();
        assert_eq!(requests.len(), 1);
        let prompt = &requests[0].messages[0].content;
        assert!(prompt.contains("Query: \"Tell me about Aspirin market trends\""));
    }
}
