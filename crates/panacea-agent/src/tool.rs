//! Tool identities, invocation outcomes, and the adapter seam.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Tool Names
// ─────────────────────────────────────────────────────────────────────────────

/// The closed set of tools a query can be routed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolName {
    Summarizer,
    Recommender,
    QuestionAnswering,
    WebSearch,
}

impl ToolName {
    /// All tools, in the order they are described to the classifier.
    pub const ALL: [ToolName; 4] = [
        ToolName::Summarizer,
        ToolName::Recommender,
        ToolName::QuestionAnswering,
        ToolName::WebSearch,
    ];

    /// The label used in classification prompts and transcript tags.
    pub fn label(&self) -> &'static str {
        match self {
            ToolName::Summarizer => "Summarizer",
            ToolName::Recommender => "Recommender",
            ToolName::QuestionAnswering => "QA",
            ToolName::WebSearch => "Alternative Search",
        }
    }

    /// One-line description shown to the classifier model.
    pub fn description(&self) -> &'static str {
        match self {
            ToolName::Summarizer => {
                "For queries seeking a concise summary of information, even indirectly."
            }
            ToolName::Recommender => "For queries requesting recommendations or alternatives.",
            ToolName::QuestionAnswering => "For factual questions requiring precise answers.",
            ToolName::WebSearch => "For all other types of queries.",
        }
    }

    /// Parse a classifier label back into a tool name.
    ///
    /// Only exact labels count. Anything else returns `None` and the
    /// caller decides the default.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            "Summarizer" => Some(ToolName::Summarizer),
            "Recommender" => Some(ToolName::Recommender),
            "QA" => Some(ToolName::QuestionAnswering),
            "Alternative Search" => Some(ToolName::WebSearch),
            _ => None,
        }
    }
}

impl std::fmt::Display for ToolName {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Results
// ─────────────────────────────────────────────────────────────────────────────

/// Outcome of a tool invocation.
///
/// Adapters never return a raw error: failures are carried here so the
/// router can always inspect the outcome and decide on a fallback.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ToolResult {
    /// The tool produced an answer.
    Answer { tool: ToolName, content: String },
    /// The tool ran but found nothing it could answer from.
    NoAnswer { tool: ToolName },
    /// The tool failed.
    Failure { tool: ToolName, message: String },
}

impl ToolResult {
    /// Create an answer result.
    pub fn answer(tool: ToolName, content: impl Into<String>) -> Self {
        Self::Answer {
            tool,
            content: content.into(),
        }
    }

    /// Create a no-answer result.
    pub fn no_answer(tool: ToolName) -> Self {
        Self::NoAnswer { tool }
    }

    /// Create a failure result.
    pub fn failure(tool: ToolName, message: impl Into<String>) -> Self {
        Self::Failure {
            tool,
            message: message.into(),
        }
    }

    /// The tool that produced this result.
    pub fn tool(&self) -> ToolName {
        match self {
            Self::Answer { tool, .. } | Self::NoAnswer { tool } | Self::Failure { tool, .. } => {
                *tool
            }
        }
    }

    /// Check if this is an answer.
    pub fn is_answer(&self) -> bool {
        matches!(self, Self::Answer { .. })
    }

    /// Check if this is a no-answer outcome.
    pub fn is_no_answer(&self) -> bool {
        matches!(self, Self::NoAnswer { .. })
    }

    /// Check if this is a failure.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Failure { .. })
    }

    /// Transcript form, tagged with the originating tool.
    pub fn render(&self) -> String {
        match self {
            Self::Answer { tool, content } => format!("[Tool: {}] {}", tool.label(), content),
            Self::NoAnswer { tool } => {
                format!("[Tool: {}] No relevant information found.", tool.label())
            }
            Self::Failure { tool, message } => {
                format!("[Tool: {}] An error occurred: {}", tool.label(), message)
            }
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tool Adapter Trait
// ─────────────────────────────────────────────────────────────────────────────

/// A single query-answering operation behind one routing intent.
#[async_trait]
pub trait ToolAdapter: Send + Sync {
    /// Which tool this adapter implements.
    fn tool_name(&self) -> ToolName;

    /// Answer the query.
    async fn invoke(&self, query: &str) -> ToolResult;
}

/// A tool adapter that can be shared across threads.
pub type SharedToolAdapter = Arc<dyn ToolAdapter>;

// ─────────────────────────────────────────────────────────────────────────────
// Tool Set
// ─────────────────────────────────────────────────────────────────────────────

/// The four adapters the router dispatches to.
///
/// One field per tool keeps dispatch exhaustive; there is no string
/// lookup that can miss at runtime.
pub struct ToolSet {
    summarizer: SharedToolAdapter,
    recommender: SharedToolAdapter,
    question_answering: SharedToolAdapter,
    web_search: SharedToolAdapter,
}

impl ToolSet {
    /// Create a tool set from one adapter per tool.
    pub fn new(
        summarizer: SharedToolAdapter,
        recommender: SharedToolAdapter,
        question_answering: SharedToolAdapter,
        web_search: SharedToolAdapter,
    ) -> Self {
        Self {
            summarizer,
            recommender,
            question_answering,
            web_search,
        }
    }

    /// The adapter registered for a tool.
    pub fn adapter(&self, name: ToolName) -> &SharedToolAdapter {
        match name {
            ToolName::Summarizer => &self.summarizer,
            ToolName::Recommender => &self.recommender,
            ToolName::QuestionAnswering => &self.question_answering,
            ToolName::WebSearch => &self.web_search,
        }
    }

    /// Invoke a tool by name.
    pub async fn invoke(&self, name: ToolName, query: &str) -> ToolResult {
        self.adapter(name).invoke(query).await
    }
}

impl std::fmt::Debug for ToolSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ToolSet")
            .field("tools", &ToolName::ALL)
            .finish()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mock Adapter (for testing)
// ─────────────────────────────────────────────────────────────────────────────

/// A mock tool adapter that returns a fixed result and records queries.
#[derive(Debug)]
pub struct MockAdapter {
    name: ToolName,
    response: ToolResult,
    queries: std::sync::Mutex<Vec<String>>,
}

impl MockAdapter {
    /// Create a mock adapter that answers with a placeholder.
    pub fn new(name: ToolName) -> Self {
        Self {
            name,
            response: ToolResult::answer(name, "mock response"),
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Set the result returned on every invocation.
    pub fn with_response(mut self, response: ToolResult) -> Self {
        self.response = response;
        self
    }

    /// Queries received so far.
    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }

    /// Number of invocations so far.
    pub fn invocation_count(&self) -> usize {
        self.queries.lock().unwrap().len()
    }
}

#[async_trait]
impl ToolAdapter for MockAdapter {
    fn tool_name(&self) -> ToolName {
        self.name
    }

    async fn invoke(&self, query: &str) -> ToolResult {
        self.queries.lock().unwrap().push(query.to_string());
        self.response.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels_round_trip() {
        for tool in ToolName::ALL {
            assert_eq!(ToolName::from_label(tool.label()), Some(tool));
        }
    }

    #[test]
    fn test_from_label_rejects_loose_matches() {
        assert_eq!(ToolName::from_label("qa"), None);
        assert_eq!(ToolName::from_label("QA."), None);
        assert_eq!(ToolName::from_label("summarizer"), None);
        assert_eq!(ToolName::from_label(""), None);
    }

    #[test]
    fn test_render_answer() {
        let result = ToolResult::answer(ToolName::Summarizer, "short version");
        assert_eq!(result.render(), "[Tool: Summarizer] short version");
    }

    #[test]
    fn test_render_failure() {
        let result = ToolResult::failure(ToolName::WebSearch, "connection refused");
        assert_eq!(
            result.render(),
            "[Tool: Alternative Search] An error occurred: connection refused"
        );
    }

    #[test]
    fn test_result_predicates() {
        assert!(ToolResult::answer(ToolName::QuestionAnswering, "x").is_answer());
        assert!(ToolResult::no_answer(ToolName::QuestionAnswering).is_no_answer());
        assert!(ToolResult::failure(ToolName::QuestionAnswering, "x").is_failure());
        assert_eq!(
            ToolResult::no_answer(ToolName::QuestionAnswering).tool(),
            ToolName::QuestionAnswering
        );
    }

    #[tokio::test]
    async fn test_mock_adapter_records_queries() {
        let adapter = MockAdapter::new(ToolName::Recommender);
        let result = adapter.invoke("suggest something").await;
        assert!(result.is_answer());
        assert_eq!(adapter.queries(), vec!["suggest something"]);
        assert_eq!(adapter.invocation_count(), 1);
    }

    #[tokio::test]
    async fn test_tool_set_dispatch() {
        let set = ToolSet::new(
            Arc::new(MockAdapter::new(ToolName::Summarizer)),
            Arc::new(MockAdapter::new(ToolName::Recommender)),
            Arc::new(MockAdapter::new(ToolName::QuestionAnswering)),
            Arc::new(MockAdapter::new(ToolName::WebSearch)),
        );
        for tool in ToolName::ALL {
            let result = set.invoke(tool, "q").await;
            assert_eq!(result.tool(), tool);
        }
    }
}
