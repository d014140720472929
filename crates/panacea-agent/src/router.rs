//! Query dispatch and fallback control.

use crate::classifier::QueryClassifier;
use crate::history::Conversation;
use crate::tool::{ToolName, ToolResult, ToolSet};

/// Executes the full query-to-answer pipeline with one layer of
/// automatic recovery.
///
/// Exactly one tool is selected per query. Question answering is the
/// only tool whose miss or failure re-routes to web search; failures
/// from any other tool, web search included, surface as-is so a bad
/// query cannot loop.
pub struct Router {
    classifier: QueryClassifier,
    tools: ToolSet,
}

impl Router {
    /// Create a router over a classifier and tool set.
    pub fn new(classifier: QueryClassifier, tools: ToolSet) -> Self {
        Self { classifier, tools }
    }

    /// Handle one query end to end.
    ///
    /// Blank input returns `None` and leaves the conversation untouched.
    /// Otherwise the conversation gains exactly two turns, the raw query
    /// under the user role and the rendered result under the assistant
    /// role, and the returned result is always a defined value.
    pub async fn handle_query(
        &self,
        query: &str,
        conversation: &mut Conversation,
    ) -> Option<ToolResult> {
        if query.trim().is_empty() {
            return None;
        }

        conversation.push_user(query);

        let result = self.dispatch(query).await;
        conversation.push_assistant(result.render());

        Some(result)
    }

    /// Classify, invoke, and apply the question-answering fallback.
    async fn dispatch(&self, query: &str) -> ToolResult {
        let tool = match self.classifier.classify(query).await {
            Ok(tool) => tool,
            Err(e) => {
                tracing::warn!(error = %e, "Classification failed, falling back to web search");
                return self.tools.invoke(ToolName::WebSearch, query).await;
            }
        };

        tracing::info!(tool = %tool, "Routing query");
        let result = self.tools.invoke(tool, query).await;

        if tool == ToolName::QuestionAnswering && (result.is_no_answer() || result.is_failure()) {
            tracing::info!("No answer from question answering, falling back to web search");
            return self.tools.invoke(ToolName::WebSearch, query).await;
        }

        result
    }
}

impl std::fmt::Debug for Router {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Router")
            .field("classifier", &self.classifier)
            .finish_non_exhaustive()
    }
}
