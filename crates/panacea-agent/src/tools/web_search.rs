//! Web search fallback over the DuckDuckGo instant answer API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{AgentError, Result};
use crate::tool::{ToolAdapter, ToolName, ToolResult};

const NO_RESULTS_MESSAGE: &str = "No results found.";

/// Configuration for web search.
#[derive(Debug, Clone)]
pub struct WebSearchConfig {
    /// Maximum number of results to keep.
    pub max_results: usize,
    /// Request timeout.
    pub timeout: Duration,
}

impl Default for WebSearchConfig {
    fn default() -> Self {
        Self {
            max_results: 5,
            timeout: Duration::from_secs(30),
        }
    }
}

/// A single search result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Catch-all tool for queries no other tool can handle.
///
/// The instant answer API is limited but free: a query yields at most
/// one abstract plus related topics, not full web results.
pub struct WebSearchTool {
    client: Client,
    config: WebSearchConfig,
}

impl WebSearchTool {
    /// Create a web search tool with default configuration.
    pub fn new() -> Self {
        Self::with_config(WebSearchConfig::default())
    }

    /// Create a web search tool with custom configuration.
    pub fn with_config(config: WebSearchConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("Failed to build HTTP client");

        Self { client, config }
    }

    async fn search_duckduckgo(&self, query: &str) -> Result<Vec<SearchResult>> {
        let url = format!(
            "https://api.duckduckgo.com/?q={}&format=json&no_html=1&skip_disambig=1",
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| AgentError::search(format!("DuckDuckGo search failed: {}", e)))?;

        if !response.status().is_success() {
            return Err(AgentError::search(format!(
                "DuckDuckGo search error: {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .await
            .map_err(|e| AgentError::search(format!("Failed to parse response: {}", e)))?;

        Ok(parse_instant_answer(&data, self.config.max_results))
    }
}

impl Default for WebSearchTool {
    fn default() -> Self {
        Self::new()
    }
}

/// Extract results from an instant answer payload: the abstract first,
/// then related topics up to `max_results` total.
fn parse_instant_answer(data: &Value, max_results: usize) -> Vec<SearchResult> {
    let mut results = Vec::new();

    if let Some(abstract_text) = data["AbstractText"].as_str() {
        if !abstract_text.is_empty() {
            results.push(SearchResult {
                title: data["Heading"].as_str().unwrap_or("Result").to_string(),
                url: data["AbstractURL"].as_str().unwrap_or("").to_string(),
                snippet: abstract_text.to_string(),
            });
        }
    }

    if let Some(topics) = data["RelatedTopics"].as_array() {
        // Grouped topics lack Text/FirstURL and are skipped
        for topic in topics.iter().take(max_results.saturating_sub(results.len())) {
            if let (Some(text), Some(url)) = (topic["Text"].as_str(), topic["FirstURL"].as_str()) {
                results.push(SearchResult {
                    title: text.chars().take(50).collect::<String>() + "...",
                    url: url.to_string(),
                    snippet: text.to_string(),
                });
            }
        }
    }

    results
}

/// Render results as a numbered list for the transcript.
fn format_results(results: &[SearchResult]) -> String {
    results
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let mut line = format!("{}. {}\n   {}", i + 1, r.title, r.snippet);
            if !r.url.is_empty() {
                line.push_str(&format!("\n   {}", r.url));
            }
            line
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl ToolAdapter for WebSearchTool {
    fn tool_name(&self) -> ToolName {
        ToolName::WebSearch
    }

    async fn invoke(&self, query: &str) -> ToolResult {
        match self.search_duckduckgo(query).await {
            Ok(results) if results.is_empty() => {
                ToolResult::answer(ToolName::WebSearch, NO_RESULTS_MESSAGE)
            }
            Ok(results) => {
                tracing::debug!(count = results.len(), "Web search returned results");
                ToolResult::answer(ToolName::WebSearch, format_results(&results))
            }
            Err(e) => ToolResult::failure(ToolName::WebSearch, e.to_string()),
        }
    }
}
