//! The TOML schema as Rust types.
//!
//! Four sections: `[llm]` for the chat endpoint, `[embedding]` for the
//! embedder, `[index]` for the chunk store and retrieval depths, and
//! `[search]` for the web fallback.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────────────────────────────────────
// Top-level Config
// ─────────────────────────────────────────────────────────────────────────────

/// The whole config file.
///
/// Every section is optional; a layer that only sets `[llm]` merges
/// cleanly over one that sets everything.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PanaceaConfig {
    /// Chat completion settings (the `[llm]` section).
    pub llm: Option<LlmSection>,

    /// Embedding settings.
    pub embedding: Option<EmbeddingSection>,

    /// Chunk index settings.
    pub index: Option<IndexSection>,

    /// Web search settings.
    pub search: Option<SearchSection>,
}

impl PanaceaConfig {
    /// A config with no sections set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML document.
    pub fn from_toml(toml_str: &str) -> crate::Result<Self> {
        Ok(toml::from_str(toml_str)?)
    }

    /// Render back to TOML.
    pub fn to_toml(&self) -> crate::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Lay `other` over this config.
    ///
    /// Granularity is the section: if `other` carries a section at all,
    /// that section wins wholesale, fields and defaults included.
    pub fn merge(&mut self, other: PanaceaConfig) {
        fn overlay<T>(base: &mut Option<T>, layer: Option<T>) {
            if layer.is_some() {
                *base = layer;
            }
        }
        overlay(&mut self.llm, other.llm);
        overlay(&mut self.embedding, other.embedding);
        overlay(&mut self.index, other.index);
        overlay(&mut self.search, other.search);
    }

    /// The LLM section, or its defaults when absent.
    pub fn effective_llm(&self) -> LlmSection {
        self.llm.clone().unwrap_or_default()
    }

    /// The embedding section, or its defaults when absent.
    pub fn effective_embedding(&self) -> EmbeddingSection {
        self.embedding.clone().unwrap_or_default()
    }

    /// The index section, or its defaults when absent.
    pub fn effective_index(&self) -> IndexSection {
        self.index.clone().unwrap_or_default()
    }

    /// The search section, or its defaults when absent.
    pub fn effective_search(&self) -> SearchSection {
        self.search.clone().unwrap_or_default()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// LLM Section
// ─────────────────────────────────────────────────────────────────────────────

/// Chat completion endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSection {
    /// OpenAI-compatible base URL. Default is a local LM Studio server.
    pub base_url: String,
    /// Chat model identifier.
    pub model: String,
    /// Optional API key. Local servers don't need one.
    pub api_key: Option<String>,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
    /// Token ceiling for classification, summaries, and recommendations.
    pub max_tokens: u32,
    /// Token ceiling for factual answers.
    pub qa_max_tokens: u32,
    /// Retries for transient request failures.
    pub retry_max: u32,
    /// Initial retry backoff in milliseconds.
    pub retry_backoff_ms: u64,
}

impl Default for LlmSection {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:1234/v1".to_string(),
            model: "llama-3.2-3b-instruct".to_string(),
            api_key: None,
            timeout_secs: 100,
            max_tokens: 1000,
            qa_max_tokens: 300,
            retry_max: 3,
            retry_backoff_ms: 500,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Embedding Section
// ─────────────────────────────────────────────────────────────────────────────

/// Embedding endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSection {
    /// Provider: "http" (OpenAI-compatible endpoint) or "mock".
    pub provider: EmbeddingProvider,
    /// Base URL override. Defaults to the `[llm]` base URL.
    pub base_url: Option<String>,
    /// Embedding model identifier.
    pub model: String,
    /// Embedding dimensionality. Must match the index.
    pub dimensions: usize,
}

impl Default for EmbeddingSection {
    fn default() -> Self {
        Self {
            provider: EmbeddingProvider::Http,
            base_url: None,
            model: "text-embedding-nomic-embed-text-v1.5".to_string(),
            dimensions: 768,
        }
    }
}

/// Which embedder implementation to construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbeddingProvider {
    /// OpenAI-compatible embeddings endpoint.
    Http,
    /// Deterministic mock embedder, for tests and offline runs.
    Mock,
}

// ─────────────────────────────────────────────────────────────────────────────
// Index Section
// ─────────────────────────────────────────────────────────────────────────────

/// Chunk index location and retrieval depths.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSection {
    /// Path to the SQLite index file. Defaults to the platform data dir.
    pub path: Option<PathBuf>,
    /// Chunks retrieved per summary.
    pub summarizer_k: Option<usize>,
    /// Chunks retrieved per recommendation.
    pub recommender_k: Option<usize>,
    /// Chunks retrieved per factual question.
    pub qa_k: Option<usize>,
}

impl IndexSection {
    pub fn effective_summarizer_k(&self) -> usize {
        self.summarizer_k.unwrap_or(3)
    }

    pub fn effective_recommender_k(&self) -> usize {
        self.recommender_k.unwrap_or(5)
    }

    pub fn effective_qa_k(&self) -> usize {
        self.qa_k.unwrap_or(5)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Search Section
// ─────────────────────────────────────────────────────────────────────────────

/// Web search fallback settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSection {
    /// Maximum results kept per search.
    pub max_results: usize,
    /// Search request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for SearchSection {
    fn default() -> Self {
        Self {
            max_results: 5,
            timeout_secs: 30,
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_parses_to_empty_config() {
        let config = PanaceaConfig::from_toml("").unwrap();
        assert!(config.llm.is_none());
        assert!(config.embedding.is_none());
        assert!(config.index.is_none());
        assert!(config.search.is_none());
    }

    #[test]
    fn test_defaults_carry_local_endpoint() {
        let llm = LlmSection::default();
        assert_eq!(llm.base_url, "http://127.0.0.1:1234/v1");
        assert_eq!(llm.model, "llama-3.2-3b-instruct");
        assert_eq!(llm.timeout_secs, 100);
        assert_eq!(llm.max_tokens, 1000);
        assert_eq!(llm.qa_max_tokens, 300);
    }

    #[test]
    fn test_partial_section_fills_defaults() {
        let config = PanaceaConfig::from_toml(
            r#"
[llm]
model = "some-other-model"
"#,
        )
        .unwrap();

        let llm = config.effective_llm();
        assert_eq!(llm.model, "some-other-model");
        assert_eq!(llm.base_url, "http://127.0.0.1:1234/v1");
    }

    #[test]
    fn test_retrieval_depth_defaults() {
        let index = IndexSection::default();
        assert_eq!(index.effective_summarizer_k(), 3);
        assert_eq!(index.effective_recommender_k(), 5);
        assert_eq!(index.effective_qa_k(), 5);
    }

    #[test]
    fn test_merge_replaces_whole_sections() {
        let mut base = PanaceaConfig::from_toml(
            r#"
[llm]
model = "base-model"
timeout_secs = 10

[search]
max_results = 9
"#,
        )
        .unwrap();

        let overlay = PanaceaConfig::from_toml(
            r#"
[llm]
model = "overlay-model"
"#,
        )
        .unwrap();

        base.merge(overlay);

        let llm = base.effective_llm();
        assert_eq!(llm.model, "overlay-model");
        // Section replace, not field merge: timeout_secs resets to default
        assert_eq!(llm.timeout_secs, 100);
        // Untouched sections survive
        assert_eq!(base.effective_search().max_results, 9);
    }

    #[test]
    fn test_embedding_provider_parses_lowercase() {
        let config = PanaceaConfig::from_toml(
            r#"
[embedding]
provider = "mock"
dimensions = 8
"#,
        )
        .unwrap();

        let embedding = config.effective_embedding();
        assert_eq!(embedding.provider, EmbeddingProvider::Mock);
        assert_eq!(embedding.dimensions, 8);
    }

    #[test]
    fn test_round_trips_through_toml() {
        let mut config = PanaceaConfig::new();
        config.llm = Some(LlmSection {
            model: "custom".to_string(),
            ..Default::default()
        });

        let toml_str = config.to_toml().unwrap();
        let parsed = PanaceaConfig::from_toml(&toml_str).unwrap();
        assert_eq!(parsed.effective_llm().model, "custom");
    }
}
