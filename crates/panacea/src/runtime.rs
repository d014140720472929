//! Runtime assembly: configuration in, a wired router out.
//!
//! Every collaborator is constructed exactly once here and handed down
//! by shared handle; nothing below this layer reaches for global state.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context as _, Result};

use panacea_agent::{
    QueryClassifier, QuestionAnsweringTool, RecommenderTool, Router, SharedRetriever,
    SummarizerTool, ToolSet, VectorRetriever, WebSearchConfig, WebSearchTool,
};
use panacea_config::{ConfigSource, EmbeddingProvider, LoadedConfig, PanaceaConfig};
use panacea_index::ChunkIndex;
use panacea_llm::{
    HttpEmbedder, HttpEmbedderConfig, LmStudioConfig, MockEmbedder, SharedBackend, SharedEmbedder,
};

/// A fully wired routing pipeline plus the handles status reporting
/// needs.
pub struct Runtime {
    pub router: Router,
    pub backend: SharedBackend,
    pub index: Arc<ChunkIndex>,
    pub index_path: Option<PathBuf>,
    pub model: String,
}

/// Load config through discovery, or from an explicit file.
pub fn load(config_path: Option<&Path>) -> Result<LoadedConfig> {
    match config_path {
        Some(path) => {
            let config = panacea_config::load_config_file(path)
                .with_context(|| format!("loading config from {}", path.display()))?;
            Ok(LoadedConfig {
                config,
                sources: vec![ConfigSource {
                    path: path.to_path_buf(),
                    loaded: true,
                }],
                warnings: Vec::new(),
            })
        }
        None => Ok(panacea_config::load_config()?),
    }
}

/// Wire the full pipeline from configuration.
pub fn build(config: &PanaceaConfig) -> Result<Runtime> {
    let llm = config.effective_llm();
    let embedding = config.effective_embedding();
    let index_section = config.effective_index();
    let search = config.effective_search();

    // Chat backend
    let mut backend_config = LmStudioConfig::lmstudio()
        .with_base_url(&llm.base_url)
        .with_model(&llm.model)
        .with_timeout(Duration::from_secs(llm.timeout_secs))
        .with_max_retries(llm.retry_max)
        .with_retry_backoff(Duration::from_millis(llm.retry_backoff_ms));
    if let Some(key) = &llm.api_key {
        backend_config = backend_config.with_api_key(key);
    }
    let backend: SharedBackend = panacea_llm::create_shared_backend(backend_config)?;

    // Embedder
    let embedder: SharedEmbedder = match embedding.provider {
        EmbeddingProvider::Mock => Arc::new(MockEmbedder::new(embedding.dimensions)),
        EmbeddingProvider::Http => {
            let base_url = embedding
                .base_url
                .clone()
                .unwrap_or_else(|| llm.base_url.clone());
            let embedder_config = HttpEmbedderConfig::lmstudio()
                .with_base_url(base_url)
                .with_model(&embedding.model)
                .with_dimensions(embedding.dimensions);
            Arc::new(HttpEmbedder::new(embedder_config)?)
        }
    };

    // Chunk index. A missing file is not fatal; tools then see empty
    // retrievals.
    let index_path = index_section
        .path
        .clone()
        .or_else(panacea_config::default_index_path);
    let index = match &index_path {
        Some(path) if path.is_file() => Arc::new(ChunkIndex::open(path, embedding.dimensions)?),
        Some(path) => {
            tracing::warn!(
                path = %path.display(),
                "Chunk index not found, starting with an empty in-memory index"
            );
            Arc::new(ChunkIndex::open_in_memory(embedding.dimensions)?)
        }
        None => {
            tracing::warn!("No data directory available, starting with an empty in-memory index");
            Arc::new(ChunkIndex::open_in_memory(embedding.dimensions)?)
        }
    };

    let retriever: SharedRetriever = Arc::new(VectorRetriever::new(index.clone(), embedder));

    // The four tools
    let summarizer = SummarizerTool::new(retriever.clone(), backend.clone(), &llm.model)
        .with_retrieve_k(index_section.effective_summarizer_k())
        .with_max_tokens(llm.max_tokens);
    let recommender = RecommenderTool::new(retriever.clone(), backend.clone(), &llm.model)
        .with_retrieve_k(index_section.effective_recommender_k())
        .with_max_tokens(llm.max_tokens);
    let question_answering =
        QuestionAnsweringTool::new(retriever.clone(), backend.clone(), &llm.model)
            .with_retrieve_k(index_section.effective_qa_k())
            .with_max_tokens(llm.qa_max_tokens);
    let web_search = WebSearchTool::with_config(WebSearchConfig {
        max_results: search.max_results,
        timeout: Duration::from_secs(search.timeout_secs),
    });

    let tools = ToolSet::new(
        Arc::new(summarizer),
        Arc::new(recommender),
        Arc::new(question_answering),
        Arc::new(web_search),
    );

    let classifier =
        QueryClassifier::new(backend.clone(), &llm.model).with_max_tokens(llm.max_tokens);

    Ok(Runtime {
        router: Router::new(classifier, tools),
        backend,
        index,
        index_path,
        model: llm.model,
    })
}
