//! Configuration system for Panacea.
//!
//! Provides TOML-based configuration with:
//! - Endpoint and model settings for the local LLM server (`[llm]`)
//! - Embedding provider settings (`[embedding]`)
//! - Chunk index location and retrieval depths (`[index]`)
//! - Web search fallback settings (`[search]`)
//! - Config file layering (XDG user config + project-local overrides)
//!
//! Every setting has a default tuned for a local LM Studio setup, so an
//! empty config is a working config.

pub mod discovery;
pub mod error;
pub mod types;

pub use discovery::{
    ConfigSource, LoadedConfig, default_index_path, load_config, load_config_file,
    load_config_with_options, xdg_config_dir, xdg_config_path,
};
pub use error::{ConfigError, Result};
pub use types::{
    EmbeddingProvider, EmbeddingSection, IndexSection, LlmSection, PanaceaConfig, SearchSection,
};
