//! LLM client abstraction for Panacea.
//!
//! This crate provides a unified interface for chat completions and text
//! embeddings over OpenAI-compatible providers, with a local LM Studio server
//! as the default.
//!
//! # Architecture
//!
//! The core abstraction is the [`LlmBackend`] trait which all providers
//! implement. This allows the routing layer to use any provider
//! interchangeably, including a deterministic mock in tests.
//!
//! ```text
//! ┌──────────────────────────────┐
//! │  LlmBackend trait            │
//! │  - complete() -> Response    │
//! │  - health_check()            │
//! └──────────────────────────────┘
//!                │
//!        ┌───────┴───────┐
//!        ▼               ▼
//! ┌───────────┐    ┌──────────┐
//! │ LM Studio │    │   Mock   │
//! └───────────┘    └──────────┘
//! ```

pub mod backend;
pub mod embeddings;
pub mod error;

// Provider implementations
pub mod lmstudio;

pub use backend::{
    ChatMessage, CompletionRequest, CompletionResponse, LlmBackend, MockBackend, Role,
    SharedBackend, Usage, with_retry,
};
pub use error::{LlmError, Result};

// Re-export embeddings
pub use embeddings::{
    Embedder, HttpEmbedder, HttpEmbedderConfig, MockEmbedder, SharedEmbedder, cosine_similarity,
};

// Re-export provider configs
pub use lmstudio::{LmStudioBackend, LmStudioConfig, create_shared_backend};
