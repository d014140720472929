//! Document chunk storage for Panacea.
//!
//! This crate provides the pre-built vector index the retrieval-backed tools
//! query at runtime. It uses SQLite for durability with sqlite-vec for
//! similarity search.
//!
//! # Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────┐
//! │  ChunkIndex                                    │
//! │  - Single SQLite file with WAL mode            │
//! │  - chunks table: content + provenance          │
//! │  - chunk_embeddings: vec0 virtual table        │
//! └────────────────────────────────────────────────┘
//! ```
//!
//! Building the index (chunking documents, computing embeddings) happens
//! outside this crate; the index only stores and searches what it is given.

pub mod chunk;
pub mod error;
pub mod store;

// Re-export chunk types
pub use chunk::{ChunkMetadata, DocChunk, ScoredChunk};

// Re-export error types
pub use error::{IndexError, Result};

// Re-export the index
pub use store::{
    ChunkIndex, DEFAULT_EMBEDDING_DIMS, check_vector_extension, init_vector_extension,
};
