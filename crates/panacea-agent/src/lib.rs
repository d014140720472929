//! Routing core for Panacea.
//!
//! This crate classifies free-text queries, dispatches them to one of
//! four retrieval-augmented tools, and applies the fallback chain when
//! question answering comes up empty.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │  Router                                                     │
//! │  - Rejects blank input                                      │
//! │  - Classifies, dispatches, falls back                       │
//! │  - Records the transcript                                   │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!              ┌───────────────┼───────────────┐
//!              ▼               ▼               ▼
//!       ┌───────────┐   ┌───────────┐   ┌───────────┐
//!       │Classifier │   │ ToolSet   │   │Conversation│
//!       │(rules+LLM)│   │ (4 tools) │   │(transcript)│
//!       └───────────┘   └───────────┘   └───────────┘
//! ```
//!
//! # Core Components
//!
//! - [`Router`]: One query in, one defined result out
//! - [`QueryClassifier`]: Lexical rules with a model fallback
//! - [`ToolSet`]: The four adapters, dispatched exhaustively
//! - [`Conversation`]: Append-only transcript of turns

pub mod classifier;
pub mod error;
pub mod history;
pub mod prompt;
pub mod retriever;
pub mod router;
pub mod tool;
pub mod tools;

// Re-export core types
pub use error::{AgentError, Result};
pub use history::{ChatTurn, Conversation, Role};

// Re-export classification
pub use classifier::{INTERROGATIVES, QueryClassifier, lexical_route};

// Re-export routing
pub use router::Router;
pub use tool::{MockAdapter, SharedToolAdapter, ToolAdapter, ToolName, ToolResult, ToolSet};

// Re-export retrieval
pub use retriever::{MockRetriever, Retriever, SharedRetriever, VectorRetriever};

// Re-export the tool adapters
pub use tools::{
    QuestionAnsweringTool, RecommenderTool, SearchResult, SummarizerTool, WebSearchConfig,
    WebSearchTool,
};
