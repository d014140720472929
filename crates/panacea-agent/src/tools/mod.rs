//! The four tool adapters behind the router.

mod qa;
mod recommender;
mod summarizer;
mod web_search;

pub use qa::QuestionAnsweringTool;
pub use recommender::RecommenderTool;
pub use summarizer::SummarizerTool;
pub use web_search::{SearchResult, WebSearchConfig, WebSearchTool};
