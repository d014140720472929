//! CLI command handlers.

pub mod ask;
pub mod chat;
pub mod config;
pub mod status;

use std::path::PathBuf;

/// Shared context for all commands.
#[derive(Debug, Clone)]
pub struct Context {
    /// Explicit config file, if given.
    pub config_path: Option<PathBuf>,
    /// Output as JSON for scripting.
    pub json_output: bool,
    /// Verbose output enabled.
    pub verbose: bool,
}
