//! Panacea command-line entry point.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

mod commands;
mod runtime;

use commands::{ask, chat, config, status};

// ─────────────────────────────────────────────────────────────────────────────
// CLI Structure
// ─────────────────────────────────────────────────────────────────────────────

/// Retrieval-augmented assistant for medication queries
#[derive(Parser)]
#[command(name = "panacea")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output as JSON (for scripting)
    #[arg(long, global = true)]
    pub json: bool,

    /// Explicit config file (skips discovery)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Ask a one-shot question
    Ask(ask::AskArgs),

    /// Enter interactive chat mode (REPL)
    Chat(chat::ChatArgs),

    /// Show backend health and index status
    Status(status::StatusArgs),

    /// Show the resolved configuration
    Config(config::ConfigArgs),
}

// ─────────────────────────────────────────────────────────────────────────────
// Tracing
// ─────────────────────────────────────────────────────────────────────────────

const WORKSPACE_CRATES: &[&str] = &[
    "panacea",
    "panacea_agent",
    "panacea_llm",
    "panacea_index",
    "panacea_config",
];

fn workspace_filter(level: &str, rest: &str) -> EnvFilter {
    let directives: Vec<String> = WORKSPACE_CRATES
        .iter()
        .map(|krate| format!("{krate}={level}"))
        .chain(Some(rest.to_string()))
        .collect();
    EnvFilter::new(directives.join(","))
}

/// Wire up console logging plus a daily-rotated JSON file under the
/// config directory. The returned guard flushes the file writer on drop
/// and must outlive all logging.
fn init_tracing(verbose: bool) -> WorkerGuard {
    let console_filter = if verbose {
        workspace_filter("debug", "info")
    } else {
        workspace_filter("info", "warn")
    };

    let log_dir = panacea_config::xdg_config_dir()
        .map(|d| d.join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"));
    let (file_writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::daily(&log_dir, "panacea.log"));

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_filter(console_filter),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(file_writer)
                .with_filter(workspace_filter("trace", "info")),
        )
        .init();

    guard
}

// ─────────────────────────────────────────────────────────────────────────────
// Main
// ─────────────────────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_tracing(cli.verbose);

    let ctx = commands::Context {
        config_path: cli.config,
        json_output: cli.json,
        verbose: cli.verbose,
    };

    match cli.command {
        Commands::Ask(args) => ask::run(args, &ctx).await,
        Commands::Chat(args) => chat::run(args, &ctx).await,
        Commands::Status(args) => status::run(args, &ctx).await,
        Commands::Config(args) => config::run(args, &ctx).await,
    }
}
