//! Status command - backend health, index state, config sources.

use anyhow::Result;
use clap::Args;
use console::Style;
use serde_json::json;

use super::Context;
use crate::runtime;

/// Arguments for the status command.
#[derive(Args, Debug)]
pub struct StatusArgs {}

/// Run the status command.
pub async fn run(_args: StatusArgs, ctx: &Context) -> Result<()> {
    let loaded = runtime::load(ctx.config_path.as_deref())?;
    let rt = runtime::build(&loaded.config)?;

    let backend_health = rt.backend.health_check().await;
    let chunks = rt.index.len();

    if ctx.json_output {
        println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "backend": {
                    "reachable": backend_health.is_ok(),
                    "model": rt.model,
                },
                "index": {
                    "path": rt.index_path.as_ref().map(|p| p.display().to_string()),
                    "chunks": chunks.as_ref().ok(),
                },
                "config_files": loaded
                    .loaded_from()
                    .iter()
                    .map(|p| p.display().to_string())
                    .collect::<Vec<_>>(),
            }))?
        );
        return Ok(());
    }

    let green = Style::new().green();
    let red = Style::new().red();
    let dim = Style::new().dim();

    match backend_health {
        Ok(()) => println!(
            "LLM backend: {} ({})",
            green.apply_to("● reachable"),
            rt.model
        ),
        Err(e) => {
            println!("LLM backend: {}", red.apply_to("● unreachable"));
            if ctx.verbose {
                println!("  {}", dim.apply_to(format!("Error: {}", e)));
            }
        }
    }

    let location = rt
        .index_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "in-memory".to_string());
    match chunks {
        Ok(count) => println!(
            "Chunk index: {} chunks {}",
            count,
            dim.apply_to(format!("({})", location))
        ),
        Err(e) => println!("Chunk index: {}", red.apply_to(format!("error: {}", e))),
    }

    let loaded_from = loaded.loaded_from();
    if loaded_from.is_empty() {
        println!("Config: {}", dim.apply_to("defaults (no config file found)"));
    } else {
        for path in loaded_from {
            println!("Config: {}", path.display());
        }
    }

    Ok(())
}
