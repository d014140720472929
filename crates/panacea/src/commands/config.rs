//! Config command - show the resolved configuration.

use anyhow::Result;
use clap::Args;
use console::Style;

use panacea_config::PanaceaConfig;

use super::Context;
use crate::runtime;

/// Arguments for the config command.
#[derive(Args, Debug)]
pub struct ConfigArgs {}

/// Run the config command.
pub async fn run(_args: ConfigArgs, ctx: &Context) -> Result<()> {
    let loaded = runtime::load(ctx.config_path.as_deref())?;

    let dim = Style::new().dim();
    let green = Style::new().green();

    println!("{}", Style::new().bold().apply_to("Config sources"));
    for source in &loaded.sources {
        let marker = if source.loaded {
            green.apply_to("●").to_string()
        } else {
            dim.apply_to("○").to_string()
        };
        println!("  {} {}", marker, source.path.display());
    }
    for warning in &loaded.warnings {
        println!("  {}", Style::new().yellow().apply_to(warning));
    }
    println!();

    // Materialize every section so defaults are visible too
    let mut resolved = PanaceaConfig {
        llm: Some(loaded.config.effective_llm()),
        embedding: Some(loaded.config.effective_embedding()),
        index: Some(loaded.config.effective_index()),
        search: Some(loaded.config.effective_search()),
    };

    // Never echo credentials
    if let Some(llm) = resolved.llm.as_mut()
        && llm.api_key.is_some()
    {
        llm.api_key = Some("***".to_string());
    }

    println!("{}", resolved.to_toml()?);

    if ctx.verbose
        && let Some(path) = panacea_config::default_index_path()
    {
        println!("{}", dim.apply_to(format!("Default index path: {}", path.display())));
    }

    Ok(())
}
