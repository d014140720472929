//! Ask command - route one question and print the result.

use anyhow::Result;
use clap::Args;
use console::Style;

use panacea_agent::{Conversation, ToolResult};

use super::Context;
use crate::runtime;

/// Arguments for the ask command.
#[derive(Args, Debug)]
pub struct AskArgs {
    /// The question to route
    #[arg(required = true)]
    pub question: String,
}

/// Run the ask command.
pub async fn run(args: AskArgs, ctx: &Context) -> Result<()> {
    let loaded = runtime::load(ctx.config_path.as_deref())?;
    for warning in &loaded.warnings {
        eprintln!("{}", Style::new().yellow().apply_to(warning));
    }

    let rt = runtime::build(&loaded.config)?;
    let mut conversation = Conversation::new();

    let Some(result) = rt.router.handle_query(&args.question, &mut conversation).await else {
        anyhow::bail!("the question is empty");
    };

    if ctx.json_output {
        println!("{}", serde_json::to_string_pretty(&result)?);
        return Ok(());
    }

    print_result(&result);
    Ok(())
}

fn print_result(result: &ToolResult) {
    let dim = Style::new().dim();
    match result {
        ToolResult::Answer { tool, content } => {
            println!("{}", dim.apply_to(format!("[Tool: {}]", tool.label())));
            println!("{}", content);
        }
        ToolResult::NoAnswer { tool } => {
            println!("{}", dim.apply_to(format!("[Tool: {}]", tool.label())));
            println!("No relevant information found.");
        }
        ToolResult::Failure { tool, message } => {
            let red = Style::new().red();
            eprintln!(
                "{} {}",
                red.apply_to(format!("[Tool: {}] Error:", tool.label())),
                message
            );
        }
    }
}
