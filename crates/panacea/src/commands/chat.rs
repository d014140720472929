//! Chat command - interactive REPL mode.

use anyhow::Result;
use clap::Args;
use console::{Style, style};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::{Config, Editor};

use panacea_agent::{Conversation, ToolResult};

use super::Context;
use crate::runtime;

/// Arguments for the chat command.
#[derive(Args, Debug)]
pub struct ChatArgs {
    /// Show the routed tool for every reply
    #[arg(long)]
    pub show_routing: bool,
}

/// Run the chat command (REPL).
pub async fn run(args: ChatArgs, ctx: &Context) -> Result<()> {
    let loaded = runtime::load(ctx.config_path.as_deref())?;
    for warning in &loaded.warnings {
        eprintln!("{}", Style::new().yellow().apply_to(warning));
    }
    let rt = runtime::build(&loaded.config)?;

    let config = Config::builder()
        .history_ignore_space(true)
        .auto_add_history(true)
        .build();
    let mut editor: Editor<(), DefaultHistory> = Editor::with_config(config)?;

    print_welcome();

    let show_routing = args.show_routing || ctx.verbose;
    let dim = Style::new().dim();
    let mut conversation = Conversation::new();

    loop {
        match editor.readline("panacea> ") {
            Ok(line) => {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                if line == "exit" || line == "quit" {
                    break;
                }

                if let Some(result) = rt.router.handle_query(line, &mut conversation).await {
                    print_result(&result, show_routing);
                }
            }
            Err(ReadlineError::Interrupted) => {
                // Ctrl+C - drop the line but keep the session
                println!();
                println!("{}", dim.apply_to("(Interrupted - type exit to leave)"));
                continue;
            }
            Err(ReadlineError::Eof) => {
                // Ctrl+D - exit
                println!();
                break;
            }
            Err(e) => {
                eprintln!("Input error: {}", e);
                break;
            }
        }
    }

    println!("{}", dim.apply_to("Goodbye!"));
    Ok(())
}

fn print_welcome() {
    let dim = Style::new().dim();
    println!();
    println!("{}", style("Panacea Chat").bold().cyan());
    println!("{}", dim.apply_to("─".repeat(40)));
    println!(
        "{}",
        dim.apply_to("Ask about medications, summaries, or recommendations.")
    );
    println!("{}", dim.apply_to("Type exit or press Ctrl+D to leave."));
    println!();
}

fn print_result(result: &ToolResult, show_routing: bool) {
    let dim = Style::new().dim();
    if show_routing {
        println!("{}", dim.apply_to(format!("[Tool: {}]", result.tool().label())));
    }
    match result {
        ToolResult::Answer { content, .. } => println!("{}", content),
        ToolResult::NoAnswer { .. } => println!("No relevant information found."),
        ToolResult::Failure { message, .. } => {
            let red = Style::new().red();
            println!("{} {}", red.apply_to("An error occurred:"), message);
        }
    }
    println!();
}
