//! Driftwatch - Conversational ops assistant for drift-monitored fleets
//!
//! Main entry point for the CLI application.

use clap::Parser;
use driftwatch::{Config, Repl, RunOutcome};
use tracing_subscriber::EnvFilter;

/// Driftwatch - Conversational ops assistant for drift-monitored fleets
#[derive(Parser, Debug)]
#[command(name = "driftwatch")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Generation backend URL
    #[arg(long, short = 'b')]
    backend_url: Option<String>,

    /// Model name sent to the backend
    #[arg(long, short = 'm')]
    model: Option<String>,

    /// Maximum generation steps per run
    #[arg(long)]
    max_steps: Option<u32>,

    /// Tool provider URL (repeat for multiple providers)
    #[arg(long = "provider")]
    providers: Vec<String>,

    /// Single prompt mode (non-interactive)
    #[arg(long, short = 'p')]
    prompt: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    // Build configuration
    let mut config = Config::load();

    // Apply CLI overrides
    if let Some(ref backend_url) = args.backend_url {
        config.backend.endpoint = backend_url.clone();
    }

    if let Some(ref model) = args.model {
        config.backend.model = model.clone();
    }

    if let Some(max_steps) = args.max_steps {
        config.agent.max_steps = max_steps;
    }

    if !args.providers.is_empty() {
        config.registry.providers = args.providers.clone();
    }

    // Single prompt mode
    if let Some(prompt) = args.prompt {
        let assistant = driftwatch::Assistant::with_config(config)?;

        match assistant.submit(&prompt).await? {
            RunOutcome::Completed(text) => println!("{}", text),
            RunOutcome::BudgetExhausted(text) => {
                match text {
                    Some(text) => println!("{}", text),
                    None => eprintln!("No answer was produced before the step budget ran out."),
                }
                std::process::exit(2);
            }
        }
        return Ok(());
    }

    // Interactive REPL mode
    let mut repl = Repl::with_config(config)?;
    repl.run().await?;

    Ok(())
}
