//! Interactive REPL for driftwatch
//!
//! Provides the main user interaction loop. Each submitted line is an
//! independent run; Ctrl+C cancels the run in flight without exiting.

use std::io::{self, BufRead, Write};

use tokio_util::sync::CancellationToken;

use crate::agent::{Assistant, RunOutcome};
use crate::cli::commands::{handle_command, CommandResult};
use crate::core::{Config, DriftwatchError, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl {
    assistant: Assistant,
}

impl Repl {
    /// Create a new REPL with default configuration
    pub fn new() -> Result<Self> {
        Ok(Self {
            assistant: Assistant::new()?,
        })
    }

    /// Create a REPL with custom configuration
    pub fn with_config(config: Config) -> Result<Self> {
        Ok(Self {
            assistant: Assistant::with_config(config)?,
        })
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        self.print_banner();

        let stdin = io::stdin();
        let mut stdout = io::stdout();

        loop {
            // Print prompt
            print!("You: ");
            stdout.flush()?;

            // Read input
            let mut input = String::new();
            match stdin.lock().read_line(&mut input) {
                Ok(0) => {
                    // EOF (Ctrl+D)
                    println!("\nGoodbye!");
                    break;
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("Error reading input: {}", e);
                    continue;
                }
            }

            let input = input.trim();

            if input.is_empty() {
                continue;
            }

            // Handle commands
            match handle_command(input, &self.assistant).await {
                Ok(CommandResult::Exit) => {
                    println!("\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Handled(output)) => {
                    println!("{}\n", output);
                    continue;
                }
                Ok(CommandResult::None) => continue,
                Ok(CommandResult::Continue(input)) => {
                    self.process(&input).await;
                }
                Err(e) => {
                    eprintln!("Command error: {}\n", e);
                }
            }
        }

        Ok(())
    }

    /// Run one utterance, cancellable with Ctrl+C
    async fn process(&self, input: &str) {
        let cancel = CancellationToken::new();
        let run = self.assistant.submit_with_cancel(input, cancel.clone());
        tokio::pin!(run);

        let result = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                cancel.cancel();
                run.await
            }
            result = &mut run => result,
        };

        match result {
            Ok(RunOutcome::Completed(text)) => {
                println!("\nAssistant:\n{}\n", text);
            }
            Ok(RunOutcome::BudgetExhausted(text)) => {
                println!("\nAssistant (ran out of steps):");
                match text {
                    Some(text) => println!("{}\n", text),
                    None => println!("(no answer was produced)\n"),
                }
            }
            Err(DriftwatchError::Cancelled) => {
                println!("\nRun cancelled.\n");
            }
            Err(e) => {
                eprintln!("\nError: {}\n", e);
            }
        }
    }

    /// Print the startup banner
    fn print_banner(&self) {
        let config = self.assistant.config();

        println!();
        println!("driftwatch — conversational ops assistant for drift-monitored fleets");
        println!("─────────────────────────────────────────────────────────────────────");
        println!("Backend:    {}", config.backend.endpoint);
        println!("Model:      {}", config.backend.model);
        println!("Providers:  {}", config.registry.providers.join(", "));
        println!();
        println!("Commands: help, tools, status, exit");
        println!("─────────────────────────────────────────────────────────────────────");
    }
}
