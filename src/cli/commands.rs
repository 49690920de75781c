//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::agent::Assistant;
use crate::core::Result;

/// Result of parsing a command
pub enum CommandResult {
    /// Continue processing as normal input
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// No output needed
    None,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, assistant: &Assistant) -> Result<CommandResult> {
    let input = input.trim();
    let cmd = input.to_lowercase();

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "tools" => {
            let names = assistant.list_tools().await?;
            if names.is_empty() {
                return Ok(CommandResult::Handled("No tools advertised.".to_string()));
            }
            let output = format!(
                "Available tools:\n{}",
                names
                    .iter()
                    .map(|n| format!("  - {}", n))
                    .collect::<Vec<_>>()
                    .join("\n")
            );
            Ok(CommandResult::Handled(output))
        }

        "status" => {
            let config = assistant.config();
            let status = format!(
                "Driftwatch Status:\n\
                 ─────────────────────────────\n\
                 Backend:    {}\n\
                 Model:      {}\n\
                 Providers:  {}\n\
                 Max steps:  {}",
                config.backend.endpoint,
                config.backend.model,
                config.registry.providers.join(", "),
                config.agent.max_steps
            );
            Ok(CommandResult::Handled(status))
        }

        _ => {
            // Not a command, treat as normal input
            if input.starts_with('/') {
                Ok(CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                )))
            } else {
                Ok(CommandResult::Continue(input.to_string()))
            }
        }
    }
}

/// Generate help text
fn help_text() -> String {
    r#"Driftwatch Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit driftwatch
  tools            List the currently advertised tools
  status           Show current configuration

Keyboard Shortcuts:
  Ctrl+C           Cancel the current run
  Ctrl+D           Exit driftwatch

Tips:
  - Each message is an independent run: the assistant starts fresh
    every time, so include the node names you care about
  - Drift scores: below 1.0 normal, 1.0-2.0 monitor, above 2.0 anomalous
─────────────────────────────────────────────"#
        .to_string()
}
