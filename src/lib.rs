//! Driftwatch - Conversational ops assistant for drift-monitored fleets
//!
//! Answers operator questions about a fleet of monitored nodes by
//! planning and executing remote tool calls in a bounded loop.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Generation backend abstraction with an HTTP implementation
//! - **Tools**: Federated tool discovery, snapshots, and dispatch
//! - **Agent**: The orchestration loop and assistant facade
//! - **CLI**: Command-line interface and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use driftwatch::Assistant;
//!
//! #[tokio::main]
//! async fn main() {
//!     let assistant = Assistant::new().unwrap();
//!
//!     let outcome = assistant.submit("Is node-7 drifting?").await.unwrap();
//!     if let Some(text) = outcome.text() {
//!         println!("{}", text);
//!     }
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::{Assistant, RunOutcome};
pub use cli::Repl;
pub use core::{Config, DriftwatchError, ErrorKind, Result};
