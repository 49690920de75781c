//! Core types, errors, and configuration

pub mod config;
pub mod error;
pub mod types;

pub use config::Config;
pub use error::{DriftwatchError, ErrorKind, Result};
pub use types::{ToolCall, ToolErrorKind, ToolOutput, ToolRecord, ToolSchema, Turn};
