//! Command-line interface

pub mod commands;
pub mod repl;

pub use repl::Repl;
