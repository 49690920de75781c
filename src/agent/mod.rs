//! Orchestration loop and assistant facade

pub mod assistant;
pub mod context;
pub mod loop_state;
pub mod orchestrator;

pub use assistant::Assistant;
pub use context::TurnAggregator;
pub use loop_state::{RunOutcome, StepBudget};
pub use orchestrator::Orchestrator;
