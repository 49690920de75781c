//! Loop bookkeeping for one run

/// Generation budget for one run
///
/// Each generation call charges one step before its result is acted on,
/// so a run makes at most `max_steps` backend calls.
#[derive(Debug, Clone)]
pub struct StepBudget {
    remaining: u32,
    max_steps: u32,
    generation_calls: u32,
}

impl StepBudget {
    pub fn new(max_steps: u32) -> Self {
        Self {
            remaining: max_steps,
            max_steps,
            generation_calls: 0,
        }
    }

    /// Whether another generation call is allowed
    pub fn has_remaining(&self) -> bool {
        self.remaining > 0
    }

    /// Charge one generation call
    pub fn charge(&mut self) {
        self.remaining = self.remaining.saturating_sub(1);
        self.generation_calls += 1;
    }

    /// Steps left before exhaustion
    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn is_exhausted(&self) -> bool {
        self.remaining == 0
    }

    /// Generation calls made so far
    pub fn generation_calls(&self) -> u32 {
        self.generation_calls
    }

    pub fn max_steps(&self) -> u32 {
        self.max_steps
    }
}

/// How one run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// The backend produced a call-free turn; carries its text verbatim
    Completed(String),
    /// The budget ran out first; carries the last assistant text, if any
    BudgetExhausted(Option<String>),
}

impl RunOutcome {
    /// The text to show the user, if the run produced any
    pub fn text(&self) -> Option<&str> {
        match self {
            Self::Completed(text) => Some(text),
            Self::BudgetExhausted(text) => text.as_deref(),
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Self::Completed(_))
    }
}
