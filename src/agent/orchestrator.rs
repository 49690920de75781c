//! The orchestration loop
//!
//! One run per user utterance: ask the backend for a turn, execute
//! whatever tools it requested, feed the results back, repeat until the
//! backend answers without calls or the step budget runs out. Tool
//! faults are observations for the model; only backend, cancellation,
//! and deadline failures abort the run.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::agent::context::TurnAggregator;
use crate::agent::loop_state::{RunOutcome, StepBudget};
use crate::core::error::{DriftwatchError, Result};
use crate::core::types::{ToolCall, ToolErrorKind, ToolRecord, Turn};
use crate::llm::traits::GenerationClient;
use crate::tools::dispatch::Dispatcher;

/// Drives one conversational run to an outcome
pub struct Orchestrator {
    llm: Arc<dyn GenerationClient>,
    dispatcher: Dispatcher,
    max_steps: u32,
    run_deadline: Duration,
}

impl Orchestrator {
    pub fn new(
        llm: Arc<dyn GenerationClient>,
        dispatcher: Dispatcher,
        max_steps: u32,
        run_deadline: Duration,
    ) -> Self {
        Self {
            llm,
            dispatcher,
            max_steps,
            run_deadline,
        }
    }

    /// Run the loop for one user utterance
    pub async fn run(
        &self,
        system_prompt: &str,
        user_text: &str,
        cancel: CancellationToken,
    ) -> Result<RunOutcome> {
        let deadline = tokio::time::Instant::now() + self.run_deadline;
        let mut context = TurnAggregator::new(system_prompt, user_text);
        let mut budget = StepBudget::new(self.max_steps);
        let schemas = self.dispatcher.snapshot().schemas();

        info!(
            backend = self.llm.name(),
            tools = schemas.len(),
            max_steps = self.max_steps,
            "starting run"
        );

        while budget.has_remaining() {
            let generation = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DriftwatchError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(DriftwatchError::DeadlineExceeded(self.run_deadline));
                }
                result = self.llm.generate(context.turns(), &schemas, budget.remaining()) => {
                    result?
                }
            };
            budget.charge();

            debug!(
                step = budget.generation_calls(),
                calls = generation.tool_calls.len(),
                has_text = generation.text.is_some(),
                "generation step"
            );

            context.push_assistant(Turn::assistant(
                generation.text.clone(),
                generation.tool_calls.clone(),
            ));

            if generation.is_final() {
                // A call-free turn ends the run; it must say something.
                let text = generation.text.ok_or_else(|| {
                    DriftwatchError::backend(
                        "Backend produced a turn with neither text nor tool calls",
                    )
                })?;
                info!(steps = budget.generation_calls(), "run completed");
                return Ok(RunOutcome::Completed(text));
            }

            let records = tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(DriftwatchError::Cancelled),
                _ = tokio::time::sleep_until(deadline) => {
                    return Err(DriftwatchError::DeadlineExceeded(self.run_deadline));
                }
                records = self.dispatch_turn(generation.tool_calls) => records,
            };

            for record in records {
                context.push_tool_record(record);
            }
        }

        info!(max_steps = budget.max_steps(), "step budget exhausted");
        Ok(RunOutcome::BudgetExhausted(context.last_assistant_text()))
    }

    /// Execute one turn's calls concurrently, results in emission order
    ///
    /// Returns exactly one record per call. A call id already seen in
    /// this turn is answered with an error record without invoking.
    async fn dispatch_turn(&self, calls: Vec<ToolCall>) -> Vec<ToolRecord> {
        let call_ids: Vec<String> = calls.iter().map(|c| c.id.clone()).collect();
        let mut slots: Vec<Option<ToolRecord>> = (0..calls.len()).map(|_| None).collect();
        let mut seen = HashSet::new();
        let mut join_set = JoinSet::new();

        for (idx, call) in calls.into_iter().enumerate() {
            if !seen.insert(call.id.clone()) {
                warn!(call_id = %call.id, tool = %call.name, "duplicate call id in one turn");
                slots[idx] = Some(ToolRecord::error(
                    call.id,
                    ToolErrorKind::DuplicateCallId,
                    "Call id was already used in this turn",
                ));
                continue;
            }

            let dispatcher = self.dispatcher.clone();
            join_set.spawn(async move { (idx, dispatcher.invoke(call).await) });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((idx, record)) => slots[idx] = Some(record),
                Err(e) => warn!(error = %e, "tool task did not finish"),
            }
        }

        slots
            .into_iter()
            .enumerate()
            .map(|(idx, slot)| {
                slot.unwrap_or_else(|| {
                    ToolRecord::error(
                        call_ids[idx].clone(),
                        ToolErrorKind::InvocationFailed,
                        "Tool task aborted before producing a result",
                    )
                })
            })
            .collect()
    }
}
