//! High-level assistant facade
//!
//! Wires configuration, the generation backend, and the tool federation
//! together, and runs one orchestration loop per user utterance.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::agent::loop_state::RunOutcome;
use crate::agent::orchestrator::Orchestrator;
use crate::core::error::{DriftwatchError, Result};
use crate::core::Config;
use crate::llm::http::HttpGenerationClient;
use crate::llm::traits::GenerationClient;
use crate::tools::dispatch::Dispatcher;
use crate::tools::federation::FederationClient;

/// The driftwatch assistant
pub struct Assistant {
    config: Config,
    llm: Arc<dyn GenerationClient>,
    federation: Arc<FederationClient>,
}

impl Assistant {
    /// Create an assistant with the loaded configuration
    pub fn new() -> Result<Self> {
        Self::with_config(Config::load())
    }

    /// Create an assistant from explicit configuration
    pub fn with_config(config: Config) -> Result<Self> {
        config.validate()?;

        let llm: Arc<dyn GenerationClient> = Arc::new(HttpGenerationClient::from_config(&config));
        let federation = Arc::new(FederationClient::from_config(&config));

        Ok(Self {
            config,
            llm,
            federation,
        })
    }

    /// Run one utterance to an outcome
    pub async fn submit(&self, text: &str) -> Result<RunOutcome> {
        self.submit_with_cancel(text, CancellationToken::new())
            .await
    }

    /// Run one utterance, interruptible through the token
    ///
    /// Discovery happens first; a provider that cannot be reached fails
    /// the run before any generation call is made.
    pub async fn submit_with_cancel(
        &self,
        text: &str,
        cancel: CancellationToken,
    ) -> Result<RunOutcome> {
        let snapshot = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(DriftwatchError::Cancelled),
            discovered = self.federation.discover() => Arc::new(discovered?),
        };

        let dispatcher = Dispatcher::new(
            snapshot,
            self.federation.clone(),
            self.config.tool_timeout(),
        );

        let orchestrator = Orchestrator::new(
            self.llm.clone(),
            dispatcher,
            self.config.agent.max_steps,
            self.config.run_deadline(),
        );

        orchestrator
            .run(self.config.system_prompt(), text, cancel)
            .await
    }

    /// Discover and list the currently advertised tool names
    pub async fn list_tools(&self) -> Result<Vec<String>> {
        let snapshot = self.federation.discover().await?;
        info!(tools = snapshot.len(), "listed tools");
        Ok(snapshot.names())
    }

    /// The active configuration
    pub fn config(&self) -> &Config {
        &self.config
    }
}
