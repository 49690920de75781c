//! Tool invocation and fault normalization
//!
//! The dispatcher turns every requested call into exactly one record.
//! Tool-level faults never abort the run: they come back as error
//! records the model can read and react to.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

use crate::core::error::Result;
use crate::core::types::{ToolCall, ToolErrorKind, ToolRecord};
use crate::tools::snapshot::{RemoteTool, ToolSnapshot};

/// Transport for invoking a remote tool
#[async_trait]
pub trait ToolTransport: Send + Sync {
    async fn invoke(
        &self,
        tool: &RemoteTool,
        arguments: &serde_json::Value,
    ) -> Result<serde_json::Value>;
}

/// Executes tool calls against one run's snapshot
#[derive(Clone)]
pub struct Dispatcher {
    snapshot: Arc<ToolSnapshot>,
    transport: Arc<dyn ToolTransport>,
    call_timeout: Duration,
}

impl Dispatcher {
    pub fn new(
        snapshot: Arc<ToolSnapshot>,
        transport: Arc<dyn ToolTransport>,
        call_timeout: Duration,
    ) -> Self {
        Self {
            snapshot,
            transport,
            call_timeout,
        }
    }

    /// The snapshot this dispatcher serves
    pub fn snapshot(&self) -> &ToolSnapshot {
        &self.snapshot
    }

    /// Execute one call and normalize whatever happens into a record
    pub async fn invoke(&self, call: ToolCall) -> ToolRecord {
        let Some(tool) = self.snapshot.get(&call.name) else {
            warn!(tool = %call.name, call_id = %call.id, "model requested an unknown tool");
            return ToolRecord::error(
                call.id,
                ToolErrorKind::UnknownTool,
                format!("No tool named '{}' is available", call.name),
            );
        };

        if !call.arguments.is_object() {
            warn!(tool = %call.name, call_id = %call.id, "tool arguments are not an object");
            return ToolRecord::error(
                call.id,
                ToolErrorKind::BadArguments,
                format!("Arguments for '{}' must be a JSON object", call.name),
            );
        }

        debug!(tool = %call.name, call_id = %call.id, "invoking tool");

        match tokio::time::timeout(self.call_timeout, self.transport.invoke(tool, &call.arguments))
            .await
        {
            Ok(Ok(payload)) => ToolRecord::payload(call.id, payload),
            Ok(Err(e)) => {
                warn!(tool = %call.name, call_id = %call.id, error = %e, "tool invocation failed");
                ToolRecord::error(call.id, ToolErrorKind::InvocationFailed, e.to_string())
            }
            Err(_) => {
                warn!(
                    tool = %call.name,
                    call_id = %call.id,
                    timeout_secs = self.call_timeout.as_secs(),
                    "tool invocation timed out"
                );
                ToolRecord::error(
                    call.id,
                    ToolErrorKind::Timeout,
                    format!(
                        "'{}' did not answer within {}s",
                        call.name,
                        self.call_timeout.as_secs()
                    ),
                )
            }
        }
    }
}
