//! Tool provider federation
//!
//! Discovers tools from a set of HTTP providers and invokes them over
//! the wire. Discovery happens once per run; any provider failing to
//! answer makes the run fail up front rather than silently shrinking
//! the tool set.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info};

use crate::core::error::{DriftwatchError, Result};
use crate::core::Config;
use crate::tools::dispatch::ToolTransport;
use crate::tools::snapshot::{RemoteTool, ToolSnapshot};

/// Client for a set of tool providers
#[derive(Clone)]
pub struct FederationClient {
    client: Client,
    providers: Vec<String>,
}

/// Tool descriptor as advertised by a provider
#[derive(Debug, Deserialize)]
struct ToolDescriptor {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "empty_object")]
    parameters: serde_json::Value,
}

fn empty_object() -> serde_json::Value {
    serde_json::json!({"type": "object", "properties": {}})
}

impl FederationClient {
    /// Create a client from configuration
    pub fn from_config(config: &Config) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.registry.discovery_timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            providers: config
                .registry
                .providers
                .iter()
                .map(|p| p.trim_end_matches('/').to_string())
                .collect(),
        }
    }

    /// Discover the tools every configured provider advertises
    pub async fn discover(&self) -> Result<ToolSnapshot> {
        let mut tools = Vec::new();

        for provider in &self.providers {
            let descriptors = self.discover_one(provider).await?;
            debug!(provider = %provider, tools = descriptors.len(), "provider answered discovery");

            tools.extend(descriptors.into_iter().map(|d| RemoteTool {
                name: d.name,
                description: d.description,
                parameters: d.parameters,
                provider: provider.clone(),
            }));
        }

        let snapshot = ToolSnapshot::from_tools(tools);
        info!(tools = snapshot.len(), providers = self.providers.len(), "tool discovery complete");
        Ok(snapshot)
    }

    async fn discover_one(&self, provider: &str) -> Result<Vec<ToolDescriptor>> {
        let response = self
            .client
            .get(format!("{}/tools", provider))
            .send()
            .await
            .map_err(|e| {
                DriftwatchError::registry(format!(
                    "Cannot reach tool provider at {}: {}",
                    provider, e
                ))
            })?;

        if !response.status().is_success() {
            return Err(DriftwatchError::registry(format!(
                "Tool provider {} answered discovery with {}",
                provider,
                response.status()
            )));
        }

        response.json().await.map_err(|e| {
            DriftwatchError::registry(format!(
                "Tool provider {} sent an unreadable tool list: {}",
                provider, e
            ))
        })
    }
}

#[async_trait]
impl ToolTransport for FederationClient {
    async fn invoke(
        &self,
        tool: &RemoteTool,
        arguments: &serde_json::Value,
    ) -> Result<serde_json::Value> {
        let response = self
            .client
            .post(format!("{}/tools/{}/invoke", tool.provider, tool.name))
            .json(arguments)
            .send()
            .await
            .map_err(|e| {
                DriftwatchError::registry(format!("invoking {} failed: {}", tool.name, e))
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DriftwatchError::registry(format!(
                "{} answered with {}: {}",
                tool.name, status, error_text
            )));
        }

        response.json().await.map_err(|e| {
            DriftwatchError::registry(format!("{} sent an unreadable payload: {}", tool.name, e))
        })
    }
}
