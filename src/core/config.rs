//! Configuration management for driftwatch
//!
//! Supports environment variables, config files, and runtime overrides.
//!
//! Config file location: ~/.config/driftwatch/config.toml

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use crate::core::error::{DriftwatchError, Result};

/// System prompt used when the config does not override it.
///
/// The drift-score bands are data communicated to the model, not logic
/// enforced by the loop.
pub const DEFAULT_SYSTEM_PROMPT: &str = "\
You are the driftwatch assistant for a fleet of monitored nodes. Use the \
available tools to check node status, compare nodes, and look up telemetry \
history before answering. Interpret drift scores as follows: below 1.0 is \
normal, 1.0 to 2.0 warrants monitoring, above 2.0 is anomalous. Answer only \
from tool results; if a tool fails, say so rather than guessing.";

/// Main configuration for driftwatch
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Generation backend configuration
    pub backend: BackendConfig,
    /// Tool provider federation configuration
    pub registry: RegistryConfig,
    /// Orchestration loop configuration
    pub agent: AgentConfig,
}

/// Generation backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Base URL of the chat-completion endpoint
    pub endpoint: String,
    /// Bearer token, if the backend requires one
    pub api_key: Option<String>,
    /// Model name sent with every request
    pub model: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Tool provider federation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Base URLs of the tool providers to discover from
    pub providers: Vec<String>,
    /// Timeout for the discovery request per provider, in seconds
    pub discovery_timeout_secs: u64,
}

/// Orchestration loop configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentConfig {
    /// Maximum generation steps per run
    /// Default: 10
    pub max_steps: u32,
    /// Per-tool-call timeout in seconds
    pub tool_timeout_secs: u64,
    /// Overall deadline for one run, in seconds
    pub run_deadline_secs: u64,
    /// Override for the built-in system prompt
    pub system_prompt: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            backend: BackendConfig::default(),
            registry: RegistryConfig::default(),
            agent: AgentConfig::default(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: env::var("DRIFTWATCH_BACKEND_URL")
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            api_key: env::var("DRIFTWATCH_API_KEY").ok(),
            model: env::var("DRIFTWATCH_MODEL").unwrap_or_else(|_| "drift-planner".to_string()),
            timeout_secs: 60,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        let providers = env::var("DRIFTWATCH_TOOL_PROVIDERS")
            .map(|v| {
                v.split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect()
            })
            .unwrap_or_else(|_| vec!["http://localhost:9400".to_string()]);

        Self {
            providers,
            discovery_timeout_secs: 10,
        }
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            max_steps: env::var("DRIFTWATCH_MAX_STEPS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(10),
            tool_timeout_secs: 30,
            run_deadline_secs: 300,
            system_prompt: None,
        }
    }
}

impl Config {
    /// Get the config directory path
    pub fn config_dir() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("driftwatch")
    }

    /// Get the config file path
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("config.toml")
    }

    /// Load configuration from file, environment, and defaults
    /// Priority: CLI args > env vars > config file > defaults
    pub fn load() -> Self {
        // Try to load .env file if it exists
        let _ = dotenvy::dotenv();

        if let Ok(config) = Self::load_from_file() {
            return config;
        }

        // Fall back to defaults (which respect env vars)
        Self::default()
    }

    /// Load configuration from file only
    pub fn load_from_file() -> Result<Self> {
        let config_path = Self::config_file();

        if !config_path.exists() {
            return Err(DriftwatchError::config("Config file not found"));
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|e| DriftwatchError::config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| DriftwatchError::config(format!("Failed to parse config: {}", e)))?;

        Ok(config)
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_dir = Self::config_dir();
        let config_path = Self::config_file();

        if !config_dir.exists() {
            fs::create_dir_all(&config_dir).map_err(|e| {
                DriftwatchError::config(format!("Failed to create config dir: {}", e))
            })?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| DriftwatchError::config(format!("Failed to serialize config: {}", e)))?;

        fs::write(&config_path, content)
            .map_err(|e| DriftwatchError::config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Check that every configured endpoint is a parseable URL
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.backend.endpoint).map_err(|e| {
            DriftwatchError::config(format!(
                "invalid backend endpoint '{}': {}",
                self.backend.endpoint, e
            ))
        })?;

        if self.registry.providers.is_empty() {
            return Err(DriftwatchError::config(
                "at least one tool provider must be configured",
            ));
        }

        for provider in &self.registry.providers {
            url::Url::parse(provider).map_err(|e| {
                DriftwatchError::config(format!("invalid tool provider '{}': {}", provider, e))
            })?;
        }

        Ok(())
    }

    /// The system prompt for this configuration
    pub fn system_prompt(&self) -> &str {
        self.agent
            .system_prompt
            .as_deref()
            .unwrap_or(DEFAULT_SYSTEM_PROMPT)
    }

    /// Per-tool-call timeout as a Duration
    pub fn tool_timeout(&self) -> Duration {
        Duration::from_secs(self.agent.tool_timeout_secs)
    }

    /// Overall run deadline as a Duration
    pub fn run_deadline(&self) -> Duration {
        Duration::from_secs(self.agent.run_deadline_secs)
    }
}
