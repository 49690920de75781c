//! Immutable per-run view of the discovered tools
//!
//! A snapshot is taken once at the start of a run and never refreshed:
//! every step of the same run sees the same tool set, even if providers
//! change underneath.

use std::collections::HashMap;

use tracing::warn;

use crate::core::types::ToolSchema;

/// A tool advertised by a federation provider
#[derive(Debug, Clone)]
pub struct RemoteTool {
    /// Tool name, unique within a snapshot
    pub name: String,
    /// Description forwarded to the generation backend
    pub description: String,
    /// JSON Schema for the arguments
    pub parameters: serde_json::Value,
    /// Base URL of the provider that advertised this tool
    pub provider: String,
}

/// The set of tools available for one run
#[derive(Debug, Clone, Default)]
pub struct ToolSnapshot {
    tools: HashMap<String, RemoteTool>,
}

impl ToolSnapshot {
    /// Build a snapshot from discovered tools
    ///
    /// When two providers advertise the same name, the first one wins.
    pub fn from_tools(tools: Vec<RemoteTool>) -> Self {
        let mut map: HashMap<String, RemoteTool> = HashMap::new();
        for tool in tools {
            if let Some(existing) = map.get(&tool.name) {
                warn!(
                    tool = %tool.name,
                    kept = %existing.provider,
                    dropped = %tool.provider,
                    "duplicate tool name across providers, keeping the first"
                );
                continue;
            }
            map.insert(tool.name.clone(), tool);
        }
        Self { tools: map }
    }

    /// Look up a tool by name
    pub fn get(&self, name: &str) -> Option<&RemoteTool> {
        self.tools.get(name)
    }

    /// Schemas for every tool, for the generation request
    pub fn schemas(&self) -> Vec<ToolSchema> {
        let mut schemas: Vec<ToolSchema> = self
            .tools
            .values()
            .map(|tool| ToolSchema {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: tool.parameters.clone(),
            })
            .collect();
        schemas.sort_by(|a, b| a.name.cmp(&b.name));
        schemas
    }

    /// Names of every tool, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(name: &str, provider: &str) -> RemoteTool {
        RemoteTool {
            name: name.to_string(),
            description: format!("{} tool", name),
            parameters: json!({"type": "object"}),
            provider: provider.to_string(),
        }
    }

    #[test]
    fn test_snapshot_lookup() {
        let snapshot = ToolSnapshot::from_tools(vec![
            tool("node_status", "http://a:9400"),
            tool("compare_nodes", "http://a:9400"),
        ]);

        assert_eq!(snapshot.len(), 2);
        assert!(snapshot.get("node_status").is_some());
        assert!(snapshot.get("reboot_node").is_none());
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let snapshot = ToolSnapshot::from_tools(vec![
            tool("node_status", "http://a:9400"),
            tool("node_status", "http://b:9400"),
        ]);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(snapshot.get("node_status").unwrap().provider, "http://a:9400");
    }

    #[test]
    fn test_schemas_are_sorted() {
        let snapshot = ToolSnapshot::from_tools(vec![
            tool("zeta", "http://a:9400"),
            tool("alpha", "http://a:9400"),
        ]);

        let schemas = snapshot.schemas();
        assert_eq!(schemas[0].name, "alpha");
        assert_eq!(schemas[1].name, "zeta");
    }
}
