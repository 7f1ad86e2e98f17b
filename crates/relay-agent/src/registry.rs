//! Named agent templates

use crate::template::AgentConfig;
use relay_core::{Error, Result};
use relay_mcp::{McpClient, McpClientManager};
use std::collections::HashMap;
use std::sync::Arc;

const MATH_INSTRUCTIONS: &str = "You are a math specialist. Use the available math tools to perform calculations.\nAlways show your work step by step.";
const TEXT_INSTRUCTIONS: &str = "You are a text processing specialist. Use the available text tools to manipulate text.\nExplain what transformations you're applying.";
const DATA_INSTRUCTIONS: &str = "You are a data processing specialist. Use the available data tools to process lists and arrays.\nExplain each step of data transformation.";

/// Connections bound to the built-in `math`, `text` and `data` templates.
///
/// A template whose connection is absent is still registered, with no
/// MCP servers.
#[derive(Debug, Clone, Default)]
pub struct BuiltinServers {
    pub math: Option<Arc<McpClient>>,
    pub text: Option<Arc<McpClient>>,
    pub data: Option<Arc<McpClient>>,
}

impl BuiltinServers {
    /// Pick up the connections the manager holds under the names
    /// `math`, `text` and `data`
    pub fn from_manager(manager: &McpClientManager) -> Self {
        Self {
            math: manager.get("math").ok(),
            text: manager.get("text").ok(),
            data: manager.get("data").ok(),
        }
    }
}

/// Agent templates keyed by type identifier, in registration order
#[derive(Debug, Clone, Default)]
pub struct AgentRegistry {
    configs: HashMap<String, AgentConfig>,
    order: Vec<String>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry seeded with the `math`, `text` and `data` templates
    pub fn with_builtin_templates(servers: &BuiltinServers) -> Self {
        let builtin = [
            ("math", "Math Agent", MATH_INSTRUCTIONS, 10, &servers.math),
            ("text", "Text Agent", TEXT_INSTRUCTIONS, 8, &servers.text),
            ("data", "Data Agent", DATA_INSTRUCTIONS, 8, &servers.data),
        ];

        let mut registry = Self::new();
        for (id, name, instructions, max_turns, server) in builtin {
            let config = AgentConfig::new(name, instructions)
                .max_turns(max_turns)
                .mcp_servers(server.clone());
            registry.insert(id.to_string(), config);
        }
        registry
    }

    /// Register a template, replacing any template with the same identifier
    pub fn register(&mut self, agent_type: impl Into<String>, config: AgentConfig) -> Result<()> {
        let agent_type = agent_type.into();
        if agent_type.is_empty() {
            return Err(Error::config_error("Agent type identifier must not be empty"));
        }

        tracing::debug!(agent_type = %agent_type, name = %config.name, "Registered agent template");
        self.insert(agent_type, config);
        Ok(())
    }

    fn insert(&mut self, agent_type: String, config: AgentConfig) {
        if self.configs.insert(agent_type.clone(), config).is_none() {
            self.order.push(agent_type);
        }
    }

    pub fn get(&self, agent_type: &str) -> Result<&AgentConfig> {
        self.configs
            .get(agent_type)
            .ok_or_else(|| Error::UnknownAgentType {
                agent_type: agent_type.to_string(),
                available: self.list(),
            })
    }

    pub fn contains(&self, agent_type: &str) -> bool {
        self.configs.contains_key(agent_type)
    }

    /// Registered identifiers, oldest first
    pub fn list(&self) -> Vec<String> {
        self.order.clone()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
