use relay_core::{AgentTemplateConfig, Tool};
use relay_mcp::McpClient;
use std::fmt;
use std::sync::Arc;

/// Default turn cap of a template
pub const DEFAULT_TEMPLATE_MAX_TURNS: u32 = 10;

/// Recipe for building an agent: identity, instructions, turn cap and the
/// capability sources it draws tools from
#[derive(Clone)]
pub struct AgentConfig {
    pub name: String,
    pub instructions: String,
    pub max_turns: u32,
    /// Pooled MCP connections whose tools the agent may use
    pub mcp_servers: Vec<Arc<McpClient>>,
    /// Locally implemented tools
    pub tools: Vec<Arc<dyn Tool>>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, instructions: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: instructions.into(),
            max_turns: DEFAULT_TEMPLATE_MAX_TURNS,
            mcp_servers: Vec::new(),
            tools: Vec::new(),
        }
    }

    /// Identity, instructions and turn cap of a `[[agents]]` entry. Its
    /// servers are bound separately since they must already be running.
    pub fn from_template(template: &AgentTemplateConfig) -> Self {
        Self::new(&template.name, &template.instructions).max_turns(template.max_turns)
    }

    pub fn max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn mcp_server(mut self, client: Arc<McpClient>) -> Self {
        self.mcp_servers.push(client);
        self
    }

    pub fn mcp_servers(mut self, clients: impl IntoIterator<Item = Arc<McpClient>>) -> Self {
        self.mcp_servers.extend(clients);
        self
    }

    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.push(tool);
        self
    }
}

impl fmt::Debug for AgentConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let servers: Vec<&str> = self.mcp_servers.iter().map(|c| c.name()).collect();
        let tools: Vec<&str> = self.tools.iter().map(|t| t.name()).collect();
        f.debug_struct("AgentConfig")
            .field("name", &self.name)
            .field("max_turns", &self.max_turns)
            .field("mcp_servers", &servers)
            .field("tools", &tools)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_template_leaves_servers_unbound() {
        let template = AgentTemplateConfig {
            id: "code".to_string(),
            name: "Code Agent".to_string(),
            instructions: "You write code.".to_string(),
            max_turns: 15,
            servers: vec!["code".to_string()],
        };

        let config = AgentConfig::from_template(&template);
        assert_eq!(config.name, "Code Agent");
        assert_eq!(config.instructions, "You write code.");
        assert_eq!(config.max_turns, 15);
        assert!(config.mcp_servers.is_empty());
        assert!(config.tools.is_empty());
    }
}
