//! MCP Toolset implementation

use crate::client::McpClient;
use crate::tool_wrapper::McpToolWrapper;
use async_trait::async_trait;
use relay_core::{InvocationContext, Result, Tool, Toolset};
use std::sync::Arc;

/// Exposes the tools of one pooled MCP connection to an agent.
///
/// The connection is borrowed from the client manager; dropping the toolset
/// never closes it.
#[derive(Debug, Clone)]
pub struct McpToolset {
    client: Arc<McpClient>,
    tool_filter: Option<Vec<String>>,
}

impl McpToolset {
    pub fn new(client: Arc<McpClient>) -> Self {
        Self {
            client,
            tool_filter: None,
        }
    }

    /// Only expose the named tools
    pub fn with_tool_filter(mut self, filter: Vec<String>) -> Self {
        self.tool_filter = Some(filter);
        self
    }

    pub fn client(&self) -> &Arc<McpClient> {
        &self.client
    }
}

#[async_trait]
impl Toolset for McpToolset {
    fn name(&self) -> &str {
        self.client.name()
    }

    async fn get_tools(&self, ctx: &dyn InvocationContext) -> Result<Vec<Arc<dyn Tool>>> {
        let mcp_tools = self.client.list_tools().await?;

        let filtered: Vec<_> = match &self.tool_filter {
            Some(filter) => mcp_tools
                .into_iter()
                .filter(|t| filter.contains(&t.name))
                .collect(),
            None => mcp_tools,
        };

        tracing::debug!(
            invocation_id = %ctx.invocation_id(),
            toolset = %self.client.name(),
            count = filtered.len(),
            "Loaded tools from MCP server"
        );

        Ok(filtered
            .into_iter()
            .map(|mcp_tool| {
                Arc::new(McpToolWrapper::new(mcp_tool, self.client.clone())) as Arc<dyn Tool>
            })
            .collect())
    }
}
