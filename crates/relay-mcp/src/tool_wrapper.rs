//! MCP tool wrapper - bridges MCP tools to the Relay Tool trait

use crate::client::McpClient;
use crate::types::McpToolInfo;
use async_trait::async_trait;
use relay_core::{Error, Result, Tool, ToolContext, ToolResponse};
use serde_json::Value;
use std::sync::Arc;

/// Wrapper that adapts an MCP tool to the Relay Tool trait
pub struct McpToolWrapper {
    mcp_tool: McpToolInfo,
    client: Arc<McpClient>,
}

impl McpToolWrapper {
    pub fn new(mcp_tool: McpToolInfo, client: Arc<McpClient>) -> Self {
        Self { mcp_tool, client }
    }
}

#[async_trait]
impl Tool for McpToolWrapper {
    fn name(&self) -> &str {
        &self.mcp_tool.name
    }

    fn description(&self) -> &str {
        &self.mcp_tool.description
    }

    fn schema(&self) -> Value {
        self.mcp_tool.input_schema.clone()
    }

    async fn execute(&self, ctx: Arc<dyn ToolContext>, params: Value) -> Result<ToolResponse> {
        tracing::debug!(
            invocation_id = %ctx.invocation_id(),
            client = %self.client.name(),
            tool = %self.mcp_tool.name,
            "Executing MCP tool"
        );

        let content = self
            .client
            .call_tool(&self.mcp_tool.name, params)
            .await
            .map_err(|e| Error::ToolFailed {
                tool: self.mcp_tool.name.clone(),
                source: anyhow::anyhow!(e),
            })?;

        Ok(ToolResponse {
            result: Value::Array(content),
        })
    }
}
