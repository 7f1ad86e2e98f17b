//! The remote capability seam
//!
//! The pool manager only needs four things from a remote server: connect,
//! list capabilities, invoke, release. Everything protocol specific lives
//! behind these traits.

use crate::connection::HttpConnectionParams;
use crate::types::{McpToolInfo, ToolContent};
use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

/// A single session with a remote MCP server
#[async_trait]
pub trait McpSession: Send + Sync {
    /// Establish the session
    async fn connect(&self) -> Result<()>;

    /// List the tools the server offers
    async fn list_tools(&self) -> Result<Vec<McpToolInfo>>;

    /// Invoke a tool on the server
    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Vec<ToolContent>>;

    /// Release the session and every resource attached to it.
    ///
    /// Must be safe to call on a session that never finished connecting.
    async fn cleanup(&self) -> Result<()>;
}

/// Creates unconnected sessions from connection parameters
pub trait McpConnector: Send + Sync {
    fn open(&self, params: &HttpConnectionParams) -> Result<Arc<dyn McpSession>>;
}
