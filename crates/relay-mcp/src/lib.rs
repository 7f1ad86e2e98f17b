//! MCP (Model Context Protocol) connection pool for Relay
//!
//! This crate keeps named connections to remote MCP servers, exposes their
//! tools to agents, and tears connections down with shielded cleanup that
//! survives caller cancellation and is bounded by a timeout.

pub mod client;
pub mod connection;
pub mod manager;
pub mod session;
pub mod shield;
pub mod streamable_http;
#[cfg(any(test, feature = "testing"))]
pub mod testing;
pub mod tool_wrapper;
pub mod toolset;
pub mod types;

// Re-exports
pub use client::{ConnectionState, McpClient};
pub use connection::HttpConnectionParams;
pub use manager::{McpClientManager, StopOptions};
pub use session::{McpConnector, McpSession};
pub use shield::{CleanupOutcome, shielded_cleanup};
pub use streamable_http::{StreamableHttpConnector, StreamableHttpSession};
pub use tool_wrapper::McpToolWrapper;
pub use toolset::McpToolset;
pub use types::{McpToolInfo, ToolContent};
