//! Connection handle owned by the client manager

use crate::connection::HttpConnectionParams;
use crate::session::McpSession;
use crate::types::{McpToolInfo, ToolContent};
use anyhow::anyhow;
use relay_core::{Error, Result};
use serde_json::Value;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Lifecycle of a connection handle.
///
/// `Pending -> Connected -> Closing -> Removed`. A handle is never removed
/// without passing through `Closing`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Pending,
    Connected,
    Closing,
    Removed,
}

/// A named, established session with a remote MCP server
pub struct McpClient {
    name: String,
    params: HttpConnectionParams,
    session: Arc<dyn McpSession>,
    state: Mutex<ConnectionState>,
    tools_cache: tokio::sync::Mutex<Option<Vec<McpToolInfo>>>,
}

impl McpClient {
    pub(crate) fn new(
        name: String,
        params: HttpConnectionParams,
        session: Arc<dyn McpSession>,
    ) -> Self {
        Self {
            name,
            params,
            session,
            state: Mutex::new(ConnectionState::Pending),
            tools_cache: tokio::sync::Mutex::new(None),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.params.url
    }

    pub fn params(&self) -> &HttpConnectionParams {
        &self.params
    }

    pub fn state(&self) -> ConnectionState {
        *self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub(crate) fn session(&self) -> Arc<dyn McpSession> {
        self.session.clone()
    }

    fn set_state(&self, next: ConnectionState) -> ConnectionState {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let previous = *state;
        *state = next;
        tracing::debug!(
            client = %self.name,
            from = ?previous,
            to = ?next,
            "Connection state changed"
        );
        previous
    }

    /// Connect the underlying session, bounded by the connect timeout
    pub(crate) async fn connect(&self) -> anyhow::Result<()> {
        let connect = self.session.connect();
        match self.params.timeout {
            Some(limit) => tokio::time::timeout(limit, connect)
                .await
                .map_err(|_| anyhow!("connect timed out after {:?}", limit))??,
            None => connect.await?,
        }
        self.set_state(ConnectionState::Connected);
        Ok(())
    }

    pub(crate) fn begin_close(&self) {
        self.set_state(ConnectionState::Closing);
    }

    pub(crate) fn finish_close(&self) {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if *state == ConnectionState::Closing {
            *state = ConnectionState::Removed;
            tracing::debug!(client = %self.name, "Connection removed");
        }
    }

    fn ensure_connected(&self) -> Result<()> {
        match self.state() {
            ConnectionState::Connected => Ok(()),
            state => Err(Error::message(format!(
                "Client '{}' is not connected ({:?})",
                self.name, state
            ))),
        }
    }

    /// List the server's tools, served from cache after the first fetch when
    /// `cache_tools_list` is set
    pub async fn list_tools(&self) -> Result<Vec<McpToolInfo>> {
        self.ensure_connected()?;

        if !self.params.cache_tools_list {
            return Ok(self.session.list_tools().await?);
        }

        let mut cache = self.tools_cache.lock().await;
        if let Some(tools) = cache.as_ref() {
            return Ok(tools.clone());
        }

        let tools = self.session.list_tools().await?;
        tracing::debug!(client = %self.name, count = tools.len(), "Cached tools list");
        *cache = Some(tools.clone());
        Ok(tools)
    }

    /// Forget the cached tools list so the next call fetches it again
    pub async fn invalidate_tools_cache(&self) {
        *self.tools_cache.lock().await = None;
    }

    /// Call a tool on the server
    pub async fn call_tool(&self, name: &str, arguments: Value) -> Result<Vec<ToolContent>> {
        self.ensure_connected()?;
        tracing::debug!(client = %self.name, tool = %name, "Calling MCP tool");
        Ok(self.session.call_tool(name, arguments).await?)
    }
}

impl fmt::Debug for McpClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("McpClient")
            .field("name", &self.name)
            .field("url", &self.params.url)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockSession;

    fn client(session: Arc<MockSession>, params: HttpConnectionParams) -> McpClient {
        McpClient::new("math".to_string(), params, session)
    }

    #[tokio::test]
    async fn test_connect_moves_to_connected() {
        let session = Arc::new(MockSession::new());
        let client = client(session, HttpConnectionParams::new("http://math/mcp"));

        assert_eq!(client.state(), ConnectionState::Pending);
        client.connect().await.unwrap();
        assert_eq!(client.state(), ConnectionState::Connected);
    }

    #[tokio::test(start_paused = true)]
    async fn test_connect_timeout() {
        let session = Arc::new(
            MockSession::new().with_connect_delay(std::time::Duration::from_secs(30)),
        );
        let client = client(session, HttpConnectionParams::new("http://math/mcp"));

        let err = client.connect().await.unwrap_err();
        assert!(err.to_string().contains("timed out"));
        assert_eq!(client.state(), ConnectionState::Pending);
    }

    #[tokio::test]
    async fn test_tools_list_is_cached() {
        let session = Arc::new(MockSession::new().with_tools(&["add", "multiply"]));
        let client = client(session.clone(), HttpConnectionParams::new("http://math/mcp"));
        client.connect().await.unwrap();

        assert_eq!(client.list_tools().await.unwrap().len(), 2);
        assert_eq!(client.list_tools().await.unwrap().len(), 2);
        assert_eq!(session.list_calls(), 1);

        client.invalidate_tools_cache().await;
        client.list_tools().await.unwrap();
        assert_eq!(session.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_tools_list_uncached() {
        let session = Arc::new(MockSession::new().with_tools(&["add"]));
        let client = client(
            session.clone(),
            HttpConnectionParams::new("http://math/mcp").cache_tools_list(false),
        );
        client.connect().await.unwrap();

        client.list_tools().await.unwrap();
        client.list_tools().await.unwrap();
        assert_eq!(session.list_calls(), 2);
    }

    #[tokio::test]
    async fn test_calls_rejected_when_not_connected() {
        let session = Arc::new(MockSession::new().with_tools(&["add"]));
        let client = client(session, HttpConnectionParams::new("http://math/mcp"));

        assert!(client.list_tools().await.is_err());
        assert!(
            client
                .call_tool("add", serde_json::json!({"a": 1, "b": 2}))
                .await
                .is_err()
        );
    }

    #[test]
    fn test_finish_close_requires_closing() {
        let session = Arc::new(MockSession::new());
        let client = client(session, HttpConnectionParams::new("http://math/mcp"));

        client.finish_close();
        assert_eq!(client.state(), ConnectionState::Pending);

        client.begin_close();
        client.finish_close();
        assert_eq!(client.state(), ConnectionState::Removed);
    }
}
