//! In-memory MCP sessions for tests
//!
//! `MockConnector` hands out `MockSession`s whose connect and cleanup
//! behaviour (delay, failure) can be configured per URL.

use crate::connection::HttpConnectionParams;
use crate::session::{McpConnector, McpSession};
use crate::types::{McpToolInfo, ToolContent};
use anyhow::{Result, anyhow};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Scriptable MCP session
#[derive(Default)]
pub struct MockSession {
    tools: Vec<McpToolInfo>,
    connect_delay: Option<Duration>,
    connect_error: Option<String>,
    cleanup_delay: Option<Duration>,
    cleanup_error: Option<String>,
    connected: AtomicBool,
    list_calls: AtomicUsize,
    cleanup_started: AtomicUsize,
    cleanup_finished: AtomicUsize,
}

impl MockSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Offer tools with the given names
    pub fn with_tools(mut self, names: &[&str]) -> Self {
        self.tools = names
            .iter()
            .map(|name| McpToolInfo {
                name: name.to_string(),
                description: format!("Mock tool {}", name),
                input_schema: serde_json::json!({"type": "object", "properties": {}}),
            })
            .collect();
        self
    }

    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    pub fn with_connect_error(mut self, message: impl Into<String>) -> Self {
        self.connect_error = Some(message.into());
        self
    }

    pub fn with_cleanup_delay(mut self, delay: Duration) -> Self {
        self.cleanup_delay = Some(delay);
        self
    }

    pub fn with_cleanup_error(mut self, message: impl Into<String>) -> Self {
        self.cleanup_error = Some(message.into());
        self
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Number of times the server was asked for its tools
    pub fn list_calls(&self) -> usize {
        self.list_calls.load(Ordering::SeqCst)
    }

    pub fn cleanup_started(&self) -> usize {
        self.cleanup_started.load(Ordering::SeqCst)
    }

    /// Number of cleanups that ran to their end, successful or not
    pub fn cleanup_finished(&self) -> usize {
        self.cleanup_finished.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl McpSession for MockSession {
    async fn connect(&self) -> Result<()> {
        if let Some(delay) = self.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if let Some(message) = &self.connect_error {
            return Err(anyhow!("{}", message));
        }
        self.connected.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<McpToolInfo>> {
        self.list_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.tools.clone())
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Vec<ToolContent>> {
        if !self.tools.iter().any(|t| t.name == name) {
            return Err(anyhow!("Unknown tool: {}", name));
        }
        Ok(vec![serde_json::json!({
            "type": "text",
            "text": format!("{}({})", name, arguments),
        })])
    }

    async fn cleanup(&self) -> Result<()> {
        self.cleanup_started.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.cleanup_delay {
            tokio::time::sleep(delay).await;
        }
        self.connected.store(false, Ordering::SeqCst);
        self.cleanup_finished.fetch_add(1, Ordering::SeqCst);
        match &self.cleanup_error {
            Some(message) => Err(anyhow!("{}", message)),
            None => Ok(()),
        }
    }
}

/// Connector returning pre-registered sessions by URL
#[derive(Default)]
pub struct MockConnector {
    sessions: Mutex<HashMap<String, Arc<MockSession>>>,
    opened: Mutex<Vec<(String, Arc<MockSession>)>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `session` for connections to `url`; other URLs get a default session
    pub fn with_session(self, url: impl Into<String>, session: MockSession) -> Self {
        self.sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(url.into(), Arc::new(session));
        self
    }

    /// Every session opened so far, in order, with the URL it was opened for
    pub fn opened(&self) -> Vec<(String, Arc<MockSession>)> {
        self.opened
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// The most recent session opened for `url`
    pub fn session_for(&self, url: &str) -> Option<Arc<MockSession>> {
        self.opened()
            .into_iter()
            .rev()
            .find(|(opened_url, _)| opened_url == url)
            .map(|(_, session)| session)
    }
}

impl McpConnector for MockConnector {
    fn open(&self, params: &HttpConnectionParams) -> Result<Arc<dyn McpSession>> {
        let session = self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&params.url)
            .unwrap_or_else(|| Arc::new(MockSession::new()));

        self.opened
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push((params.url.clone(), session.clone()));

        Ok(session)
    }
}
