//! Streamable HTTP sessions using the rmcp SDK

use crate::connection::HttpConnectionParams;
use crate::session::{McpConnector, McpSession};
use crate::types::{McpToolInfo, ToolContent};
use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use rmcp::ServiceExt;
use rmcp::model::CallToolRequestParam;
use rmcp::service::{RoleClient, RunningService};
use rmcp::transport::StreamableHttpClientTransport;
use rmcp::transport::streamable_http_client::StreamableHttpClientTransportConfig;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;

/// Connector producing [`StreamableHttpSession`]s
#[derive(Debug, Clone, Default)]
pub struct StreamableHttpConnector;

impl McpConnector for StreamableHttpConnector {
    fn open(&self, params: &HttpConnectionParams) -> Result<Arc<dyn McpSession>> {
        Ok(Arc::new(StreamableHttpSession::new(params.clone())))
    }
}

/// MCP session over streamable HTTP
///
/// Wraps a `RunningService` from rmcp once connected.
pub struct StreamableHttpSession {
    params: HttpConnectionParams,
    service: RwLock<Option<RunningService<RoleClient, ()>>>,
}

impl StreamableHttpSession {
    pub fn new(params: HttpConnectionParams) -> Self {
        Self {
            params,
            service: RwLock::new(None),
        }
    }

    fn http_client(&self) -> Result<reqwest::Client> {
        let mut headers = HeaderMap::new();
        for (key, value) in &self.params.headers {
            let name = HeaderName::from_bytes(key.as_bytes())
                .with_context(|| format!("Invalid header name: {}", key))?;
            let value = HeaderValue::from_str(value)
                .with_context(|| format!("Invalid value for header {}", key))?;
            headers.insert(name, value);
        }

        let mut builder = reqwest::Client::builder().default_headers(headers);
        if let Some(timeout) = self.params.timeout {
            builder = builder.connect_timeout(timeout);
        }
        if let Some(timeout) = self.params.sse_read_timeout {
            builder = builder.read_timeout(timeout);
        }

        Ok(builder.build()?)
    }
}

#[async_trait]
impl McpSession for StreamableHttpSession {
    async fn connect(&self) -> Result<()> {
        tracing::debug!(
            url = %self.params.url,
            headers = self.params.headers.len(),
            extra = ?self.params.extra.keys().collect::<Vec<_>>(),
            "Initializing MCP session with rmcp SDK"
        );

        let transport = StreamableHttpClientTransport::with_client(
            self.http_client()?,
            StreamableHttpClientTransportConfig::with_uri(self.params.url.as_str()),
        );

        let service = ().serve(transport).await?;

        tracing::info!(
            url = %self.params.url,
            server_info = ?service.peer_info(),
            "MCP session initialized"
        );

        *self.service.write().await = Some(service);
        Ok(())
    }

    async fn list_tools(&self) -> Result<Vec<McpToolInfo>> {
        let guard = self.service.read().await;
        let service = guard
            .as_ref()
            .ok_or_else(|| anyhow!("MCP session not connected"))?;

        let response = service.list_tools(Default::default()).await?;

        let tools: Vec<McpToolInfo> = response
            .tools
            .into_iter()
            .map(|tool| McpToolInfo {
                name: tool.name.into_owned(),
                description: tool.description.map(|d| d.into_owned()).unwrap_or_default(),
                input_schema: Value::Object((*tool.input_schema).clone()),
            })
            .collect();

        tracing::debug!(count = tools.len(), "Retrieved tools from MCP server");

        Ok(tools)
    }

    async fn call_tool(&self, name: &str, arguments: Value) -> Result<Vec<ToolContent>> {
        let guard = self.service.read().await;
        let service = guard
            .as_ref()
            .ok_or_else(|| anyhow!("MCP session not connected"))?;

        let params = CallToolRequestParam {
            name: name.to_string().into(),
            arguments: arguments.as_object().cloned(),
        };

        let response = service.call_tool(params).await?;

        response
            .content
            .into_iter()
            .map(|c| serde_json::to_value(c).map_err(Into::into))
            .collect()
    }

    async fn cleanup(&self) -> Result<()> {
        let Some(service) = self.service.write().await.take() else {
            return Ok(());
        };

        if self.params.terminate_on_close {
            // Wait for the transport worker to close the session on the server.
            let reason = service.cancel().await?;
            tracing::debug!(url = %self.params.url, reason = ?reason, "MCP session closed");
        } else {
            drop(service);
        }

        Ok(())
    }
}
