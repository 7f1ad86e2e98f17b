//! Connection parameters for MCP servers

use relay_core::{ServerConfig, timeout_from_secs};
use std::collections::HashMap;
use std::time::Duration;

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_SSE_READ_TIMEOUT: Duration = Duration::from_secs(300);

/// Parameters for connecting to an MCP server over streamable HTTP
#[derive(Debug, Clone)]
pub struct HttpConnectionParams {
    pub url: String,
    pub headers: HashMap<String, String>,
    /// Connect timeout; `None` waits indefinitely
    pub timeout: Option<Duration>,
    /// Read timeout for long-lived streams; `None` disables it
    pub sse_read_timeout: Option<Duration>,
    /// Send a session termination to the server on close
    pub terminate_on_close: bool,
    /// Cache the tools list after the first fetch
    pub cache_tools_list: bool,
    /// Provider-specific options, passed to the connector untouched
    pub extra: HashMap<String, serde_json::Value>,
}

impl HttpConnectionParams {
    /// Create connection parameters for the given URL with default options
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: HashMap::new(),
            timeout: Some(DEFAULT_CONNECT_TIMEOUT),
            sse_read_timeout: Some(DEFAULT_SSE_READ_TIMEOUT),
            terminate_on_close: true,
            cache_tools_list: true,
            extra: HashMap::new(),
        }
    }

    /// Build parameters from a `[[servers]]` entry
    pub fn from_config(config: &ServerConfig) -> Self {
        let extra = config
            .extra
            .iter()
            .filter_map(|(key, value)| {
                serde_json::to_value(value)
                    .ok()
                    .map(|value| (key.clone(), value))
            })
            .collect();

        Self {
            url: config.url.clone(),
            headers: config.headers.clone(),
            timeout: timeout_from_secs(config.timeout),
            sse_read_timeout: timeout_from_secs(config.sse_read_timeout),
            terminate_on_close: config.terminate_on_close,
            cache_tools_list: config.cache_tools_list,
            extra,
        }
    }

    /// Add an HTTP header sent with every request
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(key.into(), value.into());
        self
    }

    pub fn timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn sse_read_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.sse_read_timeout = timeout;
        self
    }

    pub fn terminate_on_close(mut self, terminate: bool) -> Self {
        self.terminate_on_close = terminate;
        self
    }

    pub fn cache_tools_list(mut self, cache: bool) -> Self {
        self.cache_tools_list = cache;
        self
    }

    /// Add a provider-specific option
    pub fn extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }
}
