//! Configuration management for Relay
//!
//! Loads configuration with priority:
//! 1. Specified config file
//! 2. relay.toml in the current directory or one of its parents
//!
//! String values of the form `${VAR_NAME}` in server URLs and headers are
//! resolved from the environment after parsing.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_FILE_NAME: &str = "relay.toml";

/// Converts a timeout given in seconds. Zero means "no timeout".
pub fn timeout_from_secs(value: f64) -> Option<Duration> {
    if value > 0.0 {
        Duration::try_from_secs_f64(value).ok()
    } else {
        None
    }
}

/// Relay configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RelayConfig {
    #[serde(default)]
    pub servers: Vec<ServerConfig>,

    #[serde(default)]
    pub agents: Vec<AgentTemplateConfig>,

    #[serde(default)]
    pub shutdown: ShutdownConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// A remote MCP server reachable over streamable HTTP
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub name: String,

    pub url: String,

    #[serde(default)]
    pub headers: HashMap<String, String>,

    /// Connect timeout in seconds
    #[serde(default = "default_connect_timeout")]
    pub timeout: f64,

    /// Read timeout for long-lived streams in seconds
    #[serde(default = "default_sse_read_timeout")]
    pub sse_read_timeout: f64,

    #[serde(default = "default_true")]
    pub terminate_on_close: bool,

    #[serde(default = "default_true")]
    pub cache_tools_list: bool,

    /// Provider-specific options passed through untouched
    #[serde(default)]
    pub extra: HashMap<String, toml::Value>,
}

/// An agent template registered with the factory at start-up
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentTemplateConfig {
    pub id: String,

    pub name: String,

    pub instructions: String,

    #[serde(default = "default_max_turns")]
    pub max_turns: u32,

    /// Names of the servers whose tools the agent may use
    #[serde(default)]
    pub servers: Vec<String>,
}

/// Shutdown behaviour of the connection pool
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownConfig {
    /// Cleanup timeout per client in seconds
    #[serde(default = "default_cleanup_timeout")]
    pub timeout_per_client: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,

    #[serde(default)]
    pub log_format: LogFormat,
}

impl ShutdownConfig {
    /// Per-client cleanup bound, `None` when cleanups may run to completion
    pub fn timeout(&self) -> Option<Duration> {
        timeout_from_secs(self.timeout_per_client)
    }
}

impl Default for ShutdownConfig {
    fn default() -> Self {
        Self {
            timeout_per_client: default_cleanup_timeout(),
        }
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: LogFormat::default(),
        }
    }
}

impl ServerConfig {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            headers: HashMap::new(),
            timeout: default_connect_timeout(),
            sse_read_timeout: default_sse_read_timeout(),
            terminate_on_close: true,
            cache_tools_list: true,
            extra: HashMap::new(),
        }
    }
}

impl RelayConfig {
    /// Load configuration from relay.toml found in the current directory
    /// or one of its parents
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: Option<&Path>) -> Result<Self> {
        let config_path = if let Some(p) = path {
            p.to_path_buf()
        } else {
            Self::find_config_file()?
        };

        tracing::debug!("Loading configuration from: {:?}", config_path);

        let contents = fs::read_to_string(&config_path)
            .with_context(|| format!("Failed to read config file: {:?}", config_path))?;

        Self::from_toml_str(&contents)
            .with_context(|| format!("Failed to parse config file: {:?}", config_path))
    }

    /// Parse configuration from TOML text and resolve `${VAR}` references
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let mut config: RelayConfig = toml::from_str(contents)?;
        config.resolve_env_vars();
        config.validate()?;
        Ok(config)
    }

    /// Find relay.toml by searching current directory and parents
    fn find_config_file() -> Result<PathBuf> {
        let mut current = env::current_dir()?;

        loop {
            let config_path = current.join(CONFIG_FILE_NAME);
            if config_path.exists() {
                return Ok(config_path);
            }

            if !current.pop() {
                break;
            }
        }

        Err(anyhow!(
            "{} not found. Create one or pass --config <PATH>",
            CONFIG_FILE_NAME
        ))
    }

    fn resolve_env_vars(&mut self) {
        for server in &mut self.servers {
            if let Some(resolved) = Self::resolve_env_var(&server.url) {
                server.url = resolved;
            }
            for value in server.headers.values_mut() {
                if let Some(resolved) = Self::resolve_env_var(value) {
                    *value = resolved;
                }
            }
        }
    }

    /// Replace every `${VAR_NAME}` reference with the variable's value.
    ///
    /// Returns `None` when a referenced variable is unset.
    fn resolve_env_var(value: &str) -> Option<String> {
        let mut resolved = String::with_capacity(value.len());
        let mut rest = value;

        while let Some(start) = rest.find("${") {
            let Some(len) = rest[start..].find('}') else {
                break;
            };
            let var_name = &rest[start + 2..start + len];
            resolved.push_str(&rest[..start]);
            resolved.push_str(&env::var(var_name).ok()?);
            rest = &rest[start + len + 1..];
        }

        resolved.push_str(rest);
        Some(resolved)
    }

    fn validate(&self) -> Result<()> {
        let mut seen = std::collections::HashSet::new();
        for server in &self.servers {
            if server.name.is_empty() {
                return Err(anyhow!("Server name must not be empty"));
            }
            if !seen.insert(server.name.as_str()) {
                return Err(anyhow!("Server '{}' is configured twice", server.name));
            }
            if server.timeout < 0.0 || server.sse_read_timeout < 0.0 {
                return Err(anyhow!(
                    "Server '{}' has a negative timeout",
                    server.name
                ));
            }
        }

        for agent in &self.agents {
            if agent.id.is_empty() {
                return Err(anyhow!("Agent id must not be empty"));
            }
            if agent.max_turns == 0 {
                return Err(anyhow!("Agent '{}' must allow at least one turn", agent.id));
            }
        }

        if self.shutdown.timeout_per_client < 0.0 {
            return Err(anyhow!("shutdown.timeout_per_client must not be negative"));
        }

        Ok(())
    }

    pub fn server(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.iter().find(|s| s.name == name)
    }
}

fn default_connect_timeout() -> f64 {
    5.0
}

fn default_sse_read_timeout() -> f64 {
    300.0
}

fn default_cleanup_timeout() -> f64 {
    5.0
}

fn default_max_turns() -> u32 {
    10
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}
