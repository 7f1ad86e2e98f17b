//! Core traits and types for Relay
//!
//! This crate provides the shared abstractions used by the connection pool,
//! the agent factory and the runner: errors, content, events, contexts and
//! the `Agent` / `LLM` / `Tool` / `Toolset` traits.

pub mod config;
pub mod content;
pub mod context;
pub mod error;
pub mod event;
pub mod traits;

// Re-exports
pub use config::{
    AgentTemplateConfig, LogFormat, ObservabilityConfig, RelayConfig, ServerConfig,
    ShutdownConfig, timeout_from_secs,
};
pub use content::{Content, FunctionCall, FunctionResponse, Part};
pub use context::{InvocationContext, ReadonlyContext, ToolContext};
pub use error::{Error, Result};
pub use event::{Event, EventActions};
pub use traits::{
    Agent, GenerateConfig, LLM, LLMRequest, LLMResponse, Tool, ToolDeclaration, ToolResponse,
    Toolset,
};
