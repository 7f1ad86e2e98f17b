//! Agents for Relay
//!
//! - [`LLMAgent`]: a model-driven agent using MCP toolsets and plain tools
//! - [`AgentRegistry`]: named agent templates
//! - [`AgentFactory`]: builds agents from templates, wraps agents as tools
//!   and composes orchestrators over them

pub mod agent_tool;
pub mod builder;
pub mod factory;
pub mod llm_agent;
pub mod registry;
pub mod sink;
pub mod template;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use agent_tool::AgentTool;
pub use builder::LLMAgentBuilder;
pub use factory::{AgentFactory, ToolAgent};
pub use llm_agent::{DEFAULT_MAX_TURNS, LLMAgent};
pub use registry::{AgentRegistry, BuiltinServers};
pub use sink::{StdoutSink, StreamSink};
pub use template::AgentConfig;
