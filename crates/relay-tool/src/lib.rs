//! Tool building blocks for Relay
//!
//! - Function tools backed by async closures
//! - JSON schema helpers for tool parameters
//! - The default tool execution context

pub mod context;
pub mod function_tool;
pub mod schema;

// Re-exports
pub use context::DefaultToolContext;
pub use function_tool::{FunctionTool, FunctionToolBuilder};
pub use schema::generate_schema;

// Re-export core types
pub use relay_core::{Result, Tool, ToolContext, ToolResponse};
