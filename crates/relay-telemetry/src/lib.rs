//! Logging and tracing for Relay
//!
//! Installs a `tracing` subscriber configured from [`ObservabilityConfig`]
//! and provides span helpers with stable attribute names.

pub mod attributes;
pub mod spans;
pub mod tracer;

pub use relay_core::ObservabilityConfig;
pub use spans::{ToolSpanAttributes, connection_span, trace_tool_call};
pub use tracer::{init_telemetry, is_initialized};
