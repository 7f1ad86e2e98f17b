//! Span helpers for tool executions and connection lifecycle

use crate::attributes::*;

/// Attributes for tracing a tool call
#[derive(Debug, Clone)]
pub struct ToolSpanAttributes {
    pub tool_name: String,
    pub tool_call_id: String,
    pub invocation_id: String,
    pub args_json: String,
    pub response_json: String,
}

/// Record a span for a finished tool execution.
pub fn trace_tool_call(attrs: ToolSpanAttributes) {
    let span = tracing::info_span!(
        "execute_tool",
        system = SYSTEM_NAME,
        { RELAY_TOOL_NAME } = %attrs.tool_name,
        { RELAY_TOOL_CALL_ID } = %attrs.tool_call_id,
        { RELAY_INVOCATION_ID } = %attrs.invocation_id,
        { RELAY_TOOL_ARGS } = %attrs.args_json,
        { RELAY_TOOL_RESPONSE } = %attrs.response_json,
    );

    let _guard = span.enter();
}

/// Span covering the lifetime operations (connect, cleanup) of one client
pub fn connection_span(name: &str, url: &str) -> tracing::Span {
    tracing::info_span!(
        "mcp_client",
        system = SYSTEM_NAME,
        { RELAY_CLIENT_NAME } = %name,
        { RELAY_CLIENT_URL } = %url,
    )
}
