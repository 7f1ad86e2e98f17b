//! Attribute names recorded on Relay spans

pub const SYSTEM_NAME: &str = "relay";

pub const RELAY_CLIENT_NAME: &str = "relay.client.name";
pub const RELAY_CLIENT_URL: &str = "relay.client.url";
pub const RELAY_INVOCATION_ID: &str = "relay.invocation_id";
pub const RELAY_TOOL_NAME: &str = "relay.tool.name";
pub const RELAY_TOOL_CALL_ID: &str = "relay.tool.call_id";
pub const RELAY_TOOL_ARGS: &str = "relay.tool.args";
pub const RELAY_TOOL_RESPONSE: &str = "relay.tool.response";
