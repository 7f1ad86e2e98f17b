use super::Content;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Event represents a single step of an agent run.
///
/// Partial events carry incremental model text (deltas); the non-partial
/// event that follows carries the aggregated content of the same turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    pub id: String,
    pub time: i64,
    pub invocation_id: String,
    pub author: String,
    pub partial: bool,
    pub turn_complete: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<Content>,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub error_code: String,

    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub error_message: String,

    pub actions: EventActions,
}

impl Event {
    pub fn new(invocation_id: String, author: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            time: Utc::now().timestamp(),
            invocation_id,
            author,
            partial: false,
            turn_complete: false,
            content: None,
            error_code: String::new(),
            error_message: String::new(),
            actions: EventActions::default(),
        }
    }

    pub fn is_final_response(&self) -> bool {
        !self.partial && self.turn_complete
    }

    /// Text increment carried by a partial model event
    pub fn text_delta(&self) -> Option<String> {
        if !self.partial {
            return None;
        }
        self.content.as_ref().and_then(|c| c.text())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EventActions {
    pub state_delta: HashMap<String, serde_json::Value>,
    #[serde(default)]
    pub escalate: bool,
}
