//! Shared test utilities for agent testing
//!
//! Scripted models and agents reused across the unit and integration tests.

use crate::sink::StreamSink;
use async_stream::stream;
use async_trait::async_trait;
use futures::stream::Stream;
use relay_core::{
    Agent, Content, Error, Event, FunctionCall, InvocationContext, LLM, LLMRequest, LLMResponse,
    Part, Result,
};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// One model turn: the responses streamed back for a single request
#[derive(Debug, Clone)]
pub struct MockTurn {
    responses: Vec<LLMResponse>,
}

impl MockTurn {
    /// Stream `chunks` as partial deltas, then the aggregated final response
    pub fn text(chunks: &[&str]) -> Self {
        let mut responses: Vec<LLMResponse> = chunks
            .iter()
            .map(|chunk| LLMResponse {
                content: Some(Content::new_model_text(*chunk)),
                partial: true,
                ..Default::default()
            })
            .collect();

        responses.push(LLMResponse {
            content: Some(Content::new_model_text(chunks.concat())),
            partial: false,
            turn_complete: true,
            finish_reason: Some("STOP".to_string()),
            ..Default::default()
        });

        Self { responses }
    }

    /// Ask for a single tool call
    pub fn tool_call(name: &str, args: serde_json::Value) -> Self {
        Self {
            responses: vec![LLMResponse {
                content: Some(Content {
                    role: "model".to_string(),
                    parts: vec![Part::FunctionCall {
                        function_call: FunctionCall {
                            name: name.to_string(),
                            args,
                            id: None,
                        },
                    }],
                }),
                partial: false,
                turn_complete: false,
                ..Default::default()
            }],
        }
    }
}

/// Mock LLM replaying scripted turns
///
/// Once the script is exhausted every further request gets the fallback
/// turn (by default a single "Test response" delta).
pub struct MockLLM {
    turns: Mutex<VecDeque<MockTurn>>,
    fallback: MockTurn,
    requests: Mutex<Vec<LLMRequest>>,
}

impl MockLLM {
    pub fn new() -> Self {
        Self::scripted(Vec::new())
    }

    pub fn scripted(turns: Vec<MockTurn>) -> Self {
        Self {
            turns: Mutex::new(turns.into()),
            fallback: MockTurn::text(&["Test response"]),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Answer every request with the same turn
    pub fn always(turn: MockTurn) -> Self {
        let mut llm = Self::new();
        llm.fallback = turn;
        llm
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<LLMRequest> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

impl Default for MockLLM {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LLM for MockLLM {
    fn name(&self) -> &str {
        "mock"
    }

    async fn generate_content(
        &self,
        request: LLMRequest,
        _stream: bool,
    ) -> Box<dyn Stream<Item = Result<LLMResponse>> + Send + Unpin> {
        self.requests
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request);

        let turn = self
            .turns
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        Box::new(Box::pin(stream! {
            for response in turn.responses {
                yield Ok(response);
            }
        }))
    }
}

/// Mock Agent streaming fixed deltas, optionally failing at the turn limit
pub struct MockAgent {
    name: String,
    deltas: Vec<String>,
    turn_limit_after: Option<usize>,
}

impl MockAgent {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            deltas: vec!["Mock agent response".to_string()],
            turn_limit_after: None,
        }
    }

    pub fn with_deltas(mut self, deltas: &[&str]) -> Self {
        self.deltas = deltas.iter().map(|d| d.to_string()).collect();
        self
    }

    /// Emit this many deltas, then fail with `TurnLimitExceeded`
    pub fn with_turn_limit_after(mut self, deltas: usize) -> Self {
        self.turn_limit_after = Some(deltas);
        self
    }
}

#[async_trait]
impl Agent for MockAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        "Mock agent for testing"
    }

    async fn run(
        &self,
        ctx: Arc<dyn InvocationContext>,
    ) -> Box<dyn Stream<Item = Result<Event>> + Send + Unpin> {
        let deltas = self.deltas.clone();
        let turn_limit_after = self.turn_limit_after;
        let max_turns = ctx.max_turns().unwrap_or_default();
        let invocation_id = ctx.invocation_id().to_string();
        let name = self.name.clone();

        Box::new(Box::pin(stream! {
            let emitted = turn_limit_after.unwrap_or(usize::MAX);
            for delta in deltas.into_iter().take(emitted) {
                let mut event = Event::new(invocation_id.clone(), name.clone());
                event.partial = true;
                event.content = Some(Content::new_model_text(delta));
                yield Ok(event);
            }

            if turn_limit_after.is_some() {
                yield Err(Error::TurnLimitExceeded { agent: name.clone(), max_turns });
                return;
            }

            let mut event = Event::new(invocation_id, name);
            event.turn_complete = true;
            yield Ok(event);
        }))
    }
}

/// Sink recording everything it observes
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<String>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<String> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    fn push(&self, entry: String) {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }
}

impl StreamSink for CollectingSink {
    fn on_start(&self, agent: &str, task: &str) {
        self.push(format!("start:{}:{}", agent, task));
    }

    fn on_delta(&self, agent: &str, delta: &str) {
        self.push(format!("delta:{}:{}", agent, delta));
    }

    fn on_finish(&self, agent: &str) {
        self.push(format!("finish:{}", agent));
    }
}
