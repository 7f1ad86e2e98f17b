//! Agents exposed as tools to other agents

use crate::sink::StreamSink;
use async_trait::async_trait;
use futures::StreamExt;
use relay_core::{Agent, Error, Result, Tool, ToolContext, ToolResponse};
use relay_runner::{RunConfig, Runner, text_deltas};
use relay_tool::generate_schema;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::Value;
use std::sync::Arc;

/// Arguments accepted by an agent tool
#[derive(Debug, Deserialize, JsonSchema)]
pub struct AgentToolArgs {
    /// The task for the specialist agent, in plain language
    pub task: String,
}

/// Runs a sub-agent on a task and returns everything it streamed.
///
/// The result is the concatenation of the sub-agent's text deltas in
/// arrival order. A sub-agent that exceeds its turn limit fails the call
/// with the sub-agent's own [`Error::TurnLimitExceeded`].
pub struct AgentTool {
    name: String,
    description: String,
    runner: Runner,
    max_turns: u32,
    sink: Option<Arc<dyn StreamSink>>,
}

impl AgentTool {
    pub fn new(
        agent: Arc<dyn Agent>,
        name: impl Into<String>,
        description: impl Into<String>,
        max_turns: u32,
        sink: Option<Arc<dyn StreamSink>>,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(Error::config_error("Agent tool name is required"));
        }
        if max_turns == 0 {
            return Err(Error::config_error(format!(
                "Agent tool '{}' must allow at least one turn",
                name
            )));
        }

        let runner = Runner::builder().app_name(name.clone()).agent(agent).build()?;

        Ok(Self {
            name,
            description: description.into(),
            runner,
            max_turns,
            sink,
        })
    }

    pub fn agent(&self) -> &Arc<dyn Agent> {
        self.runner.agent()
    }

    pub fn max_turns(&self) -> u32 {
        self.max_turns
    }

    /// Run the wrapped agent on `task` and return its streamed text
    pub async fn call(&self, task: &str) -> Result<String> {
        let agent_name = self.runner.agent().name().to_string();
        tracing::info!(tool = %self.name, agent = %agent_name, max_turns = self.max_turns, "Delegating task");

        if let Some(sink) = &self.sink {
            sink.on_start(&agent_name, task);
        }

        let events = self
            .runner
            .run(task, RunConfig::default().max_turns(self.max_turns))
            .await;
        let mut deltas = text_deltas(events);

        let mut output = String::new();
        while let Some(delta) = deltas.next().await {
            let delta = delta?;
            if let Some(sink) = &self.sink {
                sink.on_delta(&agent_name, &delta);
            }
            output.push_str(&delta);
        }

        if let Some(sink) = &self.sink {
            sink.on_finish(&agent_name);
        }

        tracing::debug!(tool = %self.name, chars = output.len(), "Delegated task finished");
        Ok(output)
    }
}

#[async_trait]
impl Tool for AgentTool {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn schema(&self) -> Value {
        generate_schema::<AgentToolArgs>()
    }

    async fn execute(&self, _ctx: Arc<dyn ToolContext>, params: Value) -> Result<ToolResponse> {
        let args: AgentToolArgs = serde_json::from_value(params)?;
        let output = self.call(&args.task).await?;
        Ok(ToolResponse {
            result: Value::String(output),
        })
    }
}
