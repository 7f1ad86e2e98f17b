use crate::builder::LLMAgentBuilder;
use async_stream::stream;
use async_trait::async_trait;
use futures::stream::{Stream, StreamExt};
use relay_core::{
    Agent, Content, Error, Event, FunctionCall, FunctionResponse, InvocationContext, LLM,
    LLMRequest, Part, Result, Tool, ToolDeclaration, Toolset,
};
use relay_telemetry::{ToolSpanAttributes, trace_tool_call};
use relay_tool::DefaultToolContext;
use std::collections::HashMap;
use std::sync::Arc;

/// Turn cap applied when neither the run nor the agent sets one
pub const DEFAULT_MAX_TURNS: u32 = 10;

/// Agent driving a model through a tool-calling loop.
///
/// Each model call is one turn. Tools come from the agent's own tool list
/// and from its toolsets, which are loaded at the start of every run. The
/// run fails with [`Error::TurnLimitExceeded`] when the model still wants
/// another turn after the limit is used up.
pub struct LLMAgent {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) model: Arc<dyn LLM>,
    pub(crate) system_instruction: Option<String>,
    pub(crate) tools: HashMap<String, Arc<dyn Tool>>,
    pub(crate) toolsets: Vec<Arc<dyn Toolset>>,
    pub(crate) max_turns: Option<u32>,
}

impl LLMAgent {
    pub fn builder() -> LLMAgentBuilder {
        LLMAgentBuilder::new()
    }

    pub fn system_instruction(&self) -> Option<&str> {
        self.system_instruction.as_deref()
    }

    pub fn max_turns(&self) -> Option<u32> {
        self.max_turns
    }

    pub fn model(&self) -> &Arc<dyn LLM> {
        &self.model
    }

    /// Names of the directly attached tools, sorted
    pub fn tool_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tools.keys().cloned().collect();
        names.sort();
        names
    }

    pub fn toolsets(&self) -> &[Arc<dyn Toolset>] {
        &self.toolsets
    }
}

impl std::fmt::Debug for LLMAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LLMAgent")
            .field("name", &self.name)
            .field("model", &self.model.name())
            .field("tools", &self.tool_names())
            .field("toolsets", &self.toolsets.len())
            .field("max_turns", &self.max_turns)
            .finish()
    }
}

/// Load tools from all toolsets concurrently.
///
/// A toolset that fails to load is logged and skipped.
async fn load_toolsets(
    toolsets: &[Arc<dyn Toolset>],
    ctx: &Arc<dyn InvocationContext>,
) -> Vec<Arc<dyn Tool>> {
    let loads = toolsets.iter().map(|toolset| {
        let ctx = ctx.clone();
        async move {
            match toolset.get_tools(&*ctx).await {
                Ok(tools) => {
                    tracing::info!(
                        invocation_id = %ctx.invocation_id(),
                        toolset = %toolset.name(),
                        count = tools.len(),
                        "Loaded tools from toolset"
                    );
                    tools
                }
                Err(e) => {
                    tracing::error!(
                        invocation_id = %ctx.invocation_id(),
                        toolset = %toolset.name(),
                        error = %e,
                        "Failed to load toolset"
                    );
                    Vec::new()
                }
            }
        }
    });

    futures::future::join_all(loads)
        .await
        .into_iter()
        .flatten()
        .collect()
}

fn declarations(tools: &HashMap<String, Arc<dyn Tool>>) -> Vec<ToolDeclaration> {
    let mut declarations: Vec<ToolDeclaration> = tools.values().map(|t| t.declaration()).collect();
    declarations.sort_by(|a, b| a.name.cmp(&b.name));
    declarations
}

#[async_trait]
impl Agent for LLMAgent {
    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn run(
        &self,
        ctx: Arc<dyn InvocationContext>,
    ) -> Box<dyn Stream<Item = Result<Event>> + Send + Unpin> {
        let model = self.model.clone();
        let agent_name = self.name.clone();
        let system_instruction = self.system_instruction.clone();
        let invocation_id = ctx.invocation_id().to_string();
        let max_turns = ctx
            .max_turns()
            .or(self.max_turns)
            .unwrap_or(DEFAULT_MAX_TURNS);
        let mut tools = self.tools.clone();
        let toolsets = self.toolsets.clone();

        Box::new(Box::pin(stream! {
            // Directly attached tools win over toolset tools of the same name.
            for tool in load_toolsets(&toolsets, &ctx).await {
                tools.entry(tool.name().to_string()).or_insert(tool);
            }

            let mut conversation: Vec<Content> = ctx.user_content().cloned().into_iter().collect();

            tracing::info!(
                invocation_id = %invocation_id,
                agent = %agent_name,
                max_turns,
                tools = tools.len(),
                "Starting LLM agent execution"
            );

            let mut turn: u32 = 0;
            loop {
                if turn >= max_turns {
                    tracing::warn!(
                        invocation_id = %invocation_id,
                        agent = %agent_name,
                        max_turns,
                        "Turn limit exceeded"
                    );
                    yield Err(Error::TurnLimitExceeded {
                        agent: agent_name.clone(),
                        max_turns,
                    });
                    return;
                }
                turn += 1;

                let request = LLMRequest {
                    model: model.name().to_string(),
                    system_instruction: system_instruction.clone(),
                    contents: conversation.clone(),
                    config: None,
                    tools: declarations(&tools),
                };

                tracing::debug!(
                    invocation_id = %invocation_id,
                    model = %request.model,
                    turn,
                    "Calling LLM"
                );

                let mut llm_stream = model.generate_content(request, true).await;
                let mut final_content: Option<Content> = None;
                let mut function_calls: Vec<FunctionCall> = Vec::new();

                while let Some(llm_result) = llm_stream.next().await {
                    let llm_response = match llm_result {
                        Ok(response) => response,
                        Err(e) => {
                            tracing::error!(
                                invocation_id = %invocation_id,
                                error = %e,
                                "LLM call failed"
                            );
                            yield Err(e);
                            return;
                        }
                    };

                    let mut event = Event::new(invocation_id.clone(), agent_name.clone());
                    event.content = llm_response.content.clone();
                    event.partial = llm_response.partial;
                    event.turn_complete = llm_response.turn_complete;
                    if let Some(code) = llm_response.error_code {
                        event.error_code = code;
                    }
                    if let Some(message) = llm_response.error_message {
                        event.error_message = message;
                    }

                    // Partial chunks only carry deltas; the final response
                    // holds the whole turn.
                    if !llm_response.partial {
                        if let Some(content) = llm_response.content {
                            function_calls.extend(content.function_calls().cloned());
                            final_content = Some(content);
                        }
                    }

                    yield Ok(event);
                }

                if let Some(content) = final_content {
                    conversation.push(content);
                }

                if function_calls.is_empty() {
                    tracing::info!(
                        invocation_id = %invocation_id,
                        agent = %agent_name,
                        turns = turn,
                        "Agent execution completed"
                    );
                    break;
                }

                let mut function_responses = Vec::with_capacity(function_calls.len());
                for call in function_calls {
                    let call_id = call
                        .id
                        .clone()
                        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

                    let outcome = match tools.get(&call.name) {
                        Some(tool) => {
                            tracing::debug!(
                                invocation_id = %invocation_id,
                                tool_name = %call.name,
                                tool_id = %call_id,
                                "Executing tool"
                            );
                            let tool_ctx = Arc::new(DefaultToolContext::new(
                                call_id.clone(),
                                invocation_id.clone(),
                            ));
                            tool.execute(tool_ctx, call.args.clone()).await
                        }
                        None => Err(Error::message(format!("Tool {} not found", call.name))),
                    };

                    let response = match outcome {
                        Ok(response) => {
                            trace_tool_call(ToolSpanAttributes {
                                tool_name: call.name.clone(),
                                tool_call_id: call_id.clone(),
                                invocation_id: invocation_id.clone(),
                                args_json: call.args.to_string(),
                                response_json: response.result.to_string(),
                            });
                            response.result
                        }
                        // A sub-agent hitting its own limit ends this run too.
                        Err(e) if e.is_turn_limit() => {
                            yield Err(e);
                            return;
                        }
                        Err(e) => {
                            let mut error_event = Event::new(invocation_id.clone(), agent_name.clone());
                            error_event.error_code = "TOOL_ERROR".to_string();
                            error_event.error_message = format!("Tool {} failed: {}", call.name, e);
                            yield Ok(error_event);
                            serde_json::json!({ "error": e.to_string() })
                        }
                    };

                    let part = Part::FunctionResponse {
                        function_response: FunctionResponse {
                            name: call.name,
                            response,
                            id: Some(call_id),
                        },
                    };

                    let mut tool_event = Event::new(invocation_id.clone(), agent_name.clone());
                    tool_event.content = Some(Content {
                        role: "function".to_string(),
                        parts: vec![part.clone()],
                    });
                    yield Ok(tool_event);

                    function_responses.push(part);
                }

                conversation.push(Content {
                    role: "function".to_string(),
                    parts: function_responses,
                });
            }
        }))
    }
}
