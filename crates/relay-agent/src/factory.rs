//! Builds agents from templates and composes orchestrators over them

use crate::agent_tool::AgentTool;
use crate::llm_agent::{DEFAULT_MAX_TURNS, LLMAgent};
use crate::registry::{AgentRegistry, BuiltinServers};
use crate::sink::{StdoutSink, StreamSink};
use crate::template::AgentConfig;
use relay_core::{Agent, Error, LLM, RelayConfig, Result, Tool, Toolset};
use relay_mcp::{McpClientManager, McpToolset};
use std::collections::HashSet;
use std::sync::Arc;

pub const ORCHESTRATOR_NAME: &str = "Data Processing Orchestrator";

/// Naming convention for agent tools: `<agent type><suffix>`
pub const TOOL_NAME_SUFFIX: &str = "_operations";

/// An agent to expose to an orchestrator under an invocable name
#[derive(Clone)]
pub struct ToolAgent {
    pub agent: Arc<dyn Agent>,
    pub tool_name: String,
    pub description: String,
    /// Turn cap for the sub-agent; resolved from the registry when unset
    pub max_turns: Option<u32>,
}

impl ToolAgent {
    pub fn new(
        agent: Arc<dyn Agent>,
        tool_name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            agent,
            tool_name: tool_name.into(),
            description: description.into(),
            max_turns: None,
        }
    }

    pub fn max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }
}

/// Creates specialist agents from registered templates and wires them
/// under an orchestrating agent.
pub struct AgentFactory {
    model: Arc<dyn LLM>,
    registry: AgentRegistry,
    sink: Arc<dyn StreamSink>,
}

impl AgentFactory {
    /// Factory seeded with the built-in templates bound to `servers`
    pub fn new(model: Arc<dyn LLM>, servers: BuiltinServers) -> Self {
        Self::with_registry(model, AgentRegistry::with_builtin_templates(&servers))
    }

    pub fn with_registry(model: Arc<dyn LLM>, registry: AgentRegistry) -> Self {
        Self {
            model,
            registry,
            sink: Arc::new(StdoutSink),
        }
    }

    /// Where streaming agent tools report progress (stdout by default)
    pub fn with_stream_sink(mut self, sink: Arc<dyn StreamSink>) -> Self {
        self.sink = sink;
        self
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn add_agent_config(&mut self, agent_type: impl Into<String>, config: AgentConfig) -> Result<()> {
        self.registry.register(agent_type, config)
    }

    pub fn list_agent_types(&self) -> Vec<String> {
        self.registry.list()
    }

    /// Register the `[[agents]]` templates of a configuration file, binding
    /// each to the named connections of `manager`. Names the manager does
    /// not hold are skipped.
    pub fn register_from_config(
        &mut self,
        config: &RelayConfig,
        manager: &McpClientManager,
    ) -> Result<()> {
        for template in &config.agents {
            let servers: Vec<_> = template
                .servers
                .iter()
                .filter_map(|name| match manager.get(name) {
                    Ok(client) => Some(client),
                    Err(_) => {
                        tracing::warn!(
                            agent_type = %template.id,
                            server = %name,
                            "Agent template references a server that is not running"
                        );
                        None
                    }
                })
                .collect();

            let agent_config = AgentConfig::from_template(template).mcp_servers(servers);
            self.registry.register(&template.id, agent_config)?;
        }
        Ok(())
    }

    /// Build a fresh agent from the template registered as `agent_type`
    pub fn create_agent(&self, agent_type: &str) -> Result<LLMAgent> {
        let config = self.registry.get(agent_type)?;

        let toolsets: Vec<Arc<dyn Toolset>> = config
            .mcp_servers
            .iter()
            .map(|client| Arc::new(McpToolset::new(client.clone())) as Arc<dyn Toolset>)
            .collect();

        tracing::debug!(
            agent_type = %agent_type,
            name = %config.name,
            servers = toolsets.len(),
            tools = config.tools.len(),
            "Creating agent from template"
        );

        LLMAgent::builder()
            .name(&config.name)
            .description(format!("Agent built from the '{}' template", agent_type))
            .model(self.model.clone())
            .system_instruction(&config.instructions)
            .max_turns(config.max_turns)
            .toolsets(toolsets)
            .tools(config.tools.clone())
            .build()
    }

    pub fn create_math_agent(&self) -> Result<LLMAgent> {
        self.create_agent("math")
    }

    pub fn create_text_agent(&self) -> Result<LLMAgent> {
        self.create_agent("text")
    }

    pub fn create_data_agent(&self) -> Result<LLMAgent> {
        self.create_agent("data")
    }

    /// Wrap `agent` as a tool. With `show_streaming` the sub-agent's
    /// progress goes to the factory's stream sink.
    pub fn create_custom_tool(
        &self,
        agent: Arc<dyn Agent>,
        tool_name: impl Into<String>,
        description: impl Into<String>,
        max_turns: u32,
        show_streaming: bool,
    ) -> Result<AgentTool> {
        let sink = show_streaming.then(|| self.sink.clone());
        AgentTool::new(agent, tool_name, description, max_turns, sink)
    }

    /// Turn cap for a tool binding: explicit value, else the template named
    /// by the tool name minus its `_operations` suffix, else the default.
    fn resolve_max_turns(&self, binding: &ToolAgent) -> u32 {
        if let Some(max_turns) = binding.max_turns {
            return max_turns;
        }

        let agent_type = binding
            .tool_name
            .strip_suffix(TOOL_NAME_SUFFIX)
            .unwrap_or(&binding.tool_name);
        self.registry
            .get(agent_type)
            .map(|config| config.max_turns)
            .unwrap_or(DEFAULT_MAX_TURNS)
    }

    fn default_bindings(&self) -> Result<Vec<ToolAgent>> {
        Ok(vec![
            ToolAgent::new(
                Arc::new(self.create_math_agent()?),
                "math_operations",
                "Perform mathematical operations like addition, multiplication, and exponentiation.",
            ),
            ToolAgent::new(
                Arc::new(self.create_text_agent()?),
                "text_operations",
                "Perform text operations like reversing, counting words, or converting case.",
            ),
            ToolAgent::new(
                Arc::new(self.create_data_agent()?),
                "data_operations",
                "Perform data operations like filtering, sorting, or aggregating lists.",
            ),
        ])
    }

    /// Build an orchestrator delegating to `tool_agents`.
    ///
    /// Without bindings the math, text and data templates are used. Tool
    /// names must be unique; a duplicate is rejected before anything is
    /// wrapped.
    pub fn create_orchestrator(
        &self,
        tool_agents: Option<Vec<ToolAgent>>,
        custom_instructions: Option<String>,
    ) -> Result<LLMAgent> {
        let bindings = match tool_agents {
            Some(bindings) => bindings,
            None => self.default_bindings()?,
        };

        let mut seen = HashSet::new();
        for binding in &bindings {
            if !seen.insert(binding.tool_name.as_str()) {
                return Err(Error::DuplicateToolName(binding.tool_name.clone()));
            }
        }

        let mut tools: Vec<Arc<dyn Tool>> = Vec::with_capacity(bindings.len());
        for binding in &bindings {
            let max_turns = self.resolve_max_turns(binding);
            let tool = self.create_custom_tool(
                binding.agent.clone(),
                &binding.tool_name,
                &binding.description,
                max_turns,
                true,
            )?;
            tools.push(Arc::new(tool));
        }

        let instructions = custom_instructions.unwrap_or_else(|| default_instructions(&bindings));

        tracing::info!(
            tools = ?bindings.iter().map(|b| b.tool_name.as_str()).collect::<Vec<_>>(),
            "Creating orchestrator"
        );

        LLMAgent::builder()
            .name(ORCHESTRATOR_NAME)
            .description("Delegates tasks to specialist agents")
            .model(self.model.clone())
            .system_instruction(instructions)
            .tools(tools)
            .build()
    }
}

fn default_instructions(bindings: &[ToolAgent]) -> String {
    let mut instructions = String::from(
        "You are a data processing orchestrator.\n\
         You coordinate between specialized agents:\n",
    );
    for binding in bindings {
        instructions.push_str(&format!("- {}: {}\n", binding.tool_name, binding.description));
    }
    instructions.push_str(
        "\nFor complex tasks, break them down and delegate to the appropriate specialist agent.\n\
         Combine results when needed to answer the user's question.",
    );
    instructions
}
