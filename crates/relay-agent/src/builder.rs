use crate::llm_agent::LLMAgent;
use relay_core::{Error, LLM, Result, Tool, Toolset};
use std::collections::HashMap;
use std::sync::Arc;

pub struct LLMAgentBuilder {
    name: Option<String>,
    description: Option<String>,
    model: Option<Arc<dyn LLM>>,
    system_instruction: Option<String>,
    tools: HashMap<String, Arc<dyn Tool>>,
    toolsets: Vec<Arc<dyn Toolset>>,
    max_turns: Option<u32>,
}

impl LLMAgentBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            description: None,
            model: None,
            system_instruction: None,
            tools: HashMap::new(),
            toolsets: Vec::new(),
            max_turns: None,
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn model(mut self, model: Arc<dyn LLM>) -> Self {
        self.model = Some(model);
        self
    }

    pub fn system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = Some(instruction.into());
        self
    }

    /// Attach a tool; a later tool with the same name replaces the earlier one
    pub fn tool(mut self, tool: Arc<dyn Tool>) -> Self {
        self.tools.insert(tool.name().to_string(), tool);
        self
    }

    pub fn tools(mut self, tools: Vec<Arc<dyn Tool>>) -> Self {
        for tool in tools {
            self.tools.insert(tool.name().to_string(), tool);
        }
        self
    }

    pub fn toolset(mut self, toolset: Arc<dyn Toolset>) -> Self {
        self.toolsets.push(toolset);
        self
    }

    pub fn toolsets(mut self, toolsets: Vec<Arc<dyn Toolset>>) -> Self {
        self.toolsets.extend(toolsets);
        self
    }

    /// Turn cap used when the run does not set one
    pub fn max_turns(mut self, max_turns: u32) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    pub fn build(self) -> Result<LLMAgent> {
        let name = self
            .name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| Error::config_error("LLMAgent name is required"))?;
        let model = self
            .model
            .ok_or_else(|| Error::config_error("Model is required"))?;
        if self.max_turns == Some(0) {
            return Err(Error::config_error(format!(
                "Agent '{}' must allow at least one turn",
                name
            )));
        }

        Ok(LLMAgent {
            name,
            description: self
                .description
                .unwrap_or_else(|| "An LLM-powered agent".to_string()),
            model,
            system_instruction: self.system_instruction,
            tools: self.tools,
            toolsets: self.toolsets,
            max_turns: self.max_turns,
        })
    }
}

impl Default for LLMAgentBuilder {
    fn default() -> Self {
        Self::new()
    }
}
