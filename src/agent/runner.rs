//! Agent runner with tool calling loop.

use super::model::{system_message, tool_calls_message, tool_message, user_message, ChatModel};
use crate::error::{DocmateError, Result};
use crate::tools::Toolset;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestMessage, ChatCompletionTool,
};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, info};

/// Default cap on LLM round-trips per run.
pub const DEFAULT_MAX_ITERATIONS: usize = 15;

/// An LLM bound to a fixed prompt and a fixed set of tools.
pub struct Agent {
    name: String,
    prompt: String,
    model: Arc<dyn ChatModel>,
    tools: Arc<dyn Toolset>,
    max_iterations: usize,
}

impl Agent {
    /// Create a new agent.
    pub fn new(
        name: &str,
        prompt: &str,
        model: Arc<dyn ChatModel>,
        tools: Arc<dyn Toolset>,
    ) -> Self {
        Self {
            name: name.to_string(),
            prompt: prompt.to_string(),
            model,
            tools,
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Set maximum iterations for the agent loop.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    /// Run the agent on a single task with no prior conversation.
    pub async fn run_task(&self, task: &str) -> Result<AgentResponse> {
        self.run(&[user_message(task)?]).await
    }

    /// Run the agent on a conversation (user/assistant turns, no system prompt).
    pub async fn run(&self, conversation: &[ChatCompletionRequestMessage]) -> Result<AgentResponse> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(system_message(&self.prompt)?);
        messages.extend_from_slice(conversation);

        let tools: Vec<ChatCompletionTool> =
            self.tools.specs().iter().map(|s| s.to_openai()).collect();

        let mut iterations = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(DocmateError::Agent(format!(
                    "Agent '{}' exceeded maximum iterations ({})",
                    self.name, self.max_iterations
                )));
            }

            debug!("Agent '{}' iteration {}", self.name, iterations);

            let reply = self.model.complete(&messages, &tools).await?;

            if reply.tool_calls.is_empty() {
                return Ok(AgentResponse {
                    agent: self.name.clone(),
                    content: reply.content.unwrap_or_default(),
                    tool_calls: tool_calls_made,
                    iterations,
                });
            }

            messages.push(tool_calls_message(&reply.tool_calls)?);

            for tool_call in &reply.tool_calls {
                let record = self.execute_tool_call(tool_call).await;
                messages.push(tool_message(&tool_call.id, &record.result)?);
                tool_calls_made.push(record);
            }
        }
    }

    /// Execute a single tool call. Failures become text for the model.
    async fn execute_tool_call(&self, tool_call: &ChatCompletionMessageToolCall) -> ToolCallRecord {
        let name = &tool_call.function.name;
        let arguments = &tool_call.function.arguments;

        info!("Agent '{}' calling tool: {} with args: {}", self.name, name, arguments);

        let (result, failed) = match self.tools.call(name, arguments).await {
            Ok(output) => (output, false),
            Err(e) => (format!("Tool error: {}", e), true),
        };

        ToolCallRecord {
            name: name.clone(),
            arguments: arguments.clone(),
            result,
            failed,
        }
    }
}

/// Something that answers a conversation: a single agent or a supervisor.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn respond(&self, conversation: &[ChatCompletionRequestMessage]) -> Result<AgentResponse>;
}

#[async_trait]
impl Assistant for Agent {
    async fn respond(&self, conversation: &[ChatCompletionRequestMessage]) -> Result<AgentResponse> {
        self.run(conversation).await
    }
}

/// Response from an agent run.
#[derive(Debug, Clone)]
pub struct AgentResponse {
    /// Name of the agent that produced the answer.
    pub agent: String,
    /// The final response content.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of iterations (LLM calls) used.
    pub iterations: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// Result returned by the tool.
    pub result: String,
    /// Whether the tool reported an error.
    pub failed: bool,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
