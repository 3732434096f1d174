//! Routing layer that hands a conversation to one of several agents.

use super::model::{
    assistant_message, system_message, tool_calls_message, tool_message, ChatModel,
};
use super::runner::{Agent, AgentResponse, Assistant, DEFAULT_MAX_ITERATIONS};
use crate::error::{DocmateError, Result};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestMessage, ChatCompletionTool,
    ChatCompletionToolType, FunctionObject,
};
use async_trait::async_trait;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

const HANDOFF_PREFIX: &str = "transfer_to_";

/// A router LLM in front of named agents.
pub struct Supervisor {
    prompt: String,
    model: Arc<dyn ChatModel>,
    agents: Vec<Arc<Agent>>,
    max_iterations: usize,
}

impl Supervisor {
    pub fn new(prompt: &str, model: Arc<dyn ChatModel>) -> Self {
        Self {
            prompt: prompt.to_string(),
            model,
            agents: Vec::new(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
        }
    }

    /// Register an agent the router may hand work to.
    pub fn with_agent(mut self, agent: Agent) -> Self {
        self.agents.push(Arc::new(agent));
        self
    }

    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max;
        self
    }

    /// Names of the registered agents.
    pub fn agent_names(&self) -> Vec<&str> {
        self.agents.iter().map(|a| a.name()).collect()
    }

    fn handoff_tools(&self) -> Vec<ChatCompletionTool> {
        self.agents
            .iter()
            .map(|agent| ChatCompletionTool {
                r#type: ChatCompletionToolType::Function,
                function: FunctionObject {
                    name: format!("{}{}", HANDOFF_PREFIX, agent.name()),
                    description: Some(format!("Ask agent '{}' for help", agent.name())),
                    parameters: Some(json!({ "type": "object", "properties": {} })),
                    strict: None,
                },
            })
            .collect()
    }

    fn find_agent(&self, tool_name: &str) -> Option<&Arc<Agent>> {
        let name = tool_name.strip_prefix(HANDOFF_PREFIX)?;
        self.agents.iter().find(|a| a.name() == name)
    }

    /// Route a conversation until the router answers without a handoff.
    pub async fn run(&self, conversation: &[ChatCompletionRequestMessage]) -> Result<AgentResponse> {
        let mut messages = Vec::with_capacity(conversation.len() + 1);
        messages.push(system_message(&self.prompt)?);
        messages.extend_from_slice(conversation);

        // What the agents see: the caller's turns plus earlier agent answers.
        let mut agent_view = conversation.to_vec();

        let tools = self.handoff_tools();
        let mut last: Option<AgentResponse> = None;
        let mut tool_calls = Vec::new();
        let mut iterations = 0;

        loop {
            iterations += 1;
            if iterations > self.max_iterations {
                return Err(DocmateError::Agent(format!(
                    "Supervisor exceeded maximum iterations ({})",
                    self.max_iterations
                )));
            }

            debug!("Supervisor iteration {}", iterations);

            let reply = self.model.complete(&messages, &tools).await?;

            if reply.tool_calls.is_empty() {
                let content = reply.content.unwrap_or_default();
                return Ok(match last {
                    Some(answer) if content.trim().is_empty() => AgentResponse {
                        tool_calls,
                        iterations,
                        ..answer
                    },
                    _ => AgentResponse {
                        agent: "supervisor".to_string(),
                        content,
                        tool_calls,
                        iterations,
                    },
                });
            }

            messages.push(tool_calls_message(&reply.tool_calls)?);

            for call in &reply.tool_calls {
                match self.handoff(call, &agent_view).await {
                    Ok(Some(response)) => {
                        messages.push(tool_message(
                            &call.id,
                            &format!("Successfully transferred to {}", response.agent),
                        )?);
                        let named = format!(
                            "<name>{}</name><content>{}</content>",
                            response.agent, response.content
                        );
                        messages.push(assistant_message(&named)?);
                        agent_view.push(assistant_message(&response.content)?);
                        tool_calls.extend(response.tool_calls.iter().cloned());
                        last = Some(response);
                    }
                    Ok(None) => {
                        messages.push(tool_message(
                            &call.id,
                            &format!(
                                "Tool error: unknown agent '{}'. Available: {}",
                                call.function.name,
                                self.agent_names().join(", ")
                            ),
                        )?);
                    }
                    Err(e) => {
                        warn!("Handoff {} failed: {}", call.function.name, e);
                        messages.push(tool_message(&call.id, &format!("Tool error: {}", e))?);
                    }
                }
            }
        }
    }

    async fn handoff(
        &self,
        call: &ChatCompletionMessageToolCall,
        conversation: &[ChatCompletionRequestMessage],
    ) -> Result<Option<AgentResponse>> {
        let Some(agent) = self.find_agent(&call.function.name) else {
            warn!("Supervisor requested unknown handoff: {}", call.function.name);
            return Ok(None);
        };

        info!("Supervisor transferring to {}", agent.name());
        agent.run(conversation).await.map(Some)
    }
}

#[async_trait]
impl Assistant for Supervisor {
    async fn respond(&self, conversation: &[ChatCompletionRequestMessage]) -> Result<AgentResponse> {
        self.run(conversation).await
    }
}
