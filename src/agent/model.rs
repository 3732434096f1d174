//! Chat-completion model abstraction.

use crate::config::LlmSettings;
use crate::error::{DocmateError, Result};
use crate::openai::create_client;
use async_openai::config::OpenAIConfig;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
    ChatCompletionTool, CreateChatCompletionRequestArgs,
};
use async_openai::Client;
use async_trait::async_trait;
use tracing::debug;

/// What the model said in one turn.
#[derive(Debug, Clone, Default)]
pub struct ModelReply {
    pub content: Option<String>,
    pub tool_calls: Vec<ChatCompletionMessageToolCall>,
}

/// A chat model that can request tool calls.
#[async_trait]
pub trait ChatModel: Send + Sync {
    async fn complete(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelReply>;
}

/// Chat model served by an OpenAI-compatible API.
pub struct OpenAiChatModel {
    client: Client<OpenAIConfig>,
    model: String,
    temperature: f32,
}

impl OpenAiChatModel {
    pub fn new(client: Client<OpenAIConfig>, model: &str, temperature: f32) -> Self {
        Self {
            client,
            model: model.to_string(),
            temperature,
        }
    }

    /// Build from settings, optionally overriding the model name.
    pub fn from_settings(settings: &LlmSettings, model: Option<&str>) -> Result<Self> {
        Ok(Self::new(
            create_client(settings)?,
            model.unwrap_or(&settings.model),
            settings.temperature,
        ))
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelReply> {
        let mut request = CreateChatCompletionRequestArgs::default();
        request
            .model(&self.model)
            .temperature(self.temperature)
            .messages(messages.to_vec());
        if !tools.is_empty() {
            request.tools(tools.to_vec());
        }
        let request = request.build().map_err(|e| DocmateError::Agent(e.to_string()))?;

        debug!("Requesting completion from {} ({} messages)", self.model, messages.len());

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| DocmateError::Llm(format!("Chat API error: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| DocmateError::Agent("No response from model".to_string()))?;

        Ok(ModelReply {
            content: choice.message.content,
            tool_calls: choice.message.tool_calls.unwrap_or_default(),
        })
    }
}

pub(crate) fn system_message(content: &str) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestSystemMessageArgs::default()
        .content(content)
        .build()
        .map_err(|e| DocmateError::Agent(e.to_string()))?
        .into())
}

/// Build a user message.
pub fn user_message(content: &str) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestUserMessageArgs::default()
        .content(content)
        .build()
        .map_err(|e| DocmateError::Agent(e.to_string()))?
        .into())
}

/// Build a plain assistant message.
pub fn assistant_message(content: &str) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestAssistantMessageArgs::default()
        .content(content)
        .build()
        .map_err(|e| DocmateError::Agent(e.to_string()))?
        .into())
}

pub(crate) fn tool_calls_message(
    calls: &[ChatCompletionMessageToolCall],
) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestAssistantMessageArgs::default()
        .tool_calls(calls.to_vec())
        .build()
        .map_err(|e| DocmateError::Agent(e.to_string()))?
        .into())
}

pub(crate) fn tool_message(tool_call_id: &str, content: &str) -> Result<ChatCompletionRequestMessage> {
    Ok(ChatCompletionRequestToolMessageArgs::default()
        .tool_call_id(tool_call_id)
        .content(content)
        .build()
        .map_err(|e| DocmateError::Agent(e.to_string()))?
        .into())
}
