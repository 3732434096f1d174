//! Multi-turn conversations over a checkpointed thread.

use super::checkpoint::{trim_history, Checkpointer};
use super::model::{assistant_message, user_message};
use super::runner::{AgentResponse, Assistant};
use crate::error::Result;
use std::sync::Arc;
use tracing::debug;

/// Runs user turns against an assistant, keeping history per thread.
pub struct ChatSession {
    assistant: Arc<dyn Assistant>,
    checkpointer: Arc<dyn Checkpointer>,
    history_limit: usize,
}

impl ChatSession {
    pub fn new(
        assistant: Arc<dyn Assistant>,
        checkpointer: Arc<dyn Checkpointer>,
        history_limit: usize,
    ) -> Self {
        Self {
            assistant,
            checkpointer,
            history_limit: history_limit.max(1),
        }
    }

    /// Send a user message on `thread_id` and record the reply.
    pub async fn send(&self, thread_id: &str, message: &str) -> Result<AgentResponse> {
        let mut history = self.checkpointer.load(thread_id).await?;
        history.push(user_message(message)?);

        debug!("Thread {} has {} messages", thread_id, history.len());

        let response = self.assistant.respond(&history).await?;

        history.push(assistant_message(&response.content)?);
        trim_history(&mut history, self.history_limit);
        self.checkpointer.save(thread_id, history).await?;

        Ok(response)
    }

    /// Forget the history of a thread.
    pub async fn clear(&self, thread_id: &str) -> Result<()> {
        self.checkpointer.save(thread_id, Vec::new()).await
    }
}
