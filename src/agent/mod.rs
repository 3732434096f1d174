//! LLM agents with tool calling.
//!
//! An [`Agent`] binds a prompt and a toolset to a chat model and loops until
//! the model answers without requesting tools. A [`Supervisor`] sits in front
//! of several agents and hands each request to one of them; a [`ChatSession`]
//! keeps the conversation of a thread between turns.

mod checkpoint;
mod factory;
mod model;
mod runner;
mod session;
mod supervisor;

pub use checkpoint::{
    open_checkpointer, trim_history, Checkpointer, MemoryCheckpointer, SqliteCheckpointer,
};
pub use factory::{AgentFactory, DOCUMENT_AGENT, MOVIE_AGENT};
pub use model::{assistant_message, user_message, ChatModel, ModelReply, OpenAiChatModel};
pub use runner::{Agent, AgentResponse, Assistant, ToolCallRecord, DEFAULT_MAX_ITERATIONS};
pub use session::ChatSession;
pub use supervisor::Supervisor;
