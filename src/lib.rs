//! Docmate - document assistant with movie discovery
//!
//! Per-user document management driven by LLM agents, plus movie lookups on
//! The Movie Database (TMDB).
//!
//! # Overview
//!
//! Docmate allows you to:
//! - Keep short documents per user (list, read, create, update, delete, search)
//! - Let a chat model manage those documents through tool calls
//! - Discover movies through a second agent, with a supervisor routing requests
//! - Reach the same tools from the CLI, a REST API or an MCP stdio server
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! - `config` - Configuration and prompt management
//! - `store` - Document persistence (SQLite or in-memory)
//! - `tmdb` - TMDB v3 API client
//! - `tools` - Tools exposed to the agents
//! - `agent` - Agent loop, supervisor and conversation checkpoints
//! - `mcp` - MCP server over stdio
//! - `cli` - Command-line interface and REST server
//!
//! # Example
//!
//! ```rust,no_run
//! use docmate::agent::AgentFactory;
//! use docmate::config::Settings;
//! use docmate::tools::RequestConfig;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = Settings::load()?;
//!     let factory = AgentFactory::from_settings(&settings, None)?;
//!
//!     let config = RequestConfig::new(Some("1".to_string()));
//!     let supervisor = factory.supervisor(&config);
//!
//!     let message = docmate::agent::user_message("What documents do I have?")?;
//!     let response = supervisor.run(&[message]).await?;
//!     println!("{}", response.content);
//!
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod config;
pub mod error;
pub mod mcp;
pub mod openai;
pub mod store;
pub mod tmdb;
pub mod tools;

pub use error::{DocmateError, Result};
