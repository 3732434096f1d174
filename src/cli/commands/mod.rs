//! CLI command implementations.

mod ask;
mod chat;
mod config;
mod docs;
mod doctor;
mod init;
mod mcp;
mod movies;
mod serve;

pub use ask::run_ask;
pub use chat::run_chat;
pub use config::run_config;
pub use docs::run_docs;
pub use doctor::run_doctor;
pub use init::run_init;
pub use mcp::run_mcp;
pub use movies::run_movies;
pub use serve::{router, run_serve, AppState};
