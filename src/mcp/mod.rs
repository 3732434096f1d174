//! MCP (Model Context Protocol) server for Docmate.
//!
//! Exposes the document and movie tools to AI assistants.
//! Implements JSON-RPC 2.0 over stdio.

mod protocol;
mod server;
mod tools;

pub use server::McpServer;
