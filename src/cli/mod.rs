//! CLI module for Docmate.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand, ValueEnum};

/// Docmate - document assistant with movie discovery
///
/// Manage your documents and look up movies, either directly or by chatting
/// with an LLM agent that uses the same tools.
#[derive(Parser, Debug)]
#[command(name = "docmate")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// User id whose documents are accessed (overrides general.user_id)
    #[arg(short, long, global = true, env = "DOCMATE_USER_ID")]
    pub user: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the data directory, database and default configuration
    Init,

    /// Check API keys, database and configuration
    Doctor,

    /// Start an interactive chat session with the supervisor
    Chat {
        /// Continue an existing conversation thread (kept with the sqlite store)
        #[arg(short, long)]
        thread: Option<String>,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Send a single message to an agent
    Ask {
        /// The message to send
        message: String,

        /// Agent that handles the message
        #[arg(short, long, value_enum, default_value = "supervisor")]
        agent: AgentChoice,

        /// LLM model to use
        #[arg(short, long)]
        model: Option<String>,
    },

    /// Manage documents directly
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Look up movies on TMDB
    Movies {
        #[command(subcommand)]
        action: MoviesAction,
    },

    /// Start HTTP API server for integration with other systems
    Serve {
        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        /// Port to bind to
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },

    /// Start MCP server for AI assistant integration
    Mcp,

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Which assistant answers an `ask`.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq)]
pub enum AgentChoice {
    /// Route between all agents
    Supervisor,
    /// Document agent only
    Documents,
    /// Movie agent only
    Movies,
}

#[derive(Subcommand, Debug)]
pub enum DocsAction {
    /// List most recent documents
    List {
        /// Maximum number of documents (at most 25)
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show a document
    Show {
        /// Document ID
        id: i64,
    },

    /// Create a document
    Create {
        /// Document title
        title: String,

        /// Document content
        #[arg(long)]
        content: Option<String>,
    },

    /// Update the title and/or content of a document
    Update {
        /// Document ID
        id: i64,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// New content
        #[arg(long)]
        content: Option<String>,
    },

    /// Delete a document
    Delete {
        /// Document ID
        id: i64,
    },

    /// Search documents by title or content
    Search {
        /// Text to look for (case-insensitive)
        query: String,

        /// Maximum number of results (at most 25)
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },
}

#[derive(Subcommand, Debug)]
pub enum MoviesAction {
    /// Search movies by title or keywords
    Search {
        /// Search query
        query: String,

        /// Maximum number of results (at most 25)
        #[arg(short, long, default_value = "5")]
        limit: usize,
    },

    /// Show movie details
    Show {
        /// TMDB movie ID
        id: i64,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Open configuration file in editor
    Edit,

    /// Show configuration file path
    Path,
}
