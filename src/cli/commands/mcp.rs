//! MCP command implementation.

use crate::config::Settings;
use crate::mcp::McpServer;
use crate::store::open_store;
use crate::tmdb::{MovieCatalog, TmdbClient};
use crate::tools::{RequestConfig, ToolRegistry};
use anyhow::Result;
use std::sync::Arc;
use tracing::warn;

/// Run the MCP server for the configured user.
pub async fn run_mcp(settings: Settings) -> Result<()> {
    let store = open_store(&settings)?;

    let catalog: Option<Arc<dyn MovieCatalog>> = match settings.tmdb.token() {
        Some(_) => Some(Arc::new(TmdbClient::new(&settings.tmdb)?)),
        None => {
            warn!("No TMDB token; movie tools are not offered");
            None
        }
    };

    if settings.general.user_id.is_none() {
        warn!("No user id configured; document tools will report an error");
    }

    let config = RequestConfig::new(settings.general.user_id.clone());
    let tools = ToolRegistry::for_request(store, catalog, config);

    McpServer::new(Arc::new(tools)).run().await
}
