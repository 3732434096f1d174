//! MCP server implementation.

use super::protocol::*;
use super::tools::describe;
use crate::tools::Toolset;
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "docmate";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP Server for Docmate.
pub struct McpServer {
    tools: Arc<dyn Toolset>,
}

impl McpServer {
    /// Create a server exposing `tools`.
    pub fn new(tools: Arc<dyn Toolset>) -> Self {
        Self { tools }
    }

    /// Run the MCP server (reads from stdin, writes to stdout).
    pub async fn run(&self) -> anyhow::Result<()> {
        info!("Docmate MCP server starting");
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve line-delimited JSON-RPC from `reader` until EOF.
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> anyhow::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_line(&line).await {
                let mut out = serde_json::to_string(&response)?;
                out.push('\n');
                writer.write_all(out.as_bytes()).await?;
                writer.flush().await?;
            }
        }

        Ok(())
    }

    /// Handle one raw request line. Notifications get no response.
    async fn handle_line(&self, line: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(line) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                Some(JsonRpcResponse::error(None, -32700, "Parse error"))
            }
        }
    }

    /// Handle a single JSON-RPC request.
    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        debug!("MCP request: {}", request.method);

        if request.jsonrpc != "2.0" {
            return Some(JsonRpcResponse::error(request.id, -32600, "Invalid Request"));
        }

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(request.id, request.params)),
            "initialized" | "notifications/initialized" => None,
            "ping" => Some(JsonRpcResponse::success(request.id, json!({}))),
            "tools/list" => Some(self.handle_tools_list(request.id)),
            "tools/call" => Some(self.handle_tools_call(request.id, request.params).await),
            _ => Some(JsonRpcResponse::error(
                request.id,
                -32601,
                &format!("Method not found: {}", request.method),
            )),
        }
    }

    /// Handle initialize request.
    fn handle_initialize(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: InitializeParams = params
            .and_then(|p| serde_json::from_value(p).ok())
            .unwrap_or_default();
        info!(
            "MCP client {} {} (protocol {})",
            params.client_info.name, params.client_info.version, params.protocol_version
        );

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability { list_changed: false },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        };

        respond(id, &result)
    }

    /// Handle tools/list request.
    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        let result = ToolsListResult {
            tools: describe(&self.tools.specs()),
        };
        respond(id, &result)
    }

    /// Handle tools/call request.
    async fn handle_tools_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return JsonRpcResponse::error(id, -32602, &format!("Invalid params: {}", e))
                }
            },
            None => return JsonRpcResponse::error(id, -32602, "Missing params"),
        };

        let arguments = params
            .arguments
            .map(|a| a.to_string())
            .unwrap_or_default();

        let result = match self.tools.call(&params.name, &arguments).await {
            Ok(output) => ToolCallResult::text(output),
            Err(e) => ToolCallResult::error(e.to_string()),
        };

        respond(id, &result)
    }
}

fn respond<T: serde::Serialize>(id: Option<Value>, result: &T) -> JsonRpcResponse {
    match serde_json::to_value(result) {
        Ok(value) => JsonRpcResponse::success(id, value),
        Err(e) => JsonRpcResponse::error(id, -32603, &format!("Internal error: {}", e)),
    }
}
