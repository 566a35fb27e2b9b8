//! MCP server implementation
//!
//! Serves the engram tools over newline-delimited JSON-RPC on stdio. The
//! HTTP/SSE transport in [`crate::mcp::sse`] shares the message handling.

use crate::mcp::protocol::*;
use crate::mcp::tools;
use crate::tools::Toolbox;
use anyhow::Result;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, info, warn};

/// Per-connection protocol state.
#[derive(Debug, Default)]
pub(crate) struct Session {
    initialized: bool,
}

#[derive(Clone)]
pub struct McpServer {
    toolbox: Arc<Toolbox>,
}

impl McpServer {
    pub fn new(toolbox: Arc<Toolbox>) -> Self {
        Self { toolbox }
    }

    /// Run the MCP server on stdin/stdout until the client closes the stream
    pub async fn run_stdio(&self) -> Result<()> {
        info!("MCP server starting on stdio");
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.serve(stdin, stdout).await
    }

    /// Serve one session over any line-oriented byte stream
    pub async fn serve<R, W>(&self, reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut session = Session::default();
        let mut lines = reader.lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            debug!("Received request: {}", line);

            let Some(response) = self.handle_message(&mut session, line).await else {
                continue;
            };

            let response_json = serde_json::to_string(&response)?;
            writer.write_all(response_json.as_bytes()).await?;
            writer.write_all(b"\n").await?;
            writer.flush().await?;

            debug!("Sent response");
        }

        info!("Client closed connection");
        Ok(())
    }

    /// Handle one JSON-RPC message. Notifications produce no response.
    pub(crate) async fn handle_message(
        &self,
        session: &mut Session,
        content: &str,
    ) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(content) {
            Ok(req) => req,
            Err(e) => {
                return Some(JsonRpcResponse::failure(
                    Value::Null,
                    JsonRpcError::new(PARSE_ERROR, format!("Parse error: {}", e)),
                ));
            }
        };

        let Some(id) = request.id.clone() else {
            self.handle_notification(session, &request);
            return None;
        };

        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                JsonRpcError::new(
                    INVALID_REQUEST,
                    format!("Unsupported jsonrpc version: {}", request.jsonrpc),
                ),
            ));
        }

        let result = match request.method.as_str() {
            "initialize" => self.handle_initialize(session, request.params),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => self.handle_list_tools(),
            "tools/call" => self.handle_call_tool(session, request.params).await,
            _ => Err(JsonRpcError::new(
                METHOD_NOT_FOUND,
                format!("Method not found: {}", request.method),
            )),
        };

        Some(match result {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::failure(id, error),
        })
    }

    fn handle_notification(&self, session: &mut Session, request: &JsonRpcRequest) {
        match request.method.as_str() {
            "notifications/initialized" => {
                session.initialized = true;
                debug!("Client finished initialization");
            }
            "notifications/cancelled" => debug!("Ignoring cancellation notice"),
            other => warn!("Ignoring unknown notification: {}", other),
        }
    }

    fn handle_initialize(
        &self,
        session: &mut Session,
        params: Option<Value>,
    ) -> Result<Value, JsonRpcError> {
        let params: InitializeParams =
            serde_json::from_value(params.unwrap_or_else(|| serde_json::json!({})))
                .map_err(|e| {
                    JsonRpcError::new(INVALID_PARAMS, format!("Invalid initialize params: {}", e))
                })?;

        if let Some(client) = &params.client_info {
            info!(
                "Initializing session for {} {}",
                client.name,
                client.version.as_deref().unwrap_or("")
            );
        }

        session.initialized = true;

        let result = InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: Some(serde_json::json!({})),
                ..ServerCapabilities::default()
            },
            server_info: ServerInfo {
                name: "engram-mcp".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        serde_json::to_value(result).map_err(|e| {
            JsonRpcError::new(INTERNAL_ERROR, format!("Failed to serialize result: {}", e))
        })
    }

    fn handle_list_tools(&self) -> Result<Value, JsonRpcError> {
        let result = ListToolsResult {
            tools: tools::get_tool_definitions(),
        };

        serde_json::to_value(result).map_err(|e| {
            JsonRpcError::new(INTERNAL_ERROR, format!("Failed to serialize tools: {}", e))
        })
    }

    async fn handle_call_tool(
        &self,
        session: &Session,
        params: Option<Value>,
    ) -> Result<Value, JsonRpcError> {
        if !session.initialized {
            return Err(JsonRpcError::new(INTERNAL_ERROR, "Server not initialized"));
        }

        let params: CallToolParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|e| {
                JsonRpcError::new(INVALID_PARAMS, format!("Invalid tool call params: {}", e))
            })?;

        let result = tools::call_tool(&params.name, params.arguments, &self.toolbox).await;

        serde_json::to_value(result).map_err(|e| {
            JsonRpcError::new(
                INTERNAL_ERROR,
                format!("Failed to serialize tool result: {}", e),
            )
        })
    }
}
