use anyhow::Result;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::RwLock;
use tracing::{debug, error, warn};

use super::handlers::RequestHandler;
use super::types::*;

pub struct McpServer {
    handler: Arc<RequestHandler>,
    initialized: Arc<RwLock<bool>>,
}

impl McpServer {
    pub fn new(handler: RequestHandler) -> Self {
        Self {
            handler: Arc::new(handler),
            initialized: Arc::new(RwLock::new(false)),
        }
    }

    /// Serve newline-delimited JSON-RPC over stdin/stdout until stdin closes.
    pub async fn run(&self) -> Result<()> {
        let reader = BufReader::new(tokio::io::stdin());
        self.serve(reader, tokio::io::stdout()).await
    }

    pub async fn serve<R, W>(&self, mut reader: R, mut writer: W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut buffer = String::new();

        loop {
            buffer.clear();

            match reader.read_line(&mut buffer).await {
                Ok(0) => {
                    debug!("stdin closed, stopping MCP server");
                    break;
                }
                Ok(_) => {
                    let trimmed = buffer.trim();
                    if trimmed.is_empty() {
                        continue;
                    }

                    let response = match self.process_request(trimmed).await {
                        Ok(Some(response)) => response,
                        Ok(None) => continue,
                        Err(e) => {
                            error!("Error processing request: {}", e);
                            JsonRpcResponse::error(
                                None,
                                JsonRpcError::internal_error(e.to_string()),
                            )
                        }
                    };

                    let response_str = serde_json::to_string(&response)?;
                    writer.write_all(response_str.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                    writer.flush().await?;
                }
                Err(e) => {
                    error!("Error reading from stdin: {}", e);
                    break;
                }
            }
        }

        Ok(())
    }

    /// Handle one JSON-RPC line. Notifications yield `None`.
    pub async fn process_request(&self, input: &str) -> Result<Option<JsonRpcResponse>> {
        let request: JsonRpcRequest = match serde_json::from_str(input) {
            Ok(req) => req,
            Err(e) => {
                warn!("Failed to parse request: {}", e);
                return Ok(Some(JsonRpcResponse::error(
                    None,
                    JsonRpcError::parse_error(),
                )));
            }
        };

        if request.jsonrpc != "2.0" {
            return Ok(Some(JsonRpcResponse::error(
                request.id.clone(),
                JsonRpcError::invalid_request(),
            )));
        }

        match request.method.as_str() {
            "initialize" => self.handle_initialize(request).await.map(Some),
            "initialized" | "notifications/initialized" => self.handle_initialized(request).await,
            "ping" => Ok(Some(JsonRpcResponse::success(
                request.id,
                serde_json::json!({}),
            ))),
            "tools/list" => self.handle_list_tools(request).await.map(Some),
            "tools/call" => self.handle_call_tool(request).await.map(Some),
            "prompts/list" => Ok(Some(JsonRpcResponse::success(
                request.id,
                serde_json::json!({ "prompts": [] }),
            ))),
            "resources/list" => Ok(Some(JsonRpcResponse::success(
                request.id,
                serde_json::json!({ "resources": [] }),
            ))),
            _ if request.id.is_none() => {
                debug!("Ignoring notification: {}", request.method);
                Ok(None)
            }
            _ => {
                warn!("Unknown method: {}", request.method);
                Ok(Some(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::method_not_found(&request.method),
                )))
            }
        }
    }

    async fn handle_initialize(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        let params: InitializeRequest = match request.params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return Ok(JsonRpcResponse::error(
                        request.id,
                        JsonRpcError::invalid_params(e.to_string()),
                    ));
                }
            },
            None => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing params".to_string()),
                ));
            }
        };

        let protocol_version = if params.protocol_version.starts_with("2025") {
            PROTOCOL_VERSION_2025.to_string()
        } else {
            PROTOCOL_VERSION.to_string()
        };

        let result = InitializeResult {
            protocol_version,
            capabilities: ServerCapabilities {
                tools: HashMap::new(),
                experimental: Default::default(),
            },
            server_info: ServerInfo {
                name: "Slack Token Broker".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        Ok(JsonRpcResponse::success(
            request.id,
            serde_json::to_value(result)?,
        ))
    }

    async fn handle_initialized(&self, request: JsonRpcRequest) -> Result<Option<JsonRpcResponse>> {
        let mut initialized = self.initialized.write().await;
        *initialized = true;

        if request.id.is_none() {
            Ok(None)
        } else {
            Ok(Some(JsonRpcResponse::success(request.id, Value::Null)))
        }
    }

    async fn ensure_initialized(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let initialized = self.initialized.read().await;
        if *initialized {
            None
        } else {
            Some(JsonRpcResponse::error(
                request.id.clone(),
                JsonRpcError::internal_error("Server not initialized".to_string()),
            ))
        }
    }

    async fn handle_list_tools(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        if let Some(rejection) = self.ensure_initialized(&request).await {
            return Ok(rejection);
        }

        let result = ListToolsResult {
            tools: self.handler.list_tools(),
        };

        Ok(JsonRpcResponse::success(
            request.id,
            serde_json::to_value(result)?,
        ))
    }

    async fn handle_call_tool(&self, request: JsonRpcRequest) -> Result<JsonRpcResponse> {
        if let Some(rejection) = self.ensure_initialized(&request).await {
            return Ok(rejection);
        }

        let params: CallToolRequest = match request.params {
            Some(p) => match serde_json::from_value(p) {
                Ok(params) => params,
                Err(e) => {
                    return Ok(JsonRpcResponse::error(
                        request.id,
                        JsonRpcError::invalid_params(e.to_string()),
                    ));
                }
            },
            None => {
                return Ok(JsonRpcResponse::error(
                    request.id,
                    JsonRpcError::invalid_params("Missing params".to_string()),
                ));
            }
        };

        // Tool failures travel inside the result with isError set
        let result = self.handler.call_tool(&params.name, params.arguments).await;

        Ok(JsonRpcResponse::success(
            request.id,
            serde_json::to_value(result)?,
        ))
    }
}
