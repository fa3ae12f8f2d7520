use crate::app::App;
use crate::constants::server::{NAME as SERVER_NAME, PROTOCOL_VERSION, VERSION as SERVER_VERSION};
use crate::errors::{ErrorCode, McpError, ToolError, ToolErrorKind, ToolResult};
use crate::mcp::catalog::ensure_known_tool;
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse};
use crate::mcp::resources::{list_resources, read_resource};
use crate::services::logger::Logger;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

pub struct McpServer {
    app: Arc<App>,
    logger: Logger,
}

impl McpServer {
    pub fn new(app: App) -> Self {
        let logger = app.logger.child("server");
        Self {
            app: Arc::new(app),
            logger,
        }
    }

    pub fn initialize() -> ToolResult<Self> {
        Ok(Self::new(App::initialize()?))
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    fn handle_initialize(&self) -> Value {
        serde_json::json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "listChanged": false, "subscribe": false }
            },
            "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
        })
    }

    fn handle_tools_list(&self) -> Value {
        serde_json::json!({ "tools": [self.app.tool()] })
    }

    async fn handle_tools_call(&self, params: &Value) -> Result<Value, McpError> {
        let name = params.get("name").and_then(Value::as_str).unwrap_or("");
        if name.is_empty() {
            return Err(McpError::invalid_params("Missing tool name"));
        }
        ensure_known_tool(name)?;

        let args = params.get("arguments").cloned().unwrap_or(Value::Null);
        match self.app.invoker.invoke(&args).await {
            Ok(envelope) => Ok(envelope.into_tool_result()?),
            Err(err) => {
                self.log_call_error(name, &err);
                Err(err.into())
            }
        }
    }

    fn log_call_error(&self, tool: &str, err: &ToolError) {
        let meta = serde_json::json!({
            "tool": tool,
            "code": err.code,
            "message": err.message,
            "details": err.details,
        });
        if err.kind == ToolErrorKind::Internal {
            self.logger.error("tool call faulted", Some(&meta));
        } else {
            self.logger.debug("tool call rejected", Some(&meta));
        }
    }

    fn handle_resources_list(&self) -> Value {
        serde_json::json!({ "resources": list_resources() })
    }

    fn handle_resources_read(&self, params: &Value) -> Result<Value, McpError> {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .filter(|uri| !uri.trim().is_empty())
            .ok_or_else(|| McpError::invalid_params("Missing resource uri"))?;
        Ok(read_resource(&self.app, uri.trim())?)
    }

    /// Routes one request. Notifications never produce a response.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let Some(id) = request.id.clone() else {
            if !request.method.starts_with("notifications/") {
                self.logger.debug(
                    "ignoring request without id",
                    Some(&serde_json::json!({ "method": request.method })),
                );
            }
            return None;
        };

        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize()),
            "ping" | "notifications/initialized" => Ok(serde_json::json!({})),
            "tools/list" => Ok(self.handle_tools_list()),
            "tools/call" => self.handle_tools_call(&request.params).await,
            "resources/list" => Ok(self.handle_resources_list()),
            "resources/read" => self.handle_resources_read(&request.params),
            _ => Err(McpError::method_not_found("Method not found")),
        };
        Some(JsonRpcResponse::from_result(id, outcome))
    }

    fn parse_error() -> JsonRpcResponse {
        JsonRpcResponse::failure(
            Value::Null,
            McpError::new(ErrorCode::ParseError, "Parse error"),
        )
    }

    fn parse_line(line: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
        let parsed: Value = serde_json::from_str(line).map_err(|_| Self::parse_error())?;
        let invalid = |id: Value| {
            JsonRpcResponse::failure(id, McpError::new(ErrorCode::InvalidRequest, "Invalid request"))
        };
        let id = parsed
            .get("id")
            .filter(|id| id.is_string() || id.is_number())
            .cloned()
            .unwrap_or(Value::Null);
        let request: JsonRpcRequest =
            serde_json::from_value(parsed).map_err(|_| invalid(id.clone()))?;
        if !request.is_well_formed() {
            return Err(invalid(id));
        }
        Ok(request)
    }

    /// Serves newline-delimited JSON-RPC until `reader` hits EOF.
    ///
    /// `tools/call` requests run as independent tasks so a slow upstream does not
    /// hold up later messages; all responses funnel through one writer task.
    pub async fn serve<R, W>(self: Arc<Self>, reader: R, writer: W) -> ToolResult<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(async move {
            let mut writer = BufWriter::new(writer);
            while let Some(response) = rx.recv().await {
                let payload = serde_json::to_string(&response)?;
                writer.write_all(payload.as_bytes()).await?;
                writer.write_all(b"\n").await?;
                writer.flush().await?;
            }
            Ok::<(), ToolError>(())
        });

        // Raw segments so a line that is not UTF-8 is a parse error, not a read failure.
        let mut segments = BufReader::new(reader).split(b'\n');
        let mut in_flight = JoinSet::new();
        let mut read_error = None;
        loop {
            tokio::select! {
                segment = segments.next_segment() => {
                    let raw = match segment {
                        Ok(Some(raw)) => raw,
                        Ok(None) => break,
                        Err(err) => {
                            self.logger.error(
                                "stdin read failed",
                                Some(&serde_json::json!({ "error": err.to_string() })),
                            );
                            read_error = Some(err);
                            break;
                        }
                    };
                    let Ok(line) = String::from_utf8(raw) else {
                        let _ = tx.send(Self::parse_error());
                        continue;
                    };
                    let trimmed = line.trim();
                    if trimmed.is_empty() {
                        continue;
                    }
                    let request = match Self::parse_line(trimmed) {
                        Ok(request) => request,
                        Err(response) => {
                            let _ = tx.send(response);
                            continue;
                        }
                    };
                    if request.method == "tools/call" && !request.is_notification() {
                        let server = self.clone();
                        let tx = tx.clone();
                        in_flight.spawn(async move {
                            if let Some(response) = server.handle_request(request).await {
                                let _ = tx.send(response);
                            }
                        });
                    } else if let Some(response) = self.handle_request(request).await {
                        let _ = tx.send(response);
                    }
                }
                Some(joined) = in_flight.join_next(), if !in_flight.is_empty() => {
                    self.log_join(joined);
                }
            }
        }

        while let Some(joined) = in_flight.join_next().await {
            self.log_join(joined);
        }
        drop(tx);
        writer_task
            .await
            .map_err(|err| ToolError::internal(format!("writer task failed: {}", err)))??;
        if let Some(err) = read_error {
            return Err(err.into());
        }
        self.logger.debug("stdin closed, server stopped", None);
        Ok(())
    }

    fn log_join(&self, joined: Result<(), tokio::task::JoinError>) {
        if let Err(err) = joined {
            self.logger.error(
                "tool call task aborted",
                Some(&serde_json::json!({ "error": err.to_string() })),
            );
        }
    }
}

pub async fn run_stdio() -> ToolResult<()> {
    let server = Arc::new(McpServer::initialize()?);
    server.serve(tokio::io::stdin(), tokio::io::stdout()).await
}
