use crate::app::App;
use crate::config::OcmConfig;
use crate::errors::{ErrorCode, McpError, ToolError};
use crate::mcp::catalog::{list_tools, tool_by_name, tool_names, validate_tool_args};
use crate::mcp::protocol::{JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use crate::services::context::InvocationContext;
use crate::utils::tool_errors::unknown_tool_error;
use serde_json::Value;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, BufWriter};
use tokio::sync::mpsc;
use tokio::task::JoinSet;

const PROTOCOL_VERSION: &str = "2025-06-18";
const SERVER_NAME: &str = "ocm-mcp";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

fn text_content(text: String) -> Value {
    serde_json::json!({ "content": [ { "type": "text", "text": text } ] })
}

/// Strings are returned as-is; anything else is pretty-printed JSON.
fn render_tool_output(value: Value) -> String {
    match value {
        Value::String(text) => text,
        other => serde_json::to_string_pretty(&other).unwrap_or_else(|_| other.to_string()),
    }
}

fn format_tool_error(tool: &str, error: &ToolError) -> String {
    let kind = serde_json::to_value(error.kind)
        .ok()
        .and_then(|v| v.as_str().map(str::to_string))
        .unwrap_or_else(|| "internal".to_string());
    let mut lines = vec![
        "OcmError".to_string(),
        format!("tool: {}", tool),
        format!("kind: {}", kind),
        format!("code: {}", error.code),
    ];
    if let Some(stage) = error.stage() {
        lines.push(format!("stage: {}", stage));
    }
    lines.push(format!("retryable: {}", error.retryable));
    lines.push(format!("message: {}", error.message));
    if let Some(hint) = &error.hint {
        lines.push(format!("hint: {}", hint));
    }
    lines.join("\n")
}

fn tool_error_result(tool: &str, error: &ToolError) -> Value {
    let mut result = text_content(format_tool_error(tool, error));
    if let Some(obj) = result.as_object_mut() {
        obj.insert("isError".to_string(), Value::Bool(true));
    }
    result
}

/// Protocol front end shared by both transports.
#[derive(Clone)]
pub struct McpServer {
    app: Arc<App>,
}

impl McpServer {
    pub fn new(config: Arc<OcmConfig>) -> Result<Self, ToolError> {
        let app = App::initialize(config)?;
        Ok(Self { app: Arc::new(app) })
    }

    pub fn app(&self) -> &App {
        &self.app
    }

    fn handle_initialize(&self, params: &Value) -> Value {
        let requested = params
            .get("protocolVersion")
            .and_then(|v| v.as_str())
            .unwrap_or(PROTOCOL_VERSION);
        serde_json::json!({
            "protocolVersion": requested,
            "capabilities": {"tools": {"listChanged": false}},
            "serverInfo": {"name": SERVER_NAME, "version": SERVER_VERSION},
        })
    }

    async fn handle_tools_call(
        &self,
        params: &Value,
        ctx: &InvocationContext,
    ) -> Result<Value, McpError> {
        let name = params.get("name").and_then(|v| v.as_str()).unwrap_or("");
        if name.is_empty() {
            return Err(McpError::invalid_params("Missing tool name"));
        }
        if tool_by_name(name).is_none() {
            return Err(unknown_tool_error(name, &tool_names()));
        }
        let args = match params.get("arguments") {
            None | Some(Value::Null) => Value::Object(Default::default()),
            Some(args) => args.clone(),
        };
        validate_tool_args(name, &args)?;

        let result = match self.app.tool_executor.execute(name, args, ctx).await {
            Ok(value) => text_content(render_tool_output(value)),
            Err(err) => tool_error_result(name, &err),
        };
        Ok(result)
    }

    /// Handles one decoded request. `None` means nothing goes back on the wire.
    pub async fn handle_request(
        &self,
        request: JsonRpcRequest,
        ctx: &InvocationContext,
    ) -> Option<JsonRpcResponse> {
        if request.method.starts_with("notifications/") && request.is_notification() {
            return None;
        }
        let id = request.id.clone()?;
        if request.jsonrpc != JSONRPC_VERSION {
            return Some(JsonRpcResponse::failure(
                id,
                ErrorCode::InvalidRequest.as_i32(),
                "Invalid request: jsonrpc must be \"2.0\"".to_string(),
            ));
        }
        let outcome = match request.method.as_str() {
            "initialize" => Ok(self.handle_initialize(&request.params)),
            "ping" => Ok(serde_json::json!({})),
            "tools/list" => Ok(list_tools()),
            "tools/call" => self.handle_tools_call(&request.params, ctx).await,
            method if method.starts_with("notifications/") => Ok(serde_json::json!({})),
            method => Err(McpError::method_not_found(method)),
        };
        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => JsonRpcResponse::failure(id, err.code.as_i32(), err.message),
        })
    }

    /// Decodes one raw message and handles it.
    pub async fn handle_message(
        &self,
        raw: &str,
        ctx: &InvocationContext,
    ) -> Option<JsonRpcResponse> {
        match decode_request(raw) {
            Ok(request) => self.handle_request(request, ctx).await,
            Err(response) => Some(response),
        }
    }

    pub async fn run_stdio(&self) -> Result<(), ToolError> {
        self.serve_lines(tokio::io::stdin(), tokio::io::stdout()).await
    }

    /// Newline-delimited JSON-RPC over any byte stream pair. Each `tools/call`
    /// runs on its own task; one writer task owns `output`.
    pub async fn serve_lines<R, W>(&self, input: R, output: W) -> Result<(), ToolError>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        let mut reader = BufReader::new(input).lines();
        let (tx, mut rx) = mpsc::unbounded_channel::<JsonRpcResponse>();

        let writer_logger = self.app.logger.child("stdio");
        let writer = tokio::spawn(async move {
            let mut writer = BufWriter::new(output);
            while let Some(response) = rx.recv().await {
                let payload = serde_json::to_string(&response).unwrap_or_default();
                let written = async {
                    writer.write_all(payload.as_bytes()).await?;
                    writer.write_all(b"\n").await?;
                    writer.flush().await
                }
                .await;
                if let Err(err) = written {
                    writer_logger.error(
                        "failed to write response",
                        Some(&serde_json::json!({ "error": err.to_string() })),
                    );
                    break;
                }
            }
        });

        let ctx = InvocationContext::new();
        let mut calls = JoinSet::new();
        while let Some(line) = reader.next_line().await? {
            reap_finished(&mut calls);
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let request = match decode_request(trimmed) {
                Ok(request) => request,
                Err(response) => {
                    let _ = tx.send(response);
                    continue;
                }
            };
            if request.method == "tools/call" {
                let server = self.clone();
                let tx = tx.clone();
                let ctx = ctx.clone();
                calls.spawn(async move {
                    if let Some(response) = server.handle_request(request, &ctx).await {
                        let _ = tx.send(response);
                    }
                });
            } else if let Some(response) = self.handle_request(request, &ctx).await {
                let _ = tx.send(response);
            }
        }

        while calls.join_next().await.is_some() {}
        drop(tx);
        writer
            .await
            .map_err(|err| ToolError::internal(format!("stdio writer failed: {}", err)))?;
        Ok(())
    }
}

/// Drops every call task that has already finished; returns how many.
fn reap_finished(calls: &mut JoinSet<()>) -> usize {
    let mut reaped = 0;
    while calls.try_join_next().is_some() {
        reaped += 1;
    }
    reaped
}

fn decode_request(raw: &str) -> Result<JsonRpcRequest, JsonRpcResponse> {
    let parsed: Value = serde_json::from_str(raw).map_err(|_| {
        JsonRpcResponse::failure(
            Value::Null,
            ErrorCode::ParseError.as_i32(),
            "Parse error".to_string(),
        )
    })?;
    let id = parsed.get("id").cloned().unwrap_or(Value::Null);
    serde_json::from_value(parsed).map_err(|_| {
        JsonRpcResponse::failure(
            id,
            ErrorCode::InvalidRequest.as_i32(),
            "Invalid request".to_string(),
        )
    })
}

pub async fn run_stdio(config: Arc<OcmConfig>) -> Result<(), ToolError> {
    let server = McpServer::new(config)?;
    server.run_stdio().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Transport;
    use crate::constants::defaults;
    use crate::errors::ToolErrorKind;

    fn server() -> McpServer {
        let config = OcmConfig::new(defaults::API_BASE, defaults::ACCESS_TOKEN_URL, Transport::Stdio)
            .unwrap();
        McpServer::new(Arc::new(config)).unwrap()
    }

    async fn call(server: &McpServer, raw: &str) -> Option<JsonRpcResponse> {
        server.handle_message(raw, &InvocationContext::new()).await
    }

    #[tokio::test]
    async fn malformed_json_is_a_parse_error() {
        let response = call(&server(), "{not json").await.unwrap();
        assert_eq!(response.error.unwrap().code, -32700);
        assert_eq!(response.id, Value::Null);
    }

    #[tokio::test]
    async fn missing_method_is_an_invalid_request() {
        let response = call(&server(), r#"{"jsonrpc":"2.0","id":3}"#).await.unwrap();
        assert_eq!(response.error.unwrap().code, -32600);
        assert_eq!(response.id, Value::from(3));
    }

    #[tokio::test]
    async fn unknown_method_is_reported() {
        let response = call(&server(), r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(response.error.unwrap().code, -32601);
    }

    #[tokio::test]
    async fn notifications_get_no_response() {
        let response = call(&server(), r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn initialize_and_list_tools() {
        let server = server();
        let init = call(&server, r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        assert_eq!(init.result.unwrap()["serverInfo"]["name"], "ocm-mcp");

        let list = call(&server, r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await
            .unwrap();
        let tools = list.result.unwrap()["tools"].as_array().unwrap().len();
        assert_eq!(tools, 7);
    }

    #[tokio::test]
    async fn unknown_tool_suggests_close_names() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"get_clustrs"}}"#,
        )
        .await
        .unwrap();
        let error = response.error.unwrap();
        assert_eq!(error.code, -32602);
        assert!(error.message.contains("Did you mean: get_clusters"));
    }

    #[tokio::test]
    async fn missing_offline_token_is_an_error_result_not_a_protocol_error() {
        let response = call(
            &server(),
            r#"{"jsonrpc":"2.0","id":1,"method":"tools/call","params":{"name":"whoami","arguments":{}}}"#,
        )
        .await
        .unwrap();
        assert!(response.error.is_none());
        let result = response.result.unwrap();
        assert_eq!(result["isError"], true);
        let text = result["content"][0]["text"].as_str().unwrap();
        assert!(text.contains("code: CONFIGURATION_MISSING"));
        assert!(text.contains("stage: resolving_credential"));
        assert!(text.contains("OCM_OFFLINE_TOKEN"));
    }

    #[test]
    fn tool_error_text_is_tagged() {
        let err = ToolError::new(ToolErrorKind::Upstream, "CALL_FAILED", "HTTP 500: boom")
            .with_hint("retry later");
        let text = format_tool_error("get_cluster", &err);
        assert!(text.starts_with("OcmError\ntool: get_cluster\nkind: upstream\ncode: CALL_FAILED"));
        assert!(text.ends_with("hint: retry later"));
    }

    #[tokio::test]
    async fn finished_calls_are_reaped_before_eof() {
        let mut calls = JoinSet::new();
        for _ in 0..3 {
            calls.spawn(async {});
        }
        while calls.len() > 0 {
            tokio::task::yield_now().await;
            if reap_finished(&mut calls) == 0 {
                tokio::time::sleep(std::time::Duration::from_millis(5)).await;
            }
        }
        assert!(calls.is_empty());
        assert_eq!(reap_finished(&mut calls), 0);
    }

    #[tokio::test]
    async fn line_loop_answers_every_request_in_a_long_session() {
        use tokio::io::AsyncReadExt;

        let mut input = String::new();
        for id in 1..=20 {
            input.push_str(&format!(
                "{{\"jsonrpc\":\"2.0\",\"id\":{},\"method\":\"tools/call\",\"params\":{{\"name\":\"whoami\"}}}}\n",
                id
            ));
        }
        input.push_str("{\"jsonrpc\":\"2.0\",\"id\":99,\"method\":\"ping\"}\n");

        let (output, mut peer) = tokio::io::duplex(1 << 20);
        server()
            .serve_lines(input.as_bytes(), output)
            .await
            .unwrap();

        let mut written = String::new();
        peer.read_to_string(&mut written).await.unwrap();
        let responses: Vec<Value> = written
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();
        assert_eq!(responses.len(), 21);
        let errors = responses
            .iter()
            .filter(|response| response["result"]["isError"] == true)
            .count();
        assert_eq!(errors, 20);
    }

    #[test]
    fn non_string_results_are_pretty_json() {
        let text = render_tool_output(serde_json::json!({"id": "abc"}));
        assert_eq!(text, "{\n  \"id\": \"abc\"\n}");
    }
}
