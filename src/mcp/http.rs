use crate::config::OcmConfig;
use crate::constants::headers;
use crate::errors::ToolError;
use crate::mcp::server::McpServer;
use crate::services::context::InvocationContext;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::sync::Arc;
use tokio::net::TcpListener;

/// Copies every UTF-8 request header into the invocation context. Headers
/// that are not valid UTF-8 cannot be credentials and are skipped.
fn invocation_context(request_headers: &HeaderMap) -> InvocationContext {
    let session_id = request_headers
        .get(headers::SESSION_ID)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    InvocationContext::from_headers(request_headers.iter().filter_map(|(name, value)| {
        value
            .to_str()
            .ok()
            .map(|value| (name.as_str().to_string(), value.to_string()))
    }))
    .with_session_id(Some(session_id))
}

async fn handle_mcp(
    State(server): State<McpServer>,
    request_headers: HeaderMap,
    body: String,
) -> Response {
    let ctx = invocation_context(&request_headers);
    let session_id = ctx.session_id().unwrap_or_default().to_string();
    match server.handle_message(&body, &ctx).await {
        Some(response) => (
            StatusCode::OK,
            [(headers::SESSION_ID, session_id)],
            Json(response),
        )
            .into_response(),
        None => (StatusCode::ACCEPTED, [(headers::SESSION_ID, session_id)]).into_response(),
    }
}

async fn health(State(server): State<McpServer>) -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "log": server.app().logger.stats(),
    }))
}

pub fn router(server: McpServer) -> Router {
    Router::new()
        .route("/mcp", post(handle_mcp))
        .route("/health", get(health))
        .with_state(server)
}

pub async fn serve(listener: TcpListener, server: McpServer) -> Result<(), ToolError> {
    let logger = server.app().logger.child("http");
    if let Ok(addr) = listener.local_addr() {
        logger.info(
            "listening",
            Some(&serde_json::json!({ "addr": addr.to_string(), "path": "/mcp" })),
        );
    }
    axum::serve(listener, router(server)).await?;
    Ok(())
}

pub async fn run_http(config: Arc<OcmConfig>) -> Result<(), ToolError> {
    let addr = config.http_addr();
    let server = McpServer::new(config)?;
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|err| ToolError::internal(format!("failed to bind {}: {}", addr, err)))?;
    serve(listener, server).await
}
