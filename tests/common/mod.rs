#![allow(dead_code)]

use ocm_mcp::config::{OcmConfig, Transport};
use ocm_mcp::services::credentials::credential_source_for;
use ocm_mcp::services::dispatcher::Dispatcher;
use ocm_mcp::services::logger::Logger;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub const TOKEN_PATH: &str = "/auth/token";

/// One mock server plays both the identity provider and the OCM API.
pub fn config(server: &MockServer, transport: Transport) -> OcmConfig {
    OcmConfig::new(
        &server.uri(),
        &format!("{}{}", server.uri(), TOKEN_PATH),
        transport,
    )
    .expect("mock server URIs are valid")
}

pub fn dispatcher(config: OcmConfig) -> Dispatcher {
    let config = Arc::new(config);
    Dispatcher::new(
        Logger::new("test"),
        config.clone(),
        credential_source_for(config),
    )
}

/// Exchanges `refresh_token` for `access_token`; other refresh tokens fall
/// through to whatever else is mounted.
pub async fn mount_exchange(server: &MockServer, refresh_token: &str, access_token: &str) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains(format!("refresh_token={}", refresh_token)))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": access_token,
            "token_type": "Bearer",
            "expires_in": 900,
        })))
        .mount(server)
        .await;
}

pub async fn requests_to(server: &MockServer, target: &str) -> Vec<wiremock::Request> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .filter(|request| request.url.path() == target)
        .collect()
}

pub fn form_body(request: &wiremock::Request) -> HashMap<String, String> {
    serde_urlencoded::from_bytes(&request.body).expect("form-encoded body")
}

pub fn tool_call(id: u64, name: &str, arguments: Value) -> String {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "method": "tools/call",
        "params": {"name": name, "arguments": arguments},
    })
    .to_string()
}
