use crate::constants::limits::ERROR_BODY_EXCERPT;
use crate::utils::redact::redact_text;
use crate::utils::text::first_line;
use serde_json::Value;

/// Short, secret-free description of a non-2xx response body.
///
/// Prefers the fields identity providers and the OCM API put their
/// explanation in, falling back to the first line of the raw body.
pub fn summarize_error_body(status: u16, body: &str, secrets: &[String]) -> String {
    let detail = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|parsed| {
            ["error_description", "reason", "error", "message"]
                .iter()
                .find_map(|key| parsed.get(*key).and_then(Value::as_str).map(str::to_string))
        })
        .unwrap_or_else(|| first_line(body, ERROR_BODY_EXCERPT));
    let message = if detail.trim().is_empty() {
        format!("HTTP {}", status)
    } else {
        format!("HTTP {}: {}", status, detail.trim())
    };
    redact_text(&message, ERROR_BODY_EXCERPT, Some(secrets))
}

/// `(timed_out, reason)` for a transport-level failure.
pub fn describe_reqwest_error(err: &reqwest::Error, secrets: &[String]) -> (bool, String) {
    let reason = if err.is_timeout() {
        "request timed out".to_string()
    } else if err.is_connect() {
        format!("connection failed: {}", err)
    } else {
        err.to_string()
    };
    (
        err.is_timeout(),
        redact_text(&reason, ERROR_BODY_EXCERPT, Some(secrets)),
    )
}
