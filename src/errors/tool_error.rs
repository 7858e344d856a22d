use crate::errors::DispatchError;
use crate::utils::redact::redact_text;
use serde::Serialize;
use serde_json::Value;
use std::error::Error;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolErrorKind {
    InvalidParams,
    Unauthenticated,
    Denied,
    NotFound,
    Timeout,
    Upstream,
    Internal,
}

#[derive(Debug, Clone, Serialize)]
pub struct ToolError {
    pub kind: ToolErrorKind,
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    pub retryable: bool,
}

impl ToolError {
    pub fn new(kind: ToolErrorKind, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
            message: message.into(),
            hint: None,
            details: None,
            retryable: matches!(kind, ToolErrorKind::Timeout | ToolErrorKind::Upstream),
        }
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::InvalidParams, "INVALID_PARAMS", message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::NotFound, "NOT_FOUND", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ToolErrorKind::Internal, "INTERNAL", message)
    }

    /// The stage tag carried over from a dispatch failure, if any.
    pub fn stage(&self) -> Option<&str> {
        self.details
            .as_ref()
            .and_then(|d| d.get("stage"))
            .and_then(|v| v.as_str())
    }
}

impl fmt::Display for ToolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for ToolError {}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::internal(err.to_string())
    }
}

impl From<DispatchError> for ToolError {
    fn from(err: DispatchError) -> Self {
        let kind = if err.is_timeout() {
            ToolErrorKind::Timeout
        } else {
            match &err {
                DispatchError::ConfigurationMissing { .. }
                | DispatchError::CredentialMissing { .. } => ToolErrorKind::Unauthenticated,
                DispatchError::TokenExchangeFailed { .. } => ToolErrorKind::Denied,
                DispatchError::CallFailed {
                    status: Some(404), ..
                } => ToolErrorKind::NotFound,
                DispatchError::CallFailed { .. } => ToolErrorKind::Upstream,
            }
        };
        let hint = match &err {
            DispatchError::ConfigurationMissing { setting } => {
                format!("Set {} in the server environment and restart it.", setting)
            }
            DispatchError::CredentialMissing { header } => format!(
                "Send your OCM offline token in the {} request header.",
                header
            ),
            DispatchError::TokenExchangeFailed { .. } => {
                "The identity provider rejected the offline token. Obtain a fresh one from https://console.redhat.com/openshift/token."
                    .to_string()
            }
            DispatchError::CallFailed { .. } => {
                "Authentication succeeded; the OCM API call itself failed.".to_string()
            }
        };
        let mut details = serde_json::json!({ "stage": err.stage().as_str() });
        if let Some(status) = err.status() {
            details["status"] = Value::from(status);
        }
        let message = redact_text(&err.to_string(), 2048, None);
        let mut out = ToolError::new(kind, err.code(), message)
            .with_hint(hint)
            .with_details(details);
        // Nothing is retried inside an invocation; the flag only tells the caller
        // whether trying again later could help.
        out.retryable = matches!(kind, ToolErrorKind::Timeout)
            || matches!(err.status(), Some(status) if status >= 500);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_and_call_failures_map_to_different_kinds() {
        let exchange: ToolError = DispatchError::TokenExchangeFailed {
            status: Some(400),
            timed_out: false,
            reason: "invalid_grant".to_string(),
        }
        .into();
        assert_eq!(exchange.kind, ToolErrorKind::Denied);
        assert_eq!(exchange.code, "TOKEN_EXCHANGE_FAILED");
        assert_eq!(exchange.stage(), Some("exchanging_token"));
        assert!(!exchange.retryable);

        let call: ToolError = DispatchError::CallFailed {
            method: "GET".to_string(),
            url: "https://api.example.com/clusters".to_string(),
            status: Some(503),
            timed_out: false,
            reason: "unavailable".to_string(),
        }
        .into();
        assert_eq!(call.kind, ToolErrorKind::Upstream);
        assert_eq!(call.code, "CALL_FAILED");
        assert_eq!(call.stage(), Some("executing_call"));
        assert!(call.retryable);
    }

    #[test]
    fn timeouts_keep_their_code() {
        let err: ToolError = DispatchError::CallFailed {
            method: "GET".to_string(),
            url: "https://api.example.com/clusters".to_string(),
            status: None,
            timed_out: true,
            reason: "timed out".to_string(),
        }
        .into();
        assert_eq!(err.kind, ToolErrorKind::Timeout);
        assert_eq!(err.code, "CALL_FAILED");
    }
}
