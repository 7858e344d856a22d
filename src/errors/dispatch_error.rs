use serde::Serialize;
use std::fmt;
use thiserror::Error;

/// Where an invocation was when it stopped.
///
/// Dispatch moves strictly forward through these stages; a failure is tagged
/// with the stage that produced it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DispatchStage {
    ResolvingCredential,
    ExchangingToken,
    ExecutingCall,
}

impl DispatchStage {
    pub fn as_str(self) -> &'static str {
        match self {
            DispatchStage::ResolvingCredential => "resolving_credential",
            DispatchStage::ExchangingToken => "exchanging_token",
            DispatchStage::ExecutingCall => "executing_call",
        }
    }
}

impl fmt::Display for DispatchStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of a single dispatched invocation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// A process-wide setting needed to authenticate is absent.
    #[error("required setting {setting} is not configured")]
    ConfigurationMissing { setting: &'static str },

    /// The invocation did not carry the credential header.
    #[error("request header {header} is required to authenticate")]
    CredentialMissing { header: &'static str },

    /// The identity provider refused the refresh credential or returned no
    /// usable access token.
    #[error("token exchange failed: {reason}")]
    TokenExchangeFailed {
        status: Option<u16>,
        timed_out: bool,
        reason: String,
    },

    /// Authenticated, but the target call did not produce a JSON result.
    #[error("{method} {url} failed: {reason}")]
    CallFailed {
        method: String,
        url: String,
        status: Option<u16>,
        timed_out: bool,
        reason: String,
    },
}

impl DispatchError {
    pub fn stage(&self) -> DispatchStage {
        match self {
            DispatchError::ConfigurationMissing { .. } | DispatchError::CredentialMissing { .. } => {
                DispatchStage::ResolvingCredential
            }
            DispatchError::TokenExchangeFailed { .. } => DispatchStage::ExchangingToken,
            DispatchError::CallFailed { .. } => DispatchStage::ExecutingCall,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            DispatchError::ConfigurationMissing { .. } => "CONFIGURATION_MISSING",
            DispatchError::CredentialMissing { .. } => "CREDENTIAL_MISSING",
            DispatchError::TokenExchangeFailed { .. } => "TOKEN_EXCHANGE_FAILED",
            DispatchError::CallFailed { .. } => "CALL_FAILED",
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            DispatchError::TokenExchangeFailed { status, .. }
            | DispatchError::CallFailed { status, .. } => *status,
            _ => None,
        }
    }

    pub fn is_timeout(&self) -> bool {
        match self {
            DispatchError::TokenExchangeFailed { timed_out, .. }
            | DispatchError::CallFailed { timed_out, .. } => *timed_out,
            _ => false,
        }
    }

    /// True when the caller has to fix credentials or configuration rather
    /// than look at the remote service.
    pub fn is_authentication_failure(&self) -> bool {
        !matches!(self, DispatchError::CallFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_failure_reports_its_originating_stage() {
        let missing = DispatchError::CredentialMissing {
            header: "X-OCM-Offline-Token",
        };
        assert_eq!(missing.stage(), DispatchStage::ResolvingCredential);

        let exchange = DispatchError::TokenExchangeFailed {
            status: Some(400),
            timed_out: false,
            reason: "invalid_grant".to_string(),
        };
        assert_eq!(exchange.stage(), DispatchStage::ExchangingToken);
        assert!(exchange.is_authentication_failure());

        let call = DispatchError::CallFailed {
            method: "GET".to_string(),
            url: "https://api.example.com/x".to_string(),
            status: Some(500),
            timed_out: false,
            reason: "boom".to_string(),
        };
        assert_eq!(call.stage(), DispatchStage::ExecutingCall);
        assert!(!call.is_authentication_failure());
        assert_eq!(call.status(), Some(500));
    }

    #[test]
    fn configuration_missing_names_the_setting() {
        let err = DispatchError::ConfigurationMissing {
            setting: "OCM_OFFLINE_TOKEN",
        };
        assert!(err.to_string().contains("OCM_OFFLINE_TOKEN"));
        assert_eq!(err.code(), "CONFIGURATION_MISSING");
    }
}
