use crate::config::{OcmConfig, TransportMode};
use crate::constants::{headers, settings};
use crate::errors::DispatchError;
use crate::services::context::InvocationContext;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;

/// The pair presented to the identity provider for one invocation.
pub struct Credentials {
    pub client_id: String,
    pub refresh_token: SecretString,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("client_id", &self.client_id)
            .field("refresh_token", &"[REDACTED]")
            .finish()
    }
}

/// Produces the caller's credentials. Implementations are pure lookups.
pub trait CredentialSource: Send + Sync {
    fn resolve(&self, ctx: &InvocationContext) -> Result<Credentials, DispatchError>;

    fn mode(&self) -> TransportMode;
}

/// Single-tenant: both values come from process configuration.
pub struct StaticSource {
    config: Arc<OcmConfig>,
}

impl StaticSource {
    pub fn new(config: Arc<OcmConfig>) -> Self {
        Self { config }
    }
}

impl CredentialSource for StaticSource {
    fn resolve(&self, _ctx: &InvocationContext) -> Result<Credentials, DispatchError> {
        let client_id = self
            .config
            .client_id()
            .ok_or(DispatchError::ConfigurationMissing {
                setting: settings::CLIENT_ID,
            })?;
        let token = self
            .config
            .offline_token()
            .ok_or(DispatchError::ConfigurationMissing {
                setting: settings::OFFLINE_TOKEN,
            })?;
        Ok(Credentials {
            client_id: client_id.to_string(),
            refresh_token: SecretString::from(token.expose_secret().to_string()),
        })
    }

    fn mode(&self) -> TransportMode {
        TransportMode::SingleTenant
    }
}

/// Multi-tenant: the refresh credential travels with each invocation.
///
/// The configured offline token is never consulted here, even when present.
pub struct PerRequestSource {
    config: Arc<OcmConfig>,
}

impl PerRequestSource {
    pub fn new(config: Arc<OcmConfig>) -> Self {
        Self { config }
    }
}

impl CredentialSource for PerRequestSource {
    fn resolve(&self, ctx: &InvocationContext) -> Result<Credentials, DispatchError> {
        let token = ctx
            .header(headers::OFFLINE_TOKEN)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(DispatchError::CredentialMissing {
                header: headers::OFFLINE_TOKEN,
            })?;
        let client_id = ctx
            .header(headers::CLIENT_ID)
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .or_else(|| self.config.client_id())
            .ok_or(DispatchError::ConfigurationMissing {
                setting: settings::CLIENT_ID,
            })?;
        Ok(Credentials {
            client_id: client_id.to_string(),
            refresh_token: SecretString::from(token.to_string()),
        })
    }

    fn mode(&self) -> TransportMode {
        TransportMode::MultiTenant
    }
}

/// Picks the strategy once, at startup, from the configured transport.
pub fn credential_source_for(config: Arc<OcmConfig>) -> Arc<dyn CredentialSource> {
    match config.mode() {
        TransportMode::SingleTenant => Arc::new(StaticSource::new(config)),
        TransportMode::MultiTenant => Arc::new(PerRequestSource::new(config)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Transport;

    fn config(transport: Transport) -> OcmConfig {
        OcmConfig::new(
            "https://api.example.com",
            "https://sso.example.com/token",
            transport,
        )
        .unwrap()
    }

    #[test]
    fn static_source_reads_configuration() {
        let cfg = Arc::new(config(Transport::Stdio).with_offline_token(Some("offline-1".into())));
        let creds = StaticSource::new(cfg)
            .resolve(&InvocationContext::new())
            .unwrap();
        assert_eq!(creds.client_id, "cloud-services");
        assert_eq!(creds.refresh_token.expose_secret(), "offline-1");
    }

    #[test]
    fn static_source_reports_missing_offline_token() {
        let cfg = Arc::new(config(Transport::Stdio));
        let err = StaticSource::new(cfg)
            .resolve(&InvocationContext::new())
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::ConfigurationMissing {
                setting: "OCM_OFFLINE_TOKEN"
            }
        );
    }

    #[test]
    fn static_source_reports_missing_client_id() {
        let cfg = Arc::new(
            config(Transport::Stdio)
                .with_client_id(None)
                .with_offline_token(Some("offline-1".into())),
        );
        let err = StaticSource::new(cfg)
            .resolve(&InvocationContext::new())
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::ConfigurationMissing {
                setting: "OCM_CLIENT_ID"
            }
        );
    }

    #[test]
    fn static_source_ignores_request_headers() {
        let cfg = Arc::new(config(Transport::Stdio).with_offline_token(Some("from-env".into())));
        let ctx = InvocationContext::new().with_header("X-OCM-Offline-Token", "from-header");
        let creds = StaticSource::new(cfg).resolve(&ctx).unwrap();
        assert_eq!(creds.refresh_token.expose_secret(), "from-env");
    }

    #[test]
    fn per_request_source_requires_header() {
        let cfg = Arc::new(config(Transport::Http).with_offline_token(Some("from-env".into())));
        let err = PerRequestSource::new(cfg)
            .resolve(&InvocationContext::new())
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::CredentialMissing {
                header: "X-OCM-Offline-Token"
            }
        );
    }

    #[test]
    fn per_request_source_treats_blank_header_as_missing() {
        let cfg = Arc::new(config(Transport::Http));
        let ctx = InvocationContext::new().with_header("x-ocm-offline-token", "   ");
        let err = PerRequestSource::new(cfg).resolve(&ctx).unwrap_err();
        assert!(matches!(err, DispatchError::CredentialMissing { .. }));
    }

    #[test]
    fn per_request_source_falls_back_to_default_client_id() {
        let cfg = Arc::new(config(Transport::Http));
        let source = PerRequestSource::new(cfg);

        let ctx = InvocationContext::new().with_header("x-ocm-offline-token", "tenant-a");
        let creds = source.resolve(&ctx).unwrap();
        assert_eq!(creds.client_id, "cloud-services");
        assert_eq!(creds.refresh_token.expose_secret(), "tenant-a");

        let ctx = ctx.with_header("X-OCM-Client-Id", "custom-client");
        assert_eq!(source.resolve(&ctx).unwrap().client_id, "custom-client");
    }

    #[test]
    fn credential_source_follows_transport() {
        let single = credential_source_for(Arc::new(config(Transport::Stdio)));
        assert_eq!(single.mode(), TransportMode::SingleTenant);
        let multi = credential_source_for(Arc::new(config(Transport::Http)));
        assert_eq!(multi.mode(), TransportMode::MultiTenant);
    }

    #[test]
    fn credentials_debug_is_redacted() {
        let creds = Credentials {
            client_id: "cloud-services".to_string(),
            refresh_token: SecretString::from("hunter2-offline".to_string()),
        };
        assert!(!format!("{:?}", creds).contains("hunter2-offline"));
    }
}
