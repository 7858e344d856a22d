use crate::constants::{defaults, network, settings};
use crate::services::logger::LogLevel;
use clap::Parser;
use secrecy::SecretString;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{setting} must be an http(s) URL, got '{value}'")]
    InvalidUrl { setting: &'static str, value: String },
    #[error("{setting} must be greater than zero")]
    ZeroTimeout { setting: &'static str },
}

/// Who supplies the refresh credential. Fixed for the life of the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    /// No per-call identity: credentials come from configuration.
    SingleTenant,
    /// Every call carries its own credential in a request header.
    MultiTenant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Stdio,
    Http,
}

impl Transport {
    pub fn mode(self) -> TransportMode {
        match self {
            Transport::Stdio => TransportMode::SingleTenant,
            Transport::Http => TransportMode::MultiTenant,
        }
    }
}

impl FromStr for Transport {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.trim().to_lowercase().as_str() {
            "stdio" => Ok(Transport::Stdio),
            "sse" | "streamable-http" | "http" => Ok(Transport::Http),
            other => Err(format!(
                "unknown transport '{}': expected stdio, sse or streamable-http",
                other
            )),
        }
    }
}

impl fmt::Display for Transport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Transport::Stdio => f.write_str("stdio"),
            Transport::Http => f.write_str("streamable-http"),
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "ocm-mcp",
    version,
    about = "MCP server for the OpenShift Cluster Manager API"
)]
pub struct Cli {
    /// Base URL of the OCM API.
    #[arg(long, env = settings::API_BASE, default_value = defaults::API_BASE)]
    pub api_base: String,

    /// OAuth client id used for the refresh-token grant.
    #[arg(long, env = settings::CLIENT_ID, default_value = defaults::CLIENT_ID)]
    pub client_id: String,

    /// Identity provider token endpoint.
    #[arg(long, env = settings::ACCESS_TOKEN_URL, default_value = defaults::ACCESS_TOKEN_URL)]
    pub token_url: String,

    /// stdio (single-tenant) or sse / streamable-http (multi-tenant).
    #[arg(long, env = settings::TRANSPORT, default_value = defaults::TRANSPORT)]
    pub transport: Transport,

    #[arg(long, env = "MCP_HOST", default_value = network::DEFAULT_HTTP_HOST)]
    pub host: String,

    #[arg(long, env = "MCP_PORT", default_value_t = network::DEFAULT_HTTP_PORT)]
    pub port: u16,

    /// Timeout for each outbound HTTP request, in milliseconds.
    #[arg(long, env = "OCM_TIMEOUT_MS", default_value_t = network::TIMEOUT_API_REQUEST_MS)]
    pub timeout_ms: u64,

    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: LogLevel,
}

/// Process-wide settings, built once at startup and shared by reference.
#[derive(Debug)]
pub struct OcmConfig {
    api_base: String,
    token_url: String,
    client_id: Option<String>,
    offline_token: Option<SecretString>,
    pub transport: Transport,
    pub host: String,
    pub port: u16,
    pub request_timeout: Duration,
    pub log_level: LogLevel,
}

impl OcmConfig {
    pub fn new(api_base: &str, token_url: &str, transport: Transport) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base: normalize_base_url(settings::API_BASE, api_base)?,
            token_url: validate_url(settings::ACCESS_TOKEN_URL, token_url)?,
            client_id: Some(defaults::CLIENT_ID.to_string()),
            offline_token: None,
            transport,
            host: network::DEFAULT_HTTP_HOST.to_string(),
            port: network::DEFAULT_HTTP_PORT,
            request_timeout: Duration::from_millis(network::TIMEOUT_API_REQUEST_MS),
            log_level: LogLevel::Info,
        })
    }

    /// `offline_token` is passed separately so it never shows up as a flag.
    pub fn from_cli(cli: Cli, offline_token: Option<String>) -> Result<Self, ConfigError> {
        if cli.timeout_ms == 0 {
            return Err(ConfigError::ZeroTimeout {
                setting: "OCM_TIMEOUT_MS",
            });
        }
        let mut config = Self::new(&cli.api_base, &cli.token_url, cli.transport)?
            .with_client_id(Some(cli.client_id))
            .with_offline_token(offline_token)
            .with_timeout(Duration::from_millis(cli.timeout_ms));
        config.host = cli.host;
        config.port = cli.port;
        config.log_level = cli.log_level;
        Ok(config)
    }

    pub fn with_client_id(mut self, client_id: Option<String>) -> Self {
        self.client_id = non_blank(client_id);
        self
    }

    pub fn with_offline_token(mut self, token: Option<String>) -> Self {
        self.offline_token = non_blank(token).map(SecretString::from);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn mode(&self) -> TransportMode {
        self.transport.mode()
    }

    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    /// `path` must start with `/`.
    pub fn api_url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    pub fn token_url(&self) -> &str {
        &self.token_url
    }

    pub fn client_id(&self) -> Option<&str> {
        self.client_id.as_deref()
    }

    pub fn offline_token(&self) -> Option<&SecretString> {
        self.offline_token.as_ref()
    }

    pub fn http_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn validate_url(setting: &'static str, raw: &str) -> Result<String, ConfigError> {
    let trimmed = raw.trim();
    let invalid = || ConfigError::InvalidUrl {
        setting,
        value: trimmed.to_string(),
    };
    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(invalid());
    }
    Ok(trimmed.to_string())
}

fn normalize_base_url(setting: &'static str, raw: &str) -> Result<String, ConfigError> {
    let validated = validate_url(setting, raw)?;
    let mut url = Url::parse(&validated).map_err(|_| ConfigError::InvalidUrl {
        setting,
        value: validated.clone(),
    })?;
    url.set_fragment(None);
    url.set_query(None);
    let normalized = format!("{}{}", url.origin().ascii_serialization(), url.path());
    Ok(normalized.trim_end_matches('/').to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    #[test]
    fn transport_selector_maps_to_tenancy() {
        assert_eq!("stdio".parse::<Transport>().unwrap().mode(), TransportMode::SingleTenant);
        assert_eq!("sse".parse::<Transport>().unwrap().mode(), TransportMode::MultiTenant);
        assert_eq!(
            "Streamable-HTTP".parse::<Transport>().unwrap().mode(),
            TransportMode::MultiTenant
        );
        assert!("carrier-pigeon".parse::<Transport>().is_err());
    }

    #[test]
    fn api_base_is_normalized_without_trailing_slash() {
        let config = OcmConfig::new(
            "https://api.openshift.com/?x=1",
            defaults::ACCESS_TOKEN_URL,
            Transport::Stdio,
        )
        .unwrap();
        assert_eq!(config.api_base(), "https://api.openshift.com");
        assert_eq!(
            config.api_url("/api/clusters_mgmt/v1/clusters"),
            "https://api.openshift.com/api/clusters_mgmt/v1/clusters"
        );
    }

    #[test]
    fn rejects_non_http_urls() {
        let err = OcmConfig::new("ftp://example.com", defaults::ACCESS_TOKEN_URL, Transport::Stdio)
            .unwrap_err();
        assert!(err.to_string().contains(settings::API_BASE));
        assert!(OcmConfig::new(defaults::API_BASE, "not a url", Transport::Stdio).is_err());
    }

    #[test]
    fn blank_values_count_as_absent() {
        let config = OcmConfig::new(defaults::API_BASE, defaults::ACCESS_TOKEN_URL, Transport::Stdio)
            .unwrap()
            .with_client_id(Some("  ".to_string()))
            .with_offline_token(Some(String::new()));
        assert!(config.client_id().is_none());
        assert!(config.offline_token().is_none());
    }

    #[test]
    fn debug_output_hides_offline_token() {
        let config = OcmConfig::new(defaults::API_BASE, defaults::ACCESS_TOKEN_URL, Transport::Stdio)
            .unwrap()
            .with_offline_token(Some("very-secret-offline-token".to_string()));
        assert_eq!(
            config.offline_token().map(|t| t.expose_secret().to_string()),
            Some("very-secret-offline-token".to_string())
        );
        assert!(!format!("{:?}", config).contains("very-secret-offline-token"));
    }

    #[test]
    fn cli_reads_flags_with_defaults() {
        let cli = Cli::try_parse_from(["ocm-mcp", "--transport", "sse", "--port", "9000"]).unwrap();
        let config = OcmConfig::from_cli(cli, None).unwrap();
        assert_eq!(config.mode(), TransportMode::MultiTenant);
        assert_eq!(config.port, 9000);
    }
}
