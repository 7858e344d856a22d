use crate::errors::DispatchError;
use crate::services::credentials::Credentials;
use crate::services::logger::Logger;
use crate::utils::http::{describe_reqwest_error, summarize_error_body};
use reqwest::header::ACCEPT;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::Value;
use std::fmt;

/// Short-lived bearer token. Lives for exactly one dispatched call.
pub struct AccessToken(SecretString);

impl AccessToken {
    pub fn expose(&self) -> &str {
        self.0.expose_secret()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken([REDACTED])")
    }
}

/// OAuth2 refresh-token grant against the configured token endpoint.
#[derive(Clone)]
pub struct TokenExchanger {
    logger: Logger,
    token_url: String,
}

impl TokenExchanger {
    pub fn new(logger: Logger, token_url: impl Into<String>) -> Self {
        Self {
            logger: logger.child("token"),
            token_url: token_url.into(),
        }
    }

    /// Trades `credentials` for a fresh access token. Nothing is cached.
    pub async fn exchange(
        &self,
        client: &Client,
        credentials: &Credentials,
    ) -> Result<AccessToken, DispatchError> {
        let refresh_token = credentials.refresh_token.expose_secret();
        let secrets = [refresh_token.to_string()];
        let form = [
            ("grant_type", "refresh_token"),
            ("client_id", credentials.client_id.as_str()),
            ("refresh_token", refresh_token),
        ];

        let response = client
            .post(&self.token_url)
            .header(ACCEPT, "application/json")
            .form(&form)
            .send()
            .await
            .map_err(|err| {
                let (timed_out, reason) = describe_reqwest_error(&err, &secrets);
                DispatchError::TokenExchangeFailed {
                    status: None,
                    timed_out,
                    reason,
                }
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|err| {
            let (timed_out, reason) = describe_reqwest_error(&err, &secrets);
            DispatchError::TokenExchangeFailed {
                status: Some(status.as_u16()),
                timed_out,
                reason,
            }
        })?;

        if !status.is_success() {
            self.logger.debug(
                "token endpoint rejected the refresh credential",
                Some(&serde_json::json!({
                    "status": status.as_u16(),
                    "client_id": credentials.client_id,
                })),
            );
            return Err(DispatchError::TokenExchangeFailed {
                status: Some(status.as_u16()),
                timed_out: false,
                reason: summarize_error_body(status.as_u16(), &body, &secrets),
            });
        }

        let payload: Value =
            serde_json::from_str(&body).map_err(|_| DispatchError::TokenExchangeFailed {
                status: Some(status.as_u16()),
                timed_out: false,
                reason: "token endpoint returned a non-JSON body".to_string(),
            })?;
        let token = payload
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.trim().is_empty())
            .ok_or_else(|| DispatchError::TokenExchangeFailed {
                status: Some(status.as_u16()),
                timed_out: false,
                reason: "token response has no access_token".to_string(),
            })?;
        // Opaque secret: used verbatim or not at all.
        if token.trim() != token {
            return Err(DispatchError::TokenExchangeFailed {
                status: Some(status.as_u16()),
                timed_out: false,
                reason: "access_token has surrounding whitespace".to_string(),
            });
        }

        Ok(AccessToken(SecretString::from(token.to_string())))
    }
}
