use crate::config::OcmConfig;
use crate::constants::network::USER_AGENT;
use crate::errors::{DispatchError, DispatchStage};
use crate::services::context::InvocationContext;
use crate::services::credentials::CredentialSource;
use crate::services::logger::Logger;
use crate::services::token_exchange::{AccessToken, TokenExchanger};
use crate::utils::http::{describe_reqwest_error, summarize_error_body};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION};
use reqwest::{Client, Method};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Instant;

/// One outbound OCM API call: target, method and optional data.
///
/// GET sends `data` as query parameters; every other method sends it as a
/// JSON body.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    method: Method,
    url: String,
    data: Option<Map<String, Value>>,
}

impl ApiRequest {
    pub fn new(method: Method, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            data: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(Method::GET, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(Method::POST, url)
    }

    pub fn with_data(mut self, data: Map<String, Value>) -> Self {
        self.data = Some(data);
        self
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn data(&self) -> Option<&Map<String, Value>> {
        self.data.as_ref()
    }

    /// Scalars only: strings verbatim, numbers and booleans as JSON text.
    /// Nulls are dropped.
    fn query_pairs(&self) -> Vec<(String, String)> {
        let Some(data) = &self.data else {
            return Vec::new();
        };
        data.iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| {
                let text = value
                    .as_str()
                    .map(str::to_string)
                    .unwrap_or_else(|| value.to_string());
                (key.clone(), text)
            })
            .collect()
    }
}

/// Resolves credentials, exchanges them for an access token and executes one
/// API call with it.
///
/// Every dispatch performs its own exchange and builds its own HTTP client;
/// nothing survives between invocations.
pub struct Dispatcher {
    logger: Logger,
    config: Arc<OcmConfig>,
    credentials: Arc<dyn CredentialSource>,
    exchanger: TokenExchanger,
}

impl Dispatcher {
    pub fn new(
        logger: Logger,
        config: Arc<OcmConfig>,
        credentials: Arc<dyn CredentialSource>,
    ) -> Self {
        let exchanger = TokenExchanger::new(logger.clone(), config.token_url());
        Self {
            logger: logger.child("dispatch"),
            config,
            credentials,
            exchanger,
        }
    }

    pub fn config(&self) -> &OcmConfig {
        &self.config
    }

    pub async fn dispatch(
        &self,
        ctx: &InvocationContext,
        request: &ApiRequest,
    ) -> Result<Value, DispatchError> {
        let started = Instant::now();
        let result = self.run(ctx, request).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        match &result {
            Ok(_) => self.logger.info(
                "dispatch succeeded",
                Some(&serde_json::json!({
                    "method": request.method().as_str(),
                    "url": request.url(),
                    "duration_ms": duration_ms,
                })),
            ),
            Err(err) => self.logger.warn(
                "dispatch failed",
                Some(&serde_json::json!({
                    "method": request.method().as_str(),
                    "url": request.url(),
                    "stage": err.stage().as_str(),
                    "code": err.code(),
                    "authentication": err.is_authentication_failure(),
                    "status": err.status(),
                    "duration_ms": duration_ms,
                })),
            ),
        }
        result
    }

    async fn run(
        &self,
        ctx: &InvocationContext,
        request: &ApiRequest,
    ) -> Result<Value, DispatchError> {
        self.enter(DispatchStage::ResolvingCredential);
        let credentials = self.credentials.resolve(ctx)?;

        self.enter(DispatchStage::ExchangingToken);
        let client = self.build_client()?;
        let token = self.exchanger.exchange(&client, &credentials).await?;

        self.enter(DispatchStage::ExecutingCall);
        self.execute(&client, &token, request).await
    }

    fn enter(&self, stage: DispatchStage) {
        self.logger
            .debug("stage", Some(&serde_json::json!({ "stage": stage.as_str() })));
    }

    fn build_client(&self) -> Result<Client, DispatchError> {
        Client::builder()
            .user_agent(USER_AGENT)
            .timeout(self.config.request_timeout)
            .build()
            .map_err(|err| DispatchError::TokenExchangeFailed {
                status: None,
                timed_out: false,
                reason: format!("failed to build HTTP client: {}", err),
            })
    }

    fn build_headers(
        &self,
        token: &AccessToken,
        request: &ApiRequest,
    ) -> Result<HeaderMap, DispatchError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        let mut bearer = HeaderValue::from_str(&format!("Bearer {}", token.expose()))
            .map_err(|_| call_failed(request, None, false, "access token is not a valid header value"))?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
        Ok(headers)
    }

    async fn execute(
        &self,
        client: &Client,
        token: &AccessToken,
        request: &ApiRequest,
    ) -> Result<Value, DispatchError> {
        let secrets = [token.expose().to_string()];
        let mut builder = client
            .request(request.method().clone(), request.url())
            .headers(self.build_headers(token, request)?);
        if let Some(data) = request.data() {
            builder = if *request.method() == Method::GET {
                builder.query(&request.query_pairs())
            } else {
                builder.json(data)
            };
        }

        let response = builder.send().await.map_err(|err| {
            let (timed_out, reason) = describe_reqwest_error(&err, &secrets);
            call_failed(request, None, timed_out, reason)
        })?;
        let status = response.status();
        let body = response.text().await.map_err(|err| {
            let (timed_out, reason) = describe_reqwest_error(&err, &secrets);
            call_failed(request, Some(status.as_u16()), timed_out, reason)
        })?;

        if !status.is_success() {
            return Err(call_failed(
                request,
                Some(status.as_u16()),
                false,
                summarize_error_body(status.as_u16(), &body, &secrets),
            ));
        }
        if body.trim().is_empty() {
            return Ok(Value::Null);
        }
        serde_json::from_str(&body).map_err(|err| {
            call_failed(
                request,
                Some(status.as_u16()),
                false,
                format!("response is not valid JSON: {}", err),
            )
        })
    }
}

fn call_failed(
    request: &ApiRequest,
    status: Option<u16>,
    timed_out: bool,
    reason: impl Into<String>,
) -> DispatchError {
    DispatchError::CallFailed {
        method: request.method().to_string(),
        url: request.url().to_string(),
        status,
        timed_out,
        reason: reason.into(),
    }
}
