use crate::config::GatewayConfig;
use crate::logging::mask_secret;
use crate::payments::error::{GatewayError, GatewayResult};
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use reqwest::Client;
use serde_json::Value as JsonValue;
use std::time::{Duration, Instant};
use tracing::{debug, error, info};

/// Transport seam between the services and the Pagsmile REST API.
///
/// Bodies cross this boundary as raw JSON; the services parse them into the
/// typed response for each endpoint.
#[async_trait]
pub trait GatewayTransport: Send + Sync {
    async fn post(&self, endpoint: &str, body: &JsonValue) -> GatewayResult<JsonValue>;

    async fn get(&self, endpoint: &str) -> GatewayResult<JsonValue>;
}

pub fn basic_auth_header(app_id: &str, security_key: &str) -> String {
    let credentials = format!("{}:{}", app_id, security_key);
    format!("Basic {}", STANDARD.encode(credentials))
}

#[derive(Clone)]
pub struct PagsmileHttpClient {
    client: Client,
    base_url: String,
    auth_header: String,
    timeout: Duration,
}

impl PagsmileHttpClient {
    pub fn new(config: &GatewayConfig) -> GatewayResult<Self> {
        let timeout = Duration::from_secs(config.timeout_secs);
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| GatewayError::Unreachable {
                message: format!("failed to initialize HTTP client: {}", e),
            })?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            auth_header: basic_auth_header(&config.app_id, &config.security_key),
            timeout,
        })
    }

    pub fn auth_header(&self) -> &str {
        &self.auth_header
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn request_json(
        &self,
        method: reqwest::Method,
        path: &str,
        body: Option<&JsonValue>,
    ) -> GatewayResult<JsonValue> {
        let url = self.endpoint(path);
        debug!(
            url = %url,
            method = %method,
            authorization = %mask_secret(&self.auth_header, 20),
            "sending pagsmile request"
        );

        let mut request = self
            .client
            .request(method.clone(), &url)
            .timeout(self.timeout)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::AUTHORIZATION, &self.auth_header);
        if let Some(payload) = body {
            request = request.json(payload);
        }

        let started = Instant::now();
        let response = request.send().await.map_err(|e| {
            error!(url = %url, error = %e, "pagsmile request failed before a response");
            GatewayError::Unreachable {
                message: format!("request to {} failed: {}", path, e),
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| GatewayError::Unreachable {
            message: format!("failed to read response body from {}: {}", path, e),
        })?;
        let elapsed_ms = started.elapsed().as_millis();

        if !status.is_success() {
            error!(
                url = %url,
                status = status.as_u16(),
                elapsed_ms = elapsed_ms as u64,
                body = %text,
                "pagsmile returned an error status"
            );
            return Err(GatewayError::Http {
                status: status.as_u16(),
                body: text,
            });
        }

        info!(
            url = %url,
            method = %method,
            status = status.as_u16(),
            elapsed_ms = elapsed_ms as u64,
            "pagsmile response received"
        );

        serde_json::from_str::<JsonValue>(&text).map_err(|e| {
            GatewayError::invalid_response(format!("response from {} is not JSON: {}", path, e))
        })
    }
}

#[async_trait]
impl GatewayTransport for PagsmileHttpClient {
    async fn post(&self, endpoint: &str, body: &JsonValue) -> GatewayResult<JsonValue> {
        self.request_json(reqwest::Method::POST, endpoint, Some(body))
            .await
    }

    async fn get(&self, endpoint: &str) -> GatewayResult<JsonValue> {
        self.request_json(reqwest::Method::GET, endpoint, None).await
    }
}
