//! Where the reconciliation loop reads trade status from.

use crate::error::AppError;
use crate::services::TransactionService;
use async_trait::async_trait;
use reqwest::{Client, Url};
use serde_json::Value as JsonValue;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Error)]
pub enum StatusSourceError {
    #[error("status query failed: {0}")]
    Query(String),
    #[error("status endpoint unreachable: {0}")]
    Unreachable(String),
    #[error("invalid status response: {0}")]
    InvalidResponse(String),
    #[error("invalid backend URL: {0}")]
    InvalidBackendUrl(String),
}

/// Returns the raw `trade_status` text for a trade.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, trade_no: &str) -> Result<String, StatusSourceError>;
}

#[async_trait]
impl StatusSource for TransactionService {
    async fn fetch_status(&self, trade_no: &str) -> Result<String, StatusSourceError> {
        self.query_transaction(trade_no)
            .await
            .map(|response| response.trade_status)
            .map_err(|e| match e {
                AppError::Gateway(gateway) if gateway.is_retryable() => {
                    StatusSourceError::Unreachable(gateway.to_string())
                }
                other => StatusSourceError::Query(other.to_string()),
            })
    }
}

/// HTTP client for this backend's own `/api/query-transaction/{trade_no}`.
#[derive(Clone)]
pub struct CheckoutApiClient {
    client: Client,
    base_url: Url,
}

impl CheckoutApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, StatusSourceError> {
        let base_url = Url::parse(base_url)
            .map_err(|e| StatusSourceError::InvalidBackendUrl(e.to_string()))?;
        if base_url.cannot_be_a_base() {
            return Err(StatusSourceError::InvalidBackendUrl(base_url.to_string()));
        }
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| StatusSourceError::Unreachable(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    pub fn query_url(&self, trade_no: &str) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments
                .pop_if_empty()
                .extend(["api", "query-transaction", trade_no]);
        }
        url
    }
}

#[async_trait]
impl StatusSource for CheckoutApiClient {
    async fn fetch_status(&self, trade_no: &str) -> Result<String, StatusSourceError> {
        let url = self.query_url(trade_no);
        debug!(url = %url, "querying checkout backend");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| StatusSourceError::Unreachable(e.to_string()))?;

        let status = response.status();
        let body: JsonValue = response
            .json()
            .await
            .map_err(|e| StatusSourceError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            let message = body
                .get("error")
                .and_then(JsonValue::as_str)
                .unwrap_or("no error message")
                .to_string();
            return Err(StatusSourceError::Query(format!(
                "HTTP {}: {}",
                status.as_u16(),
                message
            )));
        }

        body.get("trade_status")
            .and_then(JsonValue::as_str)
            .map(str::to_string)
            .ok_or_else(|| {
                StatusSourceError::InvalidResponse("response has no trade_status".to_string())
            })
    }
}
