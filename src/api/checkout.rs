use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use std::time::Instant;
use tracing::info;

use super::AppState;
use crate::error::AppError;
use crate::payments::types::{
    CreatePaymentInput, QueryTransactionResponse, SdkConfig, REGION_CODE,
};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateOrderReply {
    pub success: bool,
    pub prepay_id: String,
    pub trade_no: String,
    pub out_trade_no: String,
}

/// First `X-Forwarded-For` hop, falling back to `X-Real-IP`.
pub fn client_ip(headers: &HeaderMap) -> Option<String> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or_else(|| {
            headers
                .get("x-real-ip")
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
        })
        .map(str::to_string)
}

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> Json<SdkConfig> {
    let config = &state.config;
    info!(app_id = %config.app_id, env = %config.environment, "sdk config requested");
    Json(SdkConfig {
        app_id: config.app_id.clone(),
        public_key: config.public_key.clone(),
        env: config.environment,
        region_code: REGION_CODE.to_string(),
    })
}

/// POST /api/create-order
pub async fn create_order(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CreateOrderReply>, AppError> {
    let mut input: CreatePaymentInput = serde_json::from_slice(&body)
        .map_err(|e| AppError::InvalidArgument(format!("Invalid request body: {}", e)))?;

    let has_ip = input
        .ip_address
        .as_deref()
        .map_or(false, |ip| !ip.trim().is_empty());
    if !has_ip {
        input.ip_address = client_ip(&headers);
    }

    let started = Instant::now();
    let order = state.orders.create_order(input).await?;
    info!(
        trade_no = %order.trade_no,
        out_trade_no = %order.out_trade_no,
        elapsed_ms = started.elapsed().as_millis() as u64,
        "order created"
    );

    Ok(Json(CreateOrderReply {
        success: true,
        prepay_id: order.prepay_id,
        trade_no: order.trade_no,
        out_trade_no: order.out_trade_no,
    }))
}

/// GET /api/query-transaction/{trade_no}
pub async fn query_transaction(
    State(state): State<AppState>,
    Path(trade_no): Path<String>,
) -> Result<Json<QueryTransactionResponse>, AppError> {
    let response = state.transactions.query_transaction(&trade_no).await?;
    Ok(Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_client_ip_prefers_first_forwarded_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }

    #[test]
    fn test_client_ip_falls_back_to_real_ip() {
        let mut headers = HeaderMap::new();
        headers.insert("x-real-ip", HeaderValue::from_static("198.51.100.4"));
        assert_eq!(client_ip(&headers).as_deref(), Some("198.51.100.4"));
        assert_eq!(client_ip(&HeaderMap::new()), None);
    }
}
