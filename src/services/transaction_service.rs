use crate::config::GatewayConfig;
use crate::error::{AppError, AppResult};
use crate::payments::client::GatewayTransport;
use crate::payments::error::GatewayError;
use crate::payments::order_builder::format_timestamp;
use crate::payments::types::{parse_gateway_reply, QueryRequest, QueryTransactionResponse};
use std::sync::Arc;
use tracing::{info, warn};

pub const QUERY_ENDPOINT: &str = "/trade/query";
pub const TRADE_NO_REQUIRED: &str = "Trade number is required";

/// Read-only status lookups against `/trade/query`.
pub struct TransactionService {
    transport: Arc<dyn GatewayTransport>,
    config: GatewayConfig,
}

impl TransactionService {
    pub fn new(transport: Arc<dyn GatewayTransport>, config: GatewayConfig) -> Self {
        Self { transport, config }
    }

    pub async fn query_transaction(&self, trade_no: &str) -> AppResult<QueryTransactionResponse> {
        let trade_no = trade_no.trim();
        if trade_no.is_empty() {
            return Err(AppError::InvalidArgument(TRADE_NO_REQUIRED.to_string()));
        }

        let request = QueryRequest {
            app_id: self.config.app_id.clone(),
            timestamp: format_timestamp(),
            trade_no: trade_no.to_string(),
        };
        let body = serde_json::to_value(&request).map_err(|e| {
            GatewayError::invalid_response(format!("failed to encode query request: {}", e))
        })?;

        let raw = self.transport.post(QUERY_ENDPOINT, &body).await?;
        let response: QueryTransactionResponse = parse_gateway_reply(raw).map_err(|e| {
            warn!(trade_no = %trade_no, error = %e, "transaction query failed");
            e
        })?;

        info!(
            trade_no = %trade_no,
            trade_status = %response.trade_status,
            is_final = response.status().map_or(false, |s| s.is_terminal()),
            "transaction queried"
        );
        Ok(response)
    }
}
