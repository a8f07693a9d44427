//! Payment-result notifications pushed by the gateway.
//!
//! Notifications are accepted without any authenticity check: Pagsmile's
//! signature scheme is not implemented, so anyone who can reach the route can
//! post a forged result. Treat events as hints and confirm through
//! `/trade/query` before fulfilling anything.

use crate::payments::types::{TradeStatus, WebhookPayload};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
pub enum WebhookError {
    #[error("Malformed webhook payload: {0}")]
    MalformedPayload(String),
    #[error("Event handler failed: {0}")]
    HandlerFailed(String),
}

/// Normalised form of a gateway notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentEvent {
    pub trade_no: String,
    pub out_trade_no: String,
    pub amount: String,
    pub currency: String,
    pub method: String,
    pub status: String,
}

impl From<WebhookPayload> for PaymentEvent {
    fn from(payload: WebhookPayload) -> Self {
        PaymentEvent {
            trade_no: payload.trade_no,
            out_trade_no: payload.out_trade_no,
            amount: payload.order_amount,
            currency: payload.order_currency,
            method: payload.method,
            status: payload.trade_status,
        }
    }
}

#[async_trait]
pub trait PaymentEventSink: Send + Sync {
    async fn on_success(&self, event: &PaymentEvent) -> Result<(), WebhookError>;

    async fn on_failure(&self, event: &PaymentEvent) -> Result<(), WebhookError>;
}

/// Default sink: records the event and nothing else.
#[derive(Debug, Default, Clone, Copy)]
pub struct LoggingEventSink;

#[async_trait]
impl PaymentEventSink for LoggingEventSink {
    async fn on_success(&self, event: &PaymentEvent) -> Result<(), WebhookError> {
        info!(
            trade_no = %event.trade_no,
            out_trade_no = %event.out_trade_no,
            amount = %event.amount,
            currency = %event.currency,
            method = %event.method,
            "payment succeeded"
        );
        Ok(())
    }

    async fn on_failure(&self, event: &PaymentEvent) -> Result<(), WebhookError> {
        warn!(
            trade_no = %event.trade_no,
            out_trade_no = %event.out_trade_no,
            status = %event.status,
            "payment did not succeed"
        );
        Ok(())
    }
}

pub struct WebhookHandler {
    sink: Arc<dyn PaymentEventSink>,
}

impl WebhookHandler {
    pub fn new(sink: Arc<dyn PaymentEventSink>) -> Self {
        Self { sink }
    }

    /// Parses the notification and hands it to exactly one sink callback.
    pub async fn process_webhook(&self, payload: &JsonValue) -> Result<PaymentEvent, WebhookError> {
        let parsed: WebhookPayload = serde_json::from_value(payload.clone()).map_err(|e| {
            error!(error = %e, "webhook payload could not be parsed");
            WebhookError::MalformedPayload(e.to_string())
        })?;

        let succeeded = parsed.status() == Some(TradeStatus::Success);
        let event = PaymentEvent::from(parsed);
        info!(
            trade_no = %event.trade_no,
            status = %event.status,
            "webhook received"
        );

        if succeeded {
            self.sink.on_success(&event).await?;
        } else {
            self.sink.on_failure(&event).await?;
        }

        Ok(event)
    }
}

impl Default for WebhookHandler {
    fn default() -> Self {
        Self::new(Arc::new(LoggingEventSink))
    }
}
