//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use pagsmile_checkout::api::AppState;
use pagsmile_checkout::config::GatewayConfig;
use pagsmile_checkout::payments::{GatewayResult, GatewayTransport};
use pagsmile_checkout::services::{OrderService, PaymentEventSink, TransactionService, WebhookHandler};
use serde_json::{json, Value as JsonValue};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Answers each gateway endpoint with a fixed reply and records every call.
#[derive(Default)]
pub struct MockGateway {
    replies: Mutex<HashMap<String, GatewayResult<JsonValue>>>,
    calls: Mutex<Vec<(String, JsonValue)>>,
}

impl MockGateway {
    pub fn with_reply(self, endpoint: &str, reply: GatewayResult<JsonValue>) -> Self {
        self.replies
            .lock()
            .unwrap()
            .insert(endpoint.to_string(), reply);
        self
    }

    pub fn shared(self) -> Arc<Self> {
        Arc::new(self)
    }

    pub fn calls(&self) -> Vec<(String, JsonValue)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl GatewayTransport for MockGateway {
    async fn post(&self, endpoint: &str, body: &JsonValue) -> GatewayResult<JsonValue> {
        self.calls
            .lock()
            .unwrap()
            .push((endpoint.to_string(), body.clone()));
        self.replies
            .lock()
            .unwrap()
            .get(endpoint)
            .cloned()
            .unwrap_or_else(|| Ok(json!({"code": "50000", "msg": "no scripted reply"})))
    }

    async fn get(&self, endpoint: &str) -> GatewayResult<JsonValue> {
        self.post(endpoint, &JsonValue::Null).await
    }
}

pub fn gateway_config() -> GatewayConfig {
    GatewayConfig::new("app_test", "sk_test", "pk_test")
}

pub fn app_state(gateway: Arc<MockGateway>, sink: Arc<dyn PaymentEventSink>) -> AppState {
    let config = gateway_config();
    AppState {
        config: Arc::new(config.clone()),
        orders: Arc::new(OrderService::new(gateway.clone(), config.clone())),
        transactions: Arc::new(TransactionService::new(gateway, config)),
        webhooks: Arc::new(WebhookHandler::new(sink)),
    }
}

pub fn valid_order_body() -> JsonValue {
    json!({
        "amount": "120.00",
        "customerInfo": {
            "name": "Ana Pereira",
            "email": "ana@example.com",
            "phone": "31987654321",
            "cpf": "11122233344",
            "zipCode": "30130010",
            "city": "Belo Horizonte",
            "state": "MG",
            "address": "Avenida Afonso Pena, 1500"
        },
        "userAgent": "Mozilla/5.0 (X11; Linux x86_64)",
        "browserLanguage": "pt-BR",
        "browserColorDepth": "24",
        "browserScreenHeight": "900",
        "browserScreenWidth": "1440",
        "browserTimeZone": "180"
    })
}

pub async fn body_json(response: axum::response::Response) -> JsonValue {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}
