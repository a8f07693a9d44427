//! HTTP surface consumed by the checkout page and by the gateway.

pub mod checkout;
pub mod webhooks;

use crate::config::GatewayConfig;
use crate::health::HealthStatus;
use crate::middleware::logging::{request_logging_middleware, UuidRequestId};
use crate::services::{OrderService, TransactionService, WebhookHandler};
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::request_id::{PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<GatewayConfig>,
    pub orders: Arc<OrderService>,
    pub transactions: Arc<TransactionService>,
    pub webhooks: Arc<WebhookHandler>,
}

async fn health(State(state): State<AppState>) -> Json<HealthStatus> {
    Json(HealthStatus::ok(state.config.environment))
}

/// Full application router with request-id and access-log layers applied.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/config", get(checkout::get_config))
        .route("/api/create-order", post(checkout::create_order))
        .route(
            "/api/query-transaction/{trade_no}",
            get(checkout::query_transaction),
        )
        .route("/api/webhook/payment", post(webhooks::handle_payment_webhook))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::x_request_id(UuidRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_logging_middleware))
                .layer(PropagateRequestIdLayer::x_request_id()),
        )
}
