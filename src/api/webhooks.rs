use axum::{body::Bytes, extract::State, http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value as JsonValue};
use std::time::Instant;
use tracing::{error, info};

use super::AppState;

/// POST /api/webhook/payment
///
/// Always answers 200 so the gateway does not keep redelivering a
/// notification this service cannot process.
pub async fn handle_payment_webhook(
    State(state): State<AppState>,
    body: Bytes,
) -> impl IntoResponse {
    info!(bytes = body.len(), "Received payment webhook");

    let payload: JsonValue = match serde_json::from_slice(&body) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "Invalid JSON payload");
            return (
                StatusCode::OK,
                Json(json!({"result": "error", "message": format!("Invalid JSON: {}", e)})),
            );
        }
    };

    let started = Instant::now();
    match state.webhooks.process_webhook(&payload).await {
        Ok(event) => {
            info!(
                trade_no = %event.trade_no,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Webhook processed successfully"
            );
            (StatusCode::OK, Json(json!({"result": "success"})))
        }
        Err(e) => {
            error!(error = %e, "Webhook processing failed");
            (
                StatusCode::OK,
                Json(json!({"result": "error", "message": e.to_string()})),
            )
        }
    }
}
