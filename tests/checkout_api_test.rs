//! Integration tests for the checkout routes
//!
//! Tests cover:
//! - SDK configuration
//! - Order creation, validation and client IP capture
//! - Transaction queries and gateway error mapping
//! - Request id propagation and health

mod common;

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use common::{app_state, body_json, valid_order_body, MockGateway};
use pagsmile_checkout::api;
use pagsmile_checkout::payments::GatewayError;
use pagsmile_checkout::services::LoggingEventSink;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

fn create_test_app(gateway: Arc<MockGateway>) -> Router {
    api::router(app_state(gateway, Arc::new(LoggingEventSink)))
}

fn order_created_reply() -> Value {
    json!({
        "code": "10000",
        "msg": "Success",
        "trade_no": "2024061512345678",
        "out_trade_no": "ORDER_1718000000000_abc",
        "prepay_id": "PREPAY_XYZ"
    })
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

#[tokio::test]
async fn test_config_returns_sdk_bootstrap() {
    let app = create_test_app(MockGateway::default().shared());

    let response = app.oneshot(get("/api/config")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(
        json,
        json!({
            "app_id": "app_test",
            "public_key": "pk_test",
            "env": "sandbox",
            "region_code": "BRA"
        })
    );
}

#[tokio::test]
async fn test_create_order_success() {
    let gateway = MockGateway::default()
        .with_reply("/trade/create", Ok(order_created_reply()))
        .shared();
    let app = create_test_app(gateway.clone());

    let response = app
        .oneshot(post_json("/api/create-order", &valid_order_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["success"], true);
    assert_eq!(json["prepay_id"], "PREPAY_XYZ");
    assert_eq!(json["trade_no"], "2024061512345678");
    assert_eq!(json["out_trade_no"], "ORDER_1718000000000_abc");

    let calls = gateway.calls();
    assert_eq!(calls.len(), 1);
    let (endpoint, sent) = &calls[0];
    assert_eq!(endpoint, "/trade/create");
    assert_eq!(sent["app_id"], "app_test");
    assert_eq!(sent["order_amount"], "120.00");
    assert_eq!(sent["buyer_id"], "ana@example.com");
    assert_eq!(sent["address"]["street_number"], "1500");
    assert_eq!(sent["device_info"]["browser_time_zone"], "180");
    assert_eq!(sent["device_info"]["http_browser_screen_width"], "1440");
}

#[tokio::test]
async fn test_create_order_captures_forwarded_ip() {
    let gateway = MockGateway::default()
        .with_reply("/trade/create", Ok(order_created_reply()))
        .shared();
    let app = create_test_app(gateway.clone());

    let request = Request::builder()
        .method("POST")
        .uri("/api/create-order")
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-forwarded-for", "189.20.30.40, 10.1.1.1")
        .body(Body::from(valid_order_body().to_string()))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let calls = gateway.calls();
    assert_eq!(calls[0].1["device_info"]["ip_address"], "189.20.30.40");
}

#[tokio::test]
async fn test_create_order_keeps_supplied_ip() {
    let gateway = MockGateway::default()
        .with_reply("/trade/create", Ok(order_created_reply()))
        .shared();
    let app = create_test_app(gateway.clone());

    let mut body = valid_order_body();
    body["ipAddress"] = json!("177.1.2.3");
    let mut request = post_json("/api/create-order", &body);
    request
        .headers_mut()
        .insert("x-real-ip", "10.9.9.9".parse().unwrap());

    app.oneshot(request).await.unwrap();
    assert_eq!(gateway.calls()[0].1["device_info"]["ip_address"], "177.1.2.3");
}

#[tokio::test]
async fn test_create_order_missing_fields() {
    let gateway = MockGateway::default().shared();
    let app = create_test_app(gateway.clone());

    let response = app
        .oneshot(post_json("/api/create-order", &json!({"amount": "10.00"})))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(
        json["error"],
        "Missing required fields: amount and customerInfo"
    );
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_create_order_reports_all_validation_errors() {
    let gateway = MockGateway::default().shared();
    let app = create_test_app(gateway.clone());

    let mut body = valid_order_body();
    body["customerInfo"]["email"] = json!("ana.example.com");
    body["customerInfo"]["zipCode"] = json!("3013001");
    body["customerInfo"]["city"] = json!("B");

    let response = app
        .oneshot(post_json("/api/create-order", &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(
        json["error"],
        "Validation errors: Invalid email format, ZIP code must have 8 digits, City is required"
    );
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_create_order_malformed_json() {
    let app = create_test_app(MockGateway::default().shared());

    let request = Request::builder()
        .method("POST")
        .uri("/api/create-order")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn test_create_order_gateway_business_error() {
    let gateway = MockGateway::default()
        .with_reply(
            "/trade/create",
            Ok(json!({"code": "40002", "msg": "Invalid app_id"})),
        )
        .shared();
    let app = create_test_app(gateway);

    let response = app
        .oneshot(post_json("/api/create-order", &valid_order_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let json = body_json(response).await;
    assert_eq!(json["success"], false);
    assert_eq!(json["error"], "Pagsmile error: 40002 - Invalid app_id");
}

#[tokio::test]
async fn test_create_order_gateway_unreachable() {
    let gateway = MockGateway::default()
        .with_reply(
            "/trade/create",
            Err(GatewayError::Unreachable {
                message: "operation timed out".to_string(),
            }),
        )
        .shared();
    let app = create_test_app(gateway);

    let response = app
        .oneshot(post_json("/api/create-order", &valid_order_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_query_transaction_passes_payload_through() {
    let gateway = MockGateway::default()
        .with_reply(
            "/trade/query",
            Ok(json!({
                "code": "10000",
                "msg": "Success",
                "trade_no": "T555",
                "out_trade_no": "ORDER_1_a",
                "method": "CreditCard",
                "trade_status": "SUCCESS",
                "order_currency": "BRL",
                "order_amount": "120.00",
                "create_time": "2024-06-15 10:00:00",
                "update_time": "2024-06-15 10:00:09",
                "installments": 2
            })),
        )
        .shared();
    let app = create_test_app(gateway.clone());

    let response = app
        .oneshot(get("/api/query-transaction/T555"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    assert_eq!(json["trade_status"], "SUCCESS");
    assert_eq!(json["installments"], 2);
    assert_eq!(json["order_amount"], "120.00");

    let calls = gateway.calls();
    assert_eq!(calls[0].0, "/trade/query");
    assert_eq!(calls[0].1["trade_no"], "T555");
    assert_eq!(calls[0].1["app_id"], "app_test");
}

#[tokio::test]
async fn test_query_transaction_blank_trade_no() {
    let gateway = MockGateway::default().shared();
    let app = create_test_app(gateway.clone());

    let response = app
        .oneshot(get("/api/query-transaction/%20"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let json = body_json(response).await;
    assert_eq!(json["error"], "Trade number is required");
    assert!(gateway.calls().is_empty());
}

#[tokio::test]
async fn test_query_transaction_gateway_http_error() {
    let gateway = MockGateway::default()
        .with_reply(
            "/trade/query",
            Err(GatewayError::Http {
                status: 401,
                body: "{\"msg\":\"unauthorized\"}".to_string(),
            }),
        )
        .shared();
    let app = create_test_app(gateway);

    let response = app
        .oneshot(get("/api/query-transaction/T1"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

    let json = body_json(response).await;
    assert!(json["error"]
        .as_str()
        .unwrap()
        .starts_with("Pagsmile API error: 401"));
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let app = create_test_app(MockGateway::default().shared());

    let response = app.oneshot(get("/health")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let request_id = response
        .headers()
        .get("x-request-id")
        .expect("x-request-id header")
        .to_str()
        .unwrap()
        .to_string();
    assert_eq!(request_id.len(), 36);

    let json = body_json(response).await;
    assert_eq!(json["status"], "ok");
    assert_eq!(json["environment"], "sandbox");
}

#[tokio::test]
async fn test_caller_request_id_is_kept() {
    let app = create_test_app(MockGateway::default().shared());

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "checkout-page-42")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();
    assert_eq!(
        response.headers().get("x-request-id").unwrap(),
        "checkout-page-42"
    );
}
