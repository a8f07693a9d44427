use crate::config::GatewayEnvironment;
use crate::payments::error::{GatewayError, GatewayResult, SUCCESS_CODE};
use serde::de::{self, DeserializeOwned, Deserializer};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use std::fmt;
use std::str::FromStr;

pub const PAYMENT_METHOD: &str = "CreditCard";
pub const ORDER_CURRENCY: &str = "BRL";
pub const REGION_CODE: &str = "BRA";
pub const TRADE_TYPE: &str = "API";
pub const API_VERSION: &str = "2.0";
pub const TIMEOUT_EXPRESS: &str = "1d";
pub const ORDER_SUBJECT: &str = "Pagamento de Produto";
pub const ORDER_CONTENT: &str = "Pagamento via cartão de crédito";
pub const HTTP_ACCEPT_CONTENT: &str =
    "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8";

/// Trade status as reported by the gateway.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TradeStatus {
    Initial,
    Processing,
    Success,
    Failed,
    Cancelled,
}

impl TradeStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TradeStatus::Initial => "INITIAL",
            TradeStatus::Processing => "PROCESSING",
            TradeStatus::Success => "SUCCESS",
            TradeStatus::Failed => "FAILED",
            TradeStatus::Cancelled => "CANCELLED",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            TradeStatus::Success | TradeStatus::Failed | TradeStatus::Cancelled
        )
    }
}

impl fmt::Display for TradeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TradeStatus {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_uppercase().as_str() {
            "INITIAL" => Ok(TradeStatus::Initial),
            "PROCESSING" => Ok(TradeStatus::Processing),
            "SUCCESS" => Ok(TradeStatus::Success),
            "FAILED" => Ok(TradeStatus::Failed),
            "CANCELLED" => Ok(TradeStatus::Cancelled),
            other => Err(format!("unknown trade status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CustomerInfo {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub cpf: String,
    #[serde(default)]
    pub zip_code: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub state: String,
    #[serde(default)]
    pub address: String,
}

/// Body of `POST /api/create-order` as sent by the checkout page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePaymentInput {
    #[serde(default)]
    pub amount: Option<String>,
    #[serde(default)]
    pub customer_info: Option<CustomerInfo>,
    #[serde(default)]
    pub return_url: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub browser_language: Option<String>,
    #[serde(default)]
    pub browser_color_depth: Option<String>,
    #[serde(default)]
    pub browser_screen_height: Option<String>,
    #[serde(default)]
    pub browser_screen_width: Option<String>,
    #[serde(default)]
    pub browser_time_zone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CustomerIdentification {
    #[serde(rename = "type")]
    pub kind: String,
    pub number: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Customer {
    pub identify: CustomerIdentification,
    pub name: String,
    pub email: String,
    pub phone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Address {
    pub zip_code: String,
    pub state: String,
    pub city: String,
    pub street_name: String,
    pub street_number: String,
}

/// Browser fingerprint for 3DS and anti-fraud scoring.
///
/// Every attribute is sent twice: once under the gateway's `browser_*` names
/// and once under the `http_browser_*` names some acquirers expect.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct DeviceInfo {
    pub user_agent: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_color_depth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_screen_height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_screen_width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub browser_time_zone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_browser_language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_browser_color_depth: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_browser_screen_height: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_browser_screen_width: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_browser_time_difference: Option<String>,
    pub http_accept_content: String,
    pub http_browser_java_enabled: bool,
    pub http_browser_javascript_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateOrderRequest {
    pub app_id: String,
    pub out_trade_no: String,
    pub method: String,
    pub order_amount: String,
    pub order_currency: String,
    pub subject: String,
    pub content: String,
    pub trade_type: String,
    pub timestamp: String,
    pub notify_url: String,
    pub return_url: String,
    pub timeout_express: String,
    pub version: String,
    pub buyer_id: String,
    pub customer: Customer,
    pub address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_info: Option<DeviceInfo>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QueryRequest {
    pub app_id: String,
    pub timestamp: String,
    pub trade_no: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CreateOrderResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(default)]
    pub msg: String,
    pub out_trade_no: String,
    pub trade_no: String,
    pub prepay_id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryCustomer {
    #[serde(default)]
    pub identification: Option<JsonValue>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub buyer_id: Option<String>,
}

/// Result of `/trade/query`. Fields the gateway adds beyond the documented
/// ones are kept in `extra` so the browser receives the payload untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryTransactionResponse {
    #[serde(deserialize_with = "string_or_number")]
    pub code: String,
    #[serde(default)]
    pub msg: String,
    pub trade_no: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_trade_no: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub method: Option<String>,
    pub trade_status: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_currency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub order_amount: Option<JsonValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub customer: Option<QueryCustomer>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub create_time: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub update_time: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, JsonValue>,
}

impl QueryTransactionResponse {
    pub fn status(&self) -> Option<TradeStatus> {
        self.trade_status.parse().ok()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct WebhookPayload {
    pub trade_no: String,
    #[serde(default)]
    pub out_trade_no: String,
    pub trade_status: String,
    #[serde(default, deserialize_with = "string_or_number")]
    pub order_amount: String,
    #[serde(default)]
    pub order_currency: String,
    #[serde(default)]
    pub method: String,
}

impl WebhookPayload {
    pub fn status(&self) -> Option<TradeStatus> {
        self.trade_status.parse().ok()
    }
}

/// Browser SDK bootstrap values served by `GET /api/config`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SdkConfig {
    pub app_id: String,
    pub public_key: String,
    pub env: GatewayEnvironment,
    pub region_code: String,
}

#[derive(Debug, Deserialize)]
struct GatewayEnvelope {
    #[serde(deserialize_with = "string_or_number")]
    code: String,
    #[serde(default)]
    msg: Option<String>,
}

/// Checks the business code of a gateway reply and, on success, parses it
/// into the endpoint's typed response.
pub fn parse_gateway_reply<T: DeserializeOwned>(raw: JsonValue) -> GatewayResult<T> {
    let envelope: GatewayEnvelope = serde_json::from_value(raw.clone())
        .map_err(|e| GatewayError::invalid_response(format!("missing response code: {}", e)))?;

    if envelope.code != SUCCESS_CODE {
        return Err(GatewayError::Business {
            code: envelope.code,
            message: envelope.msg.unwrap_or_default(),
        });
    }

    serde_json::from_value(raw).map_err(|e| GatewayError::invalid_response(e.to_string()))
}

/// Accepts a JSON string or number and keeps its textual form.
fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match JsonValue::deserialize(deserializer)? {
        JsonValue::String(s) => Ok(s),
        JsonValue::Number(n) => Ok(n.to_string()),
        JsonValue::Null => Ok(String::new()),
        other => Err(de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}
