use crate::config::GatewayConfig;
use crate::payments::types::{
    Address, CreateOrderRequest, CreatePaymentInput, Customer, CustomerIdentification,
    CustomerInfo, DeviceInfo, API_VERSION, HTTP_ACCEPT_CONTENT, ORDER_CONTENT, ORDER_CURRENCY,
    ORDER_SUBJECT, PAYMENT_METHOD, TIMEOUT_EXPRESS, TRADE_TYPE,
};
use regex::Regex;
use std::sync::OnceLock;
use tracing::{info, warn};
use uuid::Uuid;

const BASE36_ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
const ORDER_SUFFIX_LEN: usize = 13;
const DEFAULT_STREET_NUMBER: &str = "1";
const IDENTIFICATION_TYPE: &str = "CPF";

fn random_base36(len: usize) -> String {
    let mut value = Uuid::new_v4().as_u128();
    let mut out = String::with_capacity(len);
    while out.len() < len {
        out.push(BASE36_ALPHABET[(value % 36) as usize] as char);
        value /= 36;
    }
    out
}

/// `ORDER_<unix millis>_<random base-36>`.
pub fn generate_order_id() -> String {
    format!(
        "ORDER_{}_{}",
        chrono::Utc::now().timestamp_millis(),
        random_base36(ORDER_SUFFIX_LEN)
    )
}

/// Local wall-clock time in the `YYYY-MM-DD HH:MM:SS` form the gateway expects.
pub fn format_timestamp() -> String {
    chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

pub fn extract_street_number(address: &str) -> String {
    static DIGITS: OnceLock<Option<Regex>> = OnceLock::new();
    DIGITS
        .get_or_init(|| Regex::new(r"[0-9]+").ok())
        .as_ref()
        .and_then(|digits| digits.find(address))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| DEFAULT_STREET_NUMBER.to_string())
}

/// Browsers report the offset west of UTC as positive and east as negative;
/// the gateway wants the magnitude in minutes.
pub fn normalize_timezone_offset(raw: &str) -> Option<String> {
    match raw.trim().parse::<i64>() {
        Ok(minutes) => Some(minutes.abs().to_string()),
        Err(_) => {
            warn!(raw_offset = %raw, "dropping unparseable browser timezone offset");
            None
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// Returns `None` when no user agent was captured; the order then goes out
/// without fingerprint data.
pub fn build_device_info(input: &CreatePaymentInput) -> Option<DeviceInfo> {
    let user_agent = match non_empty(&input.user_agent) {
        Some(ua) => ua,
        None => {
            warn!("device_info omitted from order: no user agent supplied");
            return None;
        }
    };

    let language = non_empty(&input.browser_language);
    let color_depth = non_empty(&input.browser_color_depth);
    let screen_height = non_empty(&input.browser_screen_height);
    let screen_width = non_empty(&input.browser_screen_width);
    let time_zone = input
        .browser_time_zone
        .as_deref()
        .and_then(normalize_timezone_offset);

    Some(DeviceInfo {
        user_agent,
        ip_address: non_empty(&input.ip_address),
        browser_language: language.clone(),
        browser_color_depth: color_depth.clone(),
        browser_screen_height: screen_height.clone(),
        browser_screen_width: screen_width.clone(),
        browser_time_zone: time_zone.clone(),
        http_browser_language: language,
        http_browser_color_depth: color_depth,
        http_browser_screen_height: screen_height,
        http_browser_screen_width: screen_width,
        http_browser_time_difference: time_zone,
        http_accept_content: HTTP_ACCEPT_CONTENT.to_string(),
        http_browser_java_enabled: false,
        http_browser_javascript_enabled: true,
    })
}

/// Builds the `/trade/create` body. The caller is expected to have validated
/// `customer` and `amount` already.
pub fn build_order_request(
    input: &CreatePaymentInput,
    customer: &CustomerInfo,
    amount: &str,
    config: &GatewayConfig,
) -> CreateOrderRequest {
    let device_info = build_device_info(input);
    if let Some(device) = &device_info {
        info!(
            has_ip_address = device.ip_address.is_some(),
            browser_language = ?device.browser_language,
            time_zone = ?device.browser_time_zone,
            "device_info included for 3DS and anti-fraud"
        );
    }

    CreateOrderRequest {
        app_id: config.app_id.clone(),
        out_trade_no: generate_order_id(),
        method: PAYMENT_METHOD.to_string(),
        order_amount: amount.trim().to_string(),
        order_currency: ORDER_CURRENCY.to_string(),
        subject: ORDER_SUBJECT.to_string(),
        content: ORDER_CONTENT.to_string(),
        trade_type: TRADE_TYPE.to_string(),
        timestamp: format_timestamp(),
        notify_url: config.notify_url.clone(),
        return_url: config.return_url.clone(),
        timeout_express: TIMEOUT_EXPRESS.to_string(),
        version: API_VERSION.to_string(),
        buyer_id: customer.email.clone(),
        customer: Customer {
            identify: CustomerIdentification {
                kind: IDENTIFICATION_TYPE.to_string(),
                number: customer.cpf.clone(),
            },
            name: customer.name.clone(),
            email: customer.email.clone(),
            phone: customer.phone.clone(),
        },
        address: Address {
            zip_code: customer.zip_code.clone(),
            state: customer.state.clone(),
            city: customer.city.clone(),
            street_name: customer.address.clone(),
            street_number: extract_street_number(&customer.address),
        },
        device_info,
    }
}
