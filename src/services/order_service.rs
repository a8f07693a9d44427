use crate::config::GatewayConfig;
use crate::error::{AppError, AppResult};
use crate::logging::mask_cpf;
use crate::payments::client::GatewayTransport;
use crate::payments::error::GatewayError;
use crate::payments::order_builder::build_order_request;
use crate::payments::types::{parse_gateway_reply, CreateOrderResponse, CreatePaymentInput};
use crate::payments::validation::{validate_amount, validate_customer_info};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub const CREATE_ORDER_ENDPOINT: &str = "/trade/create";
pub const MISSING_FIELDS: &str = "Missing required fields: amount and customerInfo";

/// Creates card-payment orders on the gateway. One attempt per call; the
/// gateway is the only place an order is recorded.
pub struct OrderService {
    transport: Arc<dyn GatewayTransport>,
    config: GatewayConfig,
}

impl OrderService {
    pub fn new(transport: Arc<dyn GatewayTransport>, config: GatewayConfig) -> Self {
        Self { transport, config }
    }

    pub async fn create_order(&self, input: CreatePaymentInput) -> AppResult<CreateOrderResponse> {
        let amount = input
            .amount
            .as_deref()
            .map(str::trim)
            .filter(|a| !a.is_empty());
        let (amount, customer) = match (amount, input.customer_info.as_ref()) {
            (Some(amount), Some(customer)) => (amount.to_string(), customer.clone()),
            _ => return Err(AppError::InvalidArgument(MISSING_FIELDS.to_string())),
        };

        let mut errors = validate_customer_info(&customer);
        if let Some(amount_error) = validate_amount(&amount) {
            errors.push(amount_error);
        }
        if !errors.is_empty() {
            warn!(error_count = errors.len(), "order rejected by validation");
            return Err(AppError::Validation(errors));
        }

        let request = build_order_request(&input, &customer, &amount, &self.config);
        info!(
            out_trade_no = %request.out_trade_no,
            amount = %request.order_amount,
            currency = %request.order_currency,
            cpf = %mask_cpf(&request.customer.identify.number),
            "creating pagsmile order"
        );

        let body = serde_json::to_value(&request).map_err(|e| {
            GatewayError::invalid_response(format!("failed to encode order request: {}", e))
        })?;
        debug!(request = %body, "order request body");

        let raw = self.transport.post(CREATE_ORDER_ENDPOINT, &body).await?;
        let response: CreateOrderResponse = parse_gateway_reply(raw).map_err(|e| {
            warn!(out_trade_no = %request.out_trade_no, error = %e, "order creation failed");
            e
        })?;

        if response.trade_no.is_empty()
            || response.out_trade_no.is_empty()
            || response.prepay_id.is_empty()
        {
            return Err(GatewayError::invalid_response(
                "successful order reply is missing trade_no, out_trade_no or prepay_id",
            )
            .into());
        }

        info!(
            out_trade_no = %response.out_trade_no,
            trade_no = %response.trade_no,
            "pagsmile order created"
        );
        Ok(response)
    }
}
