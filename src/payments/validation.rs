//! Customer and amount checks run before any order reaches the gateway.
//!
//! Every rule is evaluated; callers receive the full list of violations so the
//! checkout form can show them all at once.

use crate::payments::types::CustomerInfo;
use bigdecimal::BigDecimal;
use std::str::FromStr;

pub const NAME_TOO_SHORT: &str = "Name must have at least 3 characters";
pub const INVALID_EMAIL: &str = "Invalid email format";
pub const INVALID_CPF: &str = "CPF must have 11 digits";
pub const PHONE_TOO_SHORT: &str = "Phone must have at least 10 digits";
pub const INVALID_ZIP_CODE: &str = "ZIP code must have 8 digits";
pub const INVALID_STATE: &str = "State must be a 2-letter code";
pub const CITY_REQUIRED: &str = "City is required";
pub const ADDRESS_TOO_SHORT: &str = "Address must have at least 5 characters";
pub const INVALID_AMOUNT: &str = "Amount must be a positive decimal value";

fn char_len(value: &str) -> usize {
    value.chars().count()
}

pub fn validate_customer_info(customer: &CustomerInfo) -> Vec<String> {
    let mut errors = Vec::new();

    if char_len(customer.name.trim()) < 3 {
        errors.push(NAME_TOO_SHORT.to_string());
    }
    if !customer.email.contains('@') {
        errors.push(INVALID_EMAIL.to_string());
    }
    if char_len(&customer.cpf) != 11 {
        errors.push(INVALID_CPF.to_string());
    }
    if char_len(&customer.phone) < 10 {
        errors.push(PHONE_TOO_SHORT.to_string());
    }
    if char_len(&customer.zip_code) != 8 {
        errors.push(INVALID_ZIP_CODE.to_string());
    }
    if char_len(&customer.state) != 2 {
        errors.push(INVALID_STATE.to_string());
    }
    if char_len(customer.city.trim()) < 2 {
        errors.push(CITY_REQUIRED.to_string());
    }
    if char_len(customer.address.trim()) < 5 {
        errors.push(ADDRESS_TOO_SHORT.to_string());
    }

    errors
}

pub fn validate_amount(amount: &str) -> Option<String> {
    match BigDecimal::from_str(amount.trim()) {
        Ok(parsed) if parsed > BigDecimal::from(0) => None,
        _ => Some(INVALID_AMOUNT.to_string()),
    }
}
