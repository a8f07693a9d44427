use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

/// Response code the gateway uses for a successful business operation.
pub const SUCCESS_CODE: &str = "10000";

#[derive(Debug, Clone, Error)]
pub enum GatewayError {
    #[error("Pagsmile API error: {status} - {body}")]
    Http { status: u16, body: String },

    #[error("Pagsmile API unreachable: {message}")]
    Unreachable { message: String },

    #[error("Pagsmile error: {code} - {message}")]
    Business { code: String, message: String },

    #[error("Invalid Pagsmile response: {message}")]
    InvalidResponse { message: String },
}

impl GatewayError {
    pub fn is_retryable(&self) -> bool {
        match self {
            GatewayError::Http { status, .. } => *status == 429 || *status >= 500,
            GatewayError::Unreachable { .. } => true,
            GatewayError::Business { .. } => false,
            GatewayError::InvalidResponse { .. } => false,
        }
    }

    pub fn http_status_code(&self) -> u16 {
        match self {
            GatewayError::Http { .. } => 502,
            GatewayError::Unreachable { .. } => 503,
            GatewayError::Business { .. } => 500,
            GatewayError::InvalidResponse { .. } => 502,
        }
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        GatewayError::InvalidResponse {
            message: message.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn business_error_keeps_code_and_message() {
        let err = GatewayError::Business {
            code: "40002".to_string(),
            message: "invalid app_id".to_string(),
        };
        assert_eq!(err.to_string(), "Pagsmile error: 40002 - invalid app_id");
        assert_eq!(err.http_status_code(), 500);
        assert!(!err.is_retryable());
    }

    #[test]
    fn transport_errors_are_retryable() {
        assert!(GatewayError::Unreachable {
            message: "connection refused".to_string()
        }
        .is_retryable());
        assert!(GatewayError::Http {
            status: 503,
            body: "unavailable".to_string()
        }
        .is_retryable());
        assert!(!GatewayError::Http {
            status: 401,
            body: "unauthorized".to_string()
        }
        .is_retryable());
    }
}
