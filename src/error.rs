//! Error handling for the checkout backend
//!
//! Every failure a handler can surface is an [`AppError`]. The HTTP status
//! mapping lives here; the JSON body is produced in `middleware::error`.

use crate::payments::error::GatewayError;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// One or more input rules failed; all messages are kept in order.
    #[error("Validation errors: {}", .0.join(", "))]
    Validation(Vec<String>),

    #[error("{0}")]
    InvalidArgument(String),

    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

impl AppError {
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Validation(_) | AppError::InvalidArgument(_) => 400,
            AppError::Gateway(err) => err.http_status_code(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;
