//! Services module for business logic and integrations

pub mod order_service;
pub mod transaction_service;
pub mod webhook_handler;

pub use order_service::OrderService;
pub use transaction_service::TransactionService;
pub use webhook_handler::{LoggingEventSink, PaymentEvent, PaymentEventSink, WebhookHandler};
