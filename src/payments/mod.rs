//! Pagsmile gateway integration: HTTP transport, wire types and order assembly.

pub mod client;
pub mod error;
pub mod order_builder;
pub mod types;
pub mod validation;

pub use client::{GatewayTransport, PagsmileHttpClient};
pub use error::{GatewayError, GatewayResult};
