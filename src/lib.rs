//! Pagsmile checkout backend
//!
//! Bridges a browser checkout that tokenizes cards through the Pagsmile SDK with
//! server-side order creation, status queries, webhook ingestion and the
//! client-side status reconciliation loop.

pub mod api;
pub mod config;
pub mod error;
pub mod health;
pub mod logging;
pub mod middleware;
pub mod payments;
pub mod reconcile;
pub mod services;
