//! Health check module
//! Liveness report for load balancers; the gateway itself is not probed.

use crate::config::GatewayEnvironment;
use serde::Serialize;

/// Health status response
#[derive(Debug, Serialize, Clone)]
pub struct HealthStatus {
    pub status: &'static str,
    pub environment: GatewayEnvironment,
    pub version: &'static str,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

impl HealthStatus {
    pub fn ok(environment: GatewayEnvironment) -> Self {
        Self {
            status: "ok",
            environment,
            version: env!("CARGO_PKG_VERSION"),
            timestamp: chrono::Utc::now(),
        }
    }
}
