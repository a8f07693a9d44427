//! Tracing subscriber setup and helpers for keeping secrets out of logs.

use crate::config::{LogFormat, LoggingConfig};
use std::env;
use tracing_subscriber::{fmt, EnvFilter};

/// Installs the global subscriber. `RUST_LOG` wins over `LOG_LEVEL` when set.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(config: &LoggingConfig) {
    let default_directive = format!(
        "pagsmile_checkout={level},checkout_reconcile={level},tower_http=info",
        level = config.level.to_lowercase()
    );
    let filter_directive = env::var("RUST_LOG")
        .ok()
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(default_directive);

    let builder = fmt()
        .with_env_filter(EnvFilter::new(filter_directive))
        .with_target(true);

    let _ = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Plain => builder.try_init(),
    };
}

/// Keeps the first `visible` characters of a secret and replaces the rest
/// with `...`. Values no longer than `visible` are fully masked.
pub fn mask_secret(value: &str, visible: usize) -> String {
    if value.chars().count() <= visible {
        return "***".to_string();
    }
    let prefix: String = value.chars().take(visible).collect();
    format!("{}...", prefix)
}

/// Shows only the last four digits of a CPF.
pub fn mask_cpf(cpf: &str) -> String {
    let digits: Vec<char> = cpf.chars().collect();
    if digits.len() <= 4 {
        return "***".to_string();
    }
    let tail: String = digits[digits.len() - 4..].iter().collect();
    format!("***{}", tail)
}
