//! Application configuration module
//! Handles environment variable loading, configuration validation, and application settings

use serde::{Deserialize, Serialize};
use std::env;
use std::fmt;
use std::str::FromStr;

pub const DEFAULT_BASE_URL: &str = "https://gateway.pagsmile.com";
pub const DEFAULT_NOTIFY_URL: &str = "http://localhost:3000/api/webhook/payment";
pub const DEFAULT_RETURN_URL: &str = "http://localhost:3000/success";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Main application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub gateway: GatewayConfig,
    pub logging: LoggingConfig,
    pub reconcile: ReconcileConfig,
}

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Which Pagsmile environment the credentials belong to. The browser SDK
/// receives this value verbatim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GatewayEnvironment {
    Sandbox,
    Prod,
}

impl GatewayEnvironment {
    pub fn as_str(&self) -> &'static str {
        match self {
            GatewayEnvironment::Sandbox => "sandbox",
            GatewayEnvironment::Prod => "prod",
        }
    }
}

impl fmt::Display for GatewayEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GatewayEnvironment {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_lowercase().as_str() {
            "sandbox" => Ok(GatewayEnvironment::Sandbox),
            "prod" => Ok(GatewayEnvironment::Prod),
            other => Err(ConfigError::InvalidValue(format!(
                "PAGSMILE_ENVIRONMENT must be 'sandbox' or 'prod', got '{}'",
                other
            ))),
        }
    }
}

/// Pagsmile credentials and endpoints
#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub app_id: String,
    pub security_key: String,
    pub public_key: String,
    pub environment: GatewayEnvironment,
    pub notify_url: String,
    pub return_url: String,
    pub base_url: String,
    pub timeout_secs: u64,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log format options
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Json,
    Plain,
}

/// Timing of the post-submission status reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileConfig {
    pub sdk_timeout_secs: u64,
    pub settle_delay_secs: u64,
    pub max_attempts: u32,
    pub interval_secs: u64,
}

fn lookup_or<F>(lookup: &F, key: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn required<F>(lookup: &F, key: &str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVariable(key.to_string()))
}

fn parsed_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key).filter(|v| !v.trim().is_empty()) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue(key.to_string())),
        None => Ok(default),
    }
}

fn process_env(key: &str) -> Option<String> {
    env::var(key).ok()
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if it exists
        let _ = dotenv::dotenv().ok();

        Ok(AppConfig {
            server: ServerConfig::from_env()?,
            gateway: GatewayConfig::from_env()?,
            logging: LoggingConfig::from_env()?,
            reconcile: ReconcileConfig::from_env()?,
        })
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.gateway.validate()?;
        self.logging.validate()?;
        self.reconcile.validate()?;

        Ok(())
    }
}

impl ServerConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(ServerConfig {
            host: lookup_or(&lookup, "HOST", "0.0.0.0"),
            port: parsed_or(&lookup, "PORT", 3000)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.port == 0 {
            return Err(ConfigError::InvalidValue("PORT cannot be 0".to_string()));
        }

        if self.host.is_empty() {
            return Err(ConfigError::InvalidValue("HOST cannot be empty".to_string()));
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl GatewayConfig {
    /// Credentials with every optional setting at its default.
    pub fn new(
        app_id: impl Into<String>,
        security_key: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        GatewayConfig {
            app_id: app_id.into(),
            security_key: security_key.into(),
            public_key: public_key.into(),
            environment: GatewayEnvironment::Sandbox,
            notify_url: DEFAULT_NOTIFY_URL.to_string(),
            return_url: DEFAULT_RETURN_URL.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("PAGSMILE_ENVIRONMENT").filter(|v| !v.trim().is_empty()) {
            Some(raw) => raw.parse()?,
            None => GatewayEnvironment::Sandbox,
        };

        Ok(GatewayConfig {
            app_id: required(&lookup, "PAGSMILE_APP_ID")?,
            security_key: required(&lookup, "PAGSMILE_SECURITY_KEY")?,
            public_key: required(&lookup, "PAGSMILE_PUBLIC_KEY")?,
            environment,
            notify_url: lookup_or(&lookup, "PAGSMILE_NOTIFY_URL", DEFAULT_NOTIFY_URL),
            return_url: lookup_or(&lookup, "PAGSMILE_RETURN_URL", DEFAULT_RETURN_URL),
            base_url: lookup_or(&lookup, "PAGSMILE_BASE_URL", DEFAULT_BASE_URL),
            timeout_secs: parsed_or(&lookup, "PAGSMILE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("PAGSMILE_APP_ID", &self.app_id),
            ("PAGSMILE_SECURITY_KEY", &self.security_key),
            ("PAGSMILE_PUBLIC_KEY", &self.public_key),
        ] {
            if value.trim().is_empty() {
                return Err(ConfigError::MissingVariable(name.to_string()));
            }
        }

        for (name, value) in [
            ("PAGSMILE_BASE_URL", &self.base_url),
            ("PAGSMILE_NOTIFY_URL", &self.notify_url),
            ("PAGSMILE_RETURN_URL", &self.return_url),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ConfigError::ValidationFailed(format!(
                    "{} must be an http(s) URL",
                    name
                )));
            }
        }

        if self.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "PAGSMILE_TIMEOUT_SECS".to_string(),
            ));
        }

        Ok(())
    }

    /// Problems that are tolerable in sandbox but break callbacks in
    /// production. Empty outside `prod`.
    pub fn production_url_warnings(&self) -> Vec<String> {
        if self.environment != GatewayEnvironment::Prod {
            return Vec::new();
        }

        let mut warnings = Vec::new();
        for (name, value) in [
            ("PAGSMILE_NOTIFY_URL", &self.notify_url),
            ("PAGSMILE_RETURN_URL", &self.return_url),
        ] {
            if value.contains("localhost") || value.contains("127.0.0.1") {
                warnings.push(format!(
                    "{} points at localhost ({}); the gateway cannot reach it",
                    name, value
                ));
            }
            if value.starts_with("http://") {
                warnings.push(format!("{} must use HTTPS in production ({})", name, value));
            }
        }
        warnings
    }
}

impl LoggingConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(LoggingConfig {
            level: lookup_or(&lookup, "LOG_LEVEL", "INFO"),
            format: match lookup_or(&lookup, "LOG_FORMAT", "plain")
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Plain,
            },
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let valid_levels = ["TRACE", "DEBUG", "INFO", "WARN", "ERROR"];
        if !valid_levels.contains(&self.level.to_uppercase().as_str()) {
            return Err(ConfigError::InvalidValue("LOG_LEVEL".to_string()));
        }

        Ok(())
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "INFO".to_string(),
            format: LogFormat::Plain,
        }
    }
}

impl ReconcileConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(process_env)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = ReconcileConfig::default();
        Ok(ReconcileConfig {
            sdk_timeout_secs: parsed_or(
                &lookup,
                "RECONCILE_SDK_TIMEOUT_SECS",
                defaults.sdk_timeout_secs,
            )?,
            settle_delay_secs: parsed_or(
                &lookup,
                "RECONCILE_SETTLE_DELAY_SECS",
                defaults.settle_delay_secs,
            )?,
            max_attempts: parsed_or(&lookup, "RECONCILE_MAX_ATTEMPTS", defaults.max_attempts)?,
            interval_secs: parsed_or(&lookup, "RECONCILE_INTERVAL_SECS", defaults.interval_secs)?,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "RECONCILE_MAX_ATTEMPTS must be at least 1".to_string(),
            ));
        }
        if self.sdk_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "RECONCILE_SDK_TIMEOUT_SECS".to_string(),
            ));
        }

        Ok(())
    }
}

impl Default for ReconcileConfig {
    fn default() -> Self {
        ReconcileConfig {
            sdk_timeout_secs: 60,
            settle_delay_secs: 5,
            max_attempts: 15,
            interval_secs: 2,
        }
    }
}

/// Configuration error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),

    #[error("Invalid value for configuration: {0}")]
    InvalidValue(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const CREDENTIALS: [(&str, &str); 3] = [
        ("PAGSMILE_APP_ID", "app_123"),
        ("PAGSMILE_SECURITY_KEY", "sk_456"),
        ("PAGSMILE_PUBLIC_KEY", "pk_789"),
    ];

    #[test]
    fn test_gateway_defaults() {
        let config = GatewayConfig::from_lookup(lookup_from(&CREDENTIALS)).unwrap();

        assert_eq!(config.app_id, "app_123");
        assert_eq!(config.environment, GatewayEnvironment::Sandbox);
        assert_eq!(config.notify_url, DEFAULT_NOTIFY_URL);
        assert_eq!(config.return_url, DEFAULT_RETURN_URL);
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout_secs, 30);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_base_url_independent_of_environment() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("PAGSMILE_ENVIRONMENT", "prod"));
        let prod = GatewayConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(prod.environment, GatewayEnvironment::Prod);
        assert_eq!(prod.base_url, DEFAULT_BASE_URL);

        pairs.push(("PAGSMILE_BASE_URL", "https://gateway-staging.example.com"));
        let staging = GatewayConfig::from_lookup(lookup_from(&pairs)).unwrap();
        assert_eq!(staging.base_url, "https://gateway-staging.example.com");
    }

    #[test]
    fn test_missing_credential_is_reported_by_name() {
        let err = GatewayConfig::from_lookup(lookup_from(&CREDENTIALS[..2])).unwrap_err();
        match err {
            ConfigError::MissingVariable(name) => assert_eq!(name, "PAGSMILE_PUBLIC_KEY"),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_blank_credential_counts_as_missing() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs[0] = ("PAGSMILE_APP_ID", "   ");
        assert!(matches!(
            GatewayConfig::from_lookup(lookup_from(&pairs)),
            Err(ConfigError::MissingVariable(_))
        ));
    }

    #[test]
    fn test_invalid_environment_rejected() {
        let mut pairs = CREDENTIALS.to_vec();
        pairs.push(("PAGSMILE_ENVIRONMENT", "staging"));
        assert!(matches!(
            GatewayConfig::from_lookup(lookup_from(&pairs)),
            Err(ConfigError::InvalidValue(_))
        ));
    }

    #[test]
    fn test_environment_serializes_lowercase() {
        assert_eq!(
            serde_json::to_value(GatewayEnvironment::Prod).unwrap(),
            serde_json::json!("prod")
        );
        assert_eq!("SANDBOX".parse::<GatewayEnvironment>().unwrap(), GatewayEnvironment::Sandbox);
    }

    #[test]
    fn test_production_url_warnings() {
        let mut config = GatewayConfig::new("app", "key", "pk");
        assert!(config.production_url_warnings().is_empty());

        config.environment = GatewayEnvironment::Prod;
        let warnings = config.production_url_warnings();
        // both default URLs are localhost and plain http
        assert_eq!(warnings.len(), 4);

        config.notify_url = "https://shop.example.com/api/webhook/payment".to_string();
        config.return_url = "https://shop.example.com/success".to_string();
        assert!(config.production_url_warnings().is_empty());
    }

    #[test]
    fn test_non_http_url_fails_validation() {
        let mut config = GatewayConfig::new("app", "key", "pk");
        config.notify_url = "ftp://example.com/hook".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationFailed(_))
        ));
    }

    #[test]
    fn test_server_config_defaults_and_validation() {
        let config = ServerConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert!(config.validate().is_ok());

        let invalid = ServerConfig {
            host: "".to_string(),
            port: 8000,
        };
        assert!(invalid.validate().is_err());

        assert!(ServerConfig::from_lookup(lookup_from(&[("PORT", "eighty")])).is_err());
    }

    #[test]
    fn test_reconcile_overrides() {
        let config = ReconcileConfig::from_lookup(lookup_from(&[
            ("RECONCILE_MAX_ATTEMPTS", "3"),
            ("RECONCILE_INTERVAL_SECS", "1"),
        ]))
        .unwrap();
        assert_eq!(config.max_attempts, 3);
        assert_eq!(config.interval_secs, 1);
        assert_eq!(config.sdk_timeout_secs, 60);
        assert_eq!(config.settle_delay_secs, 5);

        let zero = ReconcileConfig {
            max_attempts: 0,
            ..ReconcileConfig::default()
        };
        assert!(zero.validate().is_err());
    }

    #[test]
    fn test_logging_config() {
        let config = LoggingConfig::from_lookup(lookup_from(&[("LOG_FORMAT", "JSON")])).unwrap();
        assert_eq!(config.format, LogFormat::Json);
        assert!(config.validate().is_ok());

        let bad = LoggingConfig {
            level: "LOUD".to_string(),
            format: LogFormat::Plain,
        };
        assert!(bad.validate().is_err());
    }
}
