use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::domain::{ApiKey, Locale};
use crate::infrastructure::api_key::RateLimitConfig;

/// Application configuration
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub gateway: GatewayConfig,
    #[serde(default)]
    pub rate_limit: RateLimitSettings,
    #[serde(default)]
    pub events: EventsConfig,
    #[serde(default)]
    pub usage: UsageConfig,
    #[serde(default)]
    pub metrics: MetricsConfig,
    #[serde(default)]
    pub admin: AdminConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    #[serde(default)]
    pub format: LogFormat,
}

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// External API gateway settings
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    /// Path prefix of calls that must pass the admission gate
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    /// Header carrying the caller's API key
    #[serde(default = "default_credential_header")]
    pub credential_header: String,
    /// Keys loaded into the in-memory credential store at startup
    #[serde(default)]
    pub credentials: Vec<CredentialSeed>,
}

/// One API key declared in configuration
#[derive(Debug, Clone, Deserialize)]
pub struct CredentialSeed {
    pub key: String,
    pub principal: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl CredentialSeed {
    pub fn to_api_key(&self) -> ApiKey {
        let key = ApiKey::new(&self.key, self.principal.as_str()).with_enabled(self.enabled);

        match self.expires_at {
            Some(expires_at) => key.with_expiration(expires_at),
            None => key,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitSettings {
    #[serde(default = "default_capacity")]
    pub capacity: u32,
    #[serde(default = "default_refill_period_secs")]
    pub refill_period_secs: u64,
}

impl RateLimitSettings {
    pub fn to_config(&self) -> RateLimitConfig {
        RateLimitConfig::new(self.capacity, Duration::from_secs(self.refill_period_secs))
    }
}

/// Change-stream settings
#[derive(Debug, Clone, Deserialize)]
pub struct EventsConfig {
    /// Messages buffered per subscriber before it is considered dead
    #[serde(default = "default_subscriber_buffer")]
    pub subscriber_buffer: usize,
    /// Close streams after this many seconds; unset keeps them open until disconnect
    #[serde(default)]
    pub idle_timeout_secs: Option<u64>,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,
    #[serde(default)]
    pub locale: Locale,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UsageConfig {
    #[serde(default = "default_max_records")]
    pub max_records: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MetricsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_metrics_path")]
    pub path: String,
}

/// Admin endpoints are disabled unless a token is configured
#[derive(Debug, Clone, Deserialize, Default)]
pub struct AdminConfig {
    #[serde(default)]
    pub token: Option<String>,
}

fn default_api_prefix() -> String {
    "/api".to_string()
}

fn default_credential_header() -> String {
    "x-api-key".to_string()
}

fn default_capacity() -> u32 {
    1000
}

fn default_refill_period_secs() -> u64 {
    86400
}

fn default_subscriber_buffer() -> usize {
    256
}

fn default_keep_alive_secs() -> u64 {
    15
}

fn default_max_records() -> usize {
    100000
}

fn default_metrics_path() -> String {
    "/metrics".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            api_prefix: default_api_prefix(),
            credential_header: default_credential_header(),
            credentials: Vec::new(),
        }
    }
}

impl Default for RateLimitSettings {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
            refill_period_secs: default_refill_period_secs(),
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self {
            subscriber_buffer: default_subscriber_buffer(),
            idle_timeout_secs: None,
            keep_alive_secs: default_keep_alive_secs(),
            locale: Locale::default(),
        }
    }
}

impl Default for UsageConfig {
    fn default() -> Self {
        Self {
            max_records: default_max_records(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: default_metrics_path(),
        }
    }
}

impl EventsConfig {
    pub fn idle_timeout(&self) -> Option<Duration> {
        self.idle_timeout_secs.map(Duration::from_secs)
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name("config/local").required(false))
            .add_source(
                config::Environment::with_prefix("APP")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.gateway.api_prefix, "/api");
        assert_eq!(config.gateway.credential_header, "x-api-key");
        assert_eq!(config.rate_limit.capacity, 1000);
        assert_eq!(
            config.rate_limit.to_config().refill_period,
            Duration::from_secs(86400)
        );
        assert!(config.events.idle_timeout().is_none());
        assert!(config.admin.token.is_none());
    }

    #[test]
    fn test_deserialize_partial_document() {
        let raw = r#"{
            "rate_limit": { "capacity": 3 },
            "events": { "locale": "en", "idle_timeout_secs": 30 },
            "gateway": {
                "credentials": [
                    { "key": "k1", "principal": "survey-bureau" },
                    { "key": "k2", "principal": "archive", "enabled": false }
                ]
            }
        }"#;

        let config: AppConfig = serde_json::from_str(raw).unwrap();

        assert_eq!(config.rate_limit.capacity, 3);
        assert_eq!(config.rate_limit.refill_period_secs, 86400);
        assert_eq!(config.events.locale, Locale::En);
        assert_eq!(config.events.idle_timeout(), Some(Duration::from_secs(30)));
        assert_eq!(config.gateway.api_prefix, "/api");

        let keys: Vec<_> = config
            .gateway
            .credentials
            .iter()
            .map(CredentialSeed::to_api_key)
            .collect();
        assert!(keys[0].is_valid());
        assert!(!keys[1].is_valid());
    }
}
