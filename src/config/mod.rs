//! Layered application configuration

mod app_config;

pub use app_config::{
    AdminConfig, AppConfig, CredentialSeed, EventsConfig, GatewayConfig, LogFormat,
    LoggingConfig, MetricsConfig, RateLimitSettings, ServerConfig, UsageConfig,
};
