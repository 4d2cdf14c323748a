//! Application state for shared services

use std::sync::Arc;
use std::time::Duration;

use axum::http::HeaderName;

use crate::config::{AppConfig, EventsConfig, GatewayConfig};
use crate::domain::DomainError;
use crate::infrastructure::api_key::ApiKeyService;
use crate::infrastructure::codelist::CodelistService;
use crate::infrastructure::events::{ChangeEventBus, SubscriptionRegistry};
use crate::infrastructure::usage::UsageRecorder;

/// Admission gate settings resolved from configuration
#[derive(Debug, Clone)]
pub struct GatewaySettings {
    /// Calls whose path is this prefix or lies below it are gated
    pub api_prefix: String,
    pub credential_header: HeaderName,
}

impl GatewaySettings {
    pub fn from_config(config: &GatewayConfig) -> Result<Self, DomainError> {
        let credential_header = HeaderName::try_from(config.credential_header.as_str())
            .map_err(|e| {
                DomainError::configuration(format!(
                    "Invalid credential header '{}': {}",
                    config.credential_header, e
                ))
            })?;

        let api_prefix = config.api_prefix.trim_end_matches('/').to_string();
        if !api_prefix.starts_with('/') {
            return Err(DomainError::configuration(format!(
                "API prefix '{}' must start with '/'",
                config.api_prefix
            )));
        }

        Ok(Self {
            api_prefix,
            credential_header,
        })
    }

    /// Whether a request path falls under the gated prefix
    pub fn is_gated(&self, path: &str) -> bool {
        match path.strip_prefix(self.api_prefix.as_str()) {
            Some(rest) => rest.is_empty() || rest.starts_with('/'),
            None => false,
        }
    }
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            api_prefix: "/api".to_string(),
            credential_header: HeaderName::from_static("x-api-key"),
        }
    }
}

/// Change stream settings
#[derive(Debug, Clone)]
pub struct StreamSettings {
    pub idle_timeout: Option<Duration>,
    pub keep_alive: Duration,
}

impl StreamSettings {
    pub fn from_config(config: &EventsConfig) -> Self {
        Self {
            idle_timeout: config.idle_timeout(),
            keep_alive: Duration::from_secs(config.keep_alive_secs.max(1)),
        }
    }
}

impl Default for StreamSettings {
    fn default() -> Self {
        Self::from_config(&EventsConfig::default())
    }
}

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub api_key_service: Arc<ApiKeyService>,
    pub usage_recorder: UsageRecorder,
    pub codelist_service: Arc<CodelistService>,
    pub events: ChangeEventBus,
    pub gateway: Arc<GatewaySettings>,
    pub stream: Arc<StreamSettings>,
    pub admin_token: Option<Arc<str>>,
}

impl AppState {
    pub fn new(
        api_key_service: Arc<ApiKeyService>,
        usage_recorder: UsageRecorder,
        codelist_service: Arc<CodelistService>,
        events: ChangeEventBus,
    ) -> Self {
        Self {
            api_key_service,
            usage_recorder,
            codelist_service,
            events,
            gateway: Arc::new(GatewaySettings::default()),
            stream: Arc::new(StreamSettings::default()),
            admin_token: None,
        }
    }

    /// Apply gateway, stream and admin settings from configuration
    pub fn with_config(mut self, config: &AppConfig) -> Result<Self, DomainError> {
        self.gateway = Arc::new(GatewaySettings::from_config(&config.gateway)?);
        self.stream = Arc::new(StreamSettings::from_config(&config.events));
        self.admin_token = config
            .admin
            .token
            .as_deref()
            .filter(|t| !t.is_empty())
            .map(Arc::from);
        Ok(self)
    }

    pub fn with_gateway(mut self, gateway: GatewaySettings) -> Self {
        self.gateway = Arc::new(gateway);
        self
    }

    pub fn with_admin_token(mut self, token: impl Into<String>) -> Self {
        self.admin_token = Some(Arc::from(token.into()));
        self
    }

    /// Live subscription registry behind the change stream
    pub fn registry(&self) -> &SubscriptionRegistry {
        self.events.registry()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_gated() {
        let gateway = GatewaySettings::default();

        assert!(gateway.is_gated("/api"));
        assert!(gateway.is_gated("/api/codelists/LAND_USE/entries"));
        assert!(!gateway.is_gated("/apis"));
        assert!(!gateway.is_gated("/events/stream"));
        assert!(!gateway.is_gated("/health"));
    }

    #[test]
    fn test_from_config_trims_trailing_slash() {
        let config = GatewayConfig {
            api_prefix: "/external/".to_string(),
            credential_header: "X-Client-Key".to_string(),
            credentials: Vec::new(),
        };

        let gateway = GatewaySettings::from_config(&config).unwrap();

        assert_eq!(gateway.api_prefix, "/external");
        assert_eq!(gateway.credential_header.as_str(), "x-client-key");
        assert!(gateway.is_gated("/external/codelists"));
    }

    #[test]
    fn test_from_config_rejects_bad_values() {
        let mut config = GatewayConfig::default();
        config.credential_header = "bad header".to_string();
        assert!(GatewaySettings::from_config(&config).is_err());

        let mut config = GatewayConfig::default();
        config.api_prefix = "api".to_string();
        assert!(GatewaySettings::from_config(&config).is_err());
    }
}
