//! API key (credential) entity and the caller identity derived from it

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity that owns an API key
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Principal(String);

impl Principal {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for Principal {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for Principal {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An opaque API key issued to an external caller
///
/// The gateway only reads keys; issuing and storing them belongs to the
/// authorization layer behind [`CredentialStore`](super::CredentialStore).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    /// The opaque key value presented by the caller
    key: String,
    /// Identity owning the key
    principal: Principal,
    /// Whether the key may be used at all
    enabled: bool,
    /// Expiration timestamp (None = never expires)
    #[serde(skip_serializing_if = "Option::is_none")]
    expires_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    /// Create a new, enabled, non-expiring key
    pub fn new(key: impl Into<String>, principal: impl Into<Principal>) -> Self {
        Self {
            key: key.into(),
            principal: principal.into(),
            enabled: true,
            expires_at: None,
        }
    }

    /// Set enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Set expiration
    pub fn with_expiration(mut self, expires_at: DateTime<Utc>) -> Self {
        self.expires_at = Some(expires_at);
        self
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Check if the key is currently valid and usable
    pub fn is_valid(&self) -> bool {
        self.is_valid_at(Utc::now())
    }

    /// Valid means enabled and not past its expiry (the expiry instant itself is still valid)
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        if !self.enabled {
            return false;
        }

        match self.expires_at {
            Some(expires_at) => now <= expires_at,
            None => true,
        }
    }

    /// First characters of the key, safe to log
    pub fn key_prefix(&self) -> String {
        self.key.chars().take(8).collect()
    }
}

/// Capability granted to a request that passed the admission gate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CallerRole {
    /// External API caller
    ApiCaller,
}

impl CallerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ApiCaller => "ROLE_API_CALLER",
        }
    }
}

impl std::fmt::Display for CallerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Identity attached to an admitted request, available to downstream handlers
#[derive(Debug, Clone)]
pub struct CallerIdentity {
    pub principal: Principal,
    pub key_prefix: String,
    pub role: CallerRole,
    pub request_id: String,
}

impl CallerIdentity {
    /// Identity for a request admitted with the given key
    pub fn api_caller(api_key: &ApiKey, request_id: impl Into<String>) -> Self {
        Self {
            principal: api_key.principal().clone(),
            key_prefix: api_key.key_prefix(),
            role: CallerRole::ApiCaller,
            request_id: request_id.into(),
        }
    }
}
