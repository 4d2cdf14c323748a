//! Usage record entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Unique identifier for a usage record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UsageRecordId(String);

impl UsageRecordId {
    /// Create a new usage record ID
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a new unique ID
    pub fn generate() -> Self {
        Self(format!("usage-{}", uuid::Uuid::new_v4()))
    }

    /// Get the inner string value
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for UsageRecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Representation the response was served in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResponseFormat {
    #[default]
    Json,
    Xml,
    Unknown,
}

impl ResponseFormat {
    /// Classify a media type such as `application/json; charset=utf-8`
    ///
    /// Returns `None` when the value names neither JSON nor XML, so callers
    /// can fall through to the next source.
    pub fn from_media_type(value: &str) -> Option<Self> {
        let value = value.split(';').next().unwrap_or_default().trim().to_ascii_lowercase();

        if value.contains("json") {
            Some(Self::Json)
        } else if value.contains("xml") {
            Some(Self::Xml)
        } else {
            None
        }
    }

    /// Classify an Accept header by its most preferred JSON or XML entry
    ///
    /// Entries are weighted by their `q` parameter (default 1); on a tie the
    /// one listed first wins. Entries with `q=0` are refused and ignored.
    pub fn from_accept(value: &str) -> Option<Self> {
        let mut best: Option<(Self, f32)> = None;

        for entry in value.split(',') {
            let Some(format) = Self::from_media_type(entry) else {
                continue;
            };

            let quality = quality(entry);
            if quality <= 0.0 {
                continue;
            }
            if best.is_none_or(|(_, q)| quality > q) {
                best = Some((format, quality));
            }
        }

        best.map(|(format, _)| format)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "JSON",
            Self::Xml => "XML",
            Self::Unknown => "UNKNOWN",
        }
    }
}

/// `q` parameter of one Accept entry; malformed values count as 1
fn quality(entry: &str) -> f32 {
    entry
        .split(';')
        .skip(1)
        .filter_map(|param| param.split_once('='))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("q"))
        .and_then(|(_, value)| value.trim().parse::<f32>().ok())
        .unwrap_or(1.0)
}

impl std::fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One completed external API call
///
/// Built once by the admission gate after the downstream handler returns and
/// never mutated afterwards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageRecord {
    id: UsageRecordId,
    /// Key prefix of the credential used (never the full key)
    pub credential: String,
    /// Principal owning the credential
    pub principal: String,
    /// Request path
    pub endpoint: String,
    pub timestamp: DateTime<Utc>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub response_status: u16,
    pub response_time_ms: u64,
    pub response_format: ResponseFormat,
}

impl UsageRecord {
    /// Create a new usage record stamped with the current time
    pub fn new(
        credential: impl Into<String>,
        principal: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            id: UsageRecordId::generate(),
            credential: credential.into(),
            principal: principal.into(),
            endpoint: endpoint.into(),
            timestamp: Utc::now(),
            ip_address: None,
            user_agent: None,
            response_status: 200,
            response_time_ms: 0,
            response_format: ResponseFormat::default(),
        }
    }

    pub fn with_client(mut self, ip_address: Option<String>, user_agent: Option<String>) -> Self {
        self.ip_address = ip_address;
        self.user_agent = user_agent;
        self
    }

    pub fn with_outcome(mut self, status: u16, response_time_ms: u64, format: ResponseFormat) -> Self {
        self.response_status = status;
        self.response_time_ms = response_time_ms;
        self.response_format = format;
        self
    }

    pub fn id(&self) -> &UsageRecordId {
        &self.id
    }

    /// Whether the downstream call ended in a 4xx/5xx status
    pub fn is_error(&self) -> bool {
        self.response_status >= 400
    }
}
