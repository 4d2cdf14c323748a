//! Change event entity

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of mutation applied to a codelist entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

impl ChangeKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Insert => "INSERT",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for ChangeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single committed mutation of a codelist entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Human-readable codelist name, e.g. "Land use"
    pub codelist_name: String,
    /// Codelist code, e.g. "LAND_USE"
    pub codelist_code: String,
    pub change_kind: ChangeKind,
    pub entity_id: String,
    pub entity_code: String,
    pub entity_name: String,
    /// Who performed the mutation
    pub actor: String,
    pub occurred_at: DateTime<Utc>,
}

impl ChangeEvent {
    /// Create an event stamped with the current time
    pub fn new(
        codelist_code: impl Into<String>,
        codelist_name: impl Into<String>,
        change_kind: ChangeKind,
        actor: impl Into<String>,
    ) -> Self {
        Self {
            codelist_name: codelist_name.into(),
            codelist_code: codelist_code.into(),
            change_kind,
            entity_id: String::new(),
            entity_code: String::new(),
            entity_name: String::new(),
            actor: actor.into(),
            occurred_at: Utc::now(),
        }
    }

    /// Set the affected entity
    pub fn with_entity(
        mut self,
        id: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        self.entity_id = id.into();
        self.entity_code = code.into();
        self.entity_name = name.into();
        self
    }
}
