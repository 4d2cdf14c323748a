//! Codelist and codelist entry entities

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// A named list of reference codes, e.g. `LAND_USE`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Codelist {
    pub code: String,
    pub name: String,
}

impl Codelist {
    pub fn new(code: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            name: name.into(),
        }
    }
}

/// One entry of a codelist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodelistEntry {
    pub id: String,
    pub codelist_code: String,
    pub code: String,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

impl CodelistEntry {
    /// Create a new entry with a generated id
    pub fn new(
        codelist_code: impl Into<String>,
        code: impl Into<String>,
        name: impl Into<String>,
    ) -> Result<Self, DomainError> {
        let entry = Self {
            id: uuid::Uuid::new_v4().to_string(),
            codelist_code: codelist_code.into(),
            code: code.into(),
            name: name.into(),
            updated_at: Utc::now(),
        };

        entry.validate()?;
        Ok(entry)
    }

    /// Replace code and name
    pub fn rename(&mut self, code: impl Into<String>, name: impl Into<String>) -> Result<(), DomainError> {
        self.code = code.into();
        self.name = name.into();
        self.updated_at = Utc::now();
        self.validate()
    }

    fn validate(&self) -> Result<(), DomainError> {
        if self.code.trim().is_empty() {
            return Err(DomainError::validation("Entry code cannot be empty"));
        }

        if self.name.trim().is_empty() {
            return Err(DomainError::validation("Entry name cannot be empty"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entry() {
        let entry = CodelistEntry::new("LAND_USE", "7", "Residential").unwrap();
        assert_eq!(entry.codelist_code, "LAND_USE");
        assert!(!entry.id.is_empty());
    }

    #[test]
    fn test_empty_code_rejected() {
        let err = CodelistEntry::new("LAND_USE", " ", "Residential").unwrap_err();
        assert!(matches!(err, DomainError::Validation { .. }));
    }

    #[test]
    fn test_rename_validates() {
        let mut entry = CodelistEntry::new("LAND_USE", "7", "Residential").unwrap();
        assert!(entry.rename("7", "").is_err());
        assert!(entry.rename("8", "Commercial").is_ok());
        assert_eq!(entry.code, "8");
    }
}
