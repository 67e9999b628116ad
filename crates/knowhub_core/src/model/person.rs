//! Person domain model.
//!
//! # Responsibility
//! - Define the user-profile record and its role taxonomy.
//! - Keep the role-to-capability mapping for validation work in one place.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another person.
//! - `email` is stored lowercased and must look like an address.
//! - `last_activity` only moves forward through `record_activity`.

use crate::model::ModelValidationError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a person record.
pub type PersonId = Uuid;

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));

/// Role assigned to a person, controlling validation capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PersonRole {
    Admin,
    KnowledgeChampion,
    Consultant,
    Manager,
    User,
}

impl PersonRole {
    /// Canonical token used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "ADMIN",
            Self::KnowledgeChampion => "KNOWLEDGE_CHAMPION",
            Self::Consultant => "CONSULTANT",
            Self::Manager => "MANAGER",
            Self::User => "USER",
        }
    }

    /// Parses a canonical role token.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "ADMIN" => Some(Self::Admin),
            "KNOWLEDGE_CHAMPION" => Some(Self::KnowledgeChampion),
            "CONSULTANT" => Some(Self::Consultant),
            "MANAGER" => Some(Self::Manager),
            "USER" => Some(Self::User),
            _ => None,
        }
    }

    /// Returns whether this role may review and decide on documents.
    ///
    /// Only administrators and knowledge champions hold the validation
    /// capability; every other role is a regular contributor.
    pub fn can_validate(self) -> bool {
        matches!(self, Self::Admin | Self::KnowledgeChampion)
    }
}

/// Input record for registering a person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPerson {
    /// Stable global ID used for linking and auditing.
    pub uuid: PersonId,
    /// Unique address, stored lowercased.
    pub email: String,
    /// User-facing name.
    pub display_name: String,
    pub role: PersonRole,
}

impl NewPerson {
    /// Creates a registration record with a generated stable ID.
    pub fn new(email: impl Into<String>, display_name: impl Into<String>, role: PersonRole) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            email: email.into().trim().to_lowercase(),
            display_name: display_name.into(),
            role,
        }
    }

    /// Checks field invariants before persistence.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.display_name.trim().is_empty() {
            return Err(ModelValidationError::BlankDisplayName);
        }
        if !EMAIL_RE.is_match(&self.email) {
            return Err(ModelValidationError::InvalidEmail(self.email.clone()));
        }
        Ok(())
    }
}

/// Stored person record as read back from persistence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub uuid: PersonId,
    pub email: String,
    pub display_name: String,
    pub role: PersonRole,
    /// Unix epoch milliseconds of the most recent recorded activity.
    pub last_activity: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}
