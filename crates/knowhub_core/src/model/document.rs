//! Document domain model.
//!
//! # Responsibility
//! - Define the document record, its lifecycle status set and type taxonomy.
//! - Provide field invariants checked before persistence.
//!
//! # Invariants
//! - `uuid` is stable and never reused for another document.
//! - `version` starts at 1 and only grows; re-submission resets status to
//!   `Draft` while incrementing the version.
//! - `view_count`/`download_count` never go negative.

use crate::model::person::PersonId;
use crate::model::ModelValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a document record.
pub type DocumentId = Uuid;

/// Lifecycle status of a document.
///
/// `Approved` is a defined state that no review decision currently maps to;
/// it round-trips through storage but is only reachable through direct
/// updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentStatus {
    Draft,
    PendingReview,
    UnderReview,
    Approved,
    Published,
    Archived,
    Rejected,
}

impl DocumentStatus {
    /// Canonical token used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "DRAFT",
            Self::PendingReview => "PENDING_REVIEW",
            Self::UnderReview => "UNDER_REVIEW",
            Self::Approved => "APPROVED",
            Self::Published => "PUBLISHED",
            Self::Archived => "ARCHIVED",
            Self::Rejected => "REJECTED",
        }
    }

    /// Parses a canonical status token.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DRAFT" => Some(Self::Draft),
            "PENDING_REVIEW" => Some(Self::PendingReview),
            "UNDER_REVIEW" => Some(Self::UnderReview),
            "APPROVED" => Some(Self::Approved),
            "PUBLISHED" => Some(Self::Published),
            "ARCHIVED" => Some(Self::Archived),
            "REJECTED" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Returns whether the document sits in the reviewers' queue.
    pub fn is_in_review(self) -> bool {
        matches!(self, Self::PendingReview | Self::UnderReview)
    }
}

/// Content category of a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DocumentType {
    Contract,
    Guideline,
    Other,
    Presentation,
    Proposal,
    Report,
    Research,
    Template,
}

impl DocumentType {
    /// Canonical token used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Contract => "CONTRACT",
            Self::Guideline => "GUIDELINE",
            Self::Other => "OTHER",
            Self::Presentation => "PRESENTATION",
            Self::Proposal => "PROPOSAL",
            Self::Report => "REPORT",
            Self::Research => "RESEARCH",
            Self::Template => "TEMPLATE",
        }
    }

    /// Parses a canonical type token.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "CONTRACT" => Some(Self::Contract),
            "GUIDELINE" => Some(Self::Guideline),
            "OTHER" => Some(Self::Other),
            "PRESENTATION" => Some(Self::Presentation),
            "PROPOSAL" => Some(Self::Proposal),
            "REPORT" => Some(Self::Report),
            "RESEARCH" => Some(Self::Research),
            "TEMPLATE" => Some(Self::Template),
            _ => None,
        }
    }
}

/// Input record for uploading a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDocument {
    /// Stable global ID used for linking and auditing.
    pub uuid: DocumentId,
    pub title: String,
    pub description: String,
    /// Owning uploader.
    pub uploader_uuid: PersonId,
    pub document_type: DocumentType,
    /// Optional initial quality assessment.
    pub quality_score: Option<f64>,
}

impl NewDocument {
    /// Creates an upload record with a generated stable ID.
    ///
    /// New documents always start in `Draft` at version 1; those fields are
    /// owned by storage defaults, not by the caller.
    pub fn new(
        title: impl Into<String>,
        uploader_uuid: PersonId,
        document_type: DocumentType,
    ) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            description: String::new(),
            uploader_uuid,
            document_type,
            quality_score: None,
        }
    }

    /// Checks field invariants before persistence.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.title.trim().is_empty() {
            return Err(ModelValidationError::BlankTitle);
        }
        validate_score("quality_score", self.quality_score)?;
        Ok(())
    }
}

/// Stored document record as read back from persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub uuid: DocumentId,
    pub title: String,
    pub description: String,
    pub uploader_uuid: PersonId,
    pub status: DocumentStatus,
    pub document_type: DocumentType,
    pub quality_score: Option<f64>,
    /// Positive, incremented on re-submission.
    pub version: i64,
    pub view_count: i64,
    pub download_count: i64,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}

impl Document {
    /// Checks field invariants before persistence.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.title.trim().is_empty() {
            return Err(ModelValidationError::BlankTitle);
        }
        if self.version < 1 {
            return Err(ModelValidationError::InvalidVersion(self.version));
        }
        for (field, value) in [
            ("view_count", self.view_count),
            ("download_count", self.download_count),
        ] {
            if value < 0 {
                return Err(ModelValidationError::NegativeCounter { field, value });
            }
        }
        validate_score("quality_score", self.quality_score)?;
        Ok(())
    }
}

pub(crate) fn validate_score(
    field: &'static str,
    value: Option<f64>,
) -> Result<(), ModelValidationError> {
    match value {
        Some(score) if !score.is_finite() => Err(ModelValidationError::NonFiniteScore(field)),
        _ => Ok(()),
    }
}
