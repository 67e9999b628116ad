//! Knowledge component domain model.
//!
//! # Responsibility
//! - Define the derived-analysis attachment that a document may carry.
//! - Keep the component's validation status separate from the document's
//!   lifecycle status.
//!
//! # Invariants
//! - At most one component exists per document (1:1 attachment).
//! - `validated_by`/`validated_at` are set together when the component is
//!   marked validated.

use crate::model::document::{validate_score, DocumentId};
use crate::model::person::PersonId;
use crate::model::ModelValidationError;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a knowledge component record.
pub type ComponentId = Uuid;

/// Validation state of a knowledge component, independent of the owning
/// document's lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComponentValidationStatus {
    Pending,
    Validated,
    Flagged,
    RequiresReview,
}

impl ComponentValidationStatus {
    /// Canonical token used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Validated => "VALIDATED",
            Self::Flagged => "FLAGGED",
            Self::RequiresReview => "REQUIRES_REVIEW",
        }
    }

    /// Parses a canonical status token.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PENDING" => Some(Self::Pending),
            "VALIDATED" => Some(Self::Validated),
            "FLAGGED" => Some(Self::Flagged),
            "REQUIRES_REVIEW" => Some(Self::RequiresReview),
            _ => None,
        }
    }
}

/// Input record for attaching a component to a document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewComponent {
    /// Stable global ID used for linking and auditing.
    pub uuid: ComponentId,
    /// Owning document; unique across components.
    pub document_uuid: DocumentId,
    pub summary: String,
    /// Sentiment of the content, typically -1..1.
    pub sentiment_score: Option<f64>,
    /// Structural complexity, typically 0..1.
    pub complexity_score: Option<f64>,
    pub readability_score: Option<f64>,
}

impl NewComponent {
    /// Creates an attachment record with a generated stable ID.
    ///
    /// New components always start in `Pending`; score fields default to
    /// `None` until analysis fills them.
    pub fn new(document_uuid: DocumentId, summary: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            document_uuid,
            summary: summary.into(),
            sentiment_score: None,
            complexity_score: None,
            readability_score: None,
        }
    }

    /// Checks field invariants before persistence.
    pub fn validate(&self) -> Result<(), ModelValidationError> {
        if self.summary.trim().is_empty() {
            return Err(ModelValidationError::BlankSummary);
        }
        validate_score("sentiment_score", self.sentiment_score)?;
        validate_score("complexity_score", self.complexity_score)?;
        validate_score("readability_score", self.readability_score)?;
        Ok(())
    }
}

/// Stored knowledge component record as read back from persistence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeComponent {
    pub uuid: ComponentId,
    pub document_uuid: DocumentId,
    pub summary: String,
    pub sentiment_score: Option<f64>,
    pub complexity_score: Option<f64>,
    pub readability_score: Option<f64>,
    pub validation_status: ComponentValidationStatus,
    /// Person who marked the component validated, if any.
    pub validated_by: Option<PersonId>,
    /// Unix epoch milliseconds of the validation decision, if any.
    pub validated_at: Option<i64>,
    pub feedback: String,
    /// Unix epoch milliseconds.
    pub created_at: i64,
    /// Unix epoch milliseconds.
    pub updated_at: i64,
}
