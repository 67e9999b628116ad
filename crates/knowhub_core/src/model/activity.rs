//! Validation audit trail domain model.
//!
//! # Responsibility
//! - Define the review actions and their status mapping; the document
//!   lifecycle state machine lives here.
//! - Define the immutable audit record written for every decision.
//!
//! # Invariants
//! - A `ValidationActivity` is written once and never mutated.
//! - `previous_status` always equals the document's status immediately
//!   before the decision; `new_status` is the action's mapped successor.

use crate::model::document::{DocumentId, DocumentStatus};
use crate::model::person::PersonId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Stable identifier for a validation activity record.
pub type ActivityId = Uuid;

/// Review decision taken on a document.
///
/// Any action is accepted from any current status; the mapping below is the
/// complete transition function. No action maps to `Approved`; re-submission
/// returns a document to `Draft` through the version increment instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValidationAction {
    Approve,
    Reject,
    RequestChanges,
}

impl ValidationAction {
    /// Canonical token used in storage and on the wire.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Approve => "APPROVE",
            Self::Reject => "REJECT",
            Self::RequestChanges => "REQUEST_CHANGES",
        }
    }

    /// Parses a canonical action token.
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "APPROVE" => Some(Self::Approve),
            "REJECT" => Some(Self::Reject),
            "REQUEST_CHANGES" => Some(Self::RequestChanges),
            _ => None,
        }
    }

    /// Returns the document status this action transitions to.
    pub fn resulting_status(self) -> DocumentStatus {
        match self {
            Self::Approve => DocumentStatus::Published,
            Self::Reject => DocumentStatus::Rejected,
            Self::RequestChanges => DocumentStatus::Draft,
        }
    }
}

/// Immutable audit record for one review decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationActivity {
    pub uuid: ActivityId,
    pub document_uuid: DocumentId,
    pub validator_uuid: PersonId,
    pub action: ValidationAction,
    pub feedback: String,
    pub previous_status: DocumentStatus,
    pub new_status: DocumentStatus,
    /// Unix epoch milliseconds.
    pub created_at: i64,
}
