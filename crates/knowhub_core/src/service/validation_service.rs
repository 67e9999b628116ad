//! Validation workflow use-case service.
//!
//! # Responsibility
//! - Parse review action tokens from the API collaborator and apply the
//!   decision atomically through the repository.
//! - Provide knowledge component attachment and audit-trail reads.
//!
//! # Invariants
//! - An unrecognized action token fails before any persistence work.
//! - One applied decision writes exactly one audit record.
//! - Validator authorization is the caller's responsibility; the role
//!   mapping itself lives on `PersonRole::can_validate`.

use crate::model::activity::{ValidationAction, ValidationActivity};
use crate::model::component::{KnowledgeComponent, NewComponent};
use crate::model::document::DocumentId;
use crate::model::person::PersonId;
use crate::repo::validation_repo::{DecisionOutcome, DecisionRequest, ValidationRepository};
use crate::repo::{RepoError, RepoResult};
use log::info;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for validation use-cases.
#[derive(Debug)]
pub enum ValidationServiceError {
    /// Action token is not one of APPROVE|REJECT|REQUEST_CHANGES.
    InvalidAction(String),
    /// Target document does not exist.
    DocumentNotFound(DocumentId),
    /// Referenced validator does not exist.
    ValidatorNotFound(PersonId),
    /// A component is already attached to the document.
    ComponentAlreadyAttached(DocumentId),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for ValidationServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidAction(token) => write!(
                f,
                "invalid action `{token}`; expected APPROVE|REJECT|REQUEST_CHANGES"
            ),
            Self::DocumentNotFound(id) => write!(f, "document not found: {id}"),
            Self::ValidatorNotFound(id) => write!(f, "validator not found: {id}"),
            Self::ComponentAlreadyAttached(id) => {
                write!(f, "document already has a knowledge component: {id}")
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ValidationServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ValidationServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DocumentNotFound(id) => Self::DocumentNotFound(id),
            RepoError::PersonNotFound(id) => Self::ValidatorNotFound(id),
            RepoError::ComponentAlreadyAttached(id) => Self::ComponentAlreadyAttached(id),
            other => Self::Repo(other),
        }
    }
}

/// Use-case service for the document validation workflow.
pub struct ValidationService<R: ValidationRepository> {
    repo: R,
}

impl<R: ValidationRepository> ValidationService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Applies one review decision to a document.
    ///
    /// # Contract
    /// - `action_token` must be APPROVE, REJECT or REQUEST_CHANGES; anything
    ///   else fails with `InvalidAction` and mutates nothing.
    /// - Audit record, status update and conditional component validation
    ///   are committed together or not at all.
    pub fn apply(
        &mut self,
        document_id: DocumentId,
        validator_id: PersonId,
        action_token: &str,
        feedback: impl Into<String>,
    ) -> Result<DecisionOutcome, ValidationServiceError> {
        let action = ValidationAction::parse(action_token)
            .ok_or_else(|| ValidationServiceError::InvalidAction(action_token.to_string()))?;

        let outcome = self.repo.apply_decision(&DecisionRequest {
            document_id,
            validator_id,
            action,
            feedback: feedback.into(),
        })?;

        info!(
            "event=validation_decision module=validation status=ok document={} action={} previous_status={} new_status={} component_validated={}",
            document_id,
            action.as_str(),
            outcome.activity.previous_status.as_str(),
            outcome.activity.new_status.as_str(),
            outcome.component_validated
        );

        Ok(outcome)
    }

    /// Attaches one knowledge component to a document.
    pub fn attach_component(
        &self,
        component: &NewComponent,
    ) -> Result<KnowledgeComponent, ValidationServiceError> {
        self.repo.attach_component(component).map_err(Into::into)
    }

    /// Gets the component attached to a document, if any.
    pub fn component_for(&self, document_id: DocumentId) -> RepoResult<Option<KnowledgeComponent>> {
        self.repo.get_component(document_id)
    }

    /// Lists the audit trail for a document, newest first.
    pub fn history(&self, document_id: DocumentId) -> RepoResult<Vec<ValidationActivity>> {
        self.repo.list_activities(document_id)
    }
}
