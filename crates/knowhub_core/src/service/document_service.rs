//! Document use-case service.
//!
//! # Responsibility
//! - Provide upload, lookup, listing, counter and re-submission entry
//!   points for core callers.
//! - Gate the reviewers' queue behind the validating roles.
//!
//! # Invariants
//! - Re-submission always lands the document back in `DRAFT` with a
//!   strictly larger version.
//! - Recent-published limits are normalized (default 10, clamp 50).

use crate::model::document::{Document, DocumentId, NewDocument};
use crate::model::person::PersonRole;
use crate::repo::document_repo::{
    normalize_recent_limit, DocumentListQuery, DocumentRepository,
};
use crate::repo::{RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for document use-cases.
#[derive(Debug)]
pub enum DocumentServiceError {
    /// Target document does not exist.
    DocumentNotFound(DocumentId),
    /// Caller's role does not hold the validation capability.
    NotAuthorized(PersonRole),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for DocumentServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DocumentNotFound(id) => write!(f, "document not found: {id}"),
            Self::NotAuthorized(role) => {
                write!(f, "role {} may not review documents", role.as_str())
            }
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for DocumentServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for DocumentServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::DocumentNotFound(id) => Self::DocumentNotFound(id),
            other => Self::Repo(other),
        }
    }
}

/// Use-case service wrapper for document operations.
pub struct DocumentService<R: DocumentRepository> {
    repo: R,
}

impl<R: DocumentRepository> DocumentService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Uploads one document.
    ///
    /// # Contract
    /// - New documents start in `DRAFT` at version 1.
    pub fn upload(&self, document: &NewDocument) -> Result<Document, DocumentServiceError> {
        self.repo.create_document(document).map_err(Into::into)
    }

    /// Gets one document by stable ID.
    pub fn get(&self, id: DocumentId) -> RepoResult<Option<Document>> {
        self.repo.get_document(id)
    }

    /// Replaces all mutable fields of one document.
    pub fn update(&self, document: &Document) -> Result<(), DocumentServiceError> {
        self.repo.update_document(document).map_err(Into::into)
    }

    /// Lists documents using filter, ordering and pagination options.
    pub fn list(&self, query: &DocumentListQuery) -> RepoResult<Vec<Document>> {
        self.repo.list_documents(query)
    }

    /// Records one view of a document.
    pub fn record_view(&self, id: DocumentId) -> Result<(), DocumentServiceError> {
        self.repo.increment_view_count(id).map_err(Into::into)
    }

    /// Records one download of a document.
    pub fn record_download(&self, id: DocumentId) -> Result<(), DocumentServiceError> {
        self.repo.increment_download_count(id).map_err(Into::into)
    }

    /// Re-submits a revised document.
    ///
    /// # Contract
    /// - Version is incremented by exactly 1 on every call.
    /// - Status is forced back to `DRAFT` unconditionally.
    pub fn resubmit(&self, id: DocumentId) -> Result<Document, DocumentServiceError> {
        self.repo.increment_version(id).map_err(Into::into)
    }

    /// Lists the reviewers' queue for a caller holding a validating role.
    ///
    /// Covers `PENDING_REVIEW` and `UNDER_REVIEW`, newest first. Callers
    /// without the validation capability are refused.
    pub fn pending_validations(
        &self,
        requester_role: PersonRole,
        limit: Option<u32>,
        offset: u32,
    ) -> Result<Vec<Document>, DocumentServiceError> {
        if !requester_role.can_validate() {
            return Err(DocumentServiceError::NotAuthorized(requester_role));
        }
        self.repo
            .list_pending_review(limit, offset)
            .map_err(Into::into)
    }

    /// Lists the most recently published documents.
    ///
    /// The limit defaults to 10 and clamps to 50.
    pub fn recent_published(&self, limit: Option<u32>) -> RepoResult<Vec<Document>> {
        self.repo
            .list_recent_published(normalize_recent_limit(limit))
    }
}
