//! Core domain logic for KnowHub, a knowledge-management backend.
//! This crate is the single source of truth for business invariants; the
//! HTTP API layer is a thin collaborator on top of it.

pub mod analytics;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use analytics::dashboard::{
    dashboard, AnalyticsError, AnalyticsResult, DashboardQuery, DashboardSnapshot, Timeframe,
    TrendPoint, TypeCount,
};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::activity::{ActivityId, ValidationActivity, ValidationAction};
pub use model::component::{
    ComponentId, ComponentValidationStatus, KnowledgeComponent, NewComponent,
};
pub use model::document::{
    Document, DocumentId, DocumentStatus, DocumentType, NewDocument,
};
pub use model::person::{NewPerson, Person, PersonId, PersonRole};
pub use model::ModelValidationError;
pub use repo::document_repo::{
    normalize_recent_limit, DocumentListQuery, DocumentOrder, DocumentRepository,
    SqliteDocumentRepository,
};
pub use repo::person_repo::{PersonListQuery, PersonRepository, SqlitePersonRepository};
pub use repo::validation_repo::{
    DecisionOutcome, DecisionRequest, SqliteValidationRepository, ValidationRepository,
};
pub use repo::{RepoError, RepoResult};
pub use service::document_service::{DocumentService, DocumentServiceError};
pub use service::person_service::{PersonService, PersonServiceError};
pub use service::validation_service::{ValidationService, ValidationServiceError};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
