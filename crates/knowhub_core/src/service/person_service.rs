//! Person use-case service.
//!
//! # Responsibility
//! - Provide registration, lookup and activity-touch entry points.
//! - Delegate persistence to repository implementations.
//!
//! # Invariants
//! - Service APIs never bypass repository validation/persistence contracts.
//! - Service layer remains storage-agnostic.

use crate::model::person::{NewPerson, Person, PersonId, PersonRole};
use crate::repo::person_repo::{PersonListQuery, PersonRepository};
use crate::repo::{RepoError, RepoResult};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Service error for person use-cases.
#[derive(Debug)]
pub enum PersonServiceError {
    /// Target person does not exist.
    PersonNotFound(PersonId),
    /// Email already registered by another person.
    EmailTaken(String),
    /// Persistence-layer failure.
    Repo(RepoError),
}

impl Display for PersonServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::EmailTaken(email) => write!(f, "email already registered: `{email}`"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for PersonServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for PersonServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::PersonNotFound(id) => Self::PersonNotFound(id),
            RepoError::DuplicateEmail(email) => Self::EmailTaken(email),
            other => Self::Repo(other),
        }
    }
}

/// Use-case service wrapper for person operations.
pub struct PersonService<R: PersonRepository> {
    repo: R,
}

impl<R: PersonRepository> PersonService<R> {
    /// Creates a service using the provided repository implementation.
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Registers one person.
    ///
    /// # Contract
    /// - Email is normalized to lowercase before persistence.
    /// - Duplicate email fails with `EmailTaken`; nothing is written.
    pub fn register(
        &self,
        email: impl Into<String>,
        display_name: impl Into<String>,
        role: PersonRole,
    ) -> Result<Person, PersonServiceError> {
        let person = NewPerson::new(email, display_name, role);
        self.repo.create_person(&person).map_err(Into::into)
    }

    /// Gets one person by stable ID.
    pub fn get(&self, id: PersonId) -> RepoResult<Option<Person>> {
        self.repo.get_person(id)
    }

    /// Gets one person by email.
    pub fn find_by_email(&self, email: &str) -> RepoResult<Option<Person>> {
        self.repo.get_person_by_email(email)
    }

    /// Touches `last_activity` for one person.
    pub fn record_activity(&self, id: PersonId) -> Result<(), PersonServiceError> {
        self.repo.record_activity(id).map_err(Into::into)
    }

    /// Lists persons using filter and pagination options.
    pub fn list(&self, query: &PersonListQuery) -> RepoResult<Vec<Person>> {
        self.repo.list_persons(query)
    }
}
