//! Repository layer abstractions and persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts.
//! - Isolate SQLite query details from service/business orchestration.
//!
//! # Invariants
//! - Repository writes enforce model `validate()` before persistence.
//! - Repository APIs return semantic errors (`DocumentNotFound`, ...) in
//!   addition to DB transport errors.
//! - Repositories refuse to operate on unmigrated connections.

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::document::DocumentId;
use crate::model::person::PersonId;
use crate::model::ModelValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub mod document_repo;
pub mod person_repo;
pub mod validation_repo;

pub type RepoResult<T> = Result<T, RepoError>;

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ModelValidationError),
    Db(DbError),
    DocumentNotFound(DocumentId),
    PersonNotFound(PersonId),
    /// Email already registered by another person.
    DuplicateEmail(String),
    /// A component is already attached to the document.
    ComponentAlreadyAttached(DocumentId),
    /// Connection schema is not at the expected migrated version.
    UninitializedConnection {
        expected_version: u32,
        actual_version: u32,
    },
    MissingRequiredTable(&'static str),
    MissingRequiredColumn {
        table: &'static str,
        column: &'static str,
    },
    /// Persisted data cannot be converted to a valid read model.
    InvalidData(String),
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::DocumentNotFound(id) => write!(f, "document not found: {id}"),
            Self::PersonNotFound(id) => write!(f, "person not found: {id}"),
            Self::DuplicateEmail(email) => write!(f, "email already registered: `{email}`"),
            Self::ComponentAlreadyAttached(id) => {
                write!(f, "document already has a knowledge component: {id}")
            }
            Self::UninitializedConnection {
                expected_version,
                actual_version,
            } => write!(
                f,
                "repository requires schema version {expected_version}, got {actual_version}"
            ),
            Self::MissingRequiredTable(table) => {
                write!(f, "repository requires table `{table}`")
            }
            Self::MissingRequiredColumn { table, column } => write!(
                f,
                "repository requires column `{column}` in table `{table}`"
            ),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelValidationError> for RepoError {
    fn from(value: ModelValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Table/column shape one repository depends on.
pub(crate) struct TableRequirement {
    pub table: &'static str,
    pub columns: &'static [&'static str],
}

/// Verifies the connection is migrated and carries the required schema.
pub(crate) fn ensure_connection_ready(
    conn: &Connection,
    required: &[TableRequirement],
) -> RepoResult<()> {
    let expected_version = latest_version();
    let actual_version: u32 = conn.query_row("PRAGMA user_version;", [], |row| row.get(0))?;
    if actual_version != expected_version {
        return Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version,
        });
    }

    for requirement in required {
        if !table_exists(conn, requirement.table)? {
            return Err(RepoError::MissingRequiredTable(requirement.table));
        }
        for column in requirement.columns {
            if !table_has_column(conn, requirement.table, column)? {
                return Err(RepoError::MissingRequiredColumn {
                    table: requirement.table,
                    column,
                });
            }
        }
    }

    Ok(())
}

pub(crate) fn parse_uuid(value: &str, column: &'static str) -> RepoResult<Uuid> {
    Uuid::parse_str(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid uuid `{value}` in {column}")))
}

fn table_exists(conn: &Connection, table: &str) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(
            SELECT 1
            FROM sqlite_master
            WHERE type = 'table' AND name = ?1
        );",
        [table],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn table_has_column(conn: &Connection, table: &str, column: &str) -> RepoResult<bool> {
    let mut stmt = conn.prepare(&format!("PRAGMA table_info({table});"))?;
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let current: String = row.get(1)?;
        if current == column {
            return Ok(true);
        }
    }
    Ok(false)
}
