//! Validation workflow repository: decisions, components, audit trail.
//!
//! # Responsibility
//! - Apply one review decision as a single atomic unit: audit record,
//!   document status update, and conditional component validation.
//! - Provide knowledge component attachment and audit-trail reads.
//!
//! # Invariants
//! - `apply_decision` commits all of its writes or none of them.
//! - Audit records capture the document status as it was inside the same
//!   transaction, so `previous_status` can never race a concurrent update.
//! - `validation_activities` rows are never updated or deleted.

use crate::model::activity::{ActivityId, ValidationAction, ValidationActivity};
use crate::model::component::{ComponentValidationStatus, KnowledgeComponent, NewComponent};
use crate::model::document::{Document, DocumentId, DocumentStatus};
use crate::model::person::PersonId;
use crate::repo::document_repo::load_required_document;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult, TableRequirement};
use rusqlite::{params, Connection, OptionalExtension, Row, TransactionBehavior};
use uuid::Uuid;

const COMPONENT_SELECT_SQL: &str = "SELECT
    uuid,
    document_uuid,
    summary,
    sentiment_score,
    complexity_score,
    readability_score,
    validation_status,
    validated_by,
    validated_at,
    feedback,
    created_at,
    updated_at
FROM knowledge_components";

const ACTIVITY_SELECT_SQL: &str = "SELECT
    uuid,
    document_uuid,
    validator_uuid,
    action,
    feedback,
    previous_status,
    new_status,
    created_at
FROM validation_activities";

const REQUIRED_TABLES: &[TableRequirement] = &[
    TableRequirement {
        table: "documents",
        columns: &["uuid", "status", "updated_at"],
    },
    TableRequirement {
        table: "persons",
        columns: &["uuid"],
    },
    TableRequirement {
        table: "knowledge_components",
        columns: &[
            "uuid",
            "document_uuid",
            "summary",
            "validation_status",
            "validated_by",
            "validated_at",
            "feedback",
        ],
    },
    TableRequirement {
        table: "validation_activities",
        columns: &[
            "uuid",
            "document_uuid",
            "validator_uuid",
            "action",
            "feedback",
            "previous_status",
            "new_status",
            "created_at",
        ],
    },
];

/// One review decision to apply to a document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecisionRequest {
    pub document_id: DocumentId,
    pub validator_id: PersonId,
    pub action: ValidationAction,
    /// Reviewer feedback; empty means none given.
    pub feedback: String,
}

/// Result of one applied decision.
#[derive(Debug, Clone, PartialEq)]
pub struct DecisionOutcome {
    /// Document as stored after the transition.
    pub document: Document,
    /// The audit record written for this decision.
    pub activity: ValidationActivity,
    /// Whether an attached knowledge component was marked validated.
    pub component_validated: bool,
}

/// Repository interface for the validation workflow.
pub trait ValidationRepository {
    /// Applies one decision atomically and returns the outcome.
    fn apply_decision(&mut self, request: &DecisionRequest) -> RepoResult<DecisionOutcome>;
    /// Attaches one knowledge component to a document.
    fn attach_component(&self, component: &NewComponent) -> RepoResult<KnowledgeComponent>;
    /// Gets the component attached to a document, if any.
    fn get_component(&self, document_id: DocumentId) -> RepoResult<Option<KnowledgeComponent>>;
    /// Lists audit records for a document, newest first.
    fn list_activities(&self, document_id: DocumentId) -> RepoResult<Vec<ValidationActivity>>;
}

/// SQLite-backed validation workflow repository.
pub struct SqliteValidationRepository<'conn> {
    conn: &'conn mut Connection,
}

impl<'conn> SqliteValidationRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn mut Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl ValidationRepository for SqliteValidationRepository<'_> {
    fn apply_decision(&mut self, request: &DecisionRequest) -> RepoResult<DecisionOutcome> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let previous_status = document_status(&tx, request.document_id)?
            .ok_or(RepoError::DocumentNotFound(request.document_id))?;
        if !person_exists_in_tx(&tx, request.validator_id)? {
            return Err(RepoError::PersonNotFound(request.validator_id));
        }

        let new_status = request.action.resulting_status();
        let activity_id: ActivityId = Uuid::new_v4();

        tx.execute(
            "INSERT INTO validation_activities (
                uuid,
                document_uuid,
                validator_uuid,
                action,
                feedback,
                previous_status,
                new_status
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7);",
            params![
                activity_id.to_string(),
                request.document_id.to_string(),
                request.validator_id.to_string(),
                request.action.as_str(),
                request.feedback.as_str(),
                previous_status.as_str(),
                new_status.as_str(),
            ],
        )?;

        tx.execute(
            "UPDATE documents
             SET
                status = ?1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?2;",
            params![new_status.as_str(), request.document_id.to_string()],
        )?;

        let component_validated = if request.action == ValidationAction::Approve {
            let changed = tx.execute(
                "UPDATE knowledge_components
                 SET
                    validation_status = 'VALIDATED',
                    validated_by = ?2,
                    validated_at = (strftime('%s', 'now') * 1000),
                    feedback = CASE WHEN ?3 <> '' THEN ?3 ELSE feedback END,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE document_uuid = ?1;",
                params![
                    request.document_id.to_string(),
                    request.validator_id.to_string(),
                    request.feedback.as_str(),
                ],
            )?;
            changed > 0
        } else {
            false
        };

        let document = load_required_document(&tx, request.document_id)?;
        let activity = load_required_activity(&tx, activity_id)?;

        tx.commit()?;

        Ok(DecisionOutcome {
            document,
            activity,
            component_validated,
        })
    }

    fn attach_component(&self, component: &NewComponent) -> RepoResult<KnowledgeComponent> {
        component.validate()?;

        if document_status(self.conn, component.document_uuid)?.is_none() {
            return Err(RepoError::DocumentNotFound(component.document_uuid));
        }
        if self.get_component(component.document_uuid)?.is_some() {
            return Err(RepoError::ComponentAlreadyAttached(component.document_uuid));
        }

        self.conn.execute(
            "INSERT INTO knowledge_components (
                uuid,
                document_uuid,
                summary,
                sentiment_score,
                complexity_score,
                readability_score
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                component.uuid.to_string(),
                component.document_uuid.to_string(),
                component.summary.as_str(),
                component.sentiment_score,
                component.complexity_score,
                component.readability_score,
            ],
        )?;

        self.get_component(component.document_uuid)?.ok_or_else(|| {
            RepoError::InvalidData("created component not found in read-back".to_string())
        })
    }

    fn get_component(&self, document_id: DocumentId) -> RepoResult<Option<KnowledgeComponent>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{COMPONENT_SELECT_SQL} WHERE document_uuid = ?1;"))?;
        let mut rows = stmt.query([document_id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_component_row(row)?));
        }
        Ok(None)
    }

    fn list_activities(&self, document_id: DocumentId) -> RepoResult<Vec<ValidationActivity>> {
        let mut stmt = self.conn.prepare(&format!(
            "{ACTIVITY_SELECT_SQL}
             WHERE document_uuid = ?1
             ORDER BY created_at DESC, uuid ASC;"
        ))?;
        let mut rows = stmt.query([document_id.to_string()])?;
        let mut activities = Vec::new();

        while let Some(row) = rows.next()? {
            activities.push(parse_activity_row(row)?);
        }

        Ok(activities)
    }
}

fn document_status(conn: &Connection, id: DocumentId) -> RepoResult<Option<DocumentStatus>> {
    let value: Option<String> = conn
        .query_row(
            "SELECT status FROM documents WHERE uuid = ?1;",
            [id.to_string()],
            |row| row.get(0),
        )
        .optional()?;

    match value {
        None => Ok(None),
        Some(text) => DocumentStatus::parse(&text)
            .map(Some)
            .ok_or_else(|| {
                RepoError::InvalidData(format!("invalid status `{text}` in documents.status"))
            }),
    }
}

fn person_exists_in_tx(conn: &Connection, id: PersonId) -> RepoResult<bool> {
    let exists: i64 = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM persons WHERE uuid = ?1);",
        [id.to_string()],
        |row| row.get(0),
    )?;
    Ok(exists == 1)
}

fn load_required_activity(
    conn: &Connection,
    activity_id: ActivityId,
) -> RepoResult<ValidationActivity> {
    let mut stmt = conn.prepare(&format!("{ACTIVITY_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([activity_id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_activity_row(row);
    }
    Err(RepoError::InvalidData(format!(
        "written activity `{activity_id}` not found in read-back"
    )))
}

fn parse_component_row(row: &Row<'_>) -> RepoResult<KnowledgeComponent> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "knowledge_components.uuid")?;

    let document_text: String = row.get("document_uuid")?;
    let document_uuid = parse_uuid(&document_text, "knowledge_components.document_uuid")?;

    let status_text: String = row.get("validation_status")?;
    let validation_status = ComponentValidationStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid validation status `{status_text}` in knowledge_components.validation_status"
        ))
    })?;

    let validated_by = row
        .get::<_, Option<String>>("validated_by")?
        .map(|value| parse_uuid(&value, "knowledge_components.validated_by"))
        .transpose()?;

    Ok(KnowledgeComponent {
        uuid,
        document_uuid,
        summary: row.get("summary")?,
        sentiment_score: row.get("sentiment_score")?,
        complexity_score: row.get("complexity_score")?,
        readability_score: row.get("readability_score")?,
        validation_status,
        validated_by,
        validated_at: row.get("validated_at")?,
        feedback: row.get("feedback")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_activity_row(row: &Row<'_>) -> RepoResult<ValidationActivity> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "validation_activities.uuid")?;

    let document_text: String = row.get("document_uuid")?;
    let document_uuid = parse_uuid(&document_text, "validation_activities.document_uuid")?;

    let validator_text: String = row.get("validator_uuid")?;
    let validator_uuid = parse_uuid(&validator_text, "validation_activities.validator_uuid")?;

    let action_text: String = row.get("action")?;
    let action = ValidationAction::parse(&action_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid action `{action_text}` in validation_activities.action"
        ))
    })?;

    let previous_text: String = row.get("previous_status")?;
    let previous_status = DocumentStatus::parse(&previous_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{previous_text}` in validation_activities.previous_status"
        ))
    })?;

    let new_text: String = row.get("new_status")?;
    let new_status = DocumentStatus::parse(&new_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid status `{new_text}` in validation_activities.new_status"
        ))
    })?;

    Ok(ValidationActivity {
        uuid,
        document_uuid,
        validator_uuid,
        action,
        feedback: row.get("feedback")?,
        previous_status,
        new_status,
        created_at: row.get("created_at")?,
    })
}
