//! Document repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide document CRUD, filtered listing and counter/version updates.
//! - Keep SQL details and ordering behavior inside the persistence boundary.
//!
//! # Invariants
//! - Write paths call `validate()` before SQL mutations.
//! - `increment_version` bumps the version and forces status back to
//!   `DRAFT` in one statement.
//! - List ordering is deterministic; `uuid ASC` breaks every tie.

use crate::model::document::{
    Document, DocumentId, DocumentStatus, DocumentType, NewDocument,
};
use crate::model::person::PersonId;
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult, TableRequirement};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

pub(crate) const DOCUMENT_SELECT_SQL: &str = "SELECT
    uuid,
    title,
    description,
    uploader_uuid,
    status,
    document_type,
    quality_score,
    version,
    view_count,
    download_count,
    created_at,
    updated_at
FROM documents";

const REQUIRED_TABLES: &[TableRequirement] = &[TableRequirement {
    table: "documents",
    columns: &[
        "uuid",
        "title",
        "description",
        "uploader_uuid",
        "status",
        "document_type",
        "quality_score",
        "version",
        "view_count",
        "download_count",
        "created_at",
        "updated_at",
    ],
}];

const RECENT_DEFAULT_LIMIT: u32 = 10;
const RECENT_LIMIT_MAX: u32 = 50;

/// Sort key for document listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentOrder {
    CreatedAt,
    QualityScore,
    ViewCount,
}

impl DocumentOrder {
    fn column(self) -> &'static str {
        match self {
            Self::CreatedAt => "created_at",
            Self::QualityScore => "quality_score",
            Self::ViewCount => "view_count",
        }
    }
}

/// Query options for document listing and search.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentListQuery {
    pub status: Option<DocumentStatus>,
    pub document_type: Option<DocumentType>,
    pub uploader: Option<PersonId>,
    /// Case-insensitive substring match on the title.
    pub title_contains: Option<String>,
    pub min_quality: Option<f64>,
    pub max_quality: Option<f64>,
    /// Inclusive lower bound on `created_at`, epoch milliseconds.
    pub created_after_ms: Option<i64>,
    /// Inclusive upper bound on `created_at`, epoch milliseconds.
    pub created_before_ms: Option<i64>,
    pub order_by: DocumentOrder,
    pub descending: bool,
    pub limit: Option<u32>,
    pub offset: u32,
}

impl Default for DocumentListQuery {
    fn default() -> Self {
        Self {
            status: None,
            document_type: None,
            uploader: None,
            title_contains: None,
            min_quality: None,
            max_quality: None,
            created_after_ms: None,
            created_before_ms: None,
            order_by: DocumentOrder::CreatedAt,
            descending: true,
            limit: None,
            offset: 0,
        }
    }
}

/// Repository interface for document records.
pub trait DocumentRepository {
    /// Creates one document and returns the stored record.
    fn create_document(&self, document: &NewDocument) -> RepoResult<Document>;
    /// Replaces all mutable fields of one document.
    fn update_document(&self, document: &Document) -> RepoResult<()>;
    /// Gets one document by stable ID.
    fn get_document(&self, id: DocumentId) -> RepoResult<Option<Document>>;
    /// Lists documents using filter, ordering and pagination options.
    fn list_documents(&self, query: &DocumentListQuery) -> RepoResult<Vec<Document>>;
    /// Lists the reviewers' queue: pending and under-review, newest first.
    fn list_pending_review(&self, limit: Option<u32>, offset: u32) -> RepoResult<Vec<Document>>;
    /// Lists the most recently published documents.
    fn list_recent_published(&self, limit: u32) -> RepoResult<Vec<Document>>;
    /// Adds one to the view counter.
    fn increment_view_count(&self, id: DocumentId) -> RepoResult<()>;
    /// Adds one to the download counter.
    fn increment_download_count(&self, id: DocumentId) -> RepoResult<()>;
    /// Re-submission: bumps the version and forces status back to draft.
    fn increment_version(&self, id: DocumentId) -> RepoResult<Document>;
}

/// SQLite-backed document repository.
pub struct SqliteDocumentRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteDocumentRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl DocumentRepository for SqliteDocumentRepository<'_> {
    fn create_document(&self, document: &NewDocument) -> RepoResult<Document> {
        document.validate()?;

        self.conn.execute(
            "INSERT INTO documents (
                uuid,
                title,
                description,
                uploader_uuid,
                document_type,
                quality_score
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6);",
            params![
                document.uuid.to_string(),
                document.title.as_str(),
                document.description.as_str(),
                document.uploader_uuid.to_string(),
                document.document_type.as_str(),
                document.quality_score,
            ],
        )?;

        load_required_document(self.conn, document.uuid)
    }

    fn update_document(&self, document: &Document) -> RepoResult<()> {
        document.validate()?;

        let changed = self.conn.execute(
            "UPDATE documents
             SET
                title = ?1,
                description = ?2,
                status = ?3,
                document_type = ?4,
                quality_score = ?5,
                version = ?6,
                view_count = ?7,
                download_count = ?8,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?9;",
            params![
                document.title.as_str(),
                document.description.as_str(),
                document.status.as_str(),
                document.document_type.as_str(),
                document.quality_score,
                document.version,
                document.view_count,
                document.download_count,
                document.uuid.to_string(),
            ],
        )?;

        if changed == 0 {
            return Err(RepoError::DocumentNotFound(document.uuid));
        }

        Ok(())
    }

    fn get_document(&self, id: DocumentId) -> RepoResult<Option<Document>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{DOCUMENT_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_document_row(row)?));
        }
        Ok(None)
    }

    fn list_documents(&self, query: &DocumentListQuery) -> RepoResult<Vec<Document>> {
        let mut sql = format!("{DOCUMENT_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(status) = query.status {
            sql.push_str(" AND status = ?");
            bind_values.push(Value::Text(status.as_str().to_string()));
        }

        if let Some(document_type) = query.document_type {
            sql.push_str(" AND document_type = ?");
            bind_values.push(Value::Text(document_type.as_str().to_string()));
        }

        if let Some(uploader) = query.uploader {
            sql.push_str(" AND uploader_uuid = ?");
            bind_values.push(Value::Text(uploader.to_string()));
        }

        if let Some(fragment) = query.title_contains.as_ref() {
            sql.push_str(" AND title LIKE '%' || ? || '%' ESCAPE '\\'");
            bind_values.push(Value::Text(escape_like_fragment(fragment)));
        }

        if let Some(min_quality) = query.min_quality {
            sql.push_str(" AND quality_score >= ?");
            bind_values.push(Value::Real(min_quality));
        }

        if let Some(max_quality) = query.max_quality {
            sql.push_str(" AND quality_score <= ?");
            bind_values.push(Value::Real(max_quality));
        }

        if let Some(created_after) = query.created_after_ms {
            sql.push_str(" AND created_at >= ?");
            bind_values.push(Value::Integer(created_after));
        }

        if let Some(created_before) = query.created_before_ms {
            sql.push_str(" AND created_at <= ?");
            bind_values.push(Value::Integer(created_before));
        }

        let direction = if query.descending { "DESC" } else { "ASC" };
        sql.push_str(&format!(
            " ORDER BY {} {direction}, uuid ASC",
            query.order_by.column()
        ));

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if query.offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(query.offset)));
            }
        } else if query.offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(query.offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }

        Ok(documents)
    }

    fn list_pending_review(&self, limit: Option<u32>, offset: u32) -> RepoResult<Vec<Document>> {
        let mut sql = format!(
            "{DOCUMENT_SELECT_SQL}
             WHERE status IN ('PENDING_REVIEW', 'UNDER_REVIEW')
             ORDER BY created_at DESC, uuid ASC"
        );
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(limit) = limit {
            sql.push_str(" LIMIT ?");
            bind_values.push(Value::Integer(i64::from(limit)));
            if offset > 0 {
                sql.push_str(" OFFSET ?");
                bind_values.push(Value::Integer(i64::from(offset)));
            }
        } else if offset > 0 {
            sql.push_str(" LIMIT -1 OFFSET ?");
            bind_values.push(Value::Integer(i64::from(offset)));
        }

        let mut stmt = self.conn.prepare(&sql)?;
        let mut rows = stmt.query(params_from_iter(bind_values))?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }

        Ok(documents)
    }

    fn list_recent_published(&self, limit: u32) -> RepoResult<Vec<Document>> {
        let mut stmt = self.conn.prepare(&format!(
            "{DOCUMENT_SELECT_SQL}
             WHERE status = 'PUBLISHED'
             ORDER BY created_at DESC, uuid ASC
             LIMIT ?1;"
        ))?;
        let mut rows = stmt.query([i64::from(limit)])?;
        let mut documents = Vec::new();

        while let Some(row) = rows.next()? {
            documents.push(parse_document_row(row)?);
        }

        Ok(documents)
    }

    fn increment_view_count(&self, id: DocumentId) -> RepoResult<()> {
        bump_counter(self.conn, id, "view_count")
    }

    fn increment_download_count(&self, id: DocumentId) -> RepoResult<()> {
        bump_counter(self.conn, id, "download_count")
    }

    fn increment_version(&self, id: DocumentId) -> RepoResult<Document> {
        let changed = self.conn.execute(
            "UPDATE documents
             SET
                version = version + 1,
                status = 'DRAFT',
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::DocumentNotFound(id));
        }

        load_required_document(self.conn, id)
    }
}

/// Normalizes the recent-published list limit: default 10, clamp to 50.
pub fn normalize_recent_limit(limit: Option<u32>) -> u32 {
    match limit {
        Some(0) => RECENT_DEFAULT_LIMIT,
        Some(value) if value > RECENT_LIMIT_MAX => RECENT_LIMIT_MAX,
        Some(value) => value,
        None => RECENT_DEFAULT_LIMIT,
    }
}

fn bump_counter(conn: &Connection, id: DocumentId, column: &str) -> RepoResult<()> {
    let changed = conn.execute(
        &format!(
            "UPDATE documents
             SET
                {column} = {column} + 1,
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;"
        ),
        [id.to_string()],
    )?;

    if changed == 0 {
        return Err(RepoError::DocumentNotFound(id));
    }

    Ok(())
}

fn escape_like_fragment(fragment: &str) -> String {
    fragment
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_")
}

pub(crate) fn load_required_document(conn: &Connection, id: DocumentId) -> RepoResult<Document> {
    let mut stmt = conn.prepare(&format!("{DOCUMENT_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_document_row(row);
    }
    Err(RepoError::DocumentNotFound(id))
}

pub(crate) fn parse_document_row(row: &Row<'_>) -> RepoResult<Document> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "documents.uuid")?;

    let uploader_text: String = row.get("uploader_uuid")?;
    let uploader_uuid = parse_uuid(&uploader_text, "documents.uploader_uuid")?;

    let status_text: String = row.get("status")?;
    let status = DocumentStatus::parse(&status_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid status `{status_text}` in documents.status"))
    })?;

    let type_text: String = row.get("document_type")?;
    let document_type = DocumentType::parse(&type_text).ok_or_else(|| {
        RepoError::InvalidData(format!(
            "invalid document type `{type_text}` in documents.document_type"
        ))
    })?;

    let document = Document {
        uuid,
        title: row.get("title")?,
        description: row.get("description")?,
        uploader_uuid,
        status,
        document_type,
        quality_score: row.get("quality_score")?,
        version: row.get("version")?,
        view_count: row.get("view_count")?,
        download_count: row.get("download_count")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    };
    document.validate()?;
    Ok(document)
}
