use knowhub_core::db::migrations::latest_version;
use knowhub_core::db::open_db_in_memory;
use knowhub_core::{
    normalize_recent_limit, Document, DocumentListQuery, DocumentOrder, DocumentService,
    DocumentServiceError, DocumentStatus, DocumentType, ModelValidationError, NewDocument,
    PersonId, PersonRole, PersonService, RepoError, SqliteDocumentRepository,
    SqlitePersonRepository,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

#[test]
fn upload_and_get_roundtrip_uses_storage_defaults() {
    let conn = open_db_in_memory().unwrap();
    let uploader = register_uploader(&conn);
    let service = document_service(&conn);

    let upload = NewDocument::new("Cloud migration playbook", uploader, DocumentType::Guideline);
    let created = service.upload(&upload).unwrap();

    assert_eq!(created.uuid, upload.uuid);
    assert_eq!(created.title, "Cloud migration playbook");
    assert_eq!(created.status, DocumentStatus::Draft);
    assert_eq!(created.version, 1);
    assert_eq!(created.view_count, 0);
    assert_eq!(created.download_count, 0);
    assert_eq!(created.quality_score, None);

    let loaded = service.get(created.uuid).unwrap().unwrap();
    assert_eq!(loaded, created);
}

#[test]
fn upload_rejects_blank_title() {
    let conn = open_db_in_memory().unwrap();
    let uploader = register_uploader(&conn);
    let service = document_service(&conn);

    let err = service
        .upload(&NewDocument::new("   ", uploader, DocumentType::Other))
        .unwrap_err();
    assert!(matches!(
        err,
        DocumentServiceError::Repo(RepoError::Validation(ModelValidationError::BlankTitle))
    ));
}

#[test]
fn update_replaces_mutable_fields() {
    let conn = open_db_in_memory().unwrap();
    let uploader = register_uploader(&conn);
    let service = document_service(&conn);

    let created = service
        .upload(&NewDocument::new("Draft report", uploader, DocumentType::Report))
        .unwrap();

    let mut revised = created.clone();
    revised.title = "Final report".to_string();
    revised.description = "Reviewed and polished".to_string();
    revised.status = DocumentStatus::PendingReview;
    revised.quality_score = Some(4.2);
    service.update(&revised).unwrap();

    let loaded = service.get(created.uuid).unwrap().unwrap();
    assert_eq!(loaded.title, "Final report");
    assert_eq!(loaded.status, DocumentStatus::PendingReview);
    assert_eq!(loaded.quality_score, Some(4.2));
}

#[test]
fn update_missing_document_fails_not_found() {
    let conn = open_db_in_memory().unwrap();
    let uploader = register_uploader(&conn);
    let service = document_service(&conn);

    let created = service
        .upload(&NewDocument::new("Orphan", uploader, DocumentType::Other))
        .unwrap();
    let mut ghost = created;
    ghost.uuid = Uuid::new_v4();

    let err = service.update(&ghost).unwrap_err();
    assert!(matches!(err, DocumentServiceError::DocumentNotFound(id) if id == ghost.uuid));
}

#[test]
fn counters_increment_by_exactly_one() {
    let conn = open_db_in_memory().unwrap();
    let uploader = register_uploader(&conn);
    let service = document_service(&conn);

    let created = service
        .upload(&NewDocument::new("Popular deck", uploader, DocumentType::Presentation))
        .unwrap();

    service.record_view(created.uuid).unwrap();
    service.record_view(created.uuid).unwrap();
    service.record_download(created.uuid).unwrap();

    let loaded = service.get(created.uuid).unwrap().unwrap();
    assert_eq!(loaded.view_count, 2);
    assert_eq!(loaded.download_count, 1);

    let err = service.record_view(Uuid::new_v4()).unwrap_err();
    assert!(matches!(err, DocumentServiceError::DocumentNotFound(_)));
}

#[test]
fn resubmit_always_lands_in_draft_with_strictly_growing_version() {
    let conn = open_db_in_memory().unwrap();
    let uploader = register_uploader(&conn);
    let service = document_service(&conn);

    let created = service
        .upload(&NewDocument::new("Rejected proposal", uploader, DocumentType::Proposal))
        .unwrap();
    set_status(&conn, created.uuid, "REJECTED");

    let first = service.resubmit(created.uuid).unwrap();
    assert_eq!(first.status, DocumentStatus::Draft);
    assert_eq!(first.version, 2);

    let second = service.resubmit(created.uuid).unwrap();
    assert_eq!(second.status, DocumentStatus::Draft);
    assert_eq!(second.version, 3);
}

#[test]
fn list_applies_filters_and_deterministic_order() {
    let conn = open_db_in_memory().unwrap();
    let uploader = register_uploader(&conn);
    let service = document_service(&conn);

    let report_new = upload_with_created_at(&conn, &service, uploader, "Quarterly Report", DocumentType::Report, 3_000);
    let report_old = upload_with_created_at(&conn, &service, uploader, "Annual report draft", DocumentType::Report, 1_000);
    let contract = upload_with_created_at(&conn, &service, uploader, "Vendor contract", DocumentType::Contract, 2_000);

    let reports = service
        .list(&DocumentListQuery {
            document_type: Some(DocumentType::Report),
            ..DocumentListQuery::default()
        })
        .unwrap();
    assert_eq!(
        ids(&reports),
        vec![report_new.uuid, report_old.uuid],
        "newest first with created_at DESC"
    );

    let by_title = service
        .list(&DocumentListQuery {
            title_contains: Some("report".to_string()),
            descending: false,
            ..DocumentListQuery::default()
        })
        .unwrap();
    assert_eq!(ids(&by_title), vec![report_old.uuid, report_new.uuid]);

    let in_window = service
        .list(&DocumentListQuery {
            created_after_ms: Some(1_500),
            created_before_ms: Some(2_500),
            ..DocumentListQuery::default()
        })
        .unwrap();
    assert_eq!(ids(&in_window), vec![contract.uuid]);
}

#[test]
fn list_filters_on_quality_bounds_exclude_unscored() {
    let conn = open_db_in_memory().unwrap();
    let uploader = register_uploader(&conn);
    let service = document_service(&conn);

    let mut scored_high = NewDocument::new("High quality", uploader, DocumentType::Research);
    scored_high.quality_score = Some(4.5);
    let scored_high = service.upload(&scored_high).unwrap();

    let mut scored_low = NewDocument::new("Low quality", uploader, DocumentType::Research);
    scored_low.quality_score = Some(1.5);
    service.upload(&scored_low).unwrap();

    service
        .upload(&NewDocument::new("Unscored", uploader, DocumentType::Research))
        .unwrap();

    let quality = service
        .list(&DocumentListQuery {
            min_quality: Some(3.0),
            ..DocumentListQuery::default()
        })
        .unwrap();
    assert_eq!(ids(&quality), vec![scored_high.uuid]);
}

#[test]
fn list_orders_by_view_count_when_requested() {
    let conn = open_db_in_memory().unwrap();
    let uploader = register_uploader(&conn);
    let service = document_service(&conn);

    let quiet = service
        .upload(&NewDocument::new("Quiet", uploader, DocumentType::Other))
        .unwrap();
    let popular = service
        .upload(&NewDocument::new("Popular", uploader, DocumentType::Other))
        .unwrap();
    service.record_view(popular.uuid).unwrap();
    service.record_view(popular.uuid).unwrap();

    let by_views = service
        .list(&DocumentListQuery {
            order_by: DocumentOrder::ViewCount,
            ..DocumentListQuery::default()
        })
        .unwrap();
    assert_eq!(ids(&by_views), vec![popular.uuid, quiet.uuid]);
}

#[test]
fn pending_queue_requires_validating_role_and_covers_both_statuses() {
    let conn = open_db_in_memory().unwrap();
    let uploader = register_uploader(&conn);
    let service = document_service(&conn);

    let pending = upload_with_created_at(&conn, &service, uploader, "Pending", DocumentType::Other, 2_000);
    set_status(&conn, pending.uuid, "PENDING_REVIEW");
    let under = upload_with_created_at(&conn, &service, uploader, "Under review", DocumentType::Other, 1_000);
    set_status(&conn, under.uuid, "UNDER_REVIEW");
    let draft = upload_with_created_at(&conn, &service, uploader, "Still draft", DocumentType::Other, 3_000);
    set_status(&conn, draft.uuid, "DRAFT");

    let err = service
        .pending_validations(PersonRole::Consultant, None, 0)
        .unwrap_err();
    assert!(matches!(
        err,
        DocumentServiceError::NotAuthorized(PersonRole::Consultant)
    ));

    let queue = service
        .pending_validations(PersonRole::KnowledgeChampion, None, 0)
        .unwrap();
    assert_eq!(ids(&queue), vec![pending.uuid, under.uuid]);
}

#[test]
fn recent_published_normalizes_limit_and_filters_status() {
    let conn = open_db_in_memory().unwrap();
    let uploader = register_uploader(&conn);
    let service = document_service(&conn);

    let published = upload_with_created_at(&conn, &service, uploader, "Published", DocumentType::Other, 2_000);
    set_status(&conn, published.uuid, "PUBLISHED");
    upload_with_created_at(&conn, &service, uploader, "Draft", DocumentType::Other, 3_000);

    let recent = service.recent_published(None).unwrap();
    assert_eq!(ids(&recent), vec![published.uuid]);

    assert_eq!(normalize_recent_limit(None), 10);
    assert_eq!(normalize_recent_limit(Some(0)), 10);
    assert_eq!(normalize_recent_limit(Some(25)), 25);
    assert_eq!(normalize_recent_limit(Some(500)), 50);
}

#[test]
fn repository_rejects_uninitialized_connection() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteDocumentRepository::try_new(&conn) {
        Err(RepoError::UninitializedConnection {
            expected_version,
            actual_version: 0,
        }) => assert!(expected_version > 0),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected uninitialized connection error"),
    }
}

#[test]
fn repository_rejects_connection_missing_required_schema() {
    let conn = Connection::open_in_memory().unwrap();
    conn.execute_batch(&format!("PRAGMA user_version = {};", latest_version()))
        .unwrap();

    assert!(matches!(
        SqliteDocumentRepository::try_new(&conn),
        Err(RepoError::MissingRequiredTable("documents"))
    ));

    conn.execute_batch(
        "CREATE TABLE documents (
            uuid TEXT PRIMARY KEY NOT NULL,
            title TEXT NOT NULL
        );",
    )
    .unwrap();

    assert!(matches!(
        SqliteDocumentRepository::try_new(&conn),
        Err(RepoError::MissingRequiredColumn {
            table: "documents",
            column: "description"
        })
    ));
}

fn register_uploader(conn: &Connection) -> PersonId {
    let service = PersonService::new(SqlitePersonRepository::try_new(conn).unwrap());
    service
        .register(
            format!("{}@example.com", Uuid::new_v4()),
            "Uploader",
            PersonRole::User,
        )
        .unwrap()
        .uuid
}

fn document_service(conn: &Connection) -> DocumentService<SqliteDocumentRepository<'_>> {
    DocumentService::new(SqliteDocumentRepository::try_new(conn).unwrap())
}

fn upload_with_created_at(
    conn: &Connection,
    service: &DocumentService<SqliteDocumentRepository<'_>>,
    uploader: PersonId,
    title: &str,
    document_type: DocumentType,
    created_at_ms: i64,
) -> Document {
    let created = service
        .upload(&NewDocument::new(title, uploader, document_type))
        .unwrap();
    conn.execute(
        "UPDATE documents SET created_at = ?1 WHERE uuid = ?2;",
        params![created_at_ms, created.uuid.to_string()],
    )
    .unwrap();
    service.get(created.uuid).unwrap().unwrap()
}

fn set_status(conn: &Connection, id: uuid::Uuid, status: &str) {
    conn.execute(
        "UPDATE documents SET status = ?1 WHERE uuid = ?2;",
        params![status, id.to_string()],
    )
    .unwrap();
}

fn ids(documents: &[Document]) -> Vec<uuid::Uuid> {
    documents.iter().map(|doc| doc.uuid).collect()
}
