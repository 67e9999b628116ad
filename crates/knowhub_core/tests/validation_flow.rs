use knowhub_core::db::open_db_in_memory;
use knowhub_core::{
    ComponentValidationStatus, DocumentId, DocumentRepository, DocumentStatus, DocumentType,
    NewComponent, NewDocument, PersonId, PersonRole, PersonService, SqliteDocumentRepository,
    SqlitePersonRepository, SqliteValidationRepository, ValidationAction, ValidationService,
    ValidationServiceError,
};
use rusqlite::{params, Connection};
use uuid::Uuid;

#[test]
fn approve_publishes_document_and_writes_exactly_one_activity() {
    let mut conn = open_db_in_memory().unwrap();
    let validator = register_person(&conn, PersonRole::Admin);
    let document = upload_document(&conn, "Approval target");
    set_status(&conn, document, "PENDING_REVIEW");

    let mut service = validation_service(&mut conn);
    let outcome = service
        .apply(document, validator, "APPROVE", "ship it")
        .unwrap();

    assert_eq!(outcome.document.status, DocumentStatus::Published);
    assert_eq!(outcome.activity.document_uuid, document);
    assert_eq!(outcome.activity.validator_uuid, validator);
    assert_eq!(outcome.activity.action, ValidationAction::Approve);
    assert_eq!(outcome.activity.previous_status, DocumentStatus::PendingReview);
    assert_eq!(outcome.activity.new_status, DocumentStatus::Published);
    assert_eq!(outcome.activity.feedback, "ship it");

    let history = service.history(document).unwrap();
    assert_eq!(history.len(), 1);
    assert_eq!(history[0], outcome.activity);
}

#[test]
fn action_mapping_holds_regardless_of_starting_status() {
    let cases = [
        ("APPROVE", DocumentStatus::Published),
        ("REJECT", DocumentStatus::Rejected),
        ("REQUEST_CHANGES", DocumentStatus::Draft),
    ];
    let starting_statuses = ["DRAFT", "UNDER_REVIEW", "REJECTED", "ARCHIVED"];

    for (token, expected) in cases {
        for starting in starting_statuses {
            let mut conn = open_db_in_memory().unwrap();
            let validator = register_person(&conn, PersonRole::KnowledgeChampion);
            let document = upload_document(&conn, "Mapping target");
            set_status(&conn, document, starting);

            let mut service = validation_service(&mut conn);
            let outcome = service.apply(document, validator, token, "").unwrap();

            assert_eq!(
                outcome.document.status, expected,
                "{token} from {starting} should land in {expected:?}"
            );
            assert_eq!(
                outcome.activity.previous_status.as_str(),
                starting,
                "audit must capture the pre-decision status"
            );
            assert_eq!(outcome.activity.new_status, expected);
        }
    }
}

#[test]
fn unrecognized_action_mutates_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let validator = register_person(&conn, PersonRole::Admin);
    let document = upload_document(&conn, "Untouched");
    set_status(&conn, document, "PENDING_REVIEW");

    let mut service = validation_service(&mut conn);
    let err = service
        .apply(document, validator, "ESCALATE", "")
        .unwrap_err();
    assert!(matches!(err, ValidationServiceError::InvalidAction(token) if token == "ESCALATE"));

    assert_eq!(status_of(&conn, document), "PENDING_REVIEW");
    let service = validation_service(&mut conn);
    assert!(service.history(document).unwrap().is_empty());
}

#[test]
fn approve_validates_attached_component() {
    let mut conn = open_db_in_memory().unwrap();
    let validator = register_person(&conn, PersonRole::Admin);
    let document = upload_document(&conn, "With component");
    set_status(&conn, document, "PENDING_REVIEW");

    let mut service = validation_service(&mut conn);
    let component = service
        .attach_component(&NewComponent::new(document, "Key findings summary"))
        .unwrap();
    assert_eq!(
        component.validation_status,
        ComponentValidationStatus::Pending
    );

    let outcome = service
        .apply(document, validator, "APPROVE", "solid work")
        .unwrap();
    assert!(outcome.component_validated);
    assert_eq!(outcome.document.status, DocumentStatus::Published);

    let validated = service.component_for(document).unwrap().unwrap();
    assert_eq!(
        validated.validation_status,
        ComponentValidationStatus::Validated
    );
    assert_eq!(validated.validated_by, Some(validator));
    assert!(validated.validated_at.is_some());
    assert_eq!(validated.feedback, "solid work");

    assert_eq!(service.history(document).unwrap().len(), 1);
}

#[test]
fn approve_with_empty_feedback_keeps_existing_component_feedback() {
    let mut conn = open_db_in_memory().unwrap();
    let validator = register_person(&conn, PersonRole::Admin);
    let document = upload_document(&conn, "Earlier feedback");

    let service = validation_service(&mut conn);
    service
        .attach_component(&NewComponent::new(document, "Summary"))
        .unwrap();
    conn.execute(
        "UPDATE knowledge_components SET feedback = 'earlier note' WHERE document_uuid = ?1;",
        params![document.to_string()],
    )
    .unwrap();

    let mut service = validation_service(&mut conn);
    let outcome = service.apply(document, validator, "APPROVE", "").unwrap();
    assert!(outcome.component_validated);

    let validated = service.component_for(document).unwrap().unwrap();
    assert_eq!(validated.feedback, "earlier note");
}

#[test]
fn reject_and_request_changes_leave_component_untouched() {
    let mut conn = open_db_in_memory().unwrap();
    let validator = register_person(&conn, PersonRole::KnowledgeChampion);
    let document = upload_document(&conn, "Component stays pending");

    let mut service = validation_service(&mut conn);
    service
        .attach_component(&NewComponent::new(document, "Summary"))
        .unwrap();

    let rejected = service
        .apply(document, validator, "REJECT", "not good enough")
        .unwrap();
    assert!(!rejected.component_validated);

    let changes = service
        .apply(document, validator, "REQUEST_CHANGES", "tighten up")
        .unwrap();
    assert!(!changes.component_validated);

    let component = service.component_for(document).unwrap().unwrap();
    assert_eq!(
        component.validation_status,
        ComponentValidationStatus::Pending
    );
    assert_eq!(component.validated_by, None);

    let history = service.history(document).unwrap();
    assert_eq!(history.len(), 2);
}

#[test]
fn approve_without_component_publishes_and_reports_no_component() {
    let mut conn = open_db_in_memory().unwrap();
    let validator = register_person(&conn, PersonRole::Admin);
    let document = upload_document(&conn, "No component");
    set_status(&conn, document, "UNDER_REVIEW");

    let mut service = validation_service(&mut conn);
    let outcome = service.apply(document, validator, "APPROVE", "").unwrap();

    assert!(!outcome.component_validated);
    assert_eq!(outcome.document.status, DocumentStatus::Published);
}

#[test]
fn missing_document_or_validator_mutates_nothing() {
    let mut conn = open_db_in_memory().unwrap();
    let validator = register_person(&conn, PersonRole::Admin);
    let document = upload_document(&conn, "Real document");

    let ghost_document: DocumentId = Uuid::new_v4();
    let mut service = validation_service(&mut conn);
    let err = service
        .apply(ghost_document, validator, "APPROVE", "")
        .unwrap_err();
    assert!(matches!(err, ValidationServiceError::DocumentNotFound(id) if id == ghost_document));

    let ghost_validator: PersonId = Uuid::new_v4();
    let mut service = validation_service(&mut conn);
    let err = service
        .apply(document, ghost_validator, "APPROVE", "")
        .unwrap_err();
    assert!(matches!(err, ValidationServiceError::ValidatorNotFound(id) if id == ghost_validator));

    assert_eq!(status_of(&conn, document), "DRAFT");
    let activities: i64 = conn
        .query_row("SELECT COUNT(*) FROM validation_activities;", [], |row| {
            row.get(0)
        })
        .unwrap();
    assert_eq!(activities, 0);
}

#[test]
fn second_component_attachment_is_refused() {
    let mut conn = open_db_in_memory().unwrap();
    let document = upload_document(&conn, "One component only");

    let service = validation_service(&mut conn);
    service
        .attach_component(&NewComponent::new(document, "First summary"))
        .unwrap();
    let err = service
        .attach_component(&NewComponent::new(document, "Second summary"))
        .unwrap_err();
    assert!(
        matches!(err, ValidationServiceError::ComponentAlreadyAttached(id) if id == document)
    );
}

#[test]
fn attach_component_to_missing_document_fails() {
    let mut conn = open_db_in_memory().unwrap();
    let ghost: DocumentId = Uuid::new_v4();

    let service = validation_service(&mut conn);
    let err = service
        .attach_component(&NewComponent::new(ghost, "Summary"))
        .unwrap_err();
    assert!(matches!(err, ValidationServiceError::DocumentNotFound(id) if id == ghost));
}

fn validation_service(
    conn: &mut Connection,
) -> ValidationService<SqliteValidationRepository<'_>> {
    ValidationService::new(SqliteValidationRepository::try_new(conn).unwrap())
}

fn register_person(conn: &Connection, role: PersonRole) -> PersonId {
    let service = PersonService::new(SqlitePersonRepository::try_new(conn).unwrap());
    service
        .register(format!("{}@example.com", Uuid::new_v4()), "Reviewer", role)
        .unwrap()
        .uuid
}

fn upload_document(conn: &Connection, title: &str) -> DocumentId {
    let uploader = register_person(conn, PersonRole::User);
    let repo = SqliteDocumentRepository::try_new(conn).unwrap();
    repo.create_document(&NewDocument::new(title, uploader, DocumentType::Report))
        .unwrap()
        .uuid
}

fn set_status(conn: &Connection, id: DocumentId, status: &str) {
    conn.execute(
        "UPDATE documents SET status = ?1 WHERE uuid = ?2;",
        params![status, id.to_string()],
    )
    .unwrap();
}

fn status_of(conn: &Connection, id: DocumentId) -> String {
    conn.query_row(
        "SELECT status FROM documents WHERE uuid = ?1;",
        params![id.to_string()],
        |row| row.get(0),
    )
    .unwrap()
}
