//! Person repository contract and SQLite implementation.
//!
//! # Responsibility
//! - Provide person registration, lookup and activity-touch APIs.
//! - Keep SQL details inside the persistence boundary.
//!
//! # Invariants
//! - `create_person` validates the record and enforces email uniqueness.
//! - `record_activity` moves `last_activity` to the storage clock.
//! - Listing order is deterministic: `created_at DESC, uuid ASC`.

use crate::model::person::{NewPerson, Person, PersonId, PersonRole};
use crate::repo::{ensure_connection_ready, parse_uuid, RepoError, RepoResult, TableRequirement};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row};

const PERSON_SELECT_SQL: &str = "SELECT
    uuid,
    email,
    display_name,
    role,
    last_activity,
    created_at,
    updated_at
FROM persons";

const REQUIRED_TABLES: &[TableRequirement] = &[TableRequirement {
    table: "persons",
    columns: &[
        "uuid",
        "email",
        "display_name",
        "role",
        "last_activity",
        "created_at",
        "updated_at",
    ],
}];

/// Query options for listing persons.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonListQuery {
    /// Optional exact role filter.
    pub role: Option<PersonRole>,
    pub limit: Option<u32>,
    pub offset: u32,
}

/// Repository interface for person records.
pub trait PersonRepository {
    /// Registers one person and returns the stored record.
    fn create_person(&self, person: &NewPerson) -> RepoResult<Person>;
    /// Gets one person by stable ID.
    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>>;
    /// Gets one person by lowercased email.
    fn get_person_by_email(&self, email: &str) -> RepoResult<Option<Person>>;
    /// Touches `last_activity` for one person.
    fn record_activity(&self, id: PersonId) -> RepoResult<()>;
    /// Lists persons using filter and pagination options.
    fn list_persons(&self, query: &PersonListQuery) -> RepoResult<Vec<Person>>;
}

/// SQLite-backed person repository.
pub struct SqlitePersonRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqlitePersonRepository<'conn> {
    /// Constructs a repository from a migrated/ready connection.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_connection_ready(conn, REQUIRED_TABLES)?;
        Ok(Self { conn })
    }
}

impl PersonRepository for SqlitePersonRepository<'_> {
    fn create_person(&self, person: &NewPerson) -> RepoResult<Person> {
        person.validate()?;

        let taken: i64 = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM persons WHERE email = ?1);",
            [person.email.as_str()],
            |row| row.get(0),
        )?;
        if taken == 1 {
            return Err(RepoError::DuplicateEmail(person.email.clone()));
        }

        self.conn.execute(
            "INSERT INTO persons (uuid, email, display_name, role)
             VALUES (?1, ?2, ?3, ?4);",
            params![
                person.uuid.to_string(),
                person.email.as_str(),
                person.display_name.as_str(),
                person.role.as_str(),
            ],
        )?;

        load_required_person(self.conn, person.uuid)
    }

    fn get_person(&self, id: PersonId) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE uuid = ?1;"))?;
        let mut rows = stmt.query([id.to_string()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn get_person_by_email(&self, email: &str) -> RepoResult<Option<Person>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{PERSON_SELECT_SQL} WHERE email = ?1;"))?;
        let mut rows = stmt.query([email.trim().to_lowercase()])?;
        if let Some(row) = rows.next()? {
            return Ok(Some(parse_person_row(row)?));
        }
        Ok(None)
    }

    fn record_activity(&self, id: PersonId) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE persons
             SET
                last_activity = (strftime('%s', 'now') * 1000),
                updated_at = (strftime('%s', 'now') * 1000)
             WHERE uuid = ?1;",
            [id.to_string()],
        )?;

        if changed == 0 {
            return Err(RepoError::PersonNotFound(id));
        }

        Ok(())
    }

    fn list_persons(&self, query: &PersonListQuery) -> RepoResult<Vec<Person>> {
        let mut sql = format!("{PERSON_SELECT_SQL} WHERE 1 = 1");
        let mut bind_values: Vec<Value> = Vec::new();

        if let Some(role) = query.role {
            sql.push_str(" AND role = ?");
            bind_values.push(Value::Text(role.as_str().to_string()));
        }

        sql.push_str(" ORDER BY created_at DESC, uuid ASC");

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
        let mut persons = Vec::new();

        while let Some(row) = rows.next()? {
            persons.push(parse_person_row(row)?);
        }

        Ok(persons)
    }
}

pub(crate) fn load_required_person(conn: &Connection, id: PersonId) -> RepoResult<Person> {
    let mut stmt = conn.prepare(&format!("{PERSON_SELECT_SQL} WHERE uuid = ?1;"))?;
    let mut rows = stmt.query([id.to_string()])?;
    if let Some(row) = rows.next()? {
        return parse_person_row(row);
    }
    Err(RepoError::PersonNotFound(id))
}

fn parse_person_row(row: &Row<'_>) -> RepoResult<Person> {
    let uuid_text: String = row.get("uuid")?;
    let uuid = parse_uuid(&uuid_text, "persons.uuid")?;

    let role_text: String = row.get("role")?;
    let role = PersonRole::parse(&role_text).ok_or_else(|| {
        RepoError::InvalidData(format!("invalid role `{role_text}` in persons.role"))
    })?;

    Ok(Person {
        uuid,
        email: row.get("email")?,
        display_name: row.get("display_name")?,
        role,
        last_activity: row.get("last_activity")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}
