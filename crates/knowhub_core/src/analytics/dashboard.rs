//! Dashboard metrics over documents and people.
//!
//! # Responsibility
//! - Resolve timeframe tokens into concrete windows.
//! - Compute counts, growth, averages, the daily trend series and the
//!   document-type distribution as one read-only snapshot.
//!
//! # Invariants
//! - The clock is injected through [`DashboardQuery::now`]; this module
//!   never reads wall time itself.
//! - Every call recomputes from storage; nothing is cached.
//! - The queries are independent reads with no cross-query transaction, so
//!   a snapshot taken under concurrent writes is a best-effort
//!   point-in-time approximation.
//! - Trend series ordering is chronological ascending.

use crate::db::DbError;
use crate::model::document::DocumentType;
use chrono::{DateTime, NaiveDate, Utc};
use log::info;
use rusqlite::{Connection, Row};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

const DAY_MS: i64 = 86_400_000;

/// Active-user lookback, fixed at 7 days regardless of the requested
/// timeframe.
const ACTIVE_USER_WINDOW_DAYS: i64 = 7;

/// Result type for analytics APIs.
pub type AnalyticsResult<T> = Result<T, AnalyticsError>;

/// Analytics-layer error for token parsing, DB interaction and result
/// decoding.
#[derive(Debug)]
pub enum AnalyticsError {
    /// Caller-supplied timeframe token is not recognized.
    InvalidTimeframe {
        token: String,
    },
    Db(DbError),
    InvalidData(String),
}

impl Display for AnalyticsError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidTimeframe { token } => {
                write!(f, "invalid timeframe `{token}`; expected 7days|30days|90days|year")
            }
            Self::Db(err) => write!(f, "{err}"),
            Self::InvalidData(message) => write!(f, "invalid analytics row: {message}"),
        }
    }
}

impl Error for AnalyticsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidTimeframe { .. } => None,
            Self::Db(err) => Some(err),
            Self::InvalidData(_) => None,
        }
    }
}

impl From<DbError> for AnalyticsError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for AnalyticsError {
    fn from(value: rusqlite::Error) -> Self {
        Self::Db(DbError::Sqlite(value))
    }
}

/// Symbolic dashboard window selector.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub enum Timeframe {
    #[default]
    #[serde(rename = "7days")]
    SevenDays,
    #[serde(rename = "30days")]
    ThirtyDays,
    #[serde(rename = "90days")]
    NinetyDays,
    #[serde(rename = "year")]
    Year,
}

impl Timeframe {
    /// Canonical token used on the wire.
    pub fn as_token(self) -> &'static str {
        match self {
            Self::SevenDays => "7days",
            Self::ThirtyDays => "30days",
            Self::NinetyDays => "90days",
            Self::Year => "year",
        }
    }

    /// Window length in days.
    pub fn window_days(self) -> i64 {
        match self {
            Self::SevenDays => 7,
            Self::ThirtyDays => 30,
            Self::NinetyDays => 90,
            Self::Year => 365,
        }
    }

    /// Parses a timeframe token.
    pub fn from_token(token: &str) -> AnalyticsResult<Self> {
        match token {
            "7days" => Ok(Self::SevenDays),
            "30days" => Ok(Self::ThirtyDays),
            "90days" => Ok(Self::NinetyDays),
            "year" => Ok(Self::Year),
            other => Err(AnalyticsError::InvalidTimeframe {
                token: other.to_string(),
            }),
        }
    }

    /// Resolves an optional token; absence means the 7-day default.
    pub fn resolve(token: Option<&str>) -> AnalyticsResult<Self> {
        match token {
            Some(value) => Self::from_token(value),
            None => Ok(Self::default()),
        }
    }
}

/// Dashboard computation input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DashboardQuery {
    pub timeframe: Timeframe,
    /// Reference instant the window ends at. Injected by the caller so the
    /// computation stays deterministic and testable.
    pub now: DateTime<Utc>,
}

impl DashboardQuery {
    /// Creates a query for a resolved timeframe.
    pub fn new(timeframe: Timeframe, now: DateTime<Utc>) -> Self {
        Self { timeframe, now }
    }

    /// Creates a query from an optional raw token.
    pub fn for_token(token: Option<&str>, now: DateTime<Utc>) -> AnalyticsResult<Self> {
        Ok(Self::new(Timeframe::resolve(token)?, now))
    }
}

/// One day of the activity trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    /// Calendar date (UTC) of the bucket start.
    pub date: NaiveDate,
    /// Documents created in this bucket.
    pub documents: u64,
    /// Persons whose latest activity falls in this bucket.
    pub users: u64,
    /// Mean quality score of this bucket's documents, 0 when none carry one.
    pub quality: f64,
}

/// One entry of the document-type distribution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TypeCount {
    pub document_type: DocumentType,
    pub count: u64,
}

/// Read-only dashboard snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSnapshot {
    pub timeframe: Timeframe,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
    /// All documents, unfiltered by timeframe.
    pub total_documents: u64,
    /// Growth of document creation versus the comparison window, percent,
    /// 2 decimal places. 0 when the comparison window is empty.
    pub document_growth: f64,
    /// Persons active within the last 7 days, independent of timeframe.
    pub active_users: u64,
    /// Mean quality score over all scored documents, 1 decimal place.
    pub avg_quality_score: f64,
    /// One entry per day of the window, inclusive endpoints, ascending.
    pub activity_trend: Vec<TrendPoint>,
    /// All documents grouped by type, largest group first.
    pub document_types: Vec<TypeCount>,
}

/// Computes a dashboard snapshot for the query's window.
///
/// Issues several independent aggregate reads; see the module invariants
/// for the consistency contract.
pub fn dashboard(conn: &Connection, query: &DashboardQuery) -> AnalyticsResult<DashboardSnapshot> {
    let started_at = Instant::now();

    let window_days = query.timeframe.window_days();
    let end_ms = query.now.timestamp_millis();
    let start_ms = end_ms - window_days * DAY_MS;
    let previous_end_ms = start_ms - window_days * DAY_MS;
    let previous_start_ms = previous_end_ms - window_days * DAY_MS;

    let total_documents = count_all_documents(conn)?;
    let current_count = count_documents_created_between(conn, start_ms, end_ms)?;
    let previous_count =
        count_documents_created_between(conn, previous_start_ms, previous_end_ms)?;

    let document_growth = if previous_count == 0 {
        0.0
    } else {
        let delta = current_count as f64 - previous_count as f64;
        round_to(delta / previous_count as f64 * 100.0, 2)
    };

    let active_users =
        count_persons_active_since(conn, end_ms - ACTIVE_USER_WINDOW_DAYS * DAY_MS)?;
    let avg_quality_score = round_to(average_quality_score(conn)?.unwrap_or(0.0), 1);
    let activity_trend = daily_activity_trend(conn, start_ms, window_days)?;
    let document_types = document_type_distribution(conn)?;

    info!(
        "event=dashboard_computed module=analytics status=ok timeframe={} window_days={window_days} duration_ms={}",
        query.timeframe.as_token(),
        started_at.elapsed().as_millis()
    );

    Ok(DashboardSnapshot {
        timeframe: query.timeframe,
        period_start: datetime_from_ms(start_ms)?,
        period_end: datetime_from_ms(end_ms)?,
        total_documents,
        document_growth,
        active_users,
        avg_quality_score,
        activity_trend,
        document_types,
    })
}

fn count_all_documents(conn: &Connection) -> AnalyticsResult<u64> {
    let count: i64 = conn.query_row("SELECT COUNT(*) FROM documents;", [], |row| row.get(0))?;
    Ok(count as u64)
}

fn count_documents_created_between(
    conn: &Connection,
    start_ms: i64,
    end_ms: i64,
) -> AnalyticsResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM documents WHERE created_at BETWEEN ?1 AND ?2;",
        [start_ms, end_ms],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

fn count_persons_active_since(conn: &Connection, since_ms: i64) -> AnalyticsResult<u64> {
    let count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM persons WHERE last_activity >= ?1;",
        [since_ms],
        |row| row.get(0),
    )?;
    Ok(count as u64)
}

fn average_quality_score(conn: &Connection) -> AnalyticsResult<Option<f64>> {
    let avg: Option<f64> = conn.query_row(
        "SELECT AVG(quality_score) FROM documents WHERE quality_score IS NOT NULL;",
        [],
        |row| row.get(0),
    )?;
    Ok(avg)
}

/// Builds the per-day trend by fetching the window's rows once and
/// bucketing in memory, rather than issuing one query per day.
///
/// Buckets are 24h windows anchored at the query's end instant; the last
/// bucket starts exactly at the window end.
fn daily_activity_trend(
    conn: &Connection,
    start_ms: i64,
    window_days: i64,
) -> AnalyticsResult<Vec<TrendPoint>> {
    let bucket_count = (window_days + 1) as usize;
    let fetch_end_ms = start_ms + bucket_count as i64 * DAY_MS;

    let mut documents = vec![0u64; bucket_count];
    let mut quality_sums = vec![0f64; bucket_count];
    let mut quality_counts = vec![0u64; bucket_count];
    let mut users = vec![0u64; bucket_count];

    let mut stmt = conn.prepare(
        "SELECT created_at, quality_score
         FROM documents
         WHERE created_at >= ?1 AND created_at < ?2;",
    )?;
    let mut rows = stmt.query([start_ms, fetch_end_ms])?;
    while let Some(row) = rows.next()? {
        let created_at: i64 = row.get(0)?;
        let bucket = ((created_at - start_ms) / DAY_MS) as usize;
        documents[bucket] += 1;
        if let Some(score) = row.get::<_, Option<f64>>(1)? {
            quality_sums[bucket] += score;
            quality_counts[bucket] += 1;
        }
    }

    let mut stmt = conn.prepare(
        "SELECT last_activity
         FROM persons
         WHERE last_activity >= ?1 AND last_activity < ?2;",
    )?;
    let mut rows = stmt.query([start_ms, fetch_end_ms])?;
    while let Some(row) = rows.next()? {
        let last_activity: i64 = row.get(0)?;
        let bucket = ((last_activity - start_ms) / DAY_MS) as usize;
        users[bucket] += 1;
    }

    let mut trend = Vec::with_capacity(bucket_count);
    for bucket in 0..bucket_count {
        let bucket_start_ms = start_ms + bucket as i64 * DAY_MS;
        let quality = if quality_counts[bucket] > 0 {
            quality_sums[bucket] / quality_counts[bucket] as f64
        } else {
            0.0
        };
        trend.push(TrendPoint {
            date: datetime_from_ms(bucket_start_ms)?.date_naive(),
            documents: documents[bucket],
            users: users[bucket],
            quality,
        });
    }

    Ok(trend)
}

fn document_type_distribution(conn: &Connection) -> AnalyticsResult<Vec<TypeCount>> {
    let mut stmt = conn.prepare(
        "SELECT document_type, COUNT(*) AS total
         FROM documents
         GROUP BY document_type
         ORDER BY total DESC, document_type ASC;",
    )?;
    let mut rows = stmt.query([])?;
    let mut distribution = Vec::new();

    while let Some(row) = rows.next()? {
        distribution.push(parse_type_count_row(row)?);
    }

    Ok(distribution)
}

fn parse_type_count_row(row: &Row<'_>) -> AnalyticsResult<TypeCount> {
    let type_text: String = row.get("document_type")?;
    let document_type = DocumentType::parse(&type_text).ok_or_else(|| {
        AnalyticsError::InvalidData(format!(
            "invalid document type `{type_text}` in documents.document_type"
        ))
    })?;

    let count: i64 = row.get("total")?;
    Ok(TypeCount {
        document_type,
        count: count as u64,
    })
}

fn datetime_from_ms(ms: i64) -> AnalyticsResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(ms)
        .ok_or_else(|| AnalyticsError::InvalidData(format!("timestamp out of range: {ms}")))
}

fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}
