//! Row-to-entity parsing helpers.
//!
//! Converts `libsql::Row` (column-indexed) into typed entities. Timestamps are
//! stored as fixed-width RFC 3339 strings, so lexical order in SQL is
//! chronological order.

use chrono::{DateTime, Utc};
use vitalis_core::entities::{AuditRecord, TestResult};
use vitalis_core::enums::OrderKey;
use vitalis_core::identity::ActorId;

use crate::error::DatabaseError;

/// Columns selected for a [`TestResult`], in [`row_to_test_result`] order.
pub const TEST_RESULT_COLUMNS: &str = "public_id, owner_id, test_name, value, unit, taken_at, notes, \
     created_at, updated_at, updated_by, is_deleted, deleted_at, deleted_by";

/// Columns selected for an [`AuditRecord`], in [`row_to_audit_record`] order.
pub const AUDIT_COLUMNS: &str =
    "id, entity_type, entity_public_id, actor_id, occurred_at, action, before_json, after_json";

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Accepts RFC 3339 and `SQLite`'s `datetime('now')` format.
///
/// # Errors
///
/// Returns `DatabaseError::FatalStorage` if the string is neither.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, DatabaseError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| DatabaseError::FatalStorage(format!("Failed to parse datetime '{s}': {e}")))
}

/// Parse an optional TEXT column as `Option<DateTime<Utc>>`.
///
/// # Errors
///
/// Returns `DatabaseError::FatalStorage` if a non-empty string cannot be parsed.
pub fn parse_optional_datetime(s: Option<&str>) -> Result<Option<DateTime<Utc>>, DatabaseError> {
    match s {
        Some(s) if !s.is_empty() => Ok(Some(parse_datetime(s)?)),
        _ => Ok(None),
    }
}

/// Parse a TEXT column into a `snake_case` serde enum.
///
/// # Errors
///
/// Returns `DatabaseError::FatalStorage` if no variant matches.
pub fn parse_enum<T: serde::de::DeserializeOwned>(s: &str) -> Result<T, DatabaseError> {
    serde_json::from_value(serde_json::Value::String(s.to_string()))
        .map_err(|e| DatabaseError::FatalStorage(format!("Failed to parse enum from '{s}': {e}")))
}

/// Read a nullable TEXT column. Returns `None` for both SQL NULL and empty string.
///
/// `row.get::<String>(idx)` on a NULL column returns an error, not `""`.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_string(row: &libsql::Row, idx: i32) -> Result<Option<String>, DatabaseError> {
    match row.get::<Option<String>>(idx)? {
        Some(s) if s.is_empty() => Ok(None),
        other => Ok(other),
    }
}

/// Read a nullable actor column.
///
/// # Errors
///
/// Returns `DatabaseError` if the column read fails.
pub fn get_opt_actor(row: &libsql::Row, idx: i32) -> Result<Option<ActorId>, DatabaseError> {
    Ok(get_opt_string(row, idx)?.map(ActorId::from))
}

/// `ORDER BY` clause for a list ordering. Ties fall back to insertion order.
#[must_use]
pub const fn order_clause(order: OrderKey) -> &'static str {
    match order {
        OrderKey::TakenAtDesc => "ORDER BY taken_at DESC, id DESC",
        OrderKey::TakenAtAsc => "ORDER BY taken_at ASC, id ASC",
        OrderKey::TestName => "ORDER BY test_name COLLATE NOCASE ASC, taken_at DESC, id ASC",
        OrderKey::UpdatedAtDesc => "ORDER BY updated_at DESC, id DESC",
    }
}

/// Build a [`TestResult`] from a row selected with [`TEST_RESULT_COLUMNS`].
///
/// # Errors
///
/// Returns `DatabaseError` if a column is missing or malformed.
pub fn row_to_test_result(row: &libsql::Row) -> Result<TestResult, DatabaseError> {
    Ok(TestResult {
        public_id: row.get::<String>(0)?,
        owner_id: ActorId::from(row.get::<String>(1)?),
        test_name: row.get::<String>(2)?,
        value: row.get::<f64>(3)?,
        unit: row.get::<String>(4)?,
        taken_at: parse_datetime(&row.get::<String>(5)?)?,
        notes: get_opt_string(row, 6)?,
        created_at: parse_datetime(&row.get::<String>(7)?)?,
        updated_at: parse_datetime(&row.get::<String>(8)?)?,
        updated_by: get_opt_actor(row, 9)?,
        is_deleted: row.get::<i64>(10)? != 0,
        deleted_at: parse_optional_datetime(get_opt_string(row, 11)?.as_deref())?,
        deleted_by: get_opt_actor(row, 12)?,
    })
}

/// Build an [`AuditRecord`] from a row selected with [`AUDIT_COLUMNS`].
///
/// # Errors
///
/// Returns `DatabaseError` if a column is missing or malformed.
pub fn row_to_audit_record(row: &libsql::Row) -> Result<AuditRecord, DatabaseError> {
    Ok(AuditRecord {
        id: row.get::<String>(0)?,
        entity_type: parse_enum(&row.get::<String>(1)?)?,
        entity_public_id: row.get::<String>(2)?,
        actor_id: get_opt_actor(row, 3)?,
        occurred_at: parse_datetime(&row.get::<String>(4)?)?,
        action: parse_enum(&row.get::<String>(5)?)?,
        before_json: row.get::<String>(6)?,
        after_json: row.get::<Option<String>>(7)?,
    })
}
