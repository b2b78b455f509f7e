//! Embedded schema migrations and the libSQL-backed [`SchemaStore`].
//!
//! Migration SQL is compiled in with `include_str!`. Each migration runs in
//! its own transaction and records its version with `INSERT OR IGNORE`, and
//! every statement is `IF NOT EXISTS`, so a peer process re-applying a
//! migration that another instance just finished is a no-op.

use std::time::Duration;

use libsql::Builder;
use tokio::sync::Mutex;
use vitalis_core::time::{now_utc, to_storage};

use crate::RecordDb;
use crate::bootstrap::SchemaStore;
use crate::error::DatabaseError;
use crate::storage::{StorageFault, classify, classify_open};

/// How long a unit of work waits for a peer's write lock before failing.
pub const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// One versioned schema step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Migration {
    pub version: u32,
    pub name: &'static str,
    pub sql: &'static str,
}

/// All migrations, in ascending version order.
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "001_initial",
        sql: include_str!("../migrations/001_initial.sql"),
    },
    Migration {
        version: 2,
        name: "002_audit_guards",
        sql: include_str!("../migrations/002_audit_guards.sql"),
    },
];

const SCHEMA_MIGRATIONS_DDL: &str = "CREATE TABLE IF NOT EXISTS schema_migrations (
    version INTEGER PRIMARY KEY,
    name TEXT NOT NULL,
    applied_at TEXT NOT NULL
)";

/// Highest version in `migrations`, or 0 when empty.
#[must_use]
pub fn latest_version(migrations: &[Migration]) -> u32 {
    migrations.iter().map(|m| m.version).max().unwrap_or(0)
}

/// Migrations newer than `current`, sorted by version.
#[must_use]
pub fn pending(migrations: &[Migration], current: u32) -> Vec<&Migration> {
    let mut pending: Vec<&Migration> = migrations.iter().filter(|m| m.version > current).collect();
    pending.sort_by_key(|m| m.version);
    pending
}

/// [`SchemaStore`] over a local libSQL database.
///
/// The connection is opened lazily on the first probe and dropped after any
/// transient fault, so the next attempt reconnects from scratch.
pub struct LibsqlSchemaStore {
    path: String,
    handle: Mutex<Option<(libsql::Database, libsql::Connection)>>,
}

impl LibsqlSchemaStore {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            handle: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    async fn connection(&self) -> Result<libsql::Connection, StorageFault> {
        let mut handle = self.handle.lock().await;
        if let Some((_, conn)) = handle.as_ref() {
            return Ok(conn.clone());
        }

        let db = Builder::new_local(&self.path)
            .build()
            .await
            .map_err(|e| classify_open(&e))?;
        let conn = db.connect().map_err(|e| classify_open(&e))?;
        *handle = Some((db, conn.clone()));
        Ok(conn)
    }

    async fn observe(&self, err: &libsql::Error) -> StorageFault {
        let fault = classify(err);
        if fault.is_transient() {
            *self.handle.lock().await = None;
        }
        fault
    }

    /// Hand the open connection over as a ready [`RecordDb`]. From here on a
    /// locked store makes writes queue for up to [`BUSY_TIMEOUT`].
    pub(crate) fn into_db(self) -> Result<RecordDb, DatabaseError> {
        let (db, conn) = self.handle.into_inner().ok_or_else(|| {
            DatabaseError::InvalidState("schema store was never opened".into())
        })?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        Ok(RecordDb::from_parts(db, conn))
    }
}

impl SchemaStore for LibsqlSchemaStore {
    async fn current_version(&self) -> Result<u32, StorageFault> {
        let conn = self.connection().await?;
        let version = match read_version(&conn).await {
            Ok(v) => v,
            Err(e) => return Err(self.observe(&e).await),
        };
        u32::try_from(version)
            .map_err(|_| StorageFault::fatal(format!("schema version {version} out of range")))
    }

    async fn apply(&self, migration: &Migration) -> Result<(), StorageFault> {
        let conn = self.connection().await?;
        match apply_migration(&conn, migration).await {
            Ok(()) => Ok(()),
            Err(e) => Err(self.observe(&e).await),
        }
    }
}

async fn read_version(conn: &libsql::Connection) -> Result<i64, libsql::Error> {
    let mut rows = conn
        .query(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'schema_migrations'",
            (),
        )
        .await?;
    if rows.next().await?.is_none() {
        return Ok(0);
    }

    let mut rows = conn
        .query("SELECT COALESCE(MAX(version), 0) FROM schema_migrations", ())
        .await?;
    match rows.next().await? {
        Some(row) => row.get::<i64>(0),
        None => Ok(0),
    }
}

async fn apply_migration(
    conn: &libsql::Connection,
    migration: &Migration,
) -> Result<(), libsql::Error> {
    conn.execute_batch(SCHEMA_MIGRATIONS_DDL).await?;

    let tx = conn.transaction().await?;
    tx.execute_batch(migration.sql).await?;
    tx.execute(
        "INSERT OR IGNORE INTO schema_migrations (version, name, applied_at) VALUES (?1, ?2, ?3)",
        libsql::params![
            i64::from(migration.version),
            migration.name,
            to_storage(&now_utc())
        ],
    )
    .await?;
    tx.commit().await
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn migrations_are_strictly_ascending() {
        let versions: Vec<u32> = MIGRATIONS.iter().map(|m| m.version).collect();
        let mut sorted = versions.clone();
        sorted.sort_unstable();
        sorted.dedup();
        assert_eq!(versions, sorted);
        assert_eq!(latest_version(MIGRATIONS), 2);
    }

    #[test]
    fn pending_skips_applied_versions() {
        let names: Vec<&str> = pending(MIGRATIONS, 1).iter().map(|m| m.name).collect();
        assert_eq!(names, vec!["002_audit_guards"]);
        assert!(pending(MIGRATIONS, 2).is_empty());
    }

    #[tokio::test]
    async fn fresh_store_reports_version_zero() {
        let store = LibsqlSchemaStore::new(":memory:");
        assert_eq!(store.current_version().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn reapplying_a_migration_is_a_noop() {
        let store = LibsqlSchemaStore::new(":memory:");
        for migration in MIGRATIONS {
            store.apply(migration).await.unwrap();
        }
        store.apply(&MIGRATIONS[0]).await.unwrap();
        assert_eq!(store.current_version().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn into_db_requires_an_open_connection() {
        let store = LibsqlSchemaStore::new(":memory:");
        assert!(matches!(
            store.into_db(),
            Err(DatabaseError::InvalidState(_))
        ));
    }
}
