//! # vitalis-db
//!
//! libSQL persistence for Vitalis clinical records.
//!
//! Every update, soft-delete, and purge of an audited record is written in
//! one transaction together with its before/after audit record. Default reads
//! exclude soft-deleted rows. A usable [`RecordDb`] only comes out of the
//! schema bootstrap, so nothing is served against a partial schema.
//!
//! Uses the `libsql` crate (C `SQLite` fork, v0.9.29).

pub mod bootstrap;
pub mod error;
pub mod filter;
pub mod guard;
pub mod helpers;
pub mod interceptor;
pub mod migrations;
pub mod mirror;
pub mod repos;
pub mod service;
pub mod storage;
pub mod updates;

mod test_support;

use tokio_util::sync::CancellationToken;

use bootstrap::{BootstrapReport, RetryPolicy, SchemaBootstrap};
use error::DatabaseError;
use migrations::LibsqlSchemaStore;

/// Database handle for Vitalis state.
///
/// Wraps a libSQL database and connection whose schema is known to be current.
pub struct RecordDb {
    #[allow(dead_code)]
    db: libsql::Database,
    conn: libsql::Connection,
}

impl RecordDb {
    /// Run the schema bootstrap against the store at `path` and return the
    /// ready handle.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Bootstrap` if the bootstrap ends in `Failed`.
    pub async fn bootstrap(
        path: &str,
        policy: RetryPolicy,
        cancel: &CancellationToken,
    ) -> Result<(Self, BootstrapReport), DatabaseError> {
        let store = LibsqlSchemaStore::new(path);
        let mut bootstrap = SchemaBootstrap::new(policy);
        let report = bootstrap.run(&store, cancel).await?;
        Ok((store.into_db()?, report))
    }

    /// Open a local database with the default retry policy.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Bootstrap` if the schema cannot be brought current.
    pub async fn open_local(path: &str) -> Result<Self, DatabaseError> {
        let (db, _) = Self::bootstrap(path, RetryPolicy::default(), &CancellationToken::new()).await?;
        Ok(db)
    }

    pub(crate) const fn from_parts(db: libsql::Database, conn: libsql::Connection) -> Self {
        Self { db, conn }
    }

    /// Access the underlying libSQL connection for direct queries.
    #[must_use]
    pub const fn conn(&self) -> &libsql::Connection {
        &self.conn
    }

    /// Generate a prefixed ID via libSQL, e.g. `"lab-3f8b…"` with `bytes`
    /// random bytes rendered as lowercase hex.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails or returns no rows.
    pub async fn generate_id(&self, prefix: &str, bytes: usize) -> Result<String, DatabaseError> {
        let mut rows = self
            .conn
            .query(
                &format!("SELECT '{prefix}-' || lower(hex(randomblob({bytes})))"),
                (),
            )
            .await?;
        let row = rows
            .next()
            .await?
            .ok_or_else(|| DatabaseError::FatalStorage("id generation returned no row".into()))?;
        Ok(row.get::<String>(0)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use vitalis_core::ids::{
        ALL_PREFIXES, AUDIT_ID_BYTES, PREFIX_AUDIT, PREFIX_TEST_RESULT, PUBLIC_ID_BYTES,
        is_well_formed,
    };

    async fn test_db() -> RecordDb {
        RecordDb::open_local(":memory:").await.unwrap()
    }

    #[tokio::test]
    async fn open_local_creates_schema() {
        let db = test_db().await;

        for table in ["test_results", "audit_records", "schema_migrations"] {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='table' AND name=?1",
                    [table],
                )
                .await
                .unwrap();
            assert!(
                rows.next().await.unwrap().is_some(),
                "table '{table}' should exist"
            );
        }
    }

    #[tokio::test]
    async fn audit_indexes_exist() {
        let db = test_db().await;

        for index in ["idx_audit_records_entity", "idx_audit_records_actor"] {
            let mut rows = db
                .conn()
                .query(
                    "SELECT name FROM sqlite_master WHERE type='index' AND name=?1",
                    [index],
                )
                .await
                .unwrap();
            assert!(
                rows.next().await.unwrap().is_some(),
                "index '{index}' should exist"
            );
        }
    }

    #[tokio::test]
    async fn generate_id_correct_format() {
        let db = test_db().await;
        let id = db
            .generate_id(PREFIX_TEST_RESULT, PUBLIC_ID_BYTES)
            .await
            .unwrap();
        assert!(
            is_well_formed(&id, PREFIX_TEST_RESULT, PUBLIC_ID_BYTES),
            "unexpected id: {id}"
        );

        let aud = db.generate_id(PREFIX_AUDIT, AUDIT_ID_BYTES).await.unwrap();
        assert!(is_well_formed(&aud, PREFIX_AUDIT, AUDIT_ID_BYTES));
    }

    #[tokio::test]
    async fn generate_id_all_prefixes() {
        let db = test_db().await;
        for prefix in ALL_PREFIXES {
            let id = db.generate_id(prefix, 4).await.unwrap();
            assert!(id.starts_with(&format!("{prefix}-")));
        }
    }

    #[tokio::test]
    async fn generate_id_uniqueness() {
        let db = test_db().await;
        let mut ids = HashSet::new();
        for _ in 0..100 {
            let id = db.generate_id(PREFIX_TEST_RESULT, PUBLIC_ID_BYTES).await.unwrap();
            assert!(ids.insert(id.clone()), "Duplicate ID generated: {id}");
        }
    }

    #[tokio::test]
    async fn audit_records_reject_update_and_delete() {
        let db = test_db().await;
        db.conn()
            .execute(
                "INSERT INTO audit_records (id, entity_type, entity_public_id, actor_id, occurred_at, action, before_json)
                 VALUES ('aud-1', 'test_result', 'lab-1', 'user_1', '2026-01-01T00:00:00.000000Z', 'update', '{}')",
                (),
            )
            .await
            .unwrap();

        let update = db
            .conn()
            .execute("UPDATE audit_records SET action = 'purge' WHERE id = 'aud-1'", ())
            .await;
        assert!(update.is_err(), "audit rows must not be updated");

        let delete = db
            .conn()
            .execute("DELETE FROM audit_records WHERE id = 'aud-1'", ())
            .await;
        assert!(delete.is_err(), "audit rows must not be deleted");
    }

    #[tokio::test]
    async fn owner_id_is_immutable_at_the_store() {
        let db = test_db().await;
        db.conn()
            .execute(
                "INSERT INTO test_results (public_id, owner_id, test_name, value, unit, taken_at, created_at, updated_at)
                 VALUES ('lab-1', 'user_1', 'LDL', 3.4, 'mmol/L', 't', 't', 't')",
                (),
            )
            .await
            .unwrap();

        let result = db
            .conn()
            .execute("UPDATE test_results SET owner_id = 'user_2' WHERE public_id = 'lab-1'", ())
            .await;
        assert!(result.is_err(), "owner_id change should be rejected");
    }
}
