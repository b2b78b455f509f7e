//! Service layer orchestrating audited mutations and filtered reads.
//!
//! `RecordService` wraps a bootstrapped [`RecordDb`], the [`OwnershipGuard`],
//! and the [`MutationInterceptor`]. Repo methods are implemented as
//! `impl RecordService` blocks in [`crate::repos`].
//!
//! Every mutation follows this protocol:
//! 1. Validate the request
//! 2. Resolve the target under the default read scope
//! 3. Authorize (before any transaction exists)
//! 4. Begin transaction, re-read the before-state
//! 5. Write the entity change and re-read the after-state
//! 6. Stage the audit record and hand it to the sink
//! 7. Commit, or roll back on any failure

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, MutexGuard};
use tokio_util::sync::CancellationToken;
use vitalis_config::VitalisConfig;
use vitalis_core::entities::AuditRecord;
use vitalis_core::enums::AuditAction;
use vitalis_core::identity::ActorId;
use vitalis_core::ids::{AUDIT_ID_BYTES, PREFIX_AUDIT};
use vitalis_core::snapshot::Auditable;

use crate::RecordDb;
use crate::bootstrap::{BootstrapReport, RetryPolicy};
use crate::error::DatabaseError;
use crate::guard::OwnershipGuard;
use crate::interceptor::{AuditSink, MutationInterceptor, NoopSink};
use crate::mirror::writer::JsonlAuditMirror;

/// Audited access to Vitalis records.
///
/// Units of work on the shared connection are serialized by an async gate,
/// so rows staged by an open transaction are never seen by another caller.
pub struct RecordService {
    db: RecordDb,
    guard: OwnershipGuard,
    interceptor: MutationInterceptor,
    gate: Mutex<()>,
}

impl RecordService {
    /// Bootstrap the configured store and build a service over it.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Bootstrap` if the schema cannot be brought
    /// current, or `DatabaseError::FatalStorage` if the audit mirror
    /// directory cannot be created.
    pub async fn open(
        config: &VitalisConfig,
        cancel: &CancellationToken,
    ) -> Result<(Self, BootstrapReport), DatabaseError> {
        let policy = RetryPolicy::from(&config.bootstrap);
        let (db, report) = RecordDb::bootstrap(&config.database.path, policy, cancel).await?;

        let sink: Box<dyn AuditSink> = if config.audit.mirror_enabled() {
            Box::new(JsonlAuditMirror::new(PathBuf::from(
                &config.audit.mirror_dir,
            ))?)
        } else {
            Box::new(NoopSink)
        };

        Ok((Self::new(db, sink), report))
    }

    #[must_use]
    pub fn new(db: RecordDb, sink: Box<dyn AuditSink>) -> Self {
        Self {
            db,
            guard: OwnershipGuard,
            interceptor: MutationInterceptor::new(sink),
            gate: Mutex::new(()),
        }
    }

    /// Create from an existing `RecordDb` with no audit sink.
    #[must_use]
    pub fn from_db(db: RecordDb) -> Self {
        Self::new(db, Box::new(NoopSink))
    }

    /// Access the underlying database handle.
    #[must_use]
    pub const fn db(&self) -> &RecordDb {
        &self.db
    }

    pub(crate) const fn guard(&self) -> OwnershipGuard {
        self.guard
    }

    pub(crate) async fn unit_of_work(&self) -> MutexGuard<'_, ()> {
        self.gate.lock().await
    }

    /// Capture and stage the audit record for one mutation on `conn`.
    pub(crate) async fn audit<T: Auditable>(
        &self,
        conn: &libsql::Connection,
        action: AuditAction,
        before: &T,
        after: Option<&T>,
        actor: &ActorId,
        at: DateTime<Utc>,
    ) -> Result<Option<AuditRecord>, DatabaseError> {
        let Some(draft) = MutationInterceptor::capture(action, before, after, Some(actor), at)?
        else {
            return Ok(None);
        };
        let id = self.db.generate_id(PREFIX_AUDIT, AUDIT_ID_BYTES).await?;
        let record = self.interceptor.stage(conn, id, draft).await?;
        Ok(Some(record))
    }
}

/// Commit `tx` if `outcome` succeeded, otherwise roll it back and return the
/// original error.
pub(crate) async fn commit_or_rollback<T>(
    tx: libsql::Transaction,
    outcome: Result<T, DatabaseError>,
) -> Result<T, DatabaseError> {
    match outcome {
        Ok(value) => {
            tx.commit().await?;
            Ok(value)
        }
        Err(e) => {
            if let Err(rollback) = tx.rollback().await {
                tracing::warn!(error = %rollback, "rollback failed after aborted mutation");
            }
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn open_applies_config() {
        let dir = TempDir::new().unwrap();
        let mut config = VitalisConfig::default();
        config.database.path = dir.path().join("records.db").display().to_string();
        config.audit.mirror_dir = dir.path().join("audit").display().to_string();
        config.bootstrap.backoff_ms = 1;

        let (_svc, report) = RecordService::open(&config, &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(report.applied, vec![1, 2]);
        assert!(dir.path().join("audit").is_dir());
    }

    #[tokio::test]
    async fn reopening_a_current_store_applies_nothing() {
        let dir = TempDir::new().unwrap();
        let mut config = VitalisConfig::default();
        config.database.path = dir.path().join("records.db").display().to_string();

        let (svc, _) = RecordService::open(&config, &CancellationToken::new())
            .await
            .unwrap();
        drop(svc);

        let (_svc, report) = RecordService::open(&config, &CancellationToken::new())
            .await
            .unwrap();
        assert!(report.applied.is_empty());
        assert_eq!(report.attempts, 1);
    }
}
