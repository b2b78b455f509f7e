//! Database error types for vitalis-db.
//!
//! `DatabaseError` is the single discriminated result of every storage-facing
//! operation. Raw `libsql::Error`s never reach callers unclassified: the
//! conversion goes through [`crate::storage::classify_runtime`], so units of
//! work only ever see `FatalStorage`. `TransientStorage` comes from the
//! bootstrap's typed faults.

use thiserror::Error;
use vitalis_core::enums::EntityType;
use vitalis_core::errors::CoreError;
use vitalis_core::identity::ActorId;

use crate::bootstrap::BootstrapFailure;
use crate::storage::{StorageFault, TransientCause, classify_runtime};

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Malformed input, rejected before any transaction opens.
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The actor does not own the target record.
    #[error("Actor '{actor}' is not authorized to modify {public_id}")]
    Authorization { actor: ActorId, public_id: String },

    /// Public id unresolved, or only a soft-deleted match under the default scope.
    #[error("{entity_type} '{public_id}' not found")]
    NotFound {
        entity_type: EntityType,
        public_id: String,
    },

    /// Provisioning-race failure. Only the schema bootstrap retries these.
    #[error("Transient storage failure ({cause}): {detail}")]
    TransientStorage {
        cause: TransientCause,
        detail: String,
    },

    /// Any other storage failure. Never retried.
    #[error("Storage failure: {0}")]
    FatalStorage(String),

    /// A before/after snapshot could not be produced; the mutation is aborted.
    #[error("Snapshot serialization failed: {0}")]
    Serialization(String),

    /// Lifecycle violation (e.g. purging a record that is still active).
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// Schema bootstrap ended in `Failed`; nothing may be served.
    #[error("Schema bootstrap failed after {attempts} attempt(s): {failure}")]
    Bootstrap {
        attempts: u32,
        failure: BootstrapFailure,
    },
}

impl DatabaseError {
    pub(crate) fn not_found(entity_type: EntityType, public_id: &str) -> Self {
        Self::NotFound {
            entity_type,
            public_id: public_id.to_string(),
        }
    }

    /// Whether the caller can recover by changing its request.
    #[must_use]
    pub const fn is_rejection(&self) -> bool {
        matches!(
            self,
            Self::Validation(_) | Self::Authorization { .. } | Self::NotFound { .. }
        )
    }
}

impl From<StorageFault> for DatabaseError {
    fn from(fault: StorageFault) -> Self {
        match fault {
            StorageFault::Transient { cause, detail } => Self::TransientStorage { cause, detail },
            StorageFault::Fatal { detail } => Self::FatalStorage(detail),
        }
    }
}

impl From<libsql::Error> for DatabaseError {
    fn from(e: libsql::Error) -> Self {
        classify_runtime(&e).into()
    }
}

impl From<CoreError> for DatabaseError {
    fn from(e: CoreError) -> Self {
        match e {
            CoreError::Validation(msg) => Self::Validation(msg),
            CoreError::Unrepresentable { field, reason } => {
                Self::Serialization(format!("field '{field}': {reason}"))
            }
            CoreError::Other(e) => Self::Serialization(e.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrepresentable_snapshot_becomes_serialization_error() {
        let err: DatabaseError = CoreError::Unrepresentable {
            field: "value".into(),
            reason: "non-finite number NaN".into(),
        }
        .into();
        assert!(matches!(err, DatabaseError::Serialization(ref m) if m.contains("value")));
        assert!(!err.is_rejection());
    }

    #[test]
    fn core_validation_stays_validation() {
        let err: DatabaseError = CoreError::Validation("test_name must not be empty".into()).into();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert!(err.is_rejection());
    }

    #[test]
    fn lock_contention_on_a_live_connection_is_fatal() {
        let err: DatabaseError = libsql::Error::SqliteFailure(5, "database is locked".into()).into();
        assert!(matches!(err, DatabaseError::FatalStorage(ref m) if m.contains("lock_contention")));
    }

    #[test]
    fn storage_faults_map_onto_taxonomy() {
        let transient: DatabaseError =
            StorageFault::transient(TransientCause::LockContention, "database is locked").into();
        assert!(matches!(
            transient,
            DatabaseError::TransientStorage {
                cause: TransientCause::LockContention,
                ..
            }
        ));

        let fatal: DatabaseError = StorageFault::fatal("constraint failed").into();
        assert!(matches!(fatal, DatabaseError::FatalStorage(_)));
    }
}
