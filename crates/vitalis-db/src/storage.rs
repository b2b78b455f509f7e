//! Storage fault classification.
//!
//! Every raw `libsql::Error` is classified exactly once, where the adapter
//! first observes it, into a closed [`StorageFault`] enum. Retry decisions
//! downstream branch on [`TransientCause`] only; nothing re-reads error text.
//!
//! Classification works on SQLite's primary result code (`code & 0xff`), so
//! extended codes such as `SQLITE_BUSY_SNAPSHOT` fold into their family.

use std::ffi::c_int;
use std::fmt;

use thiserror::Error;

const SQLITE_BUSY: c_int = 5;
const SQLITE_LOCKED: c_int = 6;
const SQLITE_CANTOPEN: c_int = 14;
const SQLITE_SCHEMA: c_int = 17;

/// The closed set of failures that are safe to retry during bootstrap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransientCause {
    /// The store (or its directory) does not exist yet.
    StoreNotProvisioned,
    /// The connection dropped before or during the handshake.
    ConnectionInterrupted,
    /// Another connection holds a conflicting lock.
    LockContention,
    /// The schema changed underneath a prepared statement.
    SchemaNotVisible,
}

impl TransientCause {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::StoreNotProvisioned => "store_not_provisioned",
            Self::ConnectionInterrupted => "connection_interrupted",
            Self::LockContention => "lock_contention",
            Self::SchemaNotVisible => "schema_not_visible",
        }
    }
}

impl fmt::Display for TransientCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified storage failure.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageFault {
    #[error("transient ({cause}): {detail}")]
    Transient {
        cause: TransientCause,
        detail: String,
    },

    #[error("fatal: {detail}")]
    Fatal { detail: String },
}

impl StorageFault {
    pub fn transient(cause: TransientCause, detail: impl Into<String>) -> Self {
        Self::Transient {
            cause,
            detail: detail.into(),
        }
    }

    pub fn fatal(detail: impl Into<String>) -> Self {
        Self::Fatal {
            detail: detail.into(),
        }
    }

    #[must_use]
    pub const fn is_transient(&self) -> bool {
        matches!(self, Self::Transient { .. })
    }

    #[must_use]
    pub const fn cause(&self) -> Option<TransientCause> {
        match self {
            Self::Transient { cause, .. } => Some(*cause),
            Self::Fatal { .. } => None,
        }
    }
}

/// Classify a failure observed on an established connection.
#[must_use]
pub fn classify(err: &libsql::Error) -> StorageFault {
    match err {
        libsql::Error::SqliteFailure(code, msg) => match *code & 0xff {
            SQLITE_BUSY | SQLITE_LOCKED => {
                StorageFault::transient(TransientCause::LockContention, msg.clone())
            }
            SQLITE_CANTOPEN => {
                StorageFault::transient(TransientCause::StoreNotProvisioned, msg.clone())
            }
            SQLITE_SCHEMA => StorageFault::transient(TransientCause::SchemaNotVisible, msg.clone()),
            _ => StorageFault::fatal(err.to_string()),
        },
        libsql::Error::ConnectionFailed(msg) => {
            StorageFault::transient(TransientCause::ConnectionInterrupted, msg.clone())
        }
        other => StorageFault::fatal(other.to_string()),
    }
}

/// Classify a failure observed outside the schema bootstrap.
///
/// Only the bootstrap retries, so every fault seen by a unit of work is
/// final. The transient cause is kept in the detail.
#[must_use]
pub fn classify_runtime(err: &libsql::Error) -> StorageFault {
    match classify(err) {
        StorageFault::Transient { cause, detail } => {
            StorageFault::fatal(format!("{cause}: {detail}"))
        }
        fatal @ StorageFault::Fatal { .. } => fatal,
    }
}

/// Classify a failure raised while opening the store.
///
/// A connection that cannot be established at open time means the store is
/// not there yet; everything else classifies as on a live connection.
#[must_use]
pub fn classify_open(err: &libsql::Error) -> StorageFault {
    match err {
        libsql::Error::ConnectionFailed(msg) => {
            StorageFault::transient(TransientCause::StoreNotProvisioned, msg.clone())
        }
        other => classify(other),
    }
}
