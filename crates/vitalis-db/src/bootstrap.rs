//! Schema bootstrap state machine.
//!
//! Brings the store to the current schema version once per process start:
//!
//! ```text
//! Unknown -> Connecting -> { Ready | MigrationsPending }
//! MigrationsPending -> Migrating -> { Ready | Connecting (retry) | Failed }
//! ```
//!
//! Only [`StorageFault::Transient`] faults are retried, with a fixed backoff,
//! up to `max_attempts` probes. A transient fault during the probe retries
//! too, since peers may still be provisioning the store. The whole run is
//! bounded by a deadline and a [`CancellationToken`]; either ends in
//! `Failed`. No cross-process lock is taken: concurrent peers rely on every
//! migration being idempotent.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use vitalis_config::BootstrapConfig;

use crate::error::DatabaseError;
use crate::migrations::{MIGRATIONS, Migration, latest_version, pending};
use crate::storage::StorageFault;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapState {
    Unknown,
    Connecting,
    MigrationsPending,
    Migrating,
    Ready,
    Failed,
}

impl BootstrapState {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Connecting => "connecting",
            Self::MigrationsPending => "migrations_pending",
            Self::Migrating => "migrating",
            Self::Ready => "ready",
            Self::Failed => "failed",
        }
    }

    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Failed)
    }
}

impl fmt::Display for BootstrapState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a bootstrap run ended in `Failed`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BootstrapFailure {
    #[error("retry budget exhausted, last fault: {last}")]
    RetryBudgetExhausted { last: StorageFault },

    #[error("deadline exceeded")]
    DeadlineExceeded,

    #[error("cancelled")]
    Cancelled,

    #[error("{0}")]
    Fatal(StorageFault),
}

/// Fixed-backoff retry budget for the bootstrap loop.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    /// Probes allowed, including the first.
    pub max_attempts: u32,
    /// Delay between attempts.
    pub backoff: Duration,
    /// Upper bound on the whole run.
    pub deadline: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&BootstrapConfig::default())
    }
}

impl From<&BootstrapConfig> for RetryPolicy {
    fn from(config: &BootstrapConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            backoff: Duration::from_millis(config.backoff_ms),
            deadline: Duration::from_secs(config.deadline_secs),
        }
    }
}

/// The storage operations the bootstrap needs. Faults must already be
/// classified.
pub trait SchemaStore {
    /// Probe the store and return the highest applied schema version (0 when
    /// the store is empty).
    fn current_version(&self) -> impl Future<Output = Result<u32, StorageFault>> + Send;

    /// Apply one migration atomically. Re-applying must be a no-op.
    fn apply(&self, migration: &Migration) -> impl Future<Output = Result<(), StorageFault>> + Send;
}

/// Outcome of a successful run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapReport {
    pub state: BootstrapState,
    pub attempts: u32,
    pub applied: Vec<u32>,
    pub transitions: Vec<BootstrapState>,
}

pub struct SchemaBootstrap {
    policy: RetryPolicy,
    migrations: &'static [Migration],
    state: BootstrapState,
    transitions: Vec<BootstrapState>,
    attempts: u32,
    applied: Vec<u32>,
}

impl SchemaBootstrap {
    #[must_use]
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            migrations: MIGRATIONS,
            state: BootstrapState::Unknown,
            transitions: vec![BootstrapState::Unknown],
            attempts: 0,
            applied: Vec::new(),
        }
    }

    /// Replace the embedded migration set.
    #[must_use]
    pub const fn with_migrations(mut self, migrations: &'static [Migration]) -> Self {
        self.migrations = migrations;
        self
    }

    #[must_use]
    pub const fn state(&self) -> BootstrapState {
        self.state
    }

    #[must_use]
    pub fn transitions(&self) -> &[BootstrapState] {
        &self.transitions
    }

    #[must_use]
    pub const fn attempts(&self) -> u32 {
        self.attempts
    }

    /// Drive the state machine to `Ready` or `Failed`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Bootstrap` when the run ends in `Failed`, and
    /// `DatabaseError::InvalidState` if this bootstrap already ran.
    pub async fn run<S: SchemaStore + Sync>(
        &mut self,
        store: &S,
        cancel: &CancellationToken,
    ) -> Result<BootstrapReport, DatabaseError> {
        if self.state != BootstrapState::Unknown {
            return Err(DatabaseError::InvalidState(format!(
                "schema bootstrap already ran (state: {})",
                self.state
            )));
        }

        let deadline = Instant::now() + self.policy.deadline;
        let outcome = tokio::select! {
            biased;
            () = cancel.cancelled() => Err(BootstrapFailure::Cancelled),
            () = tokio::time::sleep_until(deadline) => Err(BootstrapFailure::DeadlineExceeded),
            result = self.drive(store) => result,
        };

        match outcome {
            Ok(()) => {
                tracing::info!(
                    attempts = self.attempts,
                    applied = ?self.applied,
                    "schema bootstrap ready"
                );
                Ok(BootstrapReport {
                    state: self.state,
                    attempts: self.attempts,
                    applied: self.applied.clone(),
                    transitions: self.transitions.clone(),
                })
            }
            Err(failure) => {
                self.enter(BootstrapState::Failed);
                tracing::error!(attempts = self.attempts, %failure, "schema bootstrap failed");
                Err(DatabaseError::Bootstrap {
                    attempts: self.attempts,
                    failure,
                })
            }
        }
    }

    async fn drive<S: SchemaStore + Sync>(&mut self, store: &S) -> Result<(), BootstrapFailure> {
        loop {
            self.attempts += 1;
            self.enter(BootstrapState::Connecting);

            let fault = match self.attempt(store).await {
                Ok(()) => return Ok(()),
                Err(fault @ StorageFault::Fatal { .. }) => {
                    return Err(BootstrapFailure::Fatal(fault));
                }
                Err(fault) => fault,
            };

            if self.attempts >= self.policy.max_attempts {
                return Err(BootstrapFailure::RetryBudgetExhausted { last: fault });
            }

            tracing::warn!(
                attempt = self.attempts,
                max_attempts = self.policy.max_attempts,
                backoff_ms = u64::try_from(self.policy.backoff.as_millis()).unwrap_or(u64::MAX),
                %fault,
                "transient storage fault during schema bootstrap, retrying"
            );
            tokio::time::sleep(self.policy.backoff).await;
        }
    }

    async fn attempt<S: SchemaStore + Sync>(&mut self, store: &S) -> Result<(), StorageFault> {
        let current = store.current_version().await?;
        let latest = latest_version(self.migrations);
        if current >= latest {
            self.enter(BootstrapState::Ready);
            return Ok(());
        }

        self.enter(BootstrapState::MigrationsPending);
        self.enter(BootstrapState::Migrating);
        for migration in pending(self.migrations, current) {
            store.apply(migration).await?;
            self.applied.push(migration.version);
            tracing::info!(
                version = migration.version,
                name = migration.name,
                "applied migration"
            );
        }

        self.enter(BootstrapState::Ready);
        Ok(())
    }

    fn enter(&mut self, next: BootstrapState) {
        tracing::debug!(from = %self.state, to = %next, "bootstrap transition");
        self.state = next;
        self.transitions.push(next);
    }
}
