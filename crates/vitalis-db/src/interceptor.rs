//! Mutation interceptor.
//!
//! Turns one audited mutation into an [`AuditRecord`] and stages it on the
//! same transaction as the entity write. The record is built from the
//! entity's canonical [`Snapshot`](vitalis_core::snapshot::Snapshot) before
//! and after the change. If a snapshot cannot be produced, or the insert or
//! the sink fails, the caller rolls the whole transaction back: a mutation
//! never lands without its audit record.

use chrono::{DateTime, Utc};
use vitalis_core::entities::AuditRecord;
use vitalis_core::enums::{AuditAction, EntityType};
use vitalis_core::identity::ActorId;
use vitalis_core::snapshot::Auditable;
use vitalis_core::time::to_storage;

use crate::error::DatabaseError;

/// Receives each staged audit record before the transaction commits.
///
/// Returning an error aborts the mutation. A sink runs before the commit
/// itself, so if the commit then fails the sink has already seen a record
/// whose mutation was rolled back. Sinks are copies; `audit_records` is the
/// source of truth and a mirrored record with no matching row there never
/// committed.
pub trait AuditSink: Send + Sync {
    fn record(&self, record: &AuditRecord) -> Result<(), DatabaseError>;
}

/// Sink that accepts everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl AuditSink for NoopSink {
    fn record(&self, _record: &AuditRecord) -> Result<(), DatabaseError> {
        Ok(())
    }
}

/// An audit record that has been captured but not yet given an id or stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditDraft {
    pub entity_type: EntityType,
    pub entity_public_id: String,
    pub actor_id: Option<ActorId>,
    pub occurred_at: DateTime<Utc>,
    pub action: AuditAction,
    pub before_json: String,
    pub after_json: Option<String>,
}

impl AuditDraft {
    fn into_record(self, id: String) -> AuditRecord {
        AuditRecord {
            id,
            entity_type: self.entity_type,
            entity_public_id: self.entity_public_id,
            actor_id: self.actor_id,
            occurred_at: self.occurred_at,
            action: self.action,
            before_json: self.before_json,
            after_json: self.after_json,
        }
    }
}

pub struct MutationInterceptor {
    sink: Box<dyn AuditSink>,
}

impl Default for MutationInterceptor {
    fn default() -> Self {
        Self::new(Box::new(NoopSink))
    }
}

impl MutationInterceptor {
    #[must_use]
    pub fn new(sink: Box<dyn AuditSink>) -> Self {
        Self { sink }
    }

    /// Capture the before/after state of one mutation.
    ///
    /// Returns `Ok(None)` for entity types that are not audited. `after` must
    /// be present exactly when the action leaves a row behind.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Serialization` if either snapshot cannot be
    /// produced and `DatabaseError::InvalidState` if `after` does not match
    /// the action or names a different record.
    pub fn capture<T: Auditable>(
        action: AuditAction,
        before: &T,
        after: Option<&T>,
        actor: Option<&ActorId>,
        at: DateTime<Utc>,
    ) -> Result<Option<AuditDraft>, DatabaseError> {
        if !T::AUDITED {
            return Ok(None);
        }

        if action.has_after_state() != after.is_some() {
            return Err(DatabaseError::InvalidState(format!(
                "{action} on {} requires after-state: {}",
                before.public_id(),
                action.has_after_state()
            )));
        }
        if let Some(after) = after {
            if after.public_id() != before.public_id() {
                return Err(DatabaseError::InvalidState(format!(
                    "public id changed during {action}: {} -> {}",
                    before.public_id(),
                    after.public_id()
                )));
            }
        }

        let before_json = before.snapshot()?.to_canonical_json()?;
        let after_json = match after {
            Some(after) => Some(after.snapshot()?.to_canonical_json()?),
            None => None,
        };

        Ok(Some(AuditDraft {
            entity_type: T::ENTITY_TYPE,
            entity_public_id: before.public_id().to_string(),
            actor_id: actor.cloned(),
            occurred_at: at,
            action,
            before_json,
            after_json,
        }))
    }

    /// Insert the draft on `conn` (the open transaction) and hand it to the
    /// sink.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the insert fails or the sink rejects the
    /// record. The caller must roll back.
    pub async fn stage(
        &self,
        conn: &libsql::Connection,
        id: String,
        draft: AuditDraft,
    ) -> Result<AuditRecord, DatabaseError> {
        let record = draft.into_record(id);

        conn.execute(
            "INSERT INTO audit_records (id, entity_type, entity_public_id, actor_id, occurred_at, action, before_json, after_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            libsql::params![
                record.id.as_str(),
                record.entity_type.as_str(),
                record.entity_public_id.as_str(),
                record.actor_id.as_ref().map(ActorId::as_str),
                to_storage(&record.occurred_at),
                record.action.as_str(),
                record.before_json.as_str(),
                record.after_json.as_deref()
            ],
        )
        .await?;

        if let Err(e) = self.sink.record(&record) {
            tracing::warn!(
                audit_id = %record.id,
                entity = %record.entity_public_id,
                error = %e,
                "audit sink rejected record, aborting mutation"
            );
            return Err(e);
        }

        Ok(record)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use vitalis_core::entities::TestResult;
    use vitalis_core::errors::CoreError;
    use vitalis_core::snapshot::Snapshot;
    use vitalis_core::time::now_utc;

    fn reading(value: f64) -> TestResult {
        let now = now_utc();
        TestResult {
            public_id: "lab-0001".into(),
            owner_id: ActorId::new("user_1"),
            test_name: "HbA1c".into(),
            value,
            unit: "%".into(),
            taken_at: now,
            notes: None,
            created_at: now,
            updated_at: now,
            updated_by: None,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
        }
    }

    struct Scratch;

    impl Auditable for Scratch {
        const ENTITY_TYPE: EntityType = EntityType::TestResult;
        const AUDITED: bool = false;

        fn public_id(&self) -> &str {
            "scratch"
        }

        fn snapshot(&self) -> Result<Snapshot, CoreError> {
            Snapshot::builder().build()
        }
    }

    #[test]
    fn update_captures_both_states() {
        let actor = ActorId::new("user_1");
        let before = reading(2.5);
        let after = reading(3.1);

        let draft = MutationInterceptor::capture(
            AuditAction::Update,
            &before,
            Some(&after),
            Some(&actor),
            now_utc(),
        )
        .unwrap()
        .unwrap();

        assert_eq!(draft.entity_public_id, "lab-0001");
        assert_eq!(draft.actor_id.as_ref(), Some(&actor));
        let before_snap = Snapshot::from_json(&draft.before_json).unwrap();
        let after_snap = Snapshot::from_json(draft.after_json.as_deref().unwrap()).unwrap();
        assert_eq!(before_snap.get("value"), Some(&serde_json::json!(2.5)));
        assert_eq!(after_snap.get("value"), Some(&serde_json::json!(3.1)));
    }

    #[test]
    fn unaudited_types_pass_through() {
        let draft =
            MutationInterceptor::capture(AuditAction::Update, &Scratch, Some(&Scratch), None, now_utc())
                .unwrap();
        assert!(draft.is_none());
    }

    #[test]
    fn unrepresentable_after_state_fails_capture() {
        let err = MutationInterceptor::capture(
            AuditAction::Update,
            &reading(2.5),
            Some(&reading(f64::NAN)),
            None,
            now_utc(),
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::Serialization(_)));
    }

    #[test]
    fn purge_must_not_carry_after_state() {
        let r = reading(2.5);
        let err =
            MutationInterceptor::capture(AuditAction::Purge, &r, Some(&r), None, now_utc())
                .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));

        let draft = MutationInterceptor::capture(AuditAction::Purge, &r, None, None, now_utc())
            .unwrap()
            .unwrap();
        assert!(draft.after_json.is_none());
    }

    #[test]
    fn update_requires_after_state() {
        let err = MutationInterceptor::capture(
            AuditAction::SoftDelete,
            &reading(2.5),
            None,
            None,
            now_utc(),
        )
        .unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidState(_)));
    }
}
