//! Test result repository: unaudited create, audited update / soft-delete /
//! purge, and soft-delete-filtered reads.

use vitalis_core::entities::{NewTestResult, TestResult};
use vitalis_core::enums::{AuditAction, EntityType, OrderKey};
use vitalis_core::identity::ActorId;
use vitalis_core::ids::{PREFIX_TEST_RESULT, PUBLIC_ID_BYTES};
use vitalis_core::responses::{TrendPoint, TrendSummary};
use vitalis_core::time::{normalize, now_utc, to_storage};

use crate::error::DatabaseError;
use crate::filter::{ReadScope, SoftDeleteFilter};
use crate::helpers::{TEST_RESULT_COLUMNS, order_clause, parse_datetime, row_to_test_result};
use crate::service::{RecordService, commit_or_rollback};
use crate::updates::test_result::TestResultUpdate;

async fn load(
    conn: &libsql::Connection,
    public_id: &str,
    scope: ReadScope,
) -> Result<Option<TestResult>, DatabaseError> {
    let sql = format!(
        "SELECT {TEST_RESULT_COLUMNS} FROM test_results {}",
        SoftDeleteFilter::where_clause("public_id = ?1", scope)
    );
    let mut rows = conn.query(&sql, [public_id]).await?;
    match rows.next().await? {
        Some(row) => Ok(Some(row_to_test_result(&row)?)),
        None => Ok(None),
    }
}

async fn require(
    conn: &libsql::Connection,
    public_id: &str,
    scope: ReadScope,
) -> Result<TestResult, DatabaseError> {
    load(conn, public_id, scope)
        .await?
        .ok_or_else(|| DatabaseError::not_found(EntityType::TestResult, public_id))
}

impl RecordService {
    /// Record a new reading owned by `actor`. Creation is not audited:
    /// `created_at` and `owner_id` already capture its provenance.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::Validation` for a malformed payload, or a
    /// storage error if the insert fails.
    pub async fn create_test_result(
        &self,
        actor: &ActorId,
        new: NewTestResult,
    ) -> Result<TestResult, DatabaseError> {
        new.validate()?;

        let _unit = self.unit_of_work().await;
        let now = now_utc();
        let public_id = self
            .db()
            .generate_id(PREFIX_TEST_RESULT, PUBLIC_ID_BYTES)
            .await?;

        let result = TestResult {
            public_id,
            owner_id: actor.clone(),
            test_name: new.test_name,
            value: new.value,
            unit: new.unit,
            taken_at: normalize(new.taken_at),
            notes: new.notes.filter(|n| !n.is_empty()),
            created_at: now,
            updated_at: now,
            updated_by: None,
            is_deleted: false,
            deleted_at: None,
            deleted_by: None,
        };

        self.db()
            .conn()
            .execute(
                "INSERT INTO test_results (public_id, owner_id, test_name, value, unit, taken_at, notes, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                libsql::params![
                    result.public_id.as_str(),
                    result.owner_id.as_str(),
                    result.test_name.as_str(),
                    result.value,
                    result.unit.as_str(),
                    to_storage(&result.taken_at),
                    result.notes.as_deref(),
                    to_storage(&result.created_at),
                    to_storage(&result.updated_at)
                ],
            )
            .await?;

        tracing::info!(public_id = %result.public_id, owner = %actor, "created test result");
        Ok(result)
    }

    /// Fetch one reading. Soft-deleted rows are only returned when
    /// `include_deleted` is set.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::NotFound` if no visible row matches.
    pub async fn get_by_public_id(
        &self,
        public_id: &str,
        include_deleted: bool,
    ) -> Result<TestResult, DatabaseError> {
        let _unit = self.unit_of_work().await;
        require(
            self.db().conn(),
            public_id,
            ReadScope::from_include_deleted(include_deleted),
        )
        .await
    }

    /// All active readings of `owner`.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list_active(
        &self,
        owner: &ActorId,
        order: OrderKey,
    ) -> Result<Vec<TestResult>, DatabaseError> {
        self.list(owner, order, ReadScope::ActiveOnly).await
    }

    /// Readings of `owner` under an explicit scope.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn list(
        &self,
        owner: &ActorId,
        order: OrderKey,
        scope: ReadScope,
    ) -> Result<Vec<TestResult>, DatabaseError> {
        let sql = format!(
            "SELECT {TEST_RESULT_COLUMNS} FROM test_results {} {}",
            SoftDeleteFilter::where_clause("owner_id = ?1", scope),
            order_clause(order)
        );

        let _unit = self.unit_of_work().await;
        let mut rows = self.db().conn().query(&sql, [owner.as_str()]).await?;
        let mut results = Vec::new();
        while let Some(row) = rows.next().await? {
            results.push(row_to_test_result(&row)?);
        }
        Ok(results)
    }

    /// Series and summary statistics of `owner`'s active readings for one
    /// test, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn trend(
        &self,
        owner: &ActorId,
        test_name: &str,
    ) -> Result<TrendSummary, DatabaseError> {
        let sql = format!(
            "SELECT public_id, taken_at, value, unit FROM test_results {} ORDER BY taken_at ASC, id ASC",
            SoftDeleteFilter::where_clause(
                "owner_id = ?1 AND test_name = ?2",
                ReadScope::ActiveOnly
            )
        );

        let _unit = self.unit_of_work().await;
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params![owner.as_str(), test_name])
            .await?;
        let mut points = Vec::new();
        while let Some(row) = rows.next().await? {
            points.push(TrendPoint {
                public_id: row.get::<String>(0)?,
                taken_at: parse_datetime(&row.get::<String>(1)?)?,
                value: row.get::<f64>(2)?,
                unit: row.get::<String>(3)?,
            });
        }
        Ok(TrendSummary::from_points(test_name, points))
    }

    /// Apply `update` to an active reading owned by `actor`, with exactly one
    /// `Update` audit record in the same transaction.
    ///
    /// # Errors
    ///
    /// Returns `Validation`, `NotFound`, or `Authorization` without touching
    /// the store; any failure after the transaction opens rolls it back.
    pub async fn submit_update(
        &self,
        public_id: &str,
        update: TestResultUpdate,
        actor: &ActorId,
    ) -> Result<TestResult, DatabaseError> {
        update.validate()?;

        let _unit = self.unit_of_work().await;
        let current = require(self.db().conn(), public_id, ReadScope::ActiveOnly).await?;
        self.guard().authorize(actor, &current.owner_id, public_id)?;

        let tx = self.db().conn().transaction().await?;
        let outcome = self.apply_update(&tx, public_id, &update, actor).await;
        let updated = commit_or_rollback(tx, outcome).await?;

        tracing::info!(public_id, actor = %actor, action = %AuditAction::Update, "committed mutation");
        Ok(updated)
    }

    async fn apply_update(
        &self,
        conn: &libsql::Connection,
        public_id: &str,
        update: &TestResultUpdate,
        actor: &ActorId,
    ) -> Result<TestResult, DatabaseError> {
        let before = require(conn, public_id, ReadScope::ActiveOnly).await?;
        let at = now_utc();
        let mut next = before.clone();
        update.apply_to(&mut next);

        conn.execute(
            "UPDATE test_results
             SET test_name = ?1, value = ?2, unit = ?3, taken_at = ?4, notes = ?5, updated_at = ?6, updated_by = ?7
             WHERE public_id = ?8 AND is_deleted = 0",
            libsql::params![
                next.test_name.as_str(),
                next.value,
                next.unit.as_str(),
                to_storage(&next.taken_at),
                next.notes.as_deref(),
                to_storage(&at),
                actor.as_str(),
                public_id
            ],
        )
        .await?;

        let after = require(conn, public_id, ReadScope::ActiveOnly).await?;
        self.audit(conn, AuditAction::Update, &before, Some(&after), actor, at)
            .await?;
        Ok(after)
    }

    /// Mark an active reading owned by `actor` as deleted, with exactly one
    /// `SoftDelete` audit record in the same transaction. The row is kept.
    ///
    /// # Errors
    ///
    /// Returns `NotFound` (including for already-deleted rows) or
    /// `Authorization` without touching the store.
    pub async fn submit_soft_delete(
        &self,
        public_id: &str,
        actor: &ActorId,
    ) -> Result<(), DatabaseError> {
        let _unit = self.unit_of_work().await;
        let current = require(self.db().conn(), public_id, ReadScope::ActiveOnly).await?;
        self.guard().authorize(actor, &current.owner_id, public_id)?;

        let tx = self.db().conn().transaction().await?;
        let outcome = self.apply_soft_delete(&tx, public_id, actor).await;
        commit_or_rollback(tx, outcome).await?;

        tracing::info!(public_id, actor = %actor, action = %AuditAction::SoftDelete, "committed mutation");
        Ok(())
    }

    async fn apply_soft_delete(
        &self,
        conn: &libsql::Connection,
        public_id: &str,
        actor: &ActorId,
    ) -> Result<(), DatabaseError> {
        let before = require(conn, public_id, ReadScope::ActiveOnly).await?;
        let at = now_utc();

        conn.execute(
            "UPDATE test_results
             SET is_deleted = 1, deleted_at = ?1, deleted_by = ?2, updated_at = ?1, updated_by = ?2
             WHERE public_id = ?3 AND is_deleted = 0",
            libsql::params![to_storage(&at), actor.as_str(), public_id],
        )
        .await?;

        let after = require(conn, public_id, ReadScope::IncludeDeleted).await?;
        self.audit(conn, AuditAction::SoftDelete, &before, Some(&after), actor, at)
            .await?;
        Ok(())
    }

    /// Physically remove a soft-deleted reading owned by `actor`. The final
    /// `Purge` audit record (after-state null) is inserted before the row is
    /// deleted, in one transaction.
    ///
    /// # Errors
    ///
    /// Returns `NotFound`, `Authorization`, or `InvalidState` when the
    /// reading is still active.
    pub async fn purge(&self, public_id: &str, actor: &ActorId) -> Result<(), DatabaseError> {
        let _unit = self.unit_of_work().await;
        let current = require(self.db().conn(), public_id, ReadScope::IncludeDeleted).await?;
        self.guard().authorize(actor, &current.owner_id, public_id)?;
        if !current.is_deleted {
            return Err(DatabaseError::InvalidState(format!(
                "{public_id} must be soft-deleted before it can be purged"
            )));
        }

        let tx = self.db().conn().transaction().await?;
        let outcome = self.apply_purge(&tx, public_id, actor).await;
        commit_or_rollback(tx, outcome).await?;

        tracing::info!(public_id, actor = %actor, action = %AuditAction::Purge, "committed mutation");
        Ok(())
    }

    async fn apply_purge(
        &self,
        conn: &libsql::Connection,
        public_id: &str,
        actor: &ActorId,
    ) -> Result<(), DatabaseError> {
        let before = require(conn, public_id, ReadScope::IncludeDeleted).await?;
        let at = now_utc();
        self.audit(conn, AuditAction::Purge, &before, None, actor, at)
            .await?;

        let removed = conn
            .execute(
                "DELETE FROM test_results WHERE public_id = ?1 AND is_deleted = 1",
                [public_id],
            )
            .await?;
        if removed != 1 {
            return Err(DatabaseError::InvalidState(format!(
                "purge of {public_id} removed {removed} rows"
            )));
        }
        Ok(())
    }
}
