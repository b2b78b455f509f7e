//! Audit record repository.
//!
//! Read side of the append-only `audit_records` table. Records are written
//! only by the mutation interceptor, inside the mutation's transaction.

use vitalis_core::entities::AuditRecord;
use vitalis_core::enums::{AuditAction, EntityType};
use vitalis_core::identity::ActorId;

use crate::error::DatabaseError;
use crate::helpers::{AUDIT_COLUMNS, row_to_audit_record};
use crate::service::RecordService;

/// Filter criteria for audit queries.
#[derive(Debug, Clone, Default)]
pub struct AuditFilter {
    pub entity_type: Option<EntityType>,
    pub entity_public_id: Option<String>,
    pub actor_id: Option<ActorId>,
    pub action: Option<AuditAction>,
    pub limit: Option<u32>,
}

impl RecordService {
    /// Full audit history of one test result, oldest first.
    ///
    /// Privileged: callers must restrict access themselves. Purged records
    /// keep their history.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn get_audit_trail(&self, public_id: &str) -> Result<Vec<AuditRecord>, DatabaseError> {
        self.query_audit(&AuditFilter {
            entity_type: Some(EntityType::TestResult),
            entity_public_id: Some(public_id.to_string()),
            ..AuditFilter::default()
        })
        .await
    }

    /// Query audit records with optional filters, in append order.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError` if the query fails.
    pub async fn query_audit(
        &self,
        filter: &AuditFilter,
    ) -> Result<Vec<AuditRecord>, DatabaseError> {
        let mut conditions = Vec::new();
        let mut params: Vec<libsql::Value> = Vec::new();

        if let Some(et) = filter.entity_type {
            params.push(libsql::Value::Text(et.as_str().to_string()));
            conditions.push(format!("entity_type = ?{}", params.len()));
        }
        if let Some(ref eid) = filter.entity_public_id {
            params.push(libsql::Value::Text(eid.clone()));
            conditions.push(format!("entity_public_id = ?{}", params.len()));
        }
        if let Some(ref actor) = filter.actor_id {
            params.push(libsql::Value::Text(actor.as_str().to_string()));
            conditions.push(format!("actor_id = ?{}", params.len()));
        }
        if let Some(action) = filter.action {
            params.push(libsql::Value::Text(action.as_str().to_string()));
            conditions.push(format!("action = ?{}", params.len()));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let limit_clause = filter
            .limit
            .map_or_else(String::new, |limit| format!("LIMIT {limit}"));

        let sql = format!(
            "SELECT {AUDIT_COLUMNS} FROM audit_records {where_clause}
             ORDER BY seq ASC {limit_clause}"
        );

        let _unit = self.unit_of_work().await;
        let mut rows = self
            .db()
            .conn()
            .query(&sql, libsql::params_from_iter(params))
            .await?;

        let mut records = Vec::new();
        while let Some(row) = rows.next().await? {
            records.push(row_to_audit_record(&row)?);
        }
        Ok(records)
    }
}
