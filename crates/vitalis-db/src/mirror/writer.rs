//! JSONL audit mirror writer.
//!
//! Uses `serde_jsonlines::append_json_lines` for per-line appends.

use std::path::PathBuf;

use vitalis_core::entities::AuditRecord;

use crate::error::DatabaseError;
use crate::interceptor::AuditSink;

/// Appends audit records to per-entity JSONL files.
///
/// Registered as the [`AuditSink`] of the mutation interceptor, so a write
/// failure aborts the mutation before commit. A failed commit after a
/// successful append leaves an orphan line; reconcile against the
/// `audit_records` table by record id.
pub struct JsonlAuditMirror {
    mirror_dir: PathBuf,
}

impl JsonlAuditMirror {
    /// Create a mirror writing into `mirror_dir`, creating it if needed.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::FatalStorage` if the directory cannot be created.
    pub fn new(mirror_dir: PathBuf) -> Result<Self, DatabaseError> {
        std::fs::create_dir_all(&mirror_dir).map_err(|e| {
            DatabaseError::FatalStorage(format!(
                "cannot create audit mirror dir {}: {e}",
                mirror_dir.display()
            ))
        })?;
        Ok(Self { mirror_dir })
    }

    fn path_for(&self, entity_public_id: &str) -> PathBuf {
        self.mirror_dir.join(format!("{entity_public_id}.jsonl"))
    }

    /// Read back every mirrored record for one entity, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `DatabaseError::FatalStorage` if the file exists but cannot be
    /// read or parsed.
    pub fn read(&self, entity_public_id: &str) -> Result<Vec<AuditRecord>, DatabaseError> {
        let path = self.path_for(entity_public_id);
        if !path.exists() {
            return Ok(Vec::new());
        }
        serde_jsonlines::json_lines::<AuditRecord, _>(&path)
            .and_then(|lines| lines.collect::<std::io::Result<Vec<_>>>())
            .map_err(|e| {
                DatabaseError::FatalStorage(format!(
                    "cannot read audit mirror {}: {e}",
                    path.display()
                ))
            })
    }
}

impl AuditSink for JsonlAuditMirror {
    fn record(&self, record: &AuditRecord) -> Result<(), DatabaseError> {
        let path = self.path_for(&record.entity_public_id);
        serde_jsonlines::append_json_lines(&path, [record]).map_err(|e| {
            DatabaseError::FatalStorage(format!(
                "cannot append to audit mirror {}: {e}",
                path.display()
            ))
        })
    }
}
