//! Audit mirror configuration.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct AuditConfig {
    /// Directory for the JSONL audit mirror. Empty disables mirroring.
    #[serde(default)]
    pub mirror_dir: String,
}

impl AuditConfig {
    #[must_use]
    pub fn mirror_enabled(&self) -> bool {
        !self.mirror_dir.is_empty()
    }
}
