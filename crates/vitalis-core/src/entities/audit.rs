use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{AuditAction, EntityType};
use crate::identity::ActorId;

/// An append-only audit record written in the same transaction as the
/// mutation it describes.
///
/// `before_json` / `after_json` hold canonical snapshots (see
/// [`crate::snapshot::Snapshot`]). `after_json` is `None` only for purges.
/// `actor_id` is `None` only for system-initiated changes.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AuditRecord {
    pub id: String,
    pub entity_type: EntityType,
    pub entity_public_id: String,
    pub actor_id: Option<ActorId>,
    pub occurred_at: DateTime<Utc>,
    pub action: AuditAction,
    pub before_json: String,
    pub after_json: Option<String>,
}
