//! Audit actions, entity types, and list ordering for Vitalis.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`
//! and expose `as_str()` for the value stored in SQL.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Mutation kind recorded in the audit table.
///
/// Creation is not audited: provenance is carried by `created_at` and
/// `owner_id` on the entity itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Update,
    SoftDelete,
    Purge,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Update => "update",
            Self::SoftDelete => "soft_delete",
            Self::Purge => "purge",
        }
    }

    /// Whether the entity still exists after this action (and so has an
    /// after-state to snapshot).
    #[must_use]
    pub const fn has_after_state(self) -> bool {
        !matches!(self, Self::Purge)
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// EntityType
// ---------------------------------------------------------------------------

/// Type of audited entity, stored in `audit_records.entity_type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum EntityType {
    TestResult,
}

impl EntityType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TestResult => "test_result",
        }
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// OrderKey
// ---------------------------------------------------------------------------

/// Sort order for record listings. Ties fall back to insertion order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderKey {
    /// Most recently taken first.
    #[default]
    TakenAtDesc,
    TakenAtAsc,
    TestName,
    UpdatedAtDesc,
}

impl OrderKey {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::TakenAtDesc => "taken_at_desc",
            Self::TakenAtAsc => "taken_at_asc",
            Self::TestName => "test_name",
            Self::UpdatedAtDesc => "updated_at_desc",
        }
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
