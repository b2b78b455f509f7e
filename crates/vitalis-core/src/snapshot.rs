//! Canonical before/after snapshots for audited entities.
//!
//! An audited entity implements [`Auditable`] and describes itself field by
//! field through a [`SnapshotBuilder`]. Fields are kept in a `BTreeMap`, so the
//! serialized JSON always lists keys in the same (lexicographic) order and two
//! snapshots of the same state are byte-identical.
//!
//! Snapshotting is fallible: a value with no JSON representation (a NaN or
//! infinite reading) fails the build instead of being silently written as
//! `null`. Callers treat that failure as fatal for the enclosing mutation.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};

use crate::enums::EntityType;
use crate::errors::CoreError;
use crate::time::to_storage;

/// Capability implemented by every entity type whose mutations are audited.
pub trait Auditable {
    /// Value written to `audit_records.entity_type`.
    const ENTITY_TYPE: EntityType;

    /// Entity types that opt out pass through the interceptor with no record.
    const AUDITED: bool = true;

    /// Stable external identifier of this instance.
    fn public_id(&self) -> &str;

    /// Canonical key/value view of the full entity state.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Unrepresentable` if a field cannot be encoded.
    fn snapshot(&self) -> Result<Snapshot, CoreError>;
}

/// Ordered field map describing an entity's state at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(BTreeMap<String, Value>);

impl Snapshot {
    #[must_use]
    pub fn builder() -> SnapshotBuilder {
        SnapshotBuilder::default()
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.0.get(field)
    }

    /// Field names in canonical order.
    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Serialize with deterministic key order.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Other` if serialization fails.
    pub fn to_canonical_json(&self) -> Result<String, CoreError> {
        serde_json::to_string(&self.0).map_err(|e| CoreError::Other(e.into()))
    }

    /// Parse a snapshot previously produced by [`Snapshot::to_canonical_json`].
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` if the text is not a JSON object.
    pub fn from_json(json: &str) -> Result<Self, CoreError> {
        serde_json::from_str(json)
            .map_err(|e| CoreError::Validation(format!("invalid snapshot JSON: {e}")))
    }

    /// Names of fields whose values differ between `self` and `other`.
    #[must_use]
    pub fn changed_fields(&self, other: &Self) -> Vec<String> {
        let mut changed: Vec<String> = self
            .0
            .iter()
            .filter(|(k, v)| other.0.get(*k) != Some(*v))
            .map(|(k, _)| k.clone())
            .collect();
        changed.extend(
            other
                .0
                .keys()
                .filter(|k| !self.0.contains_key(*k))
                .cloned(),
        );
        changed.sort();
        changed
    }
}

/// Accumulates snapshot fields; the first encoding failure is reported by
/// [`SnapshotBuilder::build`].
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    fields: BTreeMap<String, Value>,
    error: Option<CoreError>,
}

impl SnapshotBuilder {
    #[must_use]
    pub fn text(mut self, field: &str, val: &str) -> Self {
        self.fields
            .insert(field.to_string(), Value::String(val.to_string()));
        self
    }

    #[must_use]
    pub fn opt_text(mut self, field: &str, val: Option<&str>) -> Self {
        let v = val.map_or(Value::Null, |s| Value::String(s.to_string()));
        self.fields.insert(field.to_string(), v);
        self
    }

    #[must_use]
    pub fn number(mut self, field: &str, val: f64) -> Self {
        if let Some(n) = Number::from_f64(val) {
            self.fields.insert(field.to_string(), Value::Number(n));
        } else if self.error.is_none() {
            self.error = Some(CoreError::Unrepresentable {
                field: field.to_string(),
                reason: format!("non-finite number {val}"),
            });
        }
        self
    }

    #[must_use]
    pub fn flag(mut self, field: &str, val: bool) -> Self {
        self.fields.insert(field.to_string(), Value::Bool(val));
        self
    }

    #[must_use]
    pub fn timestamp(mut self, field: &str, val: &DateTime<Utc>) -> Self {
        self.fields
            .insert(field.to_string(), Value::String(to_storage(val)));
        self
    }

    #[must_use]
    pub fn opt_timestamp(mut self, field: &str, val: Option<&DateTime<Utc>>) -> Self {
        let v = val.map_or(Value::Null, |ts| Value::String(to_storage(ts)));
        self.fields.insert(field.to_string(), v);
        self
    }

    /// # Errors
    ///
    /// Returns the first field encoding failure, if any.
    pub fn build(self) -> Result<Snapshot, CoreError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(Snapshot(self.fields)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn canonical_json_orders_keys() {
        let snap = Snapshot::builder()
            .text("zeta", "z")
            .number("alpha", 1.5)
            .flag("mid", false)
            .build()
            .unwrap();
        assert_eq!(
            snap.to_canonical_json().unwrap(),
            r#"{"alpha":1.5,"mid":false,"zeta":"z"}"#
        );
    }

    #[test]
    fn insertion_order_does_not_matter() {
        let a = Snapshot::builder()
            .text("b", "2")
            .text("a", "1")
            .build()
            .unwrap();
        let b = Snapshot::builder()
            .text("a", "1")
            .text("b", "2")
            .build()
            .unwrap();
        assert_eq!(
            a.to_canonical_json().unwrap(),
            b.to_canonical_json().unwrap()
        );
    }

    #[test]
    fn non_finite_number_fails_build() {
        let err = Snapshot::builder()
            .number("value", f64::NAN)
            .number("other", f64::INFINITY)
            .build()
            .unwrap_err();
        match err {
            CoreError::Unrepresentable { field, .. } => assert_eq!(field, "value"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn optional_fields_serialize_as_null() {
        let snap = Snapshot::builder()
            .opt_text("notes", None)
            .opt_timestamp("deleted_at", None)
            .build()
            .unwrap();
        assert_eq!(snap.get("notes"), Some(&Value::Null));
        assert_eq!(snap.get("deleted_at"), Some(&Value::Null));
    }

    #[test]
    fn json_roundtrip_preserves_snapshot() {
        let snap = Snapshot::builder()
            .text("unit", "mmol/L")
            .number("value", 2.5)
            .build()
            .unwrap();
        let json = snap.to_canonical_json().unwrap();
        assert_eq!(Snapshot::from_json(&json).unwrap(), snap);
    }

    #[test]
    fn changed_fields_lists_differences() {
        let before = Snapshot::builder()
            .number("value", 2.5)
            .text("unit", "mg")
            .build()
            .unwrap();
        let after = Snapshot::builder()
            .number("value", 3.1)
            .text("unit", "mg")
            .flag("is_deleted", true)
            .build()
            .unwrap();
        assert_eq!(before.changed_fields(&after), vec!["is_deleted", "value"]);
    }
}
