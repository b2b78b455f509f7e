use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::EntityType;
use crate::errors::CoreError;
use crate::identity::ActorId;
use crate::snapshot::{Auditable, Snapshot};
use crate::validate::{require_finite, require_storable_timestamp, require_text, require_unit};

/// A single lab test result owned by one actor.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct TestResult {
    pub public_id: String,
    pub owner_id: ActorId,
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub taken_at: DateTime<Utc>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub updated_by: Option<ActorId>,
    pub is_deleted: bool,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_by: Option<ActorId>,
}

impl Auditable for TestResult {
    const ENTITY_TYPE: EntityType = EntityType::TestResult;

    fn public_id(&self) -> &str {
        &self.public_id
    }

    fn snapshot(&self) -> Result<Snapshot, CoreError> {
        Snapshot::builder()
            .text("public_id", &self.public_id)
            .text("owner_id", self.owner_id.as_str())
            .text("test_name", &self.test_name)
            .number("value", self.value)
            .text("unit", &self.unit)
            .timestamp("taken_at", &self.taken_at)
            .opt_text("notes", self.notes.as_deref())
            .timestamp("created_at", &self.created_at)
            .timestamp("updated_at", &self.updated_at)
            .opt_text("updated_by", self.updated_by.as_ref().map(ActorId::as_str))
            .flag("is_deleted", self.is_deleted)
            .opt_timestamp("deleted_at", self.deleted_at.as_ref())
            .opt_text("deleted_by", self.deleted_by.as_ref().map(ActorId::as_str))
            .build()
    }
}

/// Payload for creating a test result. The owner is the creating actor.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewTestResult {
    pub test_name: String,
    pub value: f64,
    pub unit: String,
    pub taken_at: DateTime<Utc>,
    pub notes: Option<String>,
}

impl NewTestResult {
    /// Generic input contract: non-blank name and unit, finite value, and a
    /// `taken_at` the store can read back.
    ///
    /// Clinical range checks are the caller's concern.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` describing the first violation.
    pub fn validate(&self) -> Result<(), CoreError> {
        require_text("test_name", &self.test_name)?;
        require_unit(&self.unit)?;
        require_finite("value", self.value)?;
        require_storable_timestamp("taken_at", &self.taken_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::now_utc;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn sample() -> TestResult {
        let now = now_utc();
        TestResult {
            public_id: "lab-00000000000000000000000000000001".into(),
            owner_id: ActorId::new("user_1"),
            test_name: "HbA1c".into(),
            value: 2.5,
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

    #[test]
    fn snapshot_covers_every_field() {
        let snap = sample().snapshot().unwrap();
        let fields: Vec<&str> = snap.fields().collect();
        assert_eq!(
            fields,
            vec![
                "created_at",
                "deleted_at",
                "deleted_by",
                "is_deleted",
                "notes",
                "owner_id",
                "public_id",
                "taken_at",
                "test_name",
                "unit",
                "updated_at",
                "updated_by",
                "value",
            ]
        );
        assert_eq!(snap.get("value"), Some(&serde_json::json!(2.5)));
    }

    #[test]
    fn snapshot_of_nan_value_fails() {
        let mut result = sample();
        result.value = f64::NAN;
        assert!(matches!(
            result.snapshot(),
            Err(CoreError::Unrepresentable { .. })
        ));
    }

    #[test]
    fn new_result_validation() {
        let ok = NewTestResult {
            test_name: "LDL".into(),
            value: 3.4,
            unit: "mmol/L".into(),
            taken_at: now_utc(),
            notes: None,
        };
        assert!(ok.validate().is_ok());

        let blank = NewTestResult {
            test_name: "  ".into(),
            ..ok.clone()
        };
        assert!(matches!(blank.validate(), Err(CoreError::Validation(_))));

        let inf = NewTestResult {
            value: f64::INFINITY,
            ..ok.clone()
        };
        assert!(matches!(inf.validate(), Err(CoreError::Validation(_))));

        let far_future = NewTestResult {
            taken_at: Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap(),
            ..ok
        };
        assert!(matches!(far_future.validate(), Err(CoreError::Validation(_))));
    }
}
