//! Test result update builder.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use vitalis_core::entities::TestResult;
use vitalis_core::errors::CoreError;
use vitalis_core::time::normalize;
use vitalis_core::validate::{
    require_finite, require_storable_timestamp, require_text, require_unit,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TestResultUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub test_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub taken_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl TestResultUpdate {
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.test_name.is_none()
            && self.value.is_none()
            && self.unit.is_none()
            && self.taken_at.is_none()
            && self.notes.is_none()
    }

    /// Reject empty updates and malformed field values.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` describing the first bad field.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.is_empty() {
            return Err(CoreError::Validation("update changes no fields".into()));
        }
        if let Some(ref name) = self.test_name {
            require_text("test_name", name)?;
        }
        if let Some(value) = self.value {
            require_finite("value", value)?;
        }
        if let Some(ref unit) = self.unit {
            require_unit(unit)?;
        }
        if let Some(ref taken_at) = self.taken_at {
            require_storable_timestamp("taken_at", taken_at)?;
        }
        Ok(())
    }

    /// Apply the changed fields to `target`. Bookkeeping columns are left to
    /// the caller.
    pub fn apply_to(&self, target: &mut TestResult) {
        if let Some(ref name) = self.test_name {
            target.test_name.clone_from(name);
        }
        if let Some(value) = self.value {
            target.value = value;
        }
        if let Some(ref unit) = self.unit {
            target.unit.clone_from(unit);
        }
        if let Some(taken_at) = self.taken_at {
            target.taken_at = normalize(taken_at);
        }
        if let Some(ref notes) = self.notes {
            target.notes = notes.clone().filter(|n| !n.is_empty());
        }
    }
}

#[derive(Debug, Default)]
pub struct TestResultUpdateBuilder(TestResultUpdate);

impl TestResultUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn test_name(mut self, val: impl Into<String>) -> Self {
        self.0.test_name = Some(val.into());
        self
    }

    #[must_use]
    pub const fn value(mut self, val: f64) -> Self {
        self.0.value = Some(val);
        self
    }

    #[must_use]
    pub fn unit(mut self, val: impl Into<String>) -> Self {
        self.0.unit = Some(val.into());
        self
    }

    #[must_use]
    pub const fn taken_at(mut self, val: DateTime<Utc>) -> Self {
        self.0.taken_at = Some(val);
        self
    }

    #[must_use]
    pub fn notes(mut self, val: Option<String>) -> Self {
        self.0.notes = Some(val);
        self
    }

    #[must_use]
    pub fn build(self) -> TestResultUpdate {
        self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[test]
    fn empty_update_is_rejected() {
        assert!(matches!(
            TestResultUpdate::default().validate(),
            Err(CoreError::Validation(_))
        ));
    }

    #[rstest]
    #[case(TestResultUpdateBuilder::new().test_name("").build())]
    #[case(TestResultUpdateBuilder::new().value(f64::NAN).build())]
    #[case(TestResultUpdateBuilder::new().unit("").build())]
    #[case(TestResultUpdateBuilder::new()
        .taken_at(Utc.with_ymd_and_hms(10_000, 1, 1, 0, 0, 0).unwrap())
        .build())]
    fn malformed_fields_are_rejected(#[case] update: TestResultUpdate) {
        assert!(update.validate().is_err());
    }

    #[test]
    fn clearing_notes_is_a_change() {
        let update = TestResultUpdateBuilder::new().notes(None).build();
        assert!(!update.is_empty());
        assert!(update.validate().is_ok());
    }

    #[test]
    fn serializes_changed_fields_only() {
        let update = TestResultUpdateBuilder::new().value(3.1).build();
        assert_eq!(serde_json::to_string(&update).unwrap(), r#"{"value":3.1}"#);
    }
}
