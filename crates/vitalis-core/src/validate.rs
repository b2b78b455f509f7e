//! Generic input contract shared by create and update payloads.
//!
//! Only shape checks live here. Domain rules such as clinical value ranges
//! are enforced upstream before a request reaches the store.

use chrono::{DateTime, Datelike, Utc};

use crate::errors::CoreError;

/// Longest accepted unit string.
pub const MAX_UNIT_LEN: usize = 32;

/// Reject empty or whitespace-only text.
///
/// # Errors
///
/// Returns `CoreError::Validation` naming the field.
pub fn require_text(field: &str, val: &str) -> Result<(), CoreError> {
    if val.trim().is_empty() {
        return Err(CoreError::Validation(format!("{field} must not be empty")));
    }
    Ok(())
}

/// Reject NaN and infinities.
///
/// # Errors
///
/// Returns `CoreError::Validation` naming the field.
pub fn require_finite(field: &str, val: f64) -> Result<(), CoreError> {
    if !val.is_finite() {
        return Err(CoreError::Validation(format!(
            "{field} must be a finite number, got {val}"
        )));
    }
    Ok(())
}

/// Non-blank unit no longer than [`MAX_UNIT_LEN`] characters.
///
/// # Errors
///
/// Returns `CoreError::Validation` naming the field.
pub fn require_unit(val: &str) -> Result<(), CoreError> {
    require_text("unit", val)?;
    if val.chars().count() > MAX_UNIT_LEN {
        return Err(CoreError::Validation(format!(
            "unit must be at most {MAX_UNIT_LEN} characters"
        )));
    }
    Ok(())
}

/// Timestamps must fall within years 0000 through 9999, the range that the
/// fixed-width storage format can hold and read back.
///
/// # Errors
///
/// Returns `CoreError::Validation` naming the field.
pub fn require_storable_timestamp(field: &str, ts: &DateTime<Utc>) -> Result<(), CoreError> {
    if !(0..=9999).contains(&ts.year()) {
        return Err(CoreError::Validation(format!(
            "{field} year {} is outside 0000-9999",
            ts.year()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    #[rstest]
    #[case("")]
    #[case("   ")]
    #[case("\t\n")]
    fn blank_text_rejected(#[case] input: &str) {
        assert!(require_text("test_name", input).is_err());
    }

    #[rstest]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    #[case(f64::NEG_INFINITY)]
    fn non_finite_rejected(#[case] input: f64) {
        assert!(require_finite("value", input).is_err());
    }

    #[rstest]
    #[case(10_000)]
    #[case(-1)]
    fn out_of_range_year_rejected(#[case] year: i32) {
        let ts = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap();
        assert!(require_storable_timestamp("taken_at", &ts).is_err());
    }

    #[rstest]
    #[case(0)]
    #[case(2026)]
    #[case(9999)]
    fn storable_year_accepted(#[case] year: i32) {
        let ts = Utc.with_ymd_and_hms(year, 12, 31, 23, 59, 59).unwrap();
        assert!(require_storable_timestamp("taken_at", &ts).is_ok());
    }

    #[test]
    fn long_unit_rejected() {
        assert!(require_unit("mmol/L").is_ok());
        assert!(require_unit(&"x".repeat(MAX_UNIT_LEN + 1)).is_err());
    }
}
