//! Timestamp normalization.
//!
//! Stored timestamps are microsecond-precision RFC 3339 strings. Truncating
//! at creation keeps the in-memory value identical to what a later read
//! returns, so before/after snapshots compare deep-equal.

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};

/// Current UTC time truncated to microseconds.
#[must_use]
pub fn now_utc() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// Normalize an externally supplied timestamp to storage precision.
#[must_use]
pub fn normalize(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(6)
}

/// Format a timestamp the way it is stored and snapshotted.
#[must_use]
pub fn to_storage(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn storage_format_is_fixed_width_utc() {
        let ts = Utc.with_ymd_and_hms(2026, 3, 1, 8, 30, 0).unwrap();
        assert_eq!(to_storage(&ts), "2026-03-01T08:30:00.000000Z");
    }

    #[test]
    fn now_has_no_sub_microsecond_component() {
        let now = now_utc();
        assert_eq!(now.timestamp_subsec_nanos() % 1_000, 0);
    }
}
