//! Public ID prefixes.
//!
//! Public IDs have the shape `{prefix}-{hex}`. The random part is produced by
//! the store (`randomblob`) so IDs are unguessable and never derived from the
//! internal row id.

/// Prefix for test result public IDs.
pub const PREFIX_TEST_RESULT: &str = "lab";

/// Prefix for audit record IDs.
pub const PREFIX_AUDIT: &str = "aud";

/// Every prefix in use.
pub const ALL_PREFIXES: &[&str] = &[PREFIX_TEST_RESULT, PREFIX_AUDIT];

/// Random bytes behind a test result public ID (32 hex chars).
pub const PUBLIC_ID_BYTES: usize = 16;

/// Random bytes behind an audit record ID (16 hex chars).
pub const AUDIT_ID_BYTES: usize = 8;

/// Check that `id` looks like `{prefix}-{hex}` with `bytes` random bytes.
#[must_use]
pub fn is_well_formed(id: &str, prefix: &str, bytes: usize) -> bool {
    id.strip_prefix(prefix)
        .and_then(|rest| rest.strip_prefix('-'))
        .is_some_and(|hex| hex.len() == bytes * 2 && hex.chars().all(|c| c.is_ascii_hexdigit()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn well_formed_public_id() {
        assert!(is_well_formed(
            "lab-0123456789abcdef0123456789abcdef",
            PREFIX_TEST_RESULT,
            PUBLIC_ID_BYTES
        ));
    }

    #[test]
    fn rejects_wrong_prefix_and_length() {
        assert!(!is_well_formed("aud-0123", PREFIX_TEST_RESULT, PUBLIC_ID_BYTES));
        assert!(!is_well_formed("lab-0123", PREFIX_TEST_RESULT, PUBLIC_ID_BYTES));
        assert!(!is_well_formed("lab0123456789abcdef", PREFIX_TEST_RESULT, 8));
    }
}
