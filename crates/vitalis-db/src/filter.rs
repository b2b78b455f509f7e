//! Soft-delete read filter.
//!
//! Every read path takes a [`ReadScope`]. The default scope hides
//! soft-deleted rows; seeing them requires asking for
//! [`ReadScope::IncludeDeleted`] explicitly.

/// Which rows a read may return.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ReadScope {
    #[default]
    ActiveOnly,
    /// Compliance and audit review only.
    IncludeDeleted,
}

impl ReadScope {
    #[must_use]
    pub const fn from_include_deleted(include_deleted: bool) -> Self {
        if include_deleted {
            Self::IncludeDeleted
        } else {
            Self::ActiveOnly
        }
    }

    #[must_use]
    pub const fn includes_deleted(self) -> bool {
        matches!(self, Self::IncludeDeleted)
    }
}

/// Applies the soft-delete predicate to SQL read paths.
pub struct SoftDeleteFilter;

impl SoftDeleteFilter {
    /// Extra `WHERE` condition for `scope`, ready to append after an existing
    /// condition. Empty for [`ReadScope::IncludeDeleted`].
    #[must_use]
    pub const fn predicate(scope: ReadScope) -> &'static str {
        match scope {
            ReadScope::ActiveOnly => " AND is_deleted = 0",
            ReadScope::IncludeDeleted => "",
        }
    }

    /// Build `WHERE {conditions}` with the scope predicate applied.
    #[must_use]
    pub fn where_clause(conditions: &str, scope: ReadScope) -> String {
        format!("WHERE {conditions}{}", Self::predicate(scope))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn default_scope_hides_deleted() {
        assert_eq!(ReadScope::default(), ReadScope::ActiveOnly);
        assert!(!ReadScope::default().includes_deleted());
        assert_eq!(
            ReadScope::from_include_deleted(false),
            ReadScope::ActiveOnly
        );
    }

    #[test]
    fn where_clause_per_scope() {
        assert_eq!(
            SoftDeleteFilter::where_clause("owner_id = ?1", ReadScope::ActiveOnly),
            "WHERE owner_id = ?1 AND is_deleted = 0"
        );
        assert_eq!(
            SoftDeleteFilter::where_clause("owner_id = ?1", ReadScope::IncludeDeleted),
            "WHERE owner_id = ?1"
        );
    }
}
