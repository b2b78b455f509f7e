//! Cross-cutting error types for Vitalis.
//!
//! Storage-specific errors (`DatabaseError`) live in `vitalis-db`. The CLI
//! converges everything into `anyhow`.

use thiserror::Error;

/// Errors that can be raised by any Vitalis crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Data failed the generic input contract (empty text, non-finite number).
    #[error("Validation error: {0}")]
    Validation(String),

    /// A field value has no canonical JSON representation.
    #[error("Field '{field}' cannot be represented in a snapshot: {reason}")]
    Unrepresentable { field: String, reason: String },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
