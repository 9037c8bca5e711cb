//! # Error Types
//!
//! Errors raised while constructing shared identifiers.

use thiserror::Error;

/// Errors from parsing shared identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The identifier was empty.
    #[error("{kind} must not be empty")]
    Empty {
        /// Which identifier failed (`peer id`, `user id`).
        kind: &'static str,
    },

    /// The namespace tag is not one of the known values.
    #[error("Unknown namespace: {0}")]
    UnknownNamespace(String),

    /// The session kind is not one of the known values.
    #[error("Unknown session kind: {0}")]
    UnknownSessionKind(String),
}
