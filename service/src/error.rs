//! Error types for the request approval workflow.

use thiserror::Error;

/// Result type alias for workflow operations.
pub type Result<T> = std::result::Result<T, RequestError>;

/// Error taxonomy for the request lifecycle and query layers.
///
/// Every error is scoped to the single failing call: nothing is retried
/// automatically, nothing is fatal to the process, and no partial
/// mutation is ever committed on an error path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RequestError {
    // ═══════════════════════════════════════════════════════════
    // Lookup Errors
    // ═══════════════════════════════════════════════════════════
    /// A record with the given id does not exist.
    #[error("{entity} with id {id} not found")]
    NotFound {
        /// Kind of record that was looked up ("Request" or "User").
        entity: &'static str,
        /// The id that failed to resolve.
        id: i64,
    },

    // ═══════════════════════════════════════════════════════════
    // Authorization Errors
    // ═══════════════════════════════════════════════════════════
    /// The caller-asserted identifier does not match the expected one:
    /// either the caller is not the request's author, or a referenced
    /// record failed to resolve.
    #[error("{0}")]
    IdentifierMismatch(String),

    // ═══════════════════════════════════════════════════════════
    // Lifecycle Errors
    // ═══════════════════════════════════════════════════════════
    /// The requested stage move is not allowed by the transition table.
    #[error("Request stage cannot be changed from {0}")]
    StageTransition(String),

    // ═══════════════════════════════════════════════════════════
    // Input Errors
    // ═══════════════════════════════════════════════════════════
    /// Malformed pagination, sort, or numeric input.
    #[error("{0}")]
    Validation(String),

    // ═══════════════════════════════════════════════════════════
    // System Errors
    // ═══════════════════════════════════════════════════════════
    /// The store collaborator failed.
    #[error("Database error: {0}")]
    Database(String),

    /// Internal error (should not be exposed to callers in detail).
    #[error("Internal error")]
    Internal,
}

impl RequestError {
    /// A request id that failed to resolve.
    #[must_use]
    pub const fn request_not_found(id: crate::state::RequestId) -> Self {
        Self::NotFound {
            entity: "Request",
            id: id.0,
        }
    }

    /// A user id that failed to resolve.
    #[must_use]
    pub const fn user_not_found(id: crate::state::UserId) -> Self {
        Self::NotFound {
            entity: "User",
            id: id.0,
        }
    }

    /// Returns `true` if this error is due to invalid caller input
    /// rather than a system failure.
    #[must_use]
    pub const fn is_user_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. }
                | Self::IdentifierMismatch(_)
                | Self::StageTransition(_)
                | Self::Validation(_)
        )
    }
}
