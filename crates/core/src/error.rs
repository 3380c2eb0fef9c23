//! Domain error taxonomy shared by every layer.
//!
//! Business-rule violations raised by the lifecycle engine map onto these
//! variants; the API layer turns each one into an HTTP status.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A book, borrow, reservation, fine or user id did not resolve.
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    /// Malformed input or an invalid state transition (e.g. double return).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The request collides with existing state (duplicate active borrow).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Missing or invalid credentials.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The actor's role does not allow the action.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        Self::NotFound { entity, id }
    }
}
