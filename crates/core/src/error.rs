//! Domain error type shared by the store, the catalog service, and the API.

use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// No row with this id exists.
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: DbId },

    /// Input rejected before any write (bad price, negative stock, bad upload, ...).
    #[error("Validation failed: {0}")]
    Validation(String),

    /// The write collides with existing state (unique key, restricted delete).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The caller is anonymous or presented an unusable token.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller is known but lacks the privilege or ownership required.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    /// Shorthand for [`CoreError::NotFound`].
    pub fn not_found(entity: &'static str, id: DbId) -> Self {
        CoreError::NotFound { entity, id }
    }
}
