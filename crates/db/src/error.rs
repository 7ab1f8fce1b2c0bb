//! Store-level errors.

use sqlx::error::ErrorKind;

/// Errors produced by a [`crate::store::Store`] implementation.
#[derive(Debug, thiserror::Error)]
pub enum DbError {
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),

    /// A unique key or a restricted reference rejected the write.
    #[error("{0}")]
    Conflict(String),

    /// A row references another row that does not exist.
    #[error("Integrity error: {0}")]
    Integrity(String),
}

impl DbError {
    /// `true` when the write collided with existing data.
    ///
    /// Covers both store-raised conflicts and PostgreSQL unique /
    /// foreign-key violations (SQLSTATE `23505` / `23503`).
    pub fn is_conflict(&self) -> bool {
        match self {
            DbError::Conflict(_) => true,
            DbError::Sqlx(sqlx::Error::Database(db_err)) => matches!(
                db_err.kind(),
                ErrorKind::UniqueViolation | ErrorKind::ForeignKeyViolation
            ),
            _ => false,
        }
    }
}
