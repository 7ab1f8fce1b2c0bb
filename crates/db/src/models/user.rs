//! User entity model and DTOs.

use serde::Deserialize;
use sqlx::FromRow;
use storefront_core::types::{DbId, Timestamp};

/// Full user row from the `users` table.
///
/// Carries the password hash, so it is never serialized directly.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
    pub date_joined: Timestamp,
}

/// DTO for creating a user. The password is hashed by the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub is_staff: bool,
}
