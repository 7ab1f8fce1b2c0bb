//! Seeding of the configured staff account.

use storefront_core::error::CoreError;
use storefront_db::models::user::{CreateUser, User};
use storefront_db::Store;

use crate::auth::password::{hash_password, MIN_PASSWORD_LENGTH};
use crate::config::StaffAccount;
use crate::error::{AppError, AppResult};

/// Create the staff account unless a user with that username already exists.
///
/// Returns the new user, or `None` when nothing was created.
pub async fn ensure_staff_account(
    store: &dyn Store,
    account: &StaffAccount,
) -> AppResult<Option<User>> {
    if store.find_user_by_username(&account.username).await?.is_some() {
        tracing::debug!(username = %account.username, "Staff account already exists");
        return Ok(None);
    }
    if account.password.len() < MIN_PASSWORD_LENGTH {
        return Err(CoreError::Validation(format!(
            "ADMIN_PASSWORD must be at least {MIN_PASSWORD_LENGTH} characters long"
        ))
        .into());
    }

    let password_hash = hash_password(&account.password)
        .map_err(|e| AppError::InternalError(format!("Password hashing failed: {e}")))?;
    let user = store
        .create_user(&CreateUser {
            username: account.username.clone(),
            email: account.email.clone(),
            password_hash,
            is_staff: true,
        })
        .await?;

    tracing::info!(user_id = user.id, username = %user.username, "Staff account created");
    Ok(Some(user))
}

#[cfg(test)]
mod tests {
    use super::*;
    use storefront_db::MemoryStore;

    fn account(password: &str) -> StaffAccount {
        StaffAccount {
            username: "admin".into(),
            email: "admin@example.com".into(),
            password: password.into(),
        }
    }

    #[tokio::test]
    async fn creates_once() {
        let store = MemoryStore::new();

        let created = ensure_staff_account(&store, &account("long-enough-pw"))
            .await
            .unwrap()
            .unwrap();
        assert!(created.is_staff);

        let again = ensure_staff_account(&store, &account("long-enough-pw"))
            .await
            .unwrap();
        assert!(again.is_none());
    }

    #[tokio::test]
    async fn short_password_is_rejected() {
        let store = MemoryStore::new();
        assert!(ensure_staff_account(&store, &account("short")).await.is_err());
    }
}
