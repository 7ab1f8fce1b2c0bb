//! JWT-based authentication extractors for Axum handlers.
//!
//! Both `Authorization: Bearer <token>` and `Authorization: Token <token>`
//! are accepted.

use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use storefront_core::access::Caller;
use storefront_core::error::CoreError;
use storefront_core::types::DbId;

use crate::auth::jwt::{validate_token, Claims};
use crate::error::AppError;
use crate::state::AppState;

const TOKEN_SCHEMES: [&str; 2] = ["Bearer ", "Token "];

fn unauthorized(msg: &str) -> AppError {
    AppError::Core(CoreError::Unauthorized(msg.into()))
}

/// Decode the `Authorization` header, if one was sent.
///
/// A missing header is `Ok(None)`; a header that is present but malformed,
/// expired, or badly signed is rejected.
fn claims_from_parts(parts: &Parts, state: &AppState) -> Result<Option<Claims>, AppError> {
    let Some(value) = parts.headers.get(AUTHORIZATION) else {
        return Ok(None);
    };
    let header = value
        .to_str()
        .map_err(|_| unauthorized("Invalid Authorization header"))?;

    let token = TOKEN_SCHEMES
        .iter()
        .find_map(|scheme| header.strip_prefix(scheme))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| {
            unauthorized("Invalid Authorization format. Expected: Bearer <token>")
        })?;

    let claims = validate_token(token, &state.config.jwt)
        .map_err(|_| unauthorized("Invalid or expired token"))?;
    Ok(Some(claims))
}

/// Authenticated user extracted from the `Authorization` header.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(user_id = user.user_id, role = %user.role, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    /// The user's internal database id (from `claims.sub`).
    pub user_id: DbId,
    pub username: String,
    /// `"staff"` or `"customer"`.
    pub role: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = claims_from_parts(parts, state)?
            .ok_or_else(|| unauthorized("Authentication credentials were not provided"))?;
        Ok(AuthUser {
            user_id: claims.sub,
            username: claims.username,
            role: claims.role,
        })
    }
}

/// The request's [`Caller`]: anonymous without a header, a user with a valid token.
#[derive(Debug, Clone)]
pub struct RequestCaller(pub Caller);

impl FromRequestParts<AppState> for RequestCaller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let caller = match claims_from_parts(parts, state)? {
            Some(claims) => Caller::User(claims.identity()),
            None => Caller::Anonymous,
        };
        Ok(RequestCaller(caller))
    }
}
