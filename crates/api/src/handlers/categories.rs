//! Handlers for the `/categories` resource.
//!
//! Reads are public; writes require a staff account.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use storefront_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::RequestCaller;
use crate::presentation::CategoryRecord;
use crate::services::catalog::CategoryInput;
use crate::state::AppState;

/// GET /api/v1/categories
pub async fn list(State(state): State<AppState>) -> AppResult<Json<Vec<CategoryRecord>>> {
    let categories = state.catalog.list_categories().await?;
    Ok(Json(categories.into_iter().map(CategoryRecord::from).collect()))
}

/// GET /api/v1/categories/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<CategoryRecord>> {
    let category = state.catalog.get_category(id).await?;
    Ok(Json(category.into()))
}

/// POST /api/v1/categories
///
/// `slug` is optional and derived from `name` when omitted.
pub async fn create(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    Json(input): Json<CategoryInput>,
) -> AppResult<(StatusCode, Json<CategoryRecord>)> {
    let category = state.catalog.create_category(&caller, input).await?;
    Ok((StatusCode::CREATED, Json(category.into())))
}

/// PUT /api/v1/categories/{id}
///
/// Partial update: omitted fields keep their value.
pub async fn update(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<DbId>,
    Json(input): Json<CategoryInput>,
) -> AppResult<Json<CategoryRecord>> {
    let category = state.catalog.update_category(&caller, id, input).await?;
    Ok(Json(category.into()))
}

/// DELETE /api/v1/categories/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.catalog.delete_category(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
