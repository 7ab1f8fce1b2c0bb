//! Handlers for the `/products` resource.
//!
//! Create and update take `multipart/form-data` so images can travel with
//! the fields:
//!
//! | Field            | Kind            |
//! |------------------|-----------------|
//! | `name`           | text            |
//! | `description`    | text            |
//! | `price`          | decimal text    |
//! | `category_id`    | integer text    |
//! | `stock_quantity` | integer text    |
//! | `image`          | file (primary)  |
//! | `images`         | file, repeated  |

use std::str::FromStr;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use rust_decimal::Decimal;
use serde::Deserialize;
use storefront_core::access::{authenticated_or_read_only, check_product_create, Access};
use storefront_core::error::CoreError;
use storefront_core::storage::Upload;
use storefront_core::types::DbId;
use storefront_db::models::product::ProductFilter;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::RequestCaller;
use crate::middleware::origin::ClientOrigin;
use crate::presentation::{Presenter, ProductRecord};
use crate::services::catalog::ProductForm;
use crate::state::AppState;

/// Query parameters for `GET /products`.
#[derive(Debug, Deserialize)]
pub struct ProductListQuery {
    pub search: Option<String>,
    /// Category slug (case-insensitive).
    pub category: Option<String>,
}

fn parse_field<T: FromStr>(field: &str, raw: &str, expected: &str) -> Result<T, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::Validation(format!("{field}: A valid {expected} is required.")))
}

/// Read a product form from a multipart body.
///
/// File parts with an empty file name (an unfilled file input) are skipped;
/// unknown fields are ignored.
pub async fn read_product_form(mut multipart: Multipart) -> AppResult<ProductForm> {
    let mut form = ProductForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        let name = field.name().unwrap_or("").to_string();
        match name.as_str() {
            "image" | "images" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                if file_name.is_empty() && bytes.is_empty() {
                    continue;
                }
                let upload = Upload::new(file_name, bytes.to_vec());
                if name == "image" {
                    form.image = Some(upload);
                } else {
                    form.images.push(upload);
                }
            }
            "name" | "description" | "price" | "category_id" | "category" | "stock_quantity" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.to_string()))?;
                match name.as_str() {
                    "name" => form.name = Some(text),
                    "description" => form.description = Some(text),
                    "price" => form.price = Some(parse_field::<Decimal>("price", &text, "number")?),
                    "category_id" | "category" => {
                        form.category_id = Some(parse_field::<DbId>("category_id", &text, "integer")?)
                    }
                    _ => {
                        form.stock_quantity =
                            Some(parse_field::<i32>("stock_quantity", &text, "integer")?)
                    }
                }
            }
            _ => {}
        }
    }

    Ok(form)
}

/// GET /api/v1/products?search=&category=
pub async fn list(
    State(state): State<AppState>,
    origin: ClientOrigin,
    Query(query): Query<ProductListQuery>,
) -> AppResult<Json<Vec<ProductRecord>>> {
    let filter = ProductFilter {
        search: query.search,
        category_slug: query.category.filter(|s| !s.trim().is_empty()),
    };
    let products = state.catalog.list_products(&filter).await?;

    let policy = state.config.url_policy();
    Ok(Json(Presenter::new(origin.origin(), &policy).products(products)))
}

/// GET /api/v1/products/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    origin: ClientOrigin,
    Path(id): Path<DbId>,
) -> AppResult<Json<ProductRecord>> {
    let product = state.catalog.get_product(id).await?;

    let policy = state.config.url_policy();
    Ok(Json(Presenter::new(origin.origin(), &policy).product(product)))
}

/// GET /api/v1/products/category/{slug}
pub async fn by_category(
    State(state): State<AppState>,
    origin: ClientOrigin,
    Path(slug): Path<String>,
) -> AppResult<Json<Vec<ProductRecord>>> {
    let products = state.catalog.by_category(&slug).await?;

    let policy = state.config.url_policy();
    Ok(Json(Presenter::new(origin.origin(), &policy).products(products)))
}

/// POST /api/v1/products
///
/// Multipart create. The caller becomes the owner; without an `image` part
/// the first `images` part becomes the primary image.
pub async fn create(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    origin: ClientOrigin,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ProductRecord>)> {
    // Reject anonymous callers before reading the body.
    check_product_create(&caller)?;
    let form = read_product_form(multipart).await?;
    let product = state.catalog.create_product(&caller, form).await?;

    let policy = state.config.url_policy();
    let record = Presenter::new(origin.origin(), &policy).product(product);
    Ok((StatusCode::CREATED, Json(record)))
}

/// PUT / PATCH /api/v1/products/{id}
///
/// Multipart partial update; `images` parts are appended.
pub async fn update(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    origin: ClientOrigin,
    Path(id): Path<DbId>,
    multipart: Multipart,
) -> AppResult<Json<ProductRecord>> {
    authenticated_or_read_only(&caller, Access::Write)?;
    let form = read_product_form(multipart).await?;
    let product = state.catalog.update_product(&caller, id, form).await?;

    let policy = state.config.url_policy();
    Ok(Json(Presenter::new(origin.origin(), &policy).product(product)))
}

/// DELETE /api/v1/products/{id}
pub async fn delete(
    State(state): State<AppState>,
    RequestCaller(caller): RequestCaller,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    state.catalog.delete_product(&caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
