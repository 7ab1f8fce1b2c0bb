pub mod auth;
pub mod categories;
pub mod health;
pub mod products;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /auth/register                                   register (public)
/// /auth/login                                      login (public)
/// /auth/me                                         current user (auth required)
///
/// /categories                                      list, create (staff)
/// /categories/{id}                                 get, update, delete (staff)
///
/// /products                                        list (?search=&category=), create (auth)
/// /products/{id}                                   get, update, delete (owner)
/// /products/category/{slug}                        filter by category slug
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
}
