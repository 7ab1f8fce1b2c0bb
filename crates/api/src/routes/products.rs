use axum::routing::get;
use axum::Router;

use crate::handlers::products;
use crate::state::AppState;

/// Routes mounted at `/products`.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create (multipart)
/// GET    /{id}                -> get_by_id
/// PUT    /{id}                -> update (multipart)
/// PATCH  /{id}                -> update (multipart)
/// DELETE /{id}                -> delete
/// GET    /category/{slug}     -> by_category
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{id}",
            get(products::get_by_id)
                .put(products::update)
                .patch(products::update)
                .delete(products::delete),
        )
        .route("/category/{slug}", get(products::by_category))
}
