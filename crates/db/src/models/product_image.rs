//! Secondary product images.

use serde::Serialize;
use sqlx::FromRow;
use storefront_core::types::DbId;

/// A row from the `product_images` table.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize)]
pub struct ProductImage {
    pub id: DbId,
    pub product_id: DbId,
    /// Stored blob reference (relative media path or absolute URL).
    pub image: String,
}
