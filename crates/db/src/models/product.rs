//! Product entity model, DTOs, and the assembled read model.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storefront_core::types::{DbId, Timestamp};

use crate::models::category::Category;
use crate::models::product_image::ProductImage;

/// A row from the `products` table.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
pub struct Product {
    pub id: DbId,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: DbId,
    pub stock_quantity: i32,
    /// Primary image reference, if any.
    pub image: Option<String>,
    pub owner_id: DbId,
    pub created_at: Timestamp,
}

/// A product together with everything its external record needs.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: Product,
    pub category: Category,
    pub owner_username: String,
    pub images: Vec<ProductImage>,
}

/// DTO for inserting a product. `owner_id` is taken from the caller.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub category_id: DbId,
    pub stock_quantity: i32,
    pub image: Option<String>,
    pub owner_id: DbId,
}

/// DTO for updating a product. All fields are optional; the owner is fixed.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<DbId>,
    pub stock_quantity: Option<i32>,
    pub image: Option<String>,
}

/// Filters accepted by product listing. Empty filters match everything.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive substring match on name or description.
    pub search: Option<String>,
    /// Case-insensitive exact match on the category slug.
    pub category_slug: Option<String>,
}

impl ProductFilter {
    pub fn by_category(slug: impl Into<String>) -> Self {
        Self {
            search: None,
            category_slug: Some(slug.into()),
        }
    }

    /// Search term with surrounding whitespace removed, `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }
}
