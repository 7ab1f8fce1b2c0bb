//! Repository for the `products` table.
//!
//! Reads return [`ProductDetail`]: the product row joined with its category
//! and owner, plus its image rows fetched in one follow-up query.

use std::collections::HashMap;

use sqlx::{FromRow, PgPool};
use storefront_core::types::DbId;

use crate::models::category::Category;
use crate::models::product::{CreateProduct, Product, ProductDetail, ProductFilter, UpdateProduct};
use crate::models::product_image::ProductImage;
use crate::repositories::ProductImageRepo;

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str =
    "id, name, description, price, category_id, stock_quantity, image, owner_id, created_at";

/// Product columns plus the joined category and owner fields.
const DETAIL_COLUMNS: &str = "p.id, p.name, p.description, p.price, p.category_id, \
    p.stock_quantity, p.image, p.owner_id, p.created_at, \
    c.name AS category_name, c.slug AS category_slug, u.username AS owner_username";

const DETAIL_FROM: &str = "products p \
    JOIN categories c ON c.id = p.category_id \
    JOIN users u ON u.id = p.owner_id";

#[derive(FromRow)]
struct DetailRow {
    #[sqlx(flatten)]
    product: Product,
    category_name: String,
    category_slug: String,
    owner_username: String,
}

impl DetailRow {
    fn into_detail(self, images: Vec<ProductImage>) -> ProductDetail {
        ProductDetail {
            category: Category {
                id: self.product.category_id,
                name: self.category_name,
                slug: self.category_slug,
            },
            owner_username: self.owner_username,
            images,
            product: self.product,
        }
    }
}

/// Escape `LIKE` metacharacters and wrap the term for substring matching.
fn contains_pattern(term: &str) -> String {
    let escaped = term
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{escaped}%")
}

/// Provides CRUD operations for products and their image sets.
pub struct ProductRepo;

impl ProductRepo {
    /// Insert a product and its extra image rows in a single transaction.
    pub async fn create_with_images(
        pool: &PgPool,
        input: &CreateProduct,
        images: &[String],
    ) -> Result<Product, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO products
                (name, description, price, category_id, stock_quantity, image, owner_id)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.category_id)
            .bind(input.stock_quantity)
            .bind(&input.image)
            .bind(input.owner_id)
            .fetch_one(&mut *tx)
            .await?;

        ProductImageRepo::create_many(&mut *tx, product.id, images).await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Apply a partial update and append image rows in a single transaction.
    ///
    /// Returns `None` (and writes nothing) if no row with the given `id` exists.
    pub async fn update_with_images(
        pool: &PgPool,
        id: DbId,
        input: &UpdateProduct,
        images: &[String],
    ) -> Result<Option<Product>, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                price = COALESCE($4, price),
                category_id = COALESCE($5, category_id),
                stock_quantity = COALESCE($6, stock_quantity),
                image = COALESCE($7, image)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let updated = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(&input.name)
            .bind(&input.description)
            .bind(input.price)
            .bind(input.category_id)
            .bind(input.stock_quantity)
            .bind(&input.image)
            .fetch_optional(&mut *tx)
            .await?;

        let Some(product) = updated else {
            tx.rollback().await?;
            return Ok(None);
        };

        ProductImageRepo::create_many(&mut *tx, product.id, images).await?;

        tx.commit().await?;
        Ok(Some(product))
    }

    /// Find a product with its category, owner, and images.
    pub async fn find_detail(pool: &PgPool, id: DbId) -> Result<Option<ProductDetail>, sqlx::Error> {
        let query = format!("SELECT {DETAIL_COLUMNS} FROM {DETAIL_FROM} WHERE p.id = $1");
        let Some(row) = sqlx::query_as::<_, DetailRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await?
        else {
            return Ok(None);
        };
        let images = ProductImageRepo::list_by_product(pool, id).await?;
        Ok(Some(row.into_detail(images)))
    }

    /// List products matching `filter`, in insertion order.
    pub async fn list_detail(
        pool: &PgPool,
        filter: &ProductFilter,
    ) -> Result<Vec<ProductDetail>, sqlx::Error> {
        let search = filter.search_term().map(contains_pattern);

        let mut conditions = Vec::new();
        let mut bind_idx = 1u32;
        if search.is_some() {
            conditions.push(format!(
                "(p.name ILIKE ${bind_idx} OR p.description ILIKE ${bind_idx})"
            ));
            bind_idx += 1;
        }
        if filter.category_slug.is_some() {
            conditions.push(format!("LOWER(c.slug) = LOWER(${bind_idx})"));
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let query = format!("SELECT {DETAIL_COLUMNS} FROM {DETAIL_FROM} {where_clause} ORDER BY p.id");

        let mut q = sqlx::query_as::<_, DetailRow>(&query);
        if let Some(ref pattern) = search {
            q = q.bind(pattern);
        }
        if let Some(ref slug) = filter.category_slug {
            q = q.bind(slug);
        }
        let rows = q.fetch_all(pool).await?;

        let ids: Vec<DbId> = rows.iter().map(|r| r.product.id).collect();
        let mut images_by_product: HashMap<DbId, Vec<ProductImage>> = HashMap::new();
        for image in ProductImageRepo::list_by_products(pool, &ids).await? {
            images_by_product
                .entry(image.product_id)
                .or_default()
                .push(image);
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let images = images_by_product.remove(&row.product.id).unwrap_or_default();
                row.into_detail(images)
            })
            .collect())
    }

    /// Delete a product. Its image rows go with it (`ON DELETE CASCADE`).
    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
