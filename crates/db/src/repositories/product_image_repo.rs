//! Repository for the `product_images` table.

use sqlx::{PgConnection, PgPool};
use storefront_core::types::DbId;

use crate::models::product_image::ProductImage;

const COLUMNS: &str = "id, product_id, image";

/// Provides inserts and lookups for secondary product images.
///
/// Rows are removed by `ON DELETE CASCADE` when their product goes away.
pub struct ProductImageRepo;

impl ProductImageRepo {
    /// Insert one image row per reference, in order, on an open connection.
    pub async fn create_many(
        conn: &mut PgConnection,
        product_id: DbId,
        images: &[String],
    ) -> Result<Vec<ProductImage>, sqlx::Error> {
        let query = format!(
            "INSERT INTO product_images (product_id, image)
             VALUES ($1, $2)
             RETURNING {COLUMNS}"
        );
        let mut created = Vec::with_capacity(images.len());
        for image in images {
            let row = sqlx::query_as::<_, ProductImage>(&query)
                .bind(product_id)
                .bind(image)
                .fetch_one(&mut *conn)
                .await?;
            created.push(row);
        }
        Ok(created)
    }

    /// List the images of one product in upload order.
    pub async fn list_by_product(
        pool: &PgPool,
        product_id: DbId,
    ) -> Result<Vec<ProductImage>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM product_images WHERE product_id = $1 ORDER BY id");
        sqlx::query_as::<_, ProductImage>(&query)
            .bind(product_id)
            .fetch_all(pool)
            .await
    }

    /// List the images of several products at once, ordered by product then upload.
    pub async fn list_by_products(
        pool: &PgPool,
        product_ids: &[DbId],
    ) -> Result<Vec<ProductImage>, sqlx::Error> {
        if product_ids.is_empty() {
            return Ok(Vec::new());
        }
        let query = format!(
            "SELECT {COLUMNS} FROM product_images
             WHERE product_id = ANY($1)
             ORDER BY product_id, id"
        );
        sqlx::query_as::<_, ProductImage>(&query)
            .bind(product_ids)
            .fetch_all(pool)
            .await
    }
}
