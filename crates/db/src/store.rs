//! Storage traits the API layer programs against.
//!
//! [`PgStore`] delegates to the PostgreSQL repositories; the in-memory
//! [`crate::memory::MemoryStore`] backs tests and database-less runs.

use async_trait::async_trait;
use storefront_core::types::DbId;

use crate::error::DbError;
use crate::models::category::{Category, CreateCategory, UpdateCategory};
use crate::models::product::{CreateProduct, ProductDetail, ProductFilter, UpdateProduct};
use crate::models::user::{CreateUser, User};
use crate::repositories::{CategoryRepo, ProductRepo, UserRepo};
use crate::DbPool;

/// Categories, products, and their image sets.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>, DbError>;
    async fn find_category(&self, id: DbId) -> Result<Option<Category>, DbError>;
    /// Case-insensitive slug lookup.
    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, DbError>;
    async fn create_category(&self, input: &CreateCategory) -> Result<Category, DbError>;
    async fn update_category(
        &self,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, DbError>;
    /// Fails with a conflict while products still reference the category.
    async fn delete_category(&self, id: DbId) -> Result<bool, DbError>;

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductDetail>, DbError>;
    async fn find_product(&self, id: DbId) -> Result<Option<ProductDetail>, DbError>;
    /// Atomically insert a product and one image row per entry in `images`.
    async fn create_product(
        &self,
        input: &CreateProduct,
        images: &[String],
    ) -> Result<ProductDetail, DbError>;
    /// Atomically apply a partial update and append `images`.
    async fn update_product(
        &self,
        id: DbId,
        input: &UpdateProduct,
        images: &[String],
    ) -> Result<Option<ProductDetail>, DbError>;
    /// Delete a product together with its image rows.
    async fn delete_product(&self, id: DbId) -> Result<bool, DbError>;
}

/// User accounts.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn create_user(&self, input: &CreateUser) -> Result<User, DbError>;
    async fn find_user(&self, id: DbId) -> Result<Option<User>, DbError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DbError>;
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError>;
}

/// Everything the API needs from persistence.
#[async_trait]
pub trait Store: CatalogStore + UserStore {
    /// Liveness check used by `/health`.
    async fn ping(&self) -> Result<(), DbError>;

    /// Short backend name for logs and health output.
    fn backend(&self) -> &'static str;
}

/// PostgreSQL-backed store.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: DbPool,
}

impl PgStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn require_detail(&self, id: DbId) -> Result<ProductDetail, DbError> {
        ProductRepo::find_detail(&self.pool, id)
            .await?
            .ok_or_else(|| DbError::Integrity(format!("product {id} vanished after write")))
    }
}

#[async_trait]
impl CatalogStore for PgStore {
    async fn list_categories(&self) -> Result<Vec<Category>, DbError> {
        Ok(CategoryRepo::list(&self.pool).await?)
    }

    async fn find_category(&self, id: DbId) -> Result<Option<Category>, DbError> {
        Ok(CategoryRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, DbError> {
        Ok(CategoryRepo::find_by_slug(&self.pool, slug).await?)
    }

    async fn create_category(&self, input: &CreateCategory) -> Result<Category, DbError> {
        Ok(CategoryRepo::create(&self.pool, input).await?)
    }

    async fn update_category(
        &self,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, DbError> {
        Ok(CategoryRepo::update(&self.pool, id, input).await?)
    }

    async fn delete_category(&self, id: DbId) -> Result<bool, DbError> {
        Ok(CategoryRepo::delete(&self.pool, id).await?)
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductDetail>, DbError> {
        Ok(ProductRepo::list_detail(&self.pool, filter).await?)
    }

    async fn find_product(&self, id: DbId) -> Result<Option<ProductDetail>, DbError> {
        Ok(ProductRepo::find_detail(&self.pool, id).await?)
    }

    async fn create_product(
        &self,
        input: &CreateProduct,
        images: &[String],
    ) -> Result<ProductDetail, DbError> {
        let product = ProductRepo::create_with_images(&self.pool, input, images).await?;
        self.require_detail(product.id).await
    }

    async fn update_product(
        &self,
        id: DbId,
        input: &UpdateProduct,
        images: &[String],
    ) -> Result<Option<ProductDetail>, DbError> {
        match ProductRepo::update_with_images(&self.pool, id, input, images).await? {
            Some(product) => self.require_detail(product.id).await.map(Some),
            None => Ok(None),
        }
    }

    async fn delete_product(&self, id: DbId) -> Result<bool, DbError> {
        Ok(ProductRepo::delete(&self.pool, id).await?)
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create_user(&self, input: &CreateUser) -> Result<User, DbError> {
        Ok(UserRepo::create(&self.pool, input).await?)
    }

    async fn find_user(&self, id: DbId) -> Result<Option<User>, DbError> {
        Ok(UserRepo::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        Ok(UserRepo::find_by_username(&self.pool, username).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        Ok(UserRepo::find_by_email(&self.pool, email).await?)
    }
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> Result<(), DbError> {
        Ok(crate::health_check(&self.pool).await?)
    }

    fn backend(&self) -> &'static str {
        "postgres"
    }
}
