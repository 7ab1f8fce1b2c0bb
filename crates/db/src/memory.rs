//! In-memory [`Store`] used by tests and by servers started without
//! `DATABASE_URL`.
//!
//! All tables live behind one `RwLock`, so every write (including a product
//! together with its images) happens in a single critical section. Unique
//! keys and restricted deletes are checked the way the SQL schema enforces
//! them.

use std::collections::BTreeMap;

use async_trait::async_trait;
use storefront_core::types::DbId;
use tokio::sync::RwLock;

use crate::error::DbError;
use crate::models::category::{Category, CreateCategory, UpdateCategory};
use crate::models::product::{CreateProduct, Product, ProductDetail, ProductFilter, UpdateProduct};
use crate::models::product_image::ProductImage;
use crate::models::user::{CreateUser, User};
use crate::store::{CatalogStore, Store, UserStore};

#[derive(Debug, Default)]
struct Tables {
    last_id: DbId,
    users: BTreeMap<DbId, User>,
    categories: BTreeMap<DbId, Category>,
    products: BTreeMap<DbId, Product>,
    images: BTreeMap<DbId, ProductImage>,
}

impl Tables {
    fn next_id(&mut self) -> DbId {
        self.last_id += 1;
        self.last_id
    }

    fn check_category_unique(
        &self,
        name: &str,
        slug: &str,
        except: Option<DbId>,
    ) -> Result<(), DbError> {
        for category in self.categories.values() {
            if Some(category.id) == except {
                continue;
            }
            if category.name == name {
                return Err(DbError::Conflict(format!(
                    "A category named '{name}' already exists"
                )));
            }
            if category.slug == slug {
                return Err(DbError::Conflict(format!(
                    "A category with slug '{slug}' already exists"
                )));
            }
        }
        Ok(())
    }

    fn check_references(&self, category_id: DbId, owner_id: DbId) -> Result<(), DbError> {
        if !self.categories.contains_key(&category_id) {
            return Err(DbError::Conflict(format!(
                "Category {category_id} does not exist"
            )));
        }
        if !self.users.contains_key(&owner_id) {
            return Err(DbError::Conflict(format!("User {owner_id} does not exist")));
        }
        Ok(())
    }

    fn insert_images(&mut self, product_id: DbId, images: &[String]) {
        for image in images {
            let id = self.next_id();
            self.images.insert(
                id,
                ProductImage {
                    id,
                    product_id,
                    image: image.clone(),
                },
            );
        }
    }

    fn detail(&self, product: &Product) -> Result<ProductDetail, DbError> {
        let category = self
            .categories
            .get(&product.category_id)
            .cloned()
            .ok_or_else(|| {
                DbError::Integrity(format!(
                    "product {} references missing category {}",
                    product.id, product.category_id
                ))
            })?;
        let owner = self.users.get(&product.owner_id).ok_or_else(|| {
            DbError::Integrity(format!(
                "product {} references missing user {}",
                product.id, product.owner_id
            ))
        })?;
        let images = self
            .images
            .values()
            .filter(|image| image.product_id == product.id)
            .cloned()
            .collect();
        Ok(ProductDetail {
            product: product.clone(),
            category,
            owner_username: owner.username.clone(),
            images,
        })
    }

    fn matches(&self, product: &Product, filter: &ProductFilter) -> bool {
        if let Some(term) = filter.search_term() {
            let term = term.to_lowercase();
            let hit = product.name.to_lowercase().contains(&term)
                || product.description.to_lowercase().contains(&term);
            if !hit {
                return false;
            }
        }
        if let Some(slug) = &filter.category_slug {
            let same_slug = self
                .categories
                .get(&product.category_id)
                .is_some_and(|c| c.slug.eq_ignore_ascii_case(slug));
            if !same_slug {
                return false;
            }
        }
        true
    }
}

/// Store holding every table in process memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CatalogStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>, DbError> {
        Ok(self.tables.read().await.categories.values().cloned().collect())
    }

    async fn find_category(&self, id: DbId) -> Result<Option<Category>, DbError> {
        Ok(self.tables.read().await.categories.get(&id).cloned())
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables.categories.values().find(|c| c.slug.eq_ignore_ascii_case(slug)).cloned())
    }

    async fn create_category(&self, input: &CreateCategory) -> Result<Category, DbError> {
        let mut tables = self.tables.write().await;
        tables.check_category_unique(&input.name, &input.slug, None)?;
        let id = tables.next_id();
        let category = Category {
            id,
            name: input.name.clone(),
            slug: input.slug.clone(),
        };
        tables.categories.insert(id, category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, DbError> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.categories.get(&id).cloned() else {
            return Ok(None);
        };
        let updated = Category {
            id,
            name: input.name.clone().unwrap_or(current.name),
            slug: input.slug.clone().unwrap_or(current.slug),
        };
        tables.check_category_unique(&updated.name, &updated.slug, Some(id))?;
        tables.categories.insert(id, updated.clone());
        Ok(Some(updated))
    }

    async fn delete_category(&self, id: DbId) -> Result<bool, DbError> {
        let mut tables = self.tables.write().await;
        if tables.products.values().any(|p| p.category_id == id) {
            return Err(DbError::Conflict(format!(
                "Category {id} still has products and cannot be deleted"
            )));
        }
        Ok(tables.categories.remove(&id).is_some())
    }

    async fn list_products(&self, filter: &ProductFilter) -> Result<Vec<ProductDetail>, DbError> {
        let tables = self.tables.read().await;
        tables
            .products
            .values()
            .filter(|p| tables.matches(p, filter))
            .map(|p| tables.detail(p))
            .collect()
    }

    async fn find_product(&self, id: DbId) -> Result<Option<ProductDetail>, DbError> {
        let tables = self.tables.read().await;
        tables.products.get(&id).map(|p| tables.detail(p)).transpose()
    }

    async fn create_product(
        &self,
        input: &CreateProduct,
        images: &[String],
    ) -> Result<ProductDetail, DbError> {
        let mut tables = self.tables.write().await;
        tables.check_references(input.category_id, input.owner_id)?;

        let id = tables.next_id();
        let product = Product {
            id,
            name: input.name.clone(),
            description: input.description.clone(),
            price: input.price,
            category_id: input.category_id,
            stock_quantity: input.stock_quantity,
            image: input.image.clone(),
            owner_id: input.owner_id,
            created_at: chrono::Utc::now(),
        };
        tables.products.insert(id, product.clone());
        tables.insert_images(id, images);
        tables.detail(&product)
    }

    async fn update_product(
        &self,
        id: DbId,
        input: &UpdateProduct,
        images: &[String],
    ) -> Result<Option<ProductDetail>, DbError> {
        let mut tables = self.tables.write().await;
        let Some(current) = tables.products.get(&id).cloned() else {
            return Ok(None);
        };

        let updated = Product {
            name: input.name.clone().unwrap_or(current.name),
            description: input.description.clone().unwrap_or(current.description),
            price: input.price.unwrap_or(current.price),
            category_id: input.category_id.unwrap_or(current.category_id),
            stock_quantity: input.stock_quantity.unwrap_or(current.stock_quantity),
            image: input.image.clone().or(current.image),
            ..current
        };
        tables.check_references(updated.category_id, updated.owner_id)?;

        tables.products.insert(id, updated.clone());
        tables.insert_images(id, images);
        tables.detail(&updated).map(Some)
    }

    async fn delete_product(&self, id: DbId) -> Result<bool, DbError> {
        let mut tables = self.tables.write().await;
        if tables.products.remove(&id).is_none() {
            return Ok(false);
        }
        tables.images.retain(|_, image| image.product_id != id);
        Ok(true)
    }
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create_user(&self, input: &CreateUser) -> Result<User, DbError> {
        let mut tables = self.tables.write().await;
        for user in tables.users.values() {
            if user.username == input.username {
                return Err(DbError::Conflict(format!(
                    "A user named '{}' already exists",
                    input.username
                )));
            }
            if user.email == input.email {
                return Err(DbError::Conflict(format!(
                    "A user with email '{}' already exists",
                    input.email
                )));
            }
        }
        let id = tables.next_id();
        let user = User {
            id,
            username: input.username.clone(),
            email: input.email.clone(),
            password_hash: input.password_hash.clone(),
            is_staff: input.is_staff,
            date_joined: chrono::Utc::now(),
        };
        tables.users.insert(id, user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: DbId) -> Result<Option<User>, DbError> {
        Ok(self.tables.read().await.users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, DbError> {
        let tables = self.tables.read().await;
        Ok(tables
            .users
            .values()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), DbError> {
        Ok(())
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}
