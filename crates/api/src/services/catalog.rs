//! Catalog operations.
//!
//! Every mutation runs in the same order: access check, field validation,
//! upload validation, blob writes, then one atomic store write. Nothing is
//! persisted unless all earlier steps succeed; blobs written for a store
//! write that then fails are removed again.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Deserialize;
use storefront_core::access::{
    authenticated_or_read_only, check_category_access, check_product_access,
    check_product_create, Access, Caller,
};
use storefront_core::catalog::{validate_category, validate_product, ProductFields};
use storefront_core::error::CoreError;
use storefront_core::slug::slugify;
use storefront_core::storage::{validate_image_upload, BlobStore, Upload};
use storefront_core::types::DbId;
use storefront_db::models::category::{Category, CreateCategory, UpdateCategory};
use storefront_db::models::product::{CreateProduct, ProductDetail, ProductFilter, UpdateProduct};
use storefront_db::Store;

use crate::error::AppResult;

/// Category create/update payload. Absent fields keep their current value
/// on update; on create a missing slug is derived from the name.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryInput {
    pub name: Option<String>,
    pub slug: Option<String>,
}

/// Product create/update payload as decoded from a multipart form.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub category_id: Option<DbId>,
    pub stock_quantity: Option<i32>,
    /// New primary image.
    pub image: Option<Upload>,
    /// Extra images, appended to the product's image set in order.
    pub images: Vec<Upload>,
}

fn required(field: &str) -> CoreError {
    CoreError::Validation(format!("{field}: This field is required."))
}

fn trimmed(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string())
}

/// Catalog reads and writes on behalf of a [`Caller`].
pub struct CatalogService {
    store: Arc<dyn Store>,
    blobs: Arc<dyn BlobStore>,
}

impl CatalogService {
    pub fn new(store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>) -> Self {
        Self { store, blobs }
    }

    // -----------------------------------------------------------------------
    // Categories
    // -----------------------------------------------------------------------

    pub async fn list_categories(&self) -> AppResult<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn get_category(&self, id: DbId) -> AppResult<Category> {
        Ok(self
            .store
            .find_category(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Category", id))?)
    }

    pub async fn create_category(
        &self,
        caller: &Caller,
        input: CategoryInput,
    ) -> AppResult<Category> {
        check_category_access(caller, Access::Write)?;

        let name = trimmed(input.name).ok_or_else(|| required("name"))?;
        let slug = trimmed(input.slug)
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| slugify(&name));
        validate_category(&name, &slug)?;
        self.ensure_category_unique(&name, &slug, None).await?;

        let category = self
            .store
            .create_category(&CreateCategory { name, slug })
            .await?;
        tracing::info!(category_id = category.id, slug = %category.slug, "Category created");
        Ok(category)
    }

    pub async fn update_category(
        &self,
        caller: &Caller,
        id: DbId,
        input: CategoryInput,
    ) -> AppResult<Category> {
        check_category_access(caller, Access::Write)?;
        let current = self.get_category(id).await?;

        let name = trimmed(input.name).unwrap_or(current.name);
        let slug = trimmed(input.slug).unwrap_or(current.slug);
        validate_category(&name, &slug)?;
        self.ensure_category_unique(&name, &slug, Some(id)).await?;

        let update = UpdateCategory {
            name: Some(name),
            slug: Some(slug),
        };
        let category = self
            .store
            .update_category(id, &update)
            .await?
            .ok_or_else(|| CoreError::not_found("Category", id))?;
        tracing::info!(category_id = id, "Category updated");
        Ok(category)
    }

    pub async fn delete_category(&self, caller: &Caller, id: DbId) -> AppResult<()> {
        check_category_access(caller, Access::Write)?;
        let category = self.get_category(id).await?;

        let referencing = self
            .store
            .list_products(&ProductFilter::by_category(category.slug.clone()))
            .await?;
        if !referencing.is_empty() {
            return Err(CoreError::Conflict(format!(
                "Cannot delete category '{}': {} product(s) still belong to it",
                category.name,
                referencing.len()
            ))
            .into());
        }

        if !self.store.delete_category(id).await? {
            return Err(CoreError::not_found("Category", id).into());
        }
        tracing::info!(category_id = id, "Category deleted");
        Ok(())
    }

    /// Reject a name or slug already used by another category.
    async fn ensure_category_unique(
        &self,
        name: &str,
        slug: &str,
        except: Option<DbId>,
    ) -> AppResult<()> {
        let categories = self.store.list_categories().await?;
        for other in categories.iter().filter(|c| Some(c.id) != except) {
            if other.slug == slug {
                return Err(CoreError::Validation(
                    "slug: category with this slug already exists.".into(),
                )
                .into());
            }
            if other.name == name {
                return Err(CoreError::Validation(
                    "name: category with this name already exists.".into(),
                )
                .into());
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Products
    // -----------------------------------------------------------------------

    pub async fn list_products(&self, filter: &ProductFilter) -> AppResult<Vec<ProductDetail>> {
        Ok(self.store.list_products(filter).await?)
    }

    pub async fn get_product(&self, id: DbId) -> AppResult<ProductDetail> {
        Ok(self
            .store
            .find_product(id)
            .await?
            .ok_or_else(|| CoreError::not_found("Product", id))?)
    }

    /// Products whose category slug matches `slug` case-insensitively.
    pub async fn by_category(&self, slug: &str) -> AppResult<Vec<ProductDetail>> {
        let slug = slug.trim();
        if slug.is_empty() {
            return Ok(Vec::new());
        }
        let Some(category) = self.store.find_category_by_slug(slug).await? else {
            return Ok(Vec::new());
        };
        self.list_products(&ProductFilter::by_category(category.slug)).await
    }

    /// Create a product owned by `caller`, with optional primary and extra images.
    ///
    /// Without a primary image the first extra image becomes the primary.
    pub async fn create_product(
        &self,
        caller: &Caller,
        form: ProductForm,
    ) -> AppResult<ProductDetail> {
        check_product_create(caller)?;
        let owner = caller.require_identity()?;

        let name = trimmed(form.name).ok_or_else(|| required("name"))?;
        let price = form.price.ok_or_else(|| required("price"))?;
        let category_id = form.category_id.ok_or_else(|| required("category_id"))?;
        let stock_quantity = form.stock_quantity.unwrap_or(0);
        validate_product(&ProductFields {
            name: &name,
            price,
            stock_quantity,
        })?;
        self.require_category(category_id).await?;

        let (primary, extras) = self.store_uploads(form.image.as_ref(), &form.images).await?;
        let image = primary.clone().or_else(|| extras.first().cloned());

        let input = CreateProduct {
            name,
            description: form.description.unwrap_or_default(),
            price,
            category_id,
            stock_quantity,
            image,
            owner_id: owner.user_id,
        };
        let detail = match self.store.create_product(&input, &extras).await {
            Ok(detail) => detail,
            Err(e) => {
                self.discard(primary.iter().chain(extras.iter())).await;
                return Err(e.into());
            }
        };

        tracing::info!(
            product_id = detail.product.id,
            owner_id = owner.user_id,
            images = detail.images.len(),
            "Product created"
        );
        Ok(detail)
    }

    /// Apply a partial update to a product the caller owns.
    pub async fn update_product(
        &self,
        caller: &Caller,
        id: DbId,
        form: ProductForm,
    ) -> AppResult<ProductDetail> {
        authenticated_or_read_only(caller, Access::Write)?;
        let current = self.get_product(id).await?;
        check_product_access(caller, current.product.owner_id, Access::Write)?;

        let name = trimmed(form.name);
        validate_product(&ProductFields {
            name: name.as_deref().unwrap_or(&current.product.name),
            price: form.price.unwrap_or(current.product.price),
            stock_quantity: form.stock_quantity.unwrap_or(current.product.stock_quantity),
        })?;
        if let Some(category_id) = form.category_id {
            self.require_category(category_id).await?;
        }

        let (primary, extras) = self.store_uploads(form.image.as_ref(), &form.images).await?;
        let image = match (&primary, &current.product.image) {
            (Some(new), _) => Some(new.clone()),
            (None, None) => extras.first().cloned(),
            (None, Some(_)) => None,
        };

        let update = UpdateProduct {
            name,
            description: form.description,
            price: form.price,
            category_id: form.category_id,
            stock_quantity: form.stock_quantity,
            image,
        };
        let updated = match self.store.update_product(id, &update, &extras).await {
            Ok(updated) => updated,
            Err(e) => {
                self.discard(primary.iter().chain(extras.iter())).await;
                return Err(e.into());
            }
        };
        let detail = updated.ok_or_else(|| CoreError::not_found("Product", id))?;

        // A replaced primary is unreferenced unless it also sits in the image set.
        if primary.is_some() {
            if let Some(old) = &current.product.image {
                if !current.images.iter().any(|i| &i.image == old) {
                    self.discard(std::iter::once(old)).await;
                }
            }
        }

        tracing::info!(product_id = id, added_images = extras.len(), "Product updated");
        Ok(detail)
    }

    /// Delete a product the caller owns, along with its image rows and blobs.
    pub async fn delete_product(&self, caller: &Caller, id: DbId) -> AppResult<()> {
        authenticated_or_read_only(caller, Access::Write)?;
        let current = self.get_product(id).await?;
        check_product_access(caller, current.product.owner_id, Access::Write)?;

        if !self.store.delete_product(id).await? {
            return Err(CoreError::not_found("Product", id).into());
        }
        self.discard(
            current
                .product
                .image
                .iter()
                .chain(current.images.iter().map(|i| &i.image)),
        )
        .await;

        tracing::info!(product_id = id, "Product deleted");
        Ok(())
    }

    async fn require_category(&self, category_id: DbId) -> AppResult<()> {
        if self.store.find_category(category_id).await?.is_none() {
            return Err(CoreError::Validation(format!(
                "category_id: Invalid pk \"{category_id}\" - object does not exist."
            ))
            .into());
        }
        Ok(())
    }

    /// Validate every upload, then write them all to blob storage.
    ///
    /// Returns the stored primary reference and the extra references in order.
    async fn store_uploads(
        &self,
        primary: Option<&Upload>,
        extras: &[Upload],
    ) -> AppResult<(Option<String>, Vec<String>)> {
        for upload in primary.into_iter().chain(extras.iter()) {
            validate_image_upload(upload)?;
        }

        let mut stored: Vec<String> = Vec::with_capacity(extras.len() + 1);
        for upload in primary.into_iter().chain(extras.iter()) {
            match self.blobs.store(upload).await {
                Ok(reference) => stored.push(reference),
                Err(e) => {
                    self.discard(stored.iter()).await;
                    return Err(e.into());
                }
            }
        }

        let primary_ref = if primary.is_some() {
            Some(stored.remove(0))
        } else {
            None
        };
        Ok((primary_ref, stored))
    }

    /// Best-effort removal of blobs that no row references any more.
    async fn discard<'a>(&self, references: impl Iterator<Item = &'a String>) {
        for reference in references {
            if let Err(e) = self.blobs.remove(reference).await {
                tracing::warn!(reference = %reference, error = %e, "Failed to remove stored blob");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use storefront_core::access::Identity;
    use storefront_core::storage::LocalBlobStore;
    use storefront_db::models::user::CreateUser;
    use storefront_db::{MemoryStore, UserStore};
    use tempfile::TempDir;

    use crate::error::AppError;

    const PNG: &[u8] = b"\x89PNG\r\n\x1a\n\0\0\0\rIHDR";

    struct Fixture {
        service: CatalogService,
        store: Arc<MemoryStore>,
        media: TempDir,
    }

    async fn fixture() -> Fixture {
        let media = tempfile::tempdir().unwrap();
        let store = Arc::new(MemoryStore::new());
        let blobs = Arc::new(LocalBlobStore::new(media.path(), "/media"));
        Fixture {
            service: CatalogService::new(store.clone(), blobs),
            store,
            media,
        }
    }

    fn on_disk(f: &Fixture, reference: &str) -> std::path::PathBuf {
        f.media.path().join(reference.trim_start_matches("/media/"))
    }

    async fn user(store: &MemoryStore, username: &str, is_staff: bool) -> Caller {
        let user = store
            .create_user(&CreateUser {
                username: username.into(),
                email: format!("{username}@example.com"),
                password_hash: "x".into(),
                is_staff,
            })
            .await
            .unwrap();
        Caller::User(Identity {
            user_id: user.id,
            username: user.username,
            is_staff,
        })
    }

    async fn category(f: &Fixture, name: &str) -> Category {
        let staff = user(&f.store, &format!("staff-{name}"), true).await;
        f.service
            .create_category(
                &staff,
                CategoryInput {
                    name: Some(name.into()),
                    slug: None,
                },
            )
            .await
            .unwrap()
    }

    fn form(category_id: DbId) -> ProductForm {
        ProductForm {
            name: Some("Boot".into()),
            description: Some("Leather".into()),
            price: Some(Decimal::new(4999, 2)),
            category_id: Some(category_id),
            stock_quantity: Some(5),
            ..Default::default()
        }
    }

    fn png(name: &str) -> Upload {
        Upload::new(name, PNG)
    }

    #[tokio::test]
    async fn first_extra_image_becomes_primary() {
        let f = fixture().await;
        let cat = category(&f, "Shoes").await;
        let owner = user(&f.store, "alice", false).await;

        let mut input = form(cat.id);
        input.images = vec![png("a.png"), png("b.png")];
        let detail = f.service.create_product(&owner, input).await.unwrap();

        assert_eq!(detail.images.len(), 2);
        assert_eq!(detail.product.image.as_deref(), Some(detail.images[0].image.as_str()));
    }

    #[tokio::test]
    async fn explicit_primary_is_kept() {
        let f = fixture().await;
        let cat = category(&f, "Shoes").await;
        let owner = user(&f.store, "alice", false).await;

        let mut input = form(cat.id);
        input.image = Some(png("main.png"));
        input.images = vec![png("a.png"), png("b.png")];
        let detail = f.service.create_product(&owner, input).await.unwrap();

        let primary = detail.product.image.clone().unwrap();
        assert_eq!(detail.images.len(), 2);
        assert!(detail.images.iter().all(|i| i.image != primary));
    }

    #[tokio::test]
    async fn no_images_means_no_primary() {
        let f = fixture().await;
        let cat = category(&f, "Shoes").await;
        let owner = user(&f.store, "alice", false).await;

        let detail = f.service.create_product(&owner, form(cat.id)).await.unwrap();
        assert!(detail.product.image.is_none());
        assert!(detail.images.is_empty());
        assert_eq!(detail.owner_username, "alice");
    }

    #[tokio::test]
    async fn invalid_fields_write_nothing() {
        let f = fixture().await;
        let cat = category(&f, "Shoes").await;
        let owner = user(&f.store, "alice", false).await;

        let mut zero_price = form(cat.id);
        zero_price.price = Some(Decimal::ZERO);
        zero_price.images = vec![png("a.png")];
        assert_matches!(
            f.service.create_product(&owner, zero_price).await,
            Err(AppError::Core(CoreError::Validation(_)))
        );

        let mut negative_stock = form(cat.id);
        negative_stock.stock_quantity = Some(-1);
        assert_matches!(
            f.service.create_product(&owner, negative_stock).await,
            Err(AppError::Core(CoreError::Validation(_)))
        );

        assert_matches!(
            f.service.create_product(&owner, form(9999)).await,
            Err(AppError::Core(CoreError::Validation(msg))) if msg.contains("Invalid pk")
        );

        let mut bad_upload = form(cat.id);
        bad_upload.images = vec![png("a.png"), Upload::new("b.png", b"not an image".to_vec())];
        assert_matches!(
            f.service.create_product(&owner, bad_upload).await,
            Err(AppError::Core(CoreError::Validation(_)))
        );

        let all = f.service.list_products(&ProductFilter::default()).await.unwrap();
        assert!(all.is_empty());
    }

    #[tokio::test]
    async fn anonymous_cannot_write_but_can_read() {
        let f = fixture().await;
        let cat = category(&f, "Shoes").await;
        let owner = user(&f.store, "alice", false).await;
        let product = f.service.create_product(&owner, form(cat.id)).await.unwrap();
        let id = product.product.id;

        let anon = Caller::Anonymous;
        assert_matches!(
            f.service.create_product(&anon, form(cat.id)).await,
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );
        assert_matches!(
            f.service.update_product(&anon, id, ProductForm::default()).await,
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );
        assert_matches!(
            f.service.delete_product(&anon, id).await,
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );
        assert_matches!(
            f.service
                .create_category(&anon, CategoryInput { name: Some("X".into()), slug: None })
                .await,
            Err(AppError::Core(CoreError::Unauthorized(_)))
        );

        assert!(f.service.get_product(id).await.is_ok());
        assert!(f.service.get_category(cat.id).await.is_ok());
    }

    #[tokio::test]
    async fn only_owner_may_update() {
        let f = fixture().await;
        let cat = category(&f, "Shoes").await;
        let owner = user(&f.store, "alice", false).await;
        let other = user(&f.store, "mallory", false).await;
        let id = f
            .service
            .create_product(&owner, form(cat.id))
            .await
            .unwrap()
            .product
            .id;

        let patch = ProductForm {
            stock_quantity: Some(0),
            ..Default::default()
        };
        assert_matches!(
            f.service.update_product(&other, id, patch.clone()).await,
            Err(AppError::Core(CoreError::Forbidden(_)))
        );
        assert_eq!(f.service.get_product(id).await.unwrap().product.stock_quantity, 5);

        let updated = f.service.update_product(&owner, id, patch).await.unwrap();
        assert_eq!(updated.product.stock_quantity, 0);
        assert_eq!(updated.product.name, "Boot");
    }

    #[tokio::test]
    async fn update_rejects_invalid_values_and_keeps_state() {
        let f = fixture().await;
        let cat = category(&f, "Shoes").await;
        let owner = user(&f.store, "alice", false).await;
        let id = f
            .service
            .create_product(&owner, form(cat.id))
            .await
            .unwrap()
            .product
            .id;

        let patch = ProductForm {
            price: Some(Decimal::new(-100, 2)),
            ..Default::default()
        };
        assert_matches!(
            f.service.update_product(&owner, id, patch).await,
            Err(AppError::Core(CoreError::Validation(_)))
        );
        assert_eq!(
            f.service.get_product(id).await.unwrap().product.price,
            Decimal::new(4999, 2)
        );
    }

    #[tokio::test]
    async fn update_appends_images_and_fills_missing_primary() {
        let f = fixture().await;
        let cat = category(&f, "Shoes").await;
        let owner = user(&f.store, "alice", false).await;
        let id = f
            .service
            .create_product(&owner, form(cat.id))
            .await
            .unwrap()
            .product
            .id;

        let patch = ProductForm {
            images: vec![png("c.png")],
            ..Default::default()
        };
        let updated = f.service.update_product(&owner, id, patch).await.unwrap();
        assert_eq!(updated.images.len(), 1);
        assert_eq!(updated.product.image.as_deref(), Some(updated.images[0].image.as_str()));
    }

    #[tokio::test]
    async fn by_category_matches_slug_case_insensitively() {
        let f = fixture().await;
        let shoes = category(&f, "Shoes").await;
        let hats = category(&f, "Hats").await;
        let owner = user(&f.store, "alice", false).await;
        f.service.create_product(&owner, form(shoes.id)).await.unwrap();
        f.service.create_product(&owner, form(hats.id)).await.unwrap();

        let found = f.service.by_category("ShOeS").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category.id, shoes.id);

        assert!(f.service.by_category("unknown").await.unwrap().is_empty());
        assert!(f.service.by_category("  ").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn category_rules() {
        let f = fixture().await;
        let staff = user(&f.store, "admin", true).await;
        let customer = user(&f.store, "bob", false).await;

        assert_matches!(
            f.service
                .create_category(&customer, CategoryInput { name: Some("Toys".into()), slug: None })
                .await,
            Err(AppError::Core(CoreError::Forbidden(_)))
        );

        let toys = f
            .service
            .create_category(&staff, CategoryInput { name: Some("Home & Garden".into()), slug: None })
            .await
            .unwrap();
        assert_eq!(toys.slug, "home-garden");

        assert_matches!(
            f.service
                .create_category(
                    &staff,
                    CategoryInput { name: Some("Garden".into()), slug: Some("home-garden".into()) }
                )
                .await,
            Err(AppError::Core(CoreError::Validation(msg))) if msg.contains("slug")
        );

        let product = f.service.create_product(&customer, form(toys.id)).await.unwrap();
        assert_matches!(
            f.service.delete_category(&staff, toys.id).await,
            Err(AppError::Core(CoreError::Conflict(_)))
        );
        f.service.delete_product(&customer, product.product.id).await.unwrap();
        f.service.delete_category(&staff, toys.id).await.unwrap();
        assert_matches!(
            f.service.get_category(toys.id).await,
            Err(AppError::Core(CoreError::NotFound { .. }))
        );
    }

    #[tokio::test]
    async fn replacing_primary_removes_old_file() {
        let f = fixture().await;
        let cat = category(&f, "Shoes").await;
        let owner = user(&f.store, "alice", false).await;
        let mut input = form(cat.id);
        input.image = Some(png("a.png"));
        let created = f.service.create_product(&owner, input).await.unwrap();
        let old = created.product.image.clone().unwrap();
        assert!(on_disk(&f, &old).exists());

        let patch = ProductForm {
            image: Some(png("b.png")),
            ..Default::default()
        };
        let updated = f
            .service
            .update_product(&owner, created.product.id, patch)
            .await
            .unwrap();
        let new = updated.product.image.unwrap();
        assert_ne!(new, old);
        assert!(on_disk(&f, &new).exists());
        assert!(!on_disk(&f, &old).exists());
    }

    #[tokio::test]
    async fn replacing_fallback_primary_keeps_image_set_file() {
        let f = fixture().await;
        let cat = category(&f, "Shoes").await;
        let owner = user(&f.store, "alice", false).await;
        let mut input = form(cat.id);
        input.images = vec![png("a.png")];
        let created = f.service.create_product(&owner, input).await.unwrap();
        let shared = created.product.image.clone().unwrap();

        let patch = ProductForm {
            image: Some(png("b.png")),
            ..Default::default()
        };
        f.service
            .update_product(&owner, created.product.id, patch)
            .await
            .unwrap();
        assert!(on_disk(&f, &shared).exists());
    }

    #[tokio::test]
    async fn delete_removes_product_and_images() {
        let f = fixture().await;
        let cat = category(&f, "Shoes").await;
        let owner = user(&f.store, "alice", false).await;
        let mut input = form(cat.id);
        input.images = vec![png("a.png")];
        let id = f.service.create_product(&owner, input).await.unwrap().product.id;

        f.service.delete_product(&owner, id).await.unwrap();
        assert_matches!(
            f.service.get_product(id).await,
            Err(AppError::Core(CoreError::NotFound { .. }))
        );
    }
}
