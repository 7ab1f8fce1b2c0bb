//! External records for catalog entities.
//!
//! Every image reference leaving the API goes through
//! [`resolve_image_url`], so clients receive absolute HTTPS links wherever
//! the request context allows building one.

use serde::Serialize;
use storefront_core::catalog::format_price;
use storefront_core::image_url::{resolve_image_url, RequestOrigin, UrlPolicy};
use storefront_core::types::{DbId, Timestamp};
use storefront_db::models::category::Category;
use storefront_db::models::product::ProductDetail;
use storefront_db::models::user::User;

/// `{id, name, slug}`.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryRecord {
    pub id: DbId,
    pub name: String,
    pub slug: String,
}

impl From<Category> for CategoryRecord {
    fn from(c: Category) -> Self {
        Self {
            id: c.id,
            name: c.name,
            slug: c.slug,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductImageRecord {
    pub id: DbId,
    pub image: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProductRecord {
    pub id: DbId,
    pub name: String,
    pub description: String,
    /// Two-decimal string, e.g. `"19.99"`.
    pub price: String,
    pub category: CategoryRecord,
    pub stock_quantity: i32,
    pub image: Option<String>,
    pub images: Vec<ProductImageRecord>,
    pub created_at: Timestamp,
    pub owner_username: String,
}

/// Public user info (never includes the password hash).
#[derive(Debug, Clone, Serialize)]
pub struct UserRecord {
    pub id: DbId,
    pub username: String,
    pub email: String,
    pub is_staff: bool,
    pub date_joined: Timestamp,
}

impl From<&User> for UserRecord {
    fn from(u: &User) -> Self {
        Self {
            id: u.id,
            username: u.username.clone(),
            email: u.email.clone(),
            is_staff: u.is_staff,
            date_joined: u.date_joined,
        }
    }
}

/// Converts entities to records for one request.
#[derive(Debug, Clone, Copy)]
pub struct Presenter<'a> {
    origin: Option<&'a RequestOrigin>,
    policy: &'a UrlPolicy,
}

impl<'a> Presenter<'a> {
    pub fn new(origin: Option<&'a RequestOrigin>, policy: &'a UrlPolicy) -> Self {
        Self { origin, policy }
    }

    pub fn image_url(&self, stored: &str) -> String {
        resolve_image_url(stored, self.origin, self.policy)
    }

    pub fn product(&self, detail: ProductDetail) -> ProductRecord {
        let ProductDetail {
            product,
            category,
            owner_username,
            images,
        } = detail;

        ProductRecord {
            id: product.id,
            name: product.name,
            description: product.description,
            price: format_price(product.price),
            category: category.into(),
            stock_quantity: product.stock_quantity,
            image: product.image.as_deref().map(|i| self.image_url(i)),
            images: images
                .into_iter()
                .map(|i| ProductImageRecord {
                    id: i.id,
                    image: self.image_url(&i.image),
                })
                .collect(),
            created_at: product.created_at,
            owner_username,
        }
    }

    pub fn products(&self, details: Vec<ProductDetail>) -> Vec<ProductRecord> {
        details.into_iter().map(|d| self.product(d)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use storefront_core::image_url::DeploymentMode;
    use storefront_db::models::product::Product;
    use storefront_db::models::product_image::ProductImage;

    fn detail() -> ProductDetail {
        ProductDetail {
            product: Product {
                id: 1,
                name: "Boot".into(),
                description: String::new(),
                price: Decimal::new(199, 1),
                category_id: 2,
                stock_quantity: 4,
                image: Some("/media/products/a.png".into()),
                owner_id: 3,
                created_at: chrono::Utc::now(),
            },
            category: Category {
                id: 2,
                name: "Shoes".into(),
                slug: "shoes".into(),
            },
            owner_username: "alice".into(),
            images: vec![
                ProductImage {
                    id: 10,
                    product_id: 1,
                    image: "/media/products/a.png".into(),
                },
                ProductImage {
                    id: 11,
                    product_id: 1,
                    image: "http://cdn.example.com/b.png".into(),
                },
            ],
        }
    }

    #[test]
    fn product_record_resolves_every_image() {
        let policy = UrlPolicy {
            mode: DeploymentMode::Production,
            public_base_url: "https://shop.example.com".into(),
        };
        let origin = RequestOrigin::new("http", "api.example.com");
        let record = Presenter::new(Some(&origin), &policy).product(detail());

        assert_eq!(record.price, "19.90");
        assert_eq!(
            record.image.as_deref(),
            Some("https://api.example.com/media/products/a.png")
        );
        assert_eq!(record.images[0].image, "https://api.example.com/media/products/a.png");
        assert_eq!(record.images[1].image, "https://cdn.example.com/b.png");
        assert_eq!(record.category.slug, "shoes");
        assert_eq!(record.owner_username, "alice");
    }

    #[test]
    fn development_without_origin_keeps_relative_paths() {
        let policy = UrlPolicy {
            mode: DeploymentMode::Development,
            public_base_url: "https://shop.example.com".into(),
        };
        let record = Presenter::new(None, &policy).product(detail());
        assert_eq!(record.image.as_deref(), Some("/media/products/a.png"));
        assert_eq!(record.images[1].image, "https://cdn.example.com/b.png");
    }
}
