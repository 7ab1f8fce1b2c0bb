//! Storefront domain logic.
//!
//! Everything here is independent of the database and of HTTP: error types,
//! identifiers, the access policy, catalog validation rules, slug handling,
//! image URL resolution, and blob storage.

pub mod access;
pub mod catalog;
pub mod error;
pub mod image_url;
pub mod roles;
pub mod slug;
pub mod storage;
pub mod types;
