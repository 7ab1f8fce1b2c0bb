use std::sync::Arc;

use storefront_core::storage::BlobStore;
use storefront_db::Store;

use crate::config::ServerConfig;
use crate::services::catalog::CatalogService;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheap to clone: every field is behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence backend (PostgreSQL or in-memory).
    pub store: Arc<dyn Store>,
    /// Catalog operations with access checks and validation.
    pub catalog: Arc<CatalogService>,
    /// Server configuration.
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, blobs: Arc<dyn BlobStore>, config: ServerConfig) -> Self {
        let catalog = CatalogService::new(Arc::clone(&store), blobs);
        Self {
            store,
            catalog: Arc::new(catalog),
            config: Arc::new(config),
        }
    }
}
