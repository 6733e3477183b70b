//! API handlers for the catalog web API.

pub mod feeds;

pub use feeds::*;

use std::sync::Arc;

use crate::catalog::CatalogService;

/// Shared application state.
pub struct AppState {
    /// Catalog pipeline.
    pub catalog: Arc<CatalogService>,
}

impl AppState {
    /// Create a new application state.
    pub fn new(catalog: Arc<CatalogService>) -> Self {
        Self { catalog }
    }
}
