//! Error types for the VBT catalog.

use thiserror::Error;

/// Common error type for the VBT catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// The source registry could not be fetched or parsed.
    ///
    /// Always aborts the pipeline run, since the fan-out needs every source.
    #[error("registry unavailable: {0}")]
    RegistryUnavailable(String),

    /// A single source's watchlist could not be fetched or parsed.
    #[error("watchlist unavailable for {repository}: {reason}")]
    WatchlistUnavailable {
        /// Repository path as listed in the registry.
        repository: String,
        /// Underlying cause.
        reason: String,
    },

    /// A registry entry whose repository path has no owner/repository segments.
    #[error("invalid repository path: {0}")]
    InvalidRepository(String),

    /// HTTP client setup error.
    #[error("HTTP client error: {0}")]
    Http(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Validation error.
    #[error("validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),
}

impl CatalogError {
    /// Whether this error belongs to a single source rather than the whole run.
    pub fn is_source_error(&self) -> bool {
        matches!(
            self,
            CatalogError::WatchlistUnavailable { .. } | CatalogError::InvalidRepository(_)
        )
    }
}

/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
