//! Feed catalog module.
//!
//! Discovers contributor repositories from the registry, fetches each
//! watchlist, and turns every listed book into a located RSS feed.

pub mod aggregate;
pub mod fetcher;
pub mod normalize;
pub mod service;
pub mod types;

pub use aggregate::{aggregate, distinct_titles, filter_by_title, search_titles, AggregateOptions};
pub use fetcher::CatalogFetcher;
pub use normalize::{
    feed_file_name, feed_url, filename_title, normalize, normalize_with, sanitize_file_name,
    watchlist_url, RepositoryRef,
};
pub use service::{CatalogService, PipelineState, StateKind, FAILURE_MESSAGE};
pub use types::{BookRecord, Catalog, OtherName, ProcessedFeed, SkippedSource, SourceEntry};
