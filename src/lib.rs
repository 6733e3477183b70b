//! VBT catalog
//!
//! Aggregates the watchlists of every contributor listed in the VBT registry
//! into one browsable catalog of RSS feeds tracking Vietnamese book
//! publications, and serves it over a small JSON API.

pub mod catalog;
pub mod config;
pub mod error;
pub mod logging;
pub mod web;

pub use catalog::{
    aggregate, filter_by_title, AggregateOptions, BookRecord, Catalog, CatalogFetcher,
    CatalogService, OtherName, PipelineState, ProcessedFeed, SourceEntry,
};
pub use config::{AggregationMode, Config, Environment};
pub use error::{CatalogError, Result};
pub use web::WebServer;
