//! Registry and watchlist fetcher.
//!
//! Both documents are static JSON files on a raw content host. Fetches are
//! never retried; a failure is reported to the caller, which decides whether
//! the run survives it.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::catalog::normalize::{watchlist_url, RepositoryRef};
use crate::catalog::types::{BookRecord, SourceEntry};
use crate::config::CatalogConfig;
use crate::error::{CatalogError, Result};

/// Maximum number of redirects to follow.
const MAX_REDIRECTS: usize = 5;

/// Fetcher for the source registry and per-source watchlists.
#[derive(Debug, Clone)]
pub struct CatalogFetcher {
    client: Client,
    content_base_url: String,
    watchlist_file: String,
    max_document_size: u64,
}

impl CatalogFetcher {
    /// Create a fetcher from the catalog configuration.
    pub fn new(config: &CatalogConfig) -> Result<Self> {
        let mut builder = Client::builder()
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .user_agent(config.user_agent.as_str());

        if config.connect_timeout_secs > 0 {
            builder = builder.connect_timeout(Duration::from_secs(config.connect_timeout_secs));
        }
        if config.request_timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.request_timeout_secs));
        }

        let client = builder
            .build()
            .map_err(|e| CatalogError::Http(format!("failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            content_base_url: config.content_base_url.clone(),
            watchlist_file: config.watchlist_file.clone(),
            max_document_size: config.max_document_size_bytes,
        })
    }

    /// Content host used for watchlists and feed URLs.
    pub fn content_base_url(&self) -> &str {
        &self.content_base_url
    }

    /// Fetch the list of registered sources.
    pub async fn fetch_registry(&self, url: &str) -> Result<Vec<SourceEntry>> {
        debug!("Fetching registry: {}", url);
        self.fetch_json(url)
            .await
            .map_err(CatalogError::RegistryUnavailable)
    }

    /// Fetch the watchlist of one source.
    pub async fn fetch_watchlist(&self, entry: &SourceEntry) -> Result<Vec<BookRecord>> {
        let repo = RepositoryRef::parse(&entry.repository_path)?;
        self.fetch_repository_watchlist(&repo, entry).await
    }

    /// Fetch the watchlist of a source whose repository path is already parsed.
    pub async fn fetch_repository_watchlist(
        &self,
        repo: &RepositoryRef,
        entry: &SourceEntry,
    ) -> Result<Vec<BookRecord>> {
        let url = watchlist_url(
            &self.content_base_url,
            repo,
            &entry.branch,
            &self.watchlist_file,
        );

        debug!("Fetching watchlist for {}: {}", entry.repository_path, url);
        self.fetch_json(&url)
            .await
            .map_err(|reason| CatalogError::WatchlistUnavailable {
                repository: entry.repository_path.clone(),
                reason,
            })
    }

    /// Fetch a JSON document and decode it, with a size limit.
    ///
    /// Errors are plain strings so each caller can wrap them in its own kind.
    async fn fetch_json<T: DeserializeOwned>(&self, url: &str) -> std::result::Result<T, String> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| format!("failed to fetch {}: {}", url, e))?;

        if !response.status().is_success() {
            return Err(format!("HTTP error: {}", response.status()));
        }

        if let Some(content_length) = response.content_length() {
            if content_length > self.max_document_size {
                return Err(format!(
                    "document too large: {} bytes (max {} bytes)",
                    content_length, self.max_document_size
                ));
            }
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| format!("failed to read response: {}", e))?;

        if bytes.len() as u64 > self.max_document_size {
            return Err(format!(
                "document too large: {} bytes (max {} bytes)",
                bytes.len(),
                self.max_document_size
            ));
        }

        serde_json::from_slice(&bytes).map_err(|e| format!("failed to parse document: {}", e))
    }
}
