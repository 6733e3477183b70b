//! Response DTOs for Web API.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{PipelineState, ProcessedFeed, SkippedSource, StateKind};

/// Generic API response wrapper.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    /// Response data.
    pub data: T,
}

impl<T: Serialize> ApiResponse<T> {
    /// Create a new API response.
    pub fn new(data: T) -> Self {
        Self { data }
    }
}

/// A feed card.
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub title: String,
    pub cover_image_url: String,
    pub feed_url: String,
    pub source_owner: String,
    pub source_repository: String,
    /// Repository page of the watchlist source.
    pub source_url: String,
    /// Avatar of the watchlist source owner.
    pub avatar_url: String,
}

impl From<&ProcessedFeed> for FeedResponse {
    fn from(feed: &ProcessedFeed) -> Self {
        Self {
            title: feed.title.clone(),
            cover_image_url: feed.cover_image_url.clone(),
            feed_url: feed.feed_url.clone(),
            source_owner: feed.source_owner.clone(),
            source_repository: feed.source_repository.clone(),
            source_url: feed.source_url(),
            avatar_url: feed.avatar_url(),
        }
    }
}

/// Pipeline status.
#[derive(Debug, Serialize)]
pub struct StatusResponse {
    /// Current state.
    pub state: StateKind,
    /// Number of feeds in a ready catalog.
    pub feed_count: usize,
    /// Sources skipped by the last best-effort run.
    pub skipped: Vec<SkippedSource>,
    /// When the ready catalog was built.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,
    /// User-facing message of a failed run.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl From<&PipelineState> for StatusResponse {
    fn from(state: &PipelineState) -> Self {
        let mut status = Self {
            state: state.kind(),
            feed_count: 0,
            skipped: Vec::new(),
            generated_at: None,
            message: None,
        };

        match state {
            PipelineState::Ready(catalog) => {
                status.feed_count = catalog.feeds.len();
                status.skipped = catalog.skipped.clone();
                status.generated_at = Some(catalog.generated_at);
            }
            PipelineState::Failed(message) => status.message = Some(message.clone()),
            PipelineState::Idle | PipelineState::Loading => {}
        }

        status
    }
}

/// Accepted refresh.
#[derive(Debug, Serialize)]
pub struct RefreshResponse {
    /// Human-readable message.
    pub message: String,
}
