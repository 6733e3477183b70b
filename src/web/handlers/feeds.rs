//! Feed catalog handlers for Web API.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use crate::catalog::{distinct_titles, filter_by_title, search_titles, Catalog, PipelineState};
use crate::web::dto::{
    ApiResponse, FeedQuery, FeedResponse, RefreshResponse, StatusResponse, TitleQuery,
};
use crate::web::error::ApiError;
use crate::web::handlers::AppState;

/// Catalog of a ready pipeline, or the error matching the current state.
fn ready_catalog(state: &AppState) -> Result<Arc<Catalog>, ApiError> {
    match state.catalog.current() {
        PipelineState::Ready(catalog) => Ok(catalog),
        PipelineState::Idle | PipelineState::Loading => Err(ApiError::loading()),
        PipelineState::Failed(message) => Err(ApiError::unavailable(message)),
    }
}

/// GET /api/feeds - List feeds, optionally only those with an exact title.
pub async fn list_feeds(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<ApiResponse<Vec<FeedResponse>>>, ApiError> {
    let catalog = ready_catalog(&state)?;

    let feeds = filter_by_title(&catalog.feeds, query.title.as_deref())
        .into_iter()
        .map(FeedResponse::from)
        .collect();

    Ok(Json(ApiResponse::new(feeds)))
}

/// GET /api/titles - List distinct feed titles, optionally searched.
pub async fn list_titles(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TitleQuery>,
) -> Result<Json<ApiResponse<Vec<String>>>, ApiError> {
    let catalog = ready_catalog(&state)?;

    let titles = match query.q.as_deref() {
        Some(q) => search_titles(&catalog.feeds, q),
        None => distinct_titles(&catalog.feeds),
    };

    Ok(Json(ApiResponse::new(
        titles.into_iter().map(str::to_string).collect(),
    )))
}

/// GET /api/status - Current pipeline state.
pub async fn get_status(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StatusResponse>> {
    let current = state.catalog.current();
    Json(ApiResponse::new(StatusResponse::from(&current)))
}

/// POST /api/refresh - Start a new pipeline run.
pub async fn refresh(
    State(state): State<Arc<AppState>>,
) -> (StatusCode, Json<ApiResponse<RefreshResponse>>) {
    state.catalog.spawn_refresh();
    tracing::info!("Catalog refresh requested");

    (
        StatusCode::ACCEPTED,
        Json(ApiResponse::new(RefreshResponse {
            message: "Refresh started".to_string(),
        })),
    )
}
