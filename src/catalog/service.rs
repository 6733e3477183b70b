//! Catalog service: runs the pipeline and publishes its state.

use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{watch, Mutex};
use tracing::{debug, error, info};

use crate::catalog::aggregate::{aggregate, AggregateOptions};
use crate::catalog::fetcher::CatalogFetcher;
use crate::catalog::types::Catalog;
use crate::config::CatalogConfig;
use crate::error::Result;

/// Message shown to users when a run fails. Details only go to the log.
pub const FAILURE_MESSAGE: &str = "Failed to fetch RSS feeds";

/// State of the aggregation pipeline.
///
/// `Idle -> Loading -> Ready | Failed`. `Ready` and `Failed` are terminal for
/// a run; a new run starts over from `Loading`.
#[derive(Debug, Clone)]
pub enum PipelineState {
    Idle,
    Loading,
    Ready(Arc<Catalog>),
    Failed(String),
}

/// Name of a pipeline state, for status reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StateKind {
    Idle,
    Loading,
    Ready,
    Failed,
}

impl PipelineState {
    /// Kind of this state.
    pub fn kind(&self) -> StateKind {
        match self {
            PipelineState::Idle => StateKind::Idle,
            PipelineState::Loading => StateKind::Loading,
            PipelineState::Ready(_) => StateKind::Ready,
            PipelineState::Failed(_) => StateKind::Failed,
        }
    }

    /// Whether the run has finished, successfully or not.
    pub fn is_terminal(&self) -> bool {
        matches!(self, PipelineState::Ready(_) | PipelineState::Failed(_))
    }

    /// Catalog of a ready state.
    pub fn catalog(&self) -> Option<&Arc<Catalog>> {
        match self {
            PipelineState::Ready(catalog) => Some(catalog),
            _ => None,
        }
    }
}

/// Runs aggregation and publishes each state on a single watch channel.
pub struct CatalogService {
    fetcher: CatalogFetcher,
    options: AggregateOptions,
    state: watch::Sender<PipelineState>,
    run_lock: Mutex<()>,
}

impl CatalogService {
    /// Create a service in the `Idle` state.
    pub fn new(fetcher: CatalogFetcher, options: AggregateOptions) -> Self {
        let (state, _) = watch::channel(PipelineState::Idle);
        Self {
            fetcher,
            options,
            state,
            run_lock: Mutex::new(()),
        }
    }

    /// Create a service from the catalog configuration.
    pub fn from_config(config: &CatalogConfig) -> Result<Self> {
        let fetcher = CatalogFetcher::new(config)?;
        Ok(Self::new(fetcher, AggregateOptions::from_config(config)))
    }

    /// Latest published state.
    pub fn current(&self) -> PipelineState {
        self.state.borrow().clone()
    }

    /// Receiver for state changes.
    pub fn subscribe(&self) -> watch::Receiver<PipelineState> {
        self.state.subscribe()
    }

    /// Run the pipeline once and return the terminal state.
    ///
    /// A call made while a run is in flight joins that run instead of
    /// queueing another one, and returns its result. A new run discards the
    /// previous result by publishing `Loading` before fetching anything.
    pub async fn refresh(&self) -> PipelineState {
        let _guard = match self.run_lock.try_lock() {
            Ok(guard) => guard,
            Err(_) => {
                debug!("Catalog run already in progress, waiting for it");
                let _finished = self.run_lock.lock().await;
                return self.current();
            }
        };

        info!("Starting catalog run ({:?} mode)", self.options.mode);
        self.state.send_replace(PipelineState::Loading);

        let next = match aggregate(&self.fetcher, &self.options).await {
            Ok(catalog) => {
                info!("Catalog ready: {} feed(s)", catalog.feeds.len());
                PipelineState::Ready(Arc::new(catalog))
            }
            Err(e) => {
                error!("Catalog run failed: {}", e);
                PipelineState::Failed(FAILURE_MESSAGE.to_string())
            }
        };

        self.state.send_replace(next.clone());
        next
    }

    /// Start a run in the background.
    pub fn spawn_refresh(self: &Arc<Self>) -> tokio::task::JoinHandle<PipelineState> {
        let service = Arc::clone(self);
        tokio::spawn(async move { service.refresh().await })
    }
}
