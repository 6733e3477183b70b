//! Web API module.
//!
//! Serves the aggregated catalog to the landing page: feed cards, the title
//! selector, pipeline status and a refresh trigger.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use router::create_router;
pub use server::WebServer;
