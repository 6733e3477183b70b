use std::sync::Arc;

use tracing::{error, info};

use vbt_catalog::{CatalogService, Config, WebServer};

#[tokio::main]
async fn main() {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());

    // Load configuration
    let mut config = match Config::load(&config_path) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load {config_path}: {e}");
            eprintln!("Using default configuration.");
            Config::default()
        }
    };

    if let Err(e) = config.apply_env_overrides() {
        eprintln!("{e}");
        std::process::exit(1);
    }

    // Initialize logging
    if let Err(e) = vbt_catalog::logging::init(&config.logging) {
        eprintln!("Failed to initialize logging: {e}");
        vbt_catalog::logging::init_console_only(&config.logging.level);
    }

    if let Err(e) = config.validate() {
        error!("{}", e);
        std::process::exit(1);
    }

    info!("VBT catalog");
    info!(
        "Registry: {} ({:?} mode)",
        config.catalog.resolved_registry_url(),
        config.catalog.mode
    );

    let catalog = match CatalogService::from_config(&config.catalog) {
        Ok(service) => Arc::new(service),
        Err(e) => {
            error!("Failed to set up catalog: {}", e);
            std::process::exit(1);
        }
    };

    let server = match WebServer::new(&config.web, catalog) {
        Ok(server) => server,
        Err(e) => {
            error!("{}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run().await {
        error!("Web server error: {}", e);
        std::process::exit(1);
    }
}
