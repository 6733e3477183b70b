//! Configuration module for the VBT catalog.

use serde::Deserialize;
use std::path::Path;

use crate::{CatalogError, Result};

/// Registry document used in production.
pub const PRODUCTION_REGISTRY_URL: &str =
    "https://raw.githubusercontent.com/Irilith/VBT/refs/heads/main/rss.json";

/// Registry document served by a local checkout during development.
pub const DEVELOPMENT_REGISTRY_URL: &str = "http://localhost:8080/rss.json";

/// Deployment environment, selects the registry endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    /// Public registry on the raw content host.
    #[default]
    Production,
    /// Local registry.
    Development,
}

impl Environment {
    /// Parse an environment name.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "production" | "prod" => Some(Environment::Production),
            "development" | "dev" => Some(Environment::Development),
            _ => None,
        }
    }

    /// Registry URL for this environment.
    pub fn registry_url(&self) -> &'static str {
        match self {
            Environment::Production => PRODUCTION_REGISTRY_URL,
            Environment::Development => DEVELOPMENT_REGISTRY_URL,
        }
    }
}

/// How a run reacts to a single unreachable source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AggregationMode {
    /// Any failing source fails the whole run.
    #[default]
    Strict,
    /// Failing sources are skipped and reported; the others are kept.
    BestEffort,
}

/// Catalog pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct CatalogConfig {
    /// Deployment environment.
    #[serde(default)]
    pub environment: Environment,
    /// Explicit registry URL, takes precedence over the environment.
    #[serde(default)]
    pub registry_url: Option<String>,
    /// Raw content host that serves watchlists and feeds.
    #[serde(default = "default_content_base_url")]
    pub content_base_url: String,
    /// Watchlist file name at the root of each source repository.
    #[serde(default = "default_watchlist_file")]
    pub watchlist_file: String,
    /// Strict or best-effort aggregation.
    #[serde(default)]
    pub mode: AggregationMode,
    /// Number of watchlist fetches in flight.
    #[serde(default = "default_fetch_concurrency")]
    pub fetch_concurrency: usize,
    /// Maximum size of a registry or watchlist document in bytes.
    #[serde(default = "default_max_document_size")]
    pub max_document_size_bytes: u64,
    /// Connection timeout in seconds (0 = none).
    #[serde(default)]
    pub connect_timeout_secs: u64,
    /// Total request timeout in seconds (0 = none).
    #[serde(default)]
    pub request_timeout_secs: u64,
    /// User agent sent with every request.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_content_base_url() -> String {
    "https://raw.githubusercontent.com".to_string()
}

fn default_watchlist_file() -> String {
    "watchlist.json".to_string()
}

fn default_fetch_concurrency() -> usize {
    1
}

fn default_max_document_size() -> u64 {
    5 * 1024 * 1024 // 5MB
}

fn default_user_agent() -> String {
    format!("VBT-Catalog/{}", env!("CARGO_PKG_VERSION"))
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            environment: Environment::default(),
            registry_url: None,
            content_base_url: default_content_base_url(),
            watchlist_file: default_watchlist_file(),
            mode: AggregationMode::default(),
            fetch_concurrency: default_fetch_concurrency(),
            max_document_size_bytes: default_max_document_size(),
            connect_timeout_secs: 0,
            request_timeout_secs: 0,
            user_agent: default_user_agent(),
        }
    }
}

impl CatalogConfig {
    /// Registry URL for this run: the explicit override, else the environment's.
    pub fn resolved_registry_url(&self) -> String {
        match &self.registry_url {
            Some(url) if !url.is_empty() => url.clone(),
            _ => self.environment.registry_url().to_string(),
        }
    }
}

/// Web server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct WebConfig {
    /// Host address to bind.
    #[serde(default = "default_web_host")]
    pub host: String,
    /// Port number to listen on.
    #[serde(default = "default_web_port")]
    pub port: u16,
    /// CORS allowed origins.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

fn default_web_host() -> String {
    "0.0.0.0".to_string()
}

fn default_web_port() -> u16 {
    3000
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            host: default_web_host(),
            port: default_web_port(),
            cors_origins: vec![],
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Path to the log file.
    #[serde(default = "default_log_file")]
    pub file: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_file() -> String {
    "logs/vbt-catalog.log".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file: default_log_file(),
        }
    }
}

/// Main configuration structure.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Config {
    /// Catalog pipeline configuration.
    #[serde(default)]
    pub catalog: CatalogConfig,
    /// Web server configuration.
    #[serde(default)]
    pub web: WebConfig,
    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(CatalogError::Io)?;
        Self::parse(&content)
    }

    /// Parse configuration from a TOML string.
    pub fn parse(s: &str) -> Result<Self> {
        toml::from_str(s).map_err(|e| CatalogError::Config(format!("config parse error: {e}")))
    }

    /// Apply environment variable overrides to the configuration.
    ///
    /// Supported environment variables:
    /// - `VBT_ENV`: `production` or `development`
    /// - `VBT_REGISTRY_URL`: explicit registry URL
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(env) = std::env::var("VBT_ENV") {
            if !env.is_empty() {
                self.catalog.environment = Environment::parse(&env).ok_or_else(|| {
                    CatalogError::Config(format!("unknown environment in VBT_ENV: {env}"))
                })?;
            }
        }

        if let Ok(registry_url) = std::env::var("VBT_REGISTRY_URL") {
            if !registry_url.is_empty() {
                self.catalog.registry_url = Some(registry_url);
            }
        }

        Ok(())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        let registry_url = self.catalog.resolved_registry_url();
        let registry = url::Url::parse(&registry_url).map_err(|e| {
            CatalogError::Validation(format!("invalid registry URL {registry_url}: {e}"))
        })?;
        if self.registry_is_own_address(&registry) {
            return Err(CatalogError::Validation(format!(
                "registry URL {registry_url} points at this server's own address {}:{}",
                self.web.host, self.web.port
            )));
        }

        let base = url::Url::parse(&self.catalog.content_base_url).map_err(|e| {
            CatalogError::Validation(format!(
                "invalid content base URL {}: {e}",
                self.catalog.content_base_url
            ))
        })?;
        if !matches!(base.scheme(), "http" | "https") {
            return Err(CatalogError::Validation(format!(
                "unsupported content base URL scheme: {}",
                base.scheme()
            )));
        }

        if self.catalog.fetch_concurrency == 0 {
            return Err(CatalogError::Validation(
                "fetch_concurrency must be at least 1".to_string(),
            ));
        }

        if self.catalog.watchlist_file.trim().is_empty() {
            return Err(CatalogError::Validation(
                "watchlist_file must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Whether the registry would be served by this process's own listener.
    fn registry_is_own_address(&self, registry: &url::Url) -> bool {
        let Some(host) = registry.host_str() else {
            return false;
        };
        if registry.port_or_known_default() != Some(self.web.port) {
            return false;
        }

        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host == self.web.host {
            return true;
        }

        matches!(host, "localhost" | "127.0.0.1" | "::1")
            && matches!(
                self.web.host.as_str(),
                "0.0.0.0" | "::" | "localhost" | "127.0.0.1" | "::1"
            )
    }
}
