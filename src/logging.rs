//! Logging setup.
//!
//! Catalog events are logged at the configured level. The HTTP stack used to
//! fetch watchlists is held at `warn` unless the configured level is quieter,
//! so a `debug` run shows fetch decisions without connection-pool noise.
//! `RUST_LOG`, when set, replaces these directives entirely.

use std::fs::{self, File};
use std::path::Path;
use std::sync::Arc;

use tracing::Level;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LoggingConfig;
use crate::Result;

/// Log target of this crate.
const CATALOG_TARGET: &str = "vbt_catalog";

/// Targets that follow the configured level along with the catalog.
const FOLLOWING_TARGETS: &[&str] = &["tower_http"];

/// Parse log level string to tracing Level.
fn parse_level(level: &str) -> Level {
    match level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    }
}

/// Filter directives for a configured level.
fn filter_directives(level: Level) -> String {
    let others = std::cmp::min(level, Level::WARN);
    let level = level.as_str().to_ascii_lowercase();

    let mut directives = vec![others.as_str().to_ascii_lowercase()];
    directives.push(format!("{CATALOG_TARGET}={level}"));
    for target in FOLLOWING_TARGETS {
        directives.push(format!("{target}={level}"));
    }
    directives.join(",")
}

fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(filter_directives(parse_level(level))))
}

/// Initialize logging to stdout and the configured log file.
///
/// An empty `file` logs to the console only.
pub fn init(config: &LoggingConfig) -> Result<()> {
    if config.file.is_empty() {
        init_console_only(&config.level);
        return Ok(());
    }

    if let Some(parent) = Path::new(&config.file).parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            fs::create_dir_all(parent)?;
        }
    }

    let log_file = Arc::new(File::create(&config.file)?);
    let writer = std::io::stdout.and(log_file);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_target(true),
        )
        .with(build_filter(&config.level))
        .init();

    Ok(())
}

/// Initialize console-only logging.
pub fn init_console_only(level: &str) {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(build_filter(level))
        .init();
}
