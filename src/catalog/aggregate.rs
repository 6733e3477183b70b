//! Feed aggregation across all registered sources.

use std::collections::HashSet;

use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::catalog::fetcher::CatalogFetcher;
use crate::catalog::normalize::{normalize_with, RepositoryRef};
use crate::catalog::types::{Catalog, ProcessedFeed, SkippedSource, SourceEntry};
use crate::config::{AggregationMode, CatalogConfig};
use crate::error::Result;

/// Parameters of one aggregation run, resolved once from the configuration.
#[derive(Debug, Clone)]
pub struct AggregateOptions {
    /// Registry document URL.
    pub registry_url: String,
    /// Strict or best-effort handling of failing sources.
    pub mode: AggregationMode,
    /// Watchlist fetches in flight.
    pub concurrency: usize,
}

impl AggregateOptions {
    /// Create options for a strict, sequential run.
    pub fn new(registry_url: impl Into<String>) -> Self {
        Self {
            registry_url: registry_url.into(),
            mode: AggregationMode::Strict,
            concurrency: 1,
        }
    }

    /// Set the aggregation mode.
    pub fn with_mode(mut self, mode: AggregationMode) -> Self {
        self.mode = mode;
        self
    }

    /// Set the fetch concurrency.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    /// Resolve options from the catalog configuration.
    pub fn from_config(config: &CatalogConfig) -> Self {
        Self {
            registry_url: config.resolved_registry_url(),
            mode: config.mode,
            concurrency: config.fetch_concurrency,
        }
    }
}

/// Fetch the registry and every watchlist, and normalize all books.
///
/// Feeds come out in registry order, then watchlist order, whatever the
/// concurrency. A registry failure always fails the run; a source failure
/// fails it only in strict mode.
pub async fn aggregate(fetcher: &CatalogFetcher, options: &AggregateOptions) -> Result<Catalog> {
    info!("Aggregating feeds from {}", options.registry_url);

    let sources = fetcher.fetch_registry(&options.registry_url).await?;
    debug!("Registry lists {} source(s)", sources.len());

    let mut results = stream::iter(sources.iter().cloned())
        .map(|entry| async move {
            let result = collect_source(fetcher, &entry).await;
            (entry, result)
        })
        .buffered(options.concurrency.max(1));

    let mut feeds = Vec::new();
    let mut skipped = Vec::new();

    while let Some((entry, result)) = results.next().await {
        match result {
            Ok(mut source_feeds) => {
                debug!(
                    "{} feed(s) from {}",
                    source_feeds.len(),
                    entry.repository_path
                );
                feeds.append(&mut source_feeds);
            }
            Err(e) if options.mode == AggregationMode::BestEffort && e.is_source_error() => {
                warn!("Skipping source {}: {}", entry.repository_path, e);
                skipped.push(SkippedSource {
                    repository: entry.repository_path,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e),
        }
    }

    info!(
        "Aggregated {} feed(s) from {} source(s), {} skipped",
        feeds.len(),
        sources.len(),
        skipped.len()
    );

    Ok(Catalog::new(feeds, skipped))
}

/// Fetch and normalize one source's watchlist.
async fn collect_source(
    fetcher: &CatalogFetcher,
    entry: &SourceEntry,
) -> Result<Vec<ProcessedFeed>> {
    let repo = RepositoryRef::parse(&entry.repository_path)?;
    let books = fetcher.fetch_repository_watchlist(&repo, entry).await?;

    Ok(books
        .iter()
        .map(|book| normalize_with(book, &repo, &entry.branch, fetcher.content_base_url()))
        .collect())
}

/// Feeds whose title equals `title` exactly; all feeds when `title` is `None`.
pub fn filter_by_title<'a>(
    feeds: &'a [ProcessedFeed],
    title: Option<&str>,
) -> Vec<&'a ProcessedFeed> {
    match title {
        None => feeds.iter().collect(),
        Some(title) => feeds.iter().filter(|feed| feed.title == title).collect(),
    }
}

/// Unique titles in order of first appearance.
pub fn distinct_titles(feeds: &[ProcessedFeed]) -> Vec<&str> {
    let mut seen = HashSet::new();
    feeds
        .iter()
        .map(|feed| feed.title.as_str())
        .filter(|title| seen.insert(*title))
        .collect()
}

/// Unique titles containing `query`, ignoring case. An empty query matches all.
pub fn search_titles<'a>(feeds: &'a [ProcessedFeed], query: &str) -> Vec<&'a str> {
    let query = query.trim().to_lowercase();
    distinct_titles(feeds)
        .into_iter()
        .filter(|title| query.is_empty() || title.to_lowercase().contains(&query))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CatalogError;
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn feed(title: &str, owner: &str) -> ProcessedFeed {
        ProcessedFeed {
            title: title.to_string(),
            cover_image_url: "http://x/c.png".to_string(),
            feed_url: format!("https://raw.githubusercontent.com/{owner}/repo/refs/heads/main/feed/rss/{title}.rss"),
            source_owner: owner.to_string(),
            source_repository: "repo".to_string(),
        }
    }

    fn fetcher_for(server: &MockServer) -> CatalogFetcher {
        let config = CatalogConfig {
            content_base_url: server.uri(),
            ..Default::default()
        };
        CatalogFetcher::new(&config).unwrap()
    }

    async fn mount_registry(server: &MockServer, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/rss.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    async fn mount_watchlist(server: &MockServer, owner: &str, body: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path(format!("/{owner}/repo/refs/heads/main/watchlist.json")))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(server)
            .await;
    }

    fn registry_entry(owner: &str) -> serde_json::Value {
        json!({"repo": format!("https://github.com/{owner}/repo"), "branch": "main"})
    }

    #[tokio::test]
    async fn test_aggregate_empty_registry() {
        let mock_server = MockServer::start().await;
        mount_registry(&mock_server, json!([])).await;

        let fetcher = fetcher_for(&mock_server);
        let options = AggregateOptions::new(format!("{}/rss.json", mock_server.uri()));
        let catalog = aggregate(&fetcher, &options).await.unwrap();

        assert!(catalog.feeds.is_empty());
        assert!(catalog.skipped.is_empty());
    }

    #[tokio::test]
    async fn test_aggregate_single_source() {
        let mock_server = MockServer::start().await;
        mount_registry(&mock_server, json!([registry_entry("owner1")])).await;
        mount_watchlist(
            &mock_server,
            "owner1",
            json!([{"name": "My Book", "other": [{"romaji": "Maiburu"}], "cover": "http://x/c.png"}]),
        )
        .await;

        let fetcher = fetcher_for(&mock_server);
        let options = AggregateOptions::new(format!("{}/rss.json", mock_server.uri()));
        let catalog = aggregate(&fetcher, &options).await.unwrap();

        assert_eq!(catalog.feeds.len(), 1);
        let feed = &catalog.feeds[0];
        assert_eq!(feed.title, "My Book");
        assert_eq!(
            feed.feed_url,
            format!(
                "{}/owner1/repo/refs/heads/main/feed/rss/Maiburu.rss",
                mock_server.uri()
            )
        );
        assert_eq!(feed.source_owner, "owner1");
        assert_eq!(feed.source_repository, "repo");
    }

    #[tokio::test]
    async fn test_aggregate_preserves_order_with_concurrency() {
        let mock_server = MockServer::start().await;
        mount_registry(
            &mock_server,
            json!([
                registry_entry("slow"),
                registry_entry("fast")
            ]),
        )
        .await;

        Mock::given(method("GET"))
            .and(path("/slow/repo/refs/heads/main/watchlist.json"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([
                        {"name": "S1", "other": [], "cover": "c"},
                        {"name": "S2", "other": [], "cover": "c"}
                    ]))
                    .set_delay(Duration::from_millis(200)),
            )
            .mount(&mock_server)
            .await;
        mount_watchlist(
            &mock_server,
            "fast",
            json!([{"name": "F1", "other": [], "cover": "c"}]),
        )
        .await;

        let fetcher = fetcher_for(&mock_server);
        let options =
            AggregateOptions::new(format!("{}/rss.json", mock_server.uri())).with_concurrency(4);
        let catalog = aggregate(&fetcher, &options).await.unwrap();

        let titles: Vec<_> = catalog.feeds.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["S1", "S2", "F1"]);
    }

    #[tokio::test]
    async fn test_aggregate_keeps_duplicate_titles() {
        let mock_server = MockServer::start().await;
        mount_registry(
            &mock_server,
            json!([
                registry_entry("owner1"),
                registry_entry("owner2")
            ]),
        )
        .await;
        let book = json!([{"name": "Same", "other": [], "cover": "c"}]);
        mount_watchlist(&mock_server, "owner1", book.clone()).await;
        mount_watchlist(&mock_server, "owner2", book).await;

        let fetcher = fetcher_for(&mock_server);
        let options = AggregateOptions::new(format!("{}/rss.json", mock_server.uri()));
        let catalog = aggregate(&fetcher, &options).await.unwrap();

        assert_eq!(catalog.feeds.len(), 2);
        assert_eq!(catalog.feeds[0].source_owner, "owner1");
        assert_eq!(catalog.feeds[1].source_owner, "owner2");
    }

    #[tokio::test]
    async fn test_aggregate_registry_failure() {
        let mock_server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let fetcher = fetcher_for(&mock_server);
        let options = AggregateOptions::new(format!("{}/rss.json", mock_server.uri()))
            .with_mode(AggregationMode::BestEffort);
        let result = aggregate(&fetcher, &options).await;

        assert!(matches!(result, Err(CatalogError::RegistryUnavailable(_))));
    }

    #[tokio::test]
    async fn test_aggregate_strict_aborts_on_source_failure() {
        let mock_server = MockServer::start().await;
        mount_registry(
            &mock_server,
            json!([
                registry_entry("owner1"),
                registry_entry("missing")
            ]),
        )
        .await;
        mount_watchlist(
            &mock_server,
            "owner1",
            json!([{"name": "A", "other": [], "cover": "c"}]),
        )
        .await;

        let fetcher = fetcher_for(&mock_server);
        let options = AggregateOptions::new(format!("{}/rss.json", mock_server.uri()));
        let result = aggregate(&fetcher, &options).await;

        match result {
            Err(CatalogError::WatchlistUnavailable { repository, .. }) => {
                assert_eq!(repository, "https://github.com/missing/repo");
            }
            other => panic!("Expected WatchlistUnavailable, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_aggregate_best_effort_skips_failures() {
        let mock_server = MockServer::start().await;
        mount_registry(
            &mock_server,
            json!([
                {"repo": "broken", "branch": "main"},
                registry_entry("missing"),
                registry_entry("owner1")
            ]),
        )
        .await;
        mount_watchlist(
            &mock_server,
            "owner1",
            json!([{"name": "A", "other": [], "cover": "c"}]),
        )
        .await;

        let fetcher = fetcher_for(&mock_server);
        let options = AggregateOptions::new(format!("{}/rss.json", mock_server.uri()))
            .with_mode(AggregationMode::BestEffort);
        let catalog = aggregate(&fetcher, &options).await.unwrap();

        assert_eq!(catalog.feeds.len(), 1);
        assert_eq!(catalog.feeds[0].title, "A");
        assert_eq!(catalog.skipped.len(), 2);
        assert_eq!(catalog.skipped[0].repository, "broken");
        assert!(catalog.skipped[0].reason.contains("invalid repository path"));
        assert_eq!(catalog.skipped[1].repository, "https://github.com/missing/repo");
    }

    #[tokio::test]
    async fn test_aggregate_runs_on_spawned_task() {
        let mock_server = MockServer::start().await;
        mount_registry(
            &mock_server,
            json!([registry_entry("owner1"), registry_entry("owner2")]),
        )
        .await;
        mount_watchlist(
            &mock_server,
            "owner1",
            json!([{"name": "A", "other": [], "cover": "c"}]),
        )
        .await;
        mount_watchlist(
            &mock_server,
            "owner2",
            json!([{"name": "B", "other": [], "cover": "c"}]),
        )
        .await;

        let fetcher = fetcher_for(&mock_server);
        let options =
            AggregateOptions::new(format!("{}/rss.json", mock_server.uri())).with_concurrency(2);

        let catalog = tokio::spawn(async move { aggregate(&fetcher, &options).await })
            .await
            .unwrap()
            .unwrap();

        let titles: Vec<_> = catalog.feeds.iter().map(|f| f.title.as_str()).collect();
        assert_eq!(titles, vec!["A", "B"]);
    }

    #[test]
    fn test_options_from_config() {
        let config = CatalogConfig {
            registry_url: Some("https://example.com/rss.json".to_string()),
            mode: AggregationMode::BestEffort,
            fetch_concurrency: 3,
            ..Default::default()
        };
        let options = AggregateOptions::from_config(&config);
        assert_eq!(options.registry_url, "https://example.com/rss.json");
        assert_eq!(options.mode, AggregationMode::BestEffort);
        assert_eq!(options.concurrency, 3);
    }

    #[test]
    fn test_filter_by_title_none_is_identity() {
        let feeds = vec![feed("A", "o1"), feed("B", "o1"), feed("A", "o2")];
        let filtered = filter_by_title(&feeds, None);
        assert_eq!(filtered, feeds.iter().collect::<Vec<_>>());
    }

    #[test]
    fn test_filter_by_title_exact_match() {
        let feeds = vec![feed("A", "o1"), feed("B", "o1"), feed("A", "o2")];
        let filtered = filter_by_title(&feeds, Some("A"));
        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].source_owner, "o1");
        assert_eq!(filtered[1].source_owner, "o2");
    }

    #[test]
    fn test_filter_by_title_case_sensitive() {
        let feeds = vec![feed("Book", "o1")];
        assert!(filter_by_title(&feeds, Some("book")).is_empty());
        assert!(filter_by_title(&feeds, Some("Book ")).is_empty());
    }

    #[test]
    fn test_filter_by_title_no_match() {
        let feeds = vec![feed("A", "o1")];
        assert!(filter_by_title(&feeds, Some("Z")).is_empty());
        assert!(filter_by_title(&[], Some("Z")).is_empty());
    }

    #[test]
    fn test_distinct_titles() {
        let feeds = vec![feed("B", "o1"), feed("A", "o1"), feed("B", "o2")];
        assert_eq!(distinct_titles(&feeds), vec!["B", "A"]);
    }

    #[test]
    fn test_search_titles() {
        let feeds = vec![
            feed("Hành Trình Của Elaina", "o1"),
            feed("Spice and Wolf", "o1"),
            feed("Spice and Wolf", "o2"),
        ];
        assert_eq!(search_titles(&feeds, "wolf"), vec!["Spice and Wolf"]);
        assert_eq!(search_titles(&feeds, "ELAINA"), vec!["Hành Trình Của Elaina"]);
        assert_eq!(search_titles(&feeds, "").len(), 2);
        assert!(search_titles(&feeds, "nothing").is_empty());
    }
}
