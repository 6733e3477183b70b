//! Book record normalization.
//!
//! Turns a watchlist book plus its owning registry entry into a
//! [`ProcessedFeed`]. Everything here is pure: the same inputs always give
//! the same feed URL, byte for byte, since RSS readers subscribe to it.

use crate::catalog::types::{BookRecord, ProcessedFeed, SourceEntry};
use crate::error::{CatalogError, Result};

/// Characters replaced by `_` in feed file names, in addition to whitespace.
const UNSAFE_FILE_NAME_CHARS: [char; 9] = ['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// Owner and repository parsed from a registry entry's repository path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryRef {
    pub owner: String,
    pub repository: String,
}

impl RepositoryRef {
    /// Parse `scheme://host/owner/repository[/...]`.
    ///
    /// Splits on `/` and takes segments 3 and 4 (zero-indexed). Both must be
    /// present and non-empty.
    pub fn parse(path: &str) -> Result<Self> {
        let mut segments = path.split('/').skip(3);
        let owner = segments.next().unwrap_or_default();
        let repository = segments.next().unwrap_or_default();

        if owner.is_empty() || repository.is_empty() {
            return Err(CatalogError::InvalidRepository(path.to_string()));
        }

        Ok(Self {
            owner: owner.to_string(),
            repository: repository.to_string(),
        })
    }
}

/// Title used to derive the feed file name: romaji if listed, else the name.
pub fn filename_title(book: &BookRecord) -> &str {
    book.romaji().unwrap_or(&book.name)
}

/// Replace path- and URL-unsafe characters with `_`.
///
/// Each character is replaced on its own; runs are not collapsed, so
/// `"A/B: C"` becomes `"A_B__C"`.
pub fn sanitize_file_name(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_whitespace() || UNSAFE_FILE_NAME_CHARS.contains(&c) {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Sanitized file name (without extension) of a book's feed.
pub fn feed_file_name(book: &BookRecord) -> String {
    sanitize_file_name(filename_title(book))
}

/// Build the canonical RSS URL of a feed file.
pub fn feed_url(base: &str, repo: &RepositoryRef, branch: &str, file_name: &str) -> String {
    format!(
        "{}/{}/{}/refs/heads/{}/feed/rss/{}.rss",
        base.trim_end_matches('/'),
        repo.owner,
        repo.repository,
        branch,
        file_name
    )
}

/// Build the URL of a source's watchlist document.
pub fn watchlist_url(base: &str, repo: &RepositoryRef, branch: &str, file: &str) -> String {
    format!(
        "{}/{}/{}/refs/heads/{}/{}",
        base.trim_end_matches('/'),
        repo.owner,
        repo.repository,
        branch,
        file
    )
}

/// Normalize a book against an already parsed repository.
pub fn normalize_with(
    book: &BookRecord,
    repo: &RepositoryRef,
    branch: &str,
    base: &str,
) -> ProcessedFeed {
    ProcessedFeed {
        title: book.name.clone(),
        cover_image_url: book.cover_image_url.clone(),
        feed_url: feed_url(base, repo, branch, &feed_file_name(book)),
        source_owner: repo.owner.clone(),
        source_repository: repo.repository.clone(),
    }
}

/// Normalize a book from the given source.
pub fn normalize(book: &BookRecord, entry: &SourceEntry, base: &str) -> Result<ProcessedFeed> {
    let repo = RepositoryRef::parse(&entry.repository_path)?;
    Ok(normalize_with(book, &repo, &entry.branch, base))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::types::OtherName;

    const BASE: &str = "https://raw.githubusercontent.com";

    fn repo() -> RepositoryRef {
        RepositoryRef::parse("https://github.com/owner1/repoA").unwrap()
    }

    #[test]
    fn test_parse_repository() {
        let repo = repo();
        assert_eq!(repo.owner, "owner1");
        assert_eq!(repo.repository, "repoA");
    }

    #[test]
    fn test_parse_repository_extra_segments() {
        let repo = RepositoryRef::parse("https://github.com/owner1/repoA/tree/main").unwrap();
        assert_eq!(repo.owner, "owner1");
        assert_eq!(repo.repository, "repoA");
    }

    #[test]
    fn test_parse_repository_invalid() {
        assert!(RepositoryRef::parse("https://github.com/owner1").is_err());
        assert!(RepositoryRef::parse("https://github.com/owner1/").is_err());
        assert!(RepositoryRef::parse("owner1/repoA").is_err());
        assert!(RepositoryRef::parse("").is_err());
    }

    #[test]
    fn test_filename_title_prefers_romaji() {
        let book = BookRecord::new("My Book", "http://x/c.png")
            .with_other_name(OtherName::romaji("Maiburu"));
        assert_eq!(filename_title(&book), "Maiburu");
    }

    #[test]
    fn test_filename_title_falls_back_to_name() {
        let book = BookRecord::new("My Book", "http://x/c.png").with_other_name(OtherName {
            native: Some("本".to_string()),
            ..Default::default()
        });
        assert_eq!(filename_title(&book), "My Book");
    }

    #[test]
    fn test_sanitize_no_collapsing() {
        assert_eq!(sanitize_file_name("A/B: C"), "A_B__C");
    }

    #[test]
    fn test_sanitize_all_unsafe_chars() {
        assert_eq!(sanitize_file_name(r#"a<b>c:d"e/f\g|h?i*j"#), "a_b_c_d_e_f_g_h_i_j");
    }

    #[test]
    fn test_sanitize_whitespace() {
        assert_eq!(sanitize_file_name("a b\tc\nd\u{3000}e"), "a_b_c_d_e");
        assert_eq!(sanitize_file_name("  "), "__");
    }

    #[test]
    fn test_sanitize_keeps_unicode() {
        assert_eq!(
            sanitize_file_name("Hành Trình Của Elaina"),
            "Hành_Trình_Của_Elaina"
        );
        assert_eq!(sanitize_file_name("Re:Zero"), "Re_Zero");
    }

    #[test]
    fn test_sanitize_idempotent() {
        for input in ["A/B: C", "plain", "Re:Zero kara", "a <> b", "", "_already_"] {
            let once = sanitize_file_name(input);
            assert_eq!(sanitize_file_name(&once), once);
        }
    }

    #[test]
    fn test_feed_url_shape() {
        assert_eq!(
            feed_url(BASE, &repo(), "main", "Maiburu"),
            "https://raw.githubusercontent.com/owner1/repoA/refs/heads/main/feed/rss/Maiburu.rss"
        );
    }

    #[test]
    fn test_feed_url_trims_base_slash() {
        assert_eq!(
            feed_url("https://raw.githubusercontent.com/", &repo(), "dev", "X"),
            "https://raw.githubusercontent.com/owner1/repoA/refs/heads/dev/feed/rss/X.rss"
        );
    }

    #[test]
    fn test_watchlist_url() {
        assert_eq!(
            watchlist_url(BASE, &repo(), "main", "watchlist.json"),
            "https://raw.githubusercontent.com/owner1/repoA/refs/heads/main/watchlist.json"
        );
    }

    #[test]
    fn test_normalize_with_romaji() {
        let book = BookRecord::new("My Book", "http://x/c.png")
            .with_other_name(OtherName::romaji("Maiburu"));
        let entry = SourceEntry::new("https://github.com/owner1/repoA", "main");

        let feed = normalize(&book, &entry, BASE).unwrap();
        assert_eq!(feed.title, "My Book");
        assert_eq!(feed.cover_image_url, "http://x/c.png");
        assert!(feed.feed_url.ends_with("/feed/rss/Maiburu.rss"));
        assert_eq!(feed.source_owner, "owner1");
        assert_eq!(feed.source_repository, "repoA");
    }

    #[test]
    fn test_normalize_without_romaji() {
        let book = BookRecord::new("A/B: C", "http://x/c.png");
        let entry = SourceEntry::new("https://github.com/owner1/repoA", "main");

        let feed = normalize(&book, &entry, BASE).unwrap();
        assert_eq!(feed.title, "A/B: C");
        assert!(feed.feed_url.ends_with("/feed/rss/A_B__C.rss"));
    }

    #[test]
    fn test_normalize_sanitizes_romaji() {
        let book = BookRecord::new("Primary", "http://x/c.png")
            .with_other_name(OtherName::romaji("Re:Zero kara"));
        let feed = normalize_with(&book, &repo(), "main", BASE);
        assert!(feed.feed_url.ends_with("/feed/rss/Re_Zero_kara.rss"));
        assert_eq!(feed.title, "Primary");
    }

    #[test]
    fn test_normalize_deterministic() {
        let book = BookRecord::new("My Book", "http://x/c.png");
        let entry = SourceEntry::new("https://github.com/owner1/repoA", "main");
        assert_eq!(
            normalize(&book, &entry, BASE).unwrap(),
            normalize(&book, &entry, BASE).unwrap()
        );
    }

    #[test]
    fn test_normalize_invalid_repository() {
        let book = BookRecord::new("My Book", "http://x/c.png");
        let entry = SourceEntry::new("owner1/repoA", "main");
        assert!(matches!(
            normalize(&book, &entry, BASE),
            Err(CatalogError::InvalidRepository(_))
        ));
    }
}
