//! Request DTOs for Web API.

use serde::{Deserialize, Deserializer};

/// Query of `GET /api/feeds`.
#[derive(Debug, Default, Deserialize)]
pub struct FeedQuery {
    /// Selected title; exact, case-sensitive match. `?title=` selects nothing.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub title: Option<String>,
}

/// Query of `GET /api/titles`.
#[derive(Debug, Default, Deserialize)]
pub struct TitleQuery {
    /// Search text; case-insensitive substring match.
    #[serde(default, deserialize_with = "empty_as_none")]
    pub q: Option<String>,
}

/// A present but empty query value counts as absent.
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|v| !v.is_empty()))
}
