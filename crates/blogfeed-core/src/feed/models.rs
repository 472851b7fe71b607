use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named syndication endpoint configured for ingestion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedSource {
    pub name: String,
    pub url: String,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

impl FeedSource {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

/// One entry of a parsed feed.
///
/// Every field is optional because feeds are not consistent about what they
/// carry. Consumers apply their own precedence between the content fields and
/// between the media fields.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedItem {
    pub title: Option<String>,
    /// Canonical article link
    pub link: Option<String>,
    /// HTML body (`content:encoded` in RSS, HTML `<content>` in Atom)
    pub rich_content: Option<String>,
    /// Non-HTML content body
    pub content: Option<String>,
    /// `<description>` / `<summary>`
    pub summary: Option<String>,
    pub published: Option<DateTime<Utc>>,
    /// Image `media:content` URLs, in document order. Non-image enclosures are dropped.
    pub media_content: Vec<String>,
    /// `media:thumbnail` URLs, in document order
    pub media_thumbnails: Vec<String>,
}
