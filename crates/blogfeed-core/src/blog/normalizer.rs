use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;

use super::models::NewBlogPost;
use crate::feed::FeedItem;
use crate::{Error, Result};

/// Slug used when a title has no sluggable characters
pub const FALLBACK_SLUG: &str = "post";

fn img_src_regex() -> &'static Regex {
    static IMG_SRC: OnceLock<Regex> = OnceLock::new();
    IMG_SRC.get_or_init(|| {
        Regex::new(r#"(?i)<img\b[^>]*?\bsrc\s*=\s*["']([^"']+)["']"#).expect("valid img regex")
    })
}

fn separator_regex() -> &'static Regex {
    static SEPARATORS: OnceLock<Regex> = OnceLock::new();
    SEPARATORS.get_or_init(|| Regex::new(r"[\s-]+").expect("valid separator regex"))
}

/// Derive a URL slug from a title.
///
/// Lowercases, drops everything outside `[a-z0-9\s-]` (underscores included),
/// turns whitespace and hyphen runs into a single hyphen and trims hyphens
/// from both ends. The result is not guaranteed to be unique.
pub fn slugify(title: &str) -> String {
    let lowered = title.to_lowercase();
    let kept: String = lowered
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .collect();

    separator_regex()
        .replace_all(&kept, "-")
        .trim_matches('-')
        .to_string()
}

/// First `<img src="...">` in an HTML fragment
pub fn extract_first_image_url(html: &str) -> Option<String> {
    img_src_regex()
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|url| !url.is_empty())
}

fn first_non_empty(candidates: [Option<&str>; 3]) -> Option<&str> {
    candidates
        .into_iter()
        .flatten()
        .find(|s| !s.trim().is_empty())
}

/// Map a feed item into a blog post draft attributed to `source`.
///
/// `now` is used as the publication date when the item carries none.
pub fn normalize_item(item: &FeedItem, source: &str, now: DateTime<Utc>) -> Result<NewBlogPost> {
    let external_url = item
        .link
        .as_deref()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .ok_or_else(|| {
            Error::InvalidItem(format!(
                "item '{}' has no link",
                item.title.as_deref().unwrap_or("(untitled)")
            ))
        })?
        .to_string();

    let title = item.title.clone().unwrap_or_default();

    let mut slug = slugify(&title);
    if slug.is_empty() {
        slug = FALLBACK_SLUG.to_string();
    }

    let body = first_non_empty([
        item.rich_content.as_deref(),
        item.content.as_deref(),
        item.summary.as_deref(),
    ])
    .unwrap_or_default()
    .to_string();

    let image_url = item
        .media_content
        .first()
        .or_else(|| item.media_thumbnails.first())
        .cloned()
        .or_else(|| extract_first_image_url(&body));

    Ok(NewBlogPost {
        title,
        slug,
        body,
        is_show: true,
        source: source.to_string(),
        external_url,
        published_at: item.published.unwrap_or(now),
        image_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(title: &str, link: &str) -> FeedItem {
        FeedItem {
            title: Some(title.to_string()),
            link: Some(link.to_string()),
            ..FeedItem::default()
        }
    }

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Hello, World! 2024"), "hello-world-2024");
        assert_eq!(slugify("  leading/trailing -- spaces  "), "leadingtrailing-spaces");
        assert_eq!(slugify("snake_case and  tabs\tok"), "snakecase-and-tabs-ok");
        assert_eq!(slugify("---"), "");
        assert_eq!(slugify("Café déjà vu"), "caf-dj-vu");
    }

    #[test]
    fn test_slug_has_no_edge_hyphens() {
        let slug = slugify("  leading/trailing -- spaces  ");
        assert!(!slug.starts_with('-'));
        assert!(!slug.ends_with('-'));
    }

    #[test]
    fn test_extract_first_image_url() {
        let html = r#"<p>hi</p><IMG class="x" src='https://a.example/1.png'><img src="https://a.example/2.png">"#;
        assert_eq!(extract_first_image_url(html).as_deref(), Some("https://a.example/1.png"));
        assert_eq!(extract_first_image_url("<p>no images</p>"), None);
    }

    #[test]
    fn test_body_precedence() {
        let now = Utc::now();
        let mut it = item("T", "https://example.com/a");
        it.summary = Some("summary".into());
        assert_eq!(normalize_item(&it, "S", now).unwrap().body, "summary");

        it.content = Some("plain".into());
        assert_eq!(normalize_item(&it, "S", now).unwrap().body, "plain");

        it.rich_content = Some("   ".into());
        assert_eq!(normalize_item(&it, "S", now).unwrap().body, "plain");

        it.rich_content = Some("<p>rich</p>".into());
        assert_eq!(normalize_item(&it, "S", now).unwrap().body, "<p>rich</p>");

        let bare = item("T", "https://example.com/b");
        assert_eq!(normalize_item(&bare, "S", now).unwrap().body, "");
    }

    #[test]
    fn test_thumbnail_beats_inline_image() {
        let mut it = item("T", "https://example.com/a");
        it.media_thumbnails = vec!["https://cdn.example.com/thumb.jpg".into()];
        it.rich_content = Some(r#"<img src="https://cdn.example.com/inline.png">"#.into());

        let draft = normalize_item(&it, "S", Utc::now()).unwrap();
        assert_eq!(draft.image_url.as_deref(), Some("https://cdn.example.com/thumb.jpg"));
    }

    #[test]
    fn test_media_content_beats_thumbnail() {
        let mut it = item("T", "https://example.com/a");
        it.media_content = vec!["https://cdn.example.com/content.jpg".into()];
        it.media_thumbnails = vec!["https://cdn.example.com/thumb.jpg".into()];

        let draft = normalize_item(&it, "S", Utc::now()).unwrap();
        assert_eq!(draft.image_url.as_deref(), Some("https://cdn.example.com/content.jpg"));
    }

    #[test]
    fn test_inline_image_fallback_and_none() {
        let mut it = item("T", "https://example.com/a");
        it.summary = Some(r#"<img src="https://cdn.example.com/inline.png">"#.into());
        let draft = normalize_item(&it, "S", Utc::now()).unwrap();
        assert_eq!(draft.image_url.as_deref(), Some("https://cdn.example.com/inline.png"));

        let plain = item("T", "https://example.com/b");
        assert_eq!(normalize_item(&plain, "S", Utc::now()).unwrap().image_url, None);
    }

    #[test]
    fn test_fields_and_published_fallback() {
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let published = Utc.with_ymd_and_hms(2024, 1, 2, 10, 0, 0).unwrap();

        let mut it = item("Hello, World! 2024", "https://example.com/hello");
        let draft = normalize_item(&it, "Company Blog", now).unwrap();
        assert_eq!(draft.title, "Hello, World! 2024");
        assert_eq!(draft.slug, "hello-world-2024");
        assert!(draft.is_show);
        assert_eq!(draft.source, "Company Blog");
        assert_eq!(draft.external_url, "https://example.com/hello");
        assert_eq!(draft.published_at, now);

        it.published = Some(published);
        assert_eq!(normalize_item(&it, "Company Blog", now).unwrap().published_at, published);
    }

    #[test]
    fn test_missing_link_is_invalid_item() {
        let it = FeedItem {
            title: Some("Orphan".into()),
            ..FeedItem::default()
        };
        let err = normalize_item(&it, "S", Utc::now()).unwrap_err();
        assert!(matches!(err, Error::InvalidItem(_)));
    }

    #[test]
    fn test_unsluggable_title_falls_back() {
        let it = item("!!!", "https://example.com/x");
        assert_eq!(normalize_item(&it, "S", Utc::now()).unwrap().slug, FALLBACK_SLUG);
    }
}
