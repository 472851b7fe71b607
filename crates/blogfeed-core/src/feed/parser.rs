use feed_rs::model::{Content, Entry, Link, MediaContent};
use feed_rs::parser;

use super::models::FeedItem;
use crate::{Error, Result};

/// Parsed feed data from RSS/Atom/JSON Feed content
#[derive(Debug, Clone)]
pub struct ParsedFeed {
    pub title: Option<String>,
    pub site_url: Option<String>,
    /// Entries in document order (feeds conventionally list newest first)
    pub items: Vec<FeedItem>,
}

/// Parse feed content into structured data
pub fn parse_feed(content: &[u8]) -> Result<ParsedFeed> {
    let feed = parser::parse(content).map_err(|e| Error::FeedParse(e.to_string()))?;

    let title = feed.title.map(|t| t.content);
    let site_url = feed.links.first().map(|l| l.href.clone());
    let items = feed.entries.into_iter().map(entry_to_item).collect();

    Ok(ParsedFeed {
        title,
        site_url,
        items,
    })
}

fn entry_to_item(entry: Entry) -> FeedItem {
    let (rich_content, content) = match entry.content {
        Some(c) if is_html(&c) => (c.body, None),
        Some(c) => (None, c.body),
        None => (None, None),
    };

    // Enclosures land in `media` too; only image entries count
    let media_content = entry
        .media
        .iter()
        .flat_map(|m| m.content.iter())
        .filter(|c| is_image(c))
        .filter_map(|c| c.url.as_ref().map(|u| u.to_string()))
        .collect();

    let media_thumbnails = entry
        .media
        .iter()
        .flat_map(|m| m.thumbnails.iter())
        .map(|t| t.image.uri.clone())
        .collect();

    FeedItem {
        title: entry.title.map(|t| t.content),
        link: canonical_link(&entry.links),
        rich_content,
        content,
        summary: entry.summary.map(|s| s.content),
        published: entry.published,
        media_content,
        media_thumbnails,
    }
}

fn is_html(content: &Content) -> bool {
    content.content_type.as_str().contains("html")
}

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp", "avif", "svg"];

fn is_image(media: &MediaContent) -> bool {
    match &media.content_type {
        Some(mime) => mime.as_str().starts_with("image/"),
        None => media.url.as_ref().is_some_and(|url| {
            url.path()
                .rsplit_once('.')
                .is_some_and(|(_, ext)| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        }),
    }
}

/// The `alternate` (or untyped) link, else whatever comes first.
///
/// Atom entries often list `replies` or `edit` links before the article.
fn canonical_link(links: &[Link]) -> Option<String> {
    links
        .iter()
        .find(|l| matches!(l.rel.as_deref(), None | Some("alternate")))
        .or_else(|| links.first())
        .map(|l| l.href.clone())
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"
     xmlns:content="http://purl.org/rss/1.0/modules/content/"
     xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Example Engineering</title>
    <link>https://example.com/</link>
    <description>Posts</description>
    <item>
      <title>Shipping faster builds</title>
      <link>https://example.com/posts/faster-builds</link>
      <guid>https://example.com/posts/faster-builds</guid>
      <description>A short summary</description>
      <content:encoded><![CDATA[<p>Full <b>body</b></p><img src="https://cdn.example.com/inline.png">]]></content:encoded>
      <pubDate>Tue, 02 Jan 2024 10:00:00 GMT</pubDate>
      <media:thumbnail url="https://cdn.example.com/thumb.jpg"/>
    </item>
    <item>
      <title>No extras</title>
      <link>https://example.com/posts/no-extras</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss_items() {
        let parsed = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(parsed.title.as_deref(), Some("Example Engineering"));
        assert_eq!(parsed.items.len(), 2);

        let first = &parsed.items[0];
        assert_eq!(first.title.as_deref(), Some("Shipping faster builds"));
        assert_eq!(first.link.as_deref(), Some("https://example.com/posts/faster-builds"));
        assert!(first.rich_content.as_deref().unwrap().contains("<b>body</b>"));
        assert_eq!(first.summary.as_deref(), Some("A short summary"));
        assert!(first.published.is_some());
        assert_eq!(first.media_thumbnails, vec!["https://cdn.example.com/thumb.jpg"]);

        let second = &parsed.items[1];
        assert!(second.rich_content.is_none());
        assert!(second.summary.is_none());
        assert!(second.published.is_none());
        assert!(second.media_content.is_empty());
    }

    #[test]
    fn test_parse_atom_text_content() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <id>urn:example</id>
  <updated>2024-03-01T00:00:00Z</updated>
  <entry>
    <title>Plain entry</title>
    <id>urn:example:1</id>
    <link href="https://example.com/atom/1"/>
    <updated>2024-03-01T00:00:00Z</updated>
    <published>2024-02-28T12:00:00Z</published>
    <content type="text">Just text</content>
  </entry>
</feed>"#;

        let parsed = parse_feed(atom.as_bytes()).unwrap();
        let item = &parsed.items[0];
        assert_eq!(item.content.as_deref(), Some("Just text"));
        assert!(item.rich_content.is_none());
        assert_eq!(item.link.as_deref(), Some("https://example.com/atom/1"));
    }

    #[test]
    fn test_parse_atom_html_content() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Atom Example</title>
  <id>urn:example</id>
  <updated>2024-03-01T00:00:00Z</updated>
  <entry>
    <title>Rich entry</title>
    <id>urn:example:2</id>
    <link href="https://example.com/atom/2"/>
    <updated>2024-03-01T00:00:00Z</updated>
    <content type="html">&lt;p&gt;Hello &lt;em&gt;there&lt;/em&gt;&lt;/p&gt;</content>
  </entry>
</feed>"#;

        let parsed = parse_feed(atom.as_bytes()).unwrap();
        let item = &parsed.items[0];
        assert!(item.rich_content.as_deref().unwrap().contains("<em>there</em>"));
        assert!(item.content.is_none());
    }

    #[test]
    fn test_audio_enclosure_is_not_an_image() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Podcast</title>
    <link>https://pod.example.com/</link>
    <description>Episodes</description>
    <item>
      <title>Episode 1</title>
      <link>https://pod.example.com/ep1</link>
      <enclosure url="https://cdn.example.com/ep1.mp3" length="1000" type="audio/mpeg"/>
      <media:thumbnail url="https://cdn.example.com/thumb.jpg"/>
      <media:content url="https://cdn.example.com/cover.png" medium="image"/>
    </item>
  </channel>
</rss>"#;

        let parsed = parse_feed(rss.as_bytes()).unwrap();
        let item = &parsed.items[0];
        assert!(!item.media_content.iter().any(|u| u.ends_with(".mp3")));
        assert_eq!(item.media_content, vec!["https://cdn.example.com/cover.png"]);
        assert_eq!(item.media_thumbnails, vec!["https://cdn.example.com/thumb.jpg"]);
    }

    #[test]
    fn test_enclosure_only_falls_back_to_thumbnail() {
        let rss = r#"<?xml version="1.0"?>
<rss version="2.0" xmlns:media="http://search.yahoo.com/mrss/">
  <channel>
    <title>Podcast</title>
    <link>https://pod.example.com/</link>
    <description>Episodes</description>
    <item>
      <title>Episode 2</title>
      <link>https://pod.example.com/ep2</link>
      <enclosure url="https://cdn.example.com/ep2.mp3" length="1000" type="audio/mpeg"/>
      <media:thumbnail url="https://cdn.example.com/thumb2.jpg"/>
    </item>
  </channel>
</rss>"#;

        let parsed = parse_feed(rss.as_bytes()).unwrap();
        let item = &parsed.items[0];
        assert!(item.media_content.is_empty());

        let post = crate::blog::normalize_item(item, "Podcast", chrono::Utc::now()).unwrap();
        assert_eq!(post.image_url.as_deref(), Some("https://cdn.example.com/thumb2.jpg"));
    }

    #[test]
    fn test_atom_prefers_alternate_link() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Blogger Example</title>
  <id>urn:blogger</id>
  <updated>2024-03-01T00:00:00Z</updated>
  <entry>
    <title>A post</title>
    <id>urn:blogger:1</id>
    <updated>2024-03-01T00:00:00Z</updated>
    <link rel="replies" type="text/html" href="https://b.example/post#comments"/>
    <link rel="edit" type="application/atom+xml" href="https://b.example/feeds/posts/1"/>
    <link rel="alternate" type="text/html" href="https://b.example/post"/>
  </entry>
</feed>"#;

        let parsed = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(parsed.items[0].link.as_deref(), Some("https://b.example/post"));
    }

    #[test]
    fn test_link_without_alternate_uses_first() {
        let atom = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>Odd Example</title>
  <id>urn:odd</id>
  <updated>2024-03-01T00:00:00Z</updated>
  <entry>
    <title>Only side links</title>
    <id>urn:odd:1</id>
    <updated>2024-03-01T00:00:00Z</updated>
    <link rel="replies" href="https://b.example/other#comments"/>
    <link rel="edit" href="https://b.example/feeds/posts/2"/>
  </entry>
</feed>"#;

        let parsed = parse_feed(atom.as_bytes()).unwrap();
        assert_eq!(
            parsed.items[0].link.as_deref(),
            Some("https://b.example/other#comments")
        );
        assert_eq!(canonical_link(&[]), None);
    }

    #[test]
    fn test_garbage_is_parse_error() {
        let err = parse_feed(b"<html><body>not a feed</body></html>").unwrap_err();
        assert!(matches!(err, Error::FeedParse(_)));
    }
}
