use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, USER_AGENT};
use reqwest::{Client, Proxy};
use url::Url;

use super::parser::{parse_feed, ParsedFeed};
use crate::config::FetchConfig;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;

// Rotating User-Agent pool; some feed hosts reject non-browser agents
static USER_AGENT_INDEX: AtomicUsize = AtomicUsize::new(0);
const USER_AGENTS: &[&str] = &[
    // Chrome on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Chrome on Windows
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    // Firefox on macOS
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10.15; rv:121.0) Gecko/20100101 Firefox/121.0",
];

/// Get the next User-Agent in rotation
fn next_user_agent() -> &'static str {
    let index = USER_AGENT_INDEX.fetch_add(1, Ordering::Relaxed) % USER_AGENTS.len();
    USER_AGENTS[index]
}

/// Source of parsed feeds. The batch processor only depends on this trait.
#[async_trait]
pub trait FetchFeed: Send + Sync {
    /// Retrieve and parse the feed at `url`.
    ///
    /// Any network, status, size or parse failure is reported as
    /// [`Error::Fetch`] wrapping the underlying cause. No retry is attempted.
    async fn fetch(&self, url: &str) -> Result<ParsedFeed>;
}

/// HTTP feed fetcher
pub struct FeedFetcher {
    client: Client,
}

impl FeedFetcher {
    /// Create a new feed fetcher with configuration
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let client = Self::build_client(config.request_timeout_secs, &config.proxy_url)?;
        Ok(Self { client })
    }

    /// Build HTTP client with optional proxy
    fn build_client(timeout_secs: u64, proxy_url: &Option<String>) -> Result<Client> {
        let mut builder = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .gzip(true)
            .deflate(true)
            .brotli(true)
            .redirect(reqwest::redirect::Policy::limited(10));

        if let Some(ref proxy) = proxy_url {
            let proxy = Proxy::all(proxy)
                .map_err(|e| Error::Config(format!("Invalid proxy URL: {}", e)))?;
            builder = builder.proxy(proxy);
            tracing::info!("Using HTTP proxy for feed fetching");
        }

        Ok(builder.build()?)
    }

    fn build_headers(user_agent: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            ACCEPT,
            HeaderValue::from_static(
                "application/rss+xml,application/atom+xml,application/feed+json,application/xml;q=0.9,*/*;q=0.8",
            ),
        );
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
        headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("gzip, deflate, br"));
        if let Ok(ua) = HeaderValue::from_str(user_agent) {
            headers.insert(USER_AGENT, ua);
        }
        headers
    }

    /// Only absolute http(s) URLs are fetched
    fn validate_url(url: &str) -> Result<Url> {
        let parsed = Url::parse(url)?;
        match parsed.scheme() {
            "http" | "https" => Ok(parsed),
            other => Err(Error::fetch(url, format!("unsupported URL scheme '{}'", other))),
        }
    }

    async fn fetch_bytes(&self, url: &Url) -> std::result::Result<Bytes, String> {
        let response = self
            .client
            .get(url.clone())
            .headers(Self::build_headers(next_user_agent()))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {}", status));
        }

        let bytes = response.bytes().await.map_err(|e| e.to_string())?;
        ensure_content_size(bytes.len())?;
        Ok(bytes)
    }
}

#[async_trait]
impl FetchFeed for FeedFetcher {
    async fn fetch(&self, url: &str) -> Result<ParsedFeed> {
        let parsed_url = Self::validate_url(url).map_err(|e| match e {
            Error::Fetch { .. } => e,
            other => Error::fetch(url, other),
        })?;

        tracing::info!("Fetching feed from: {}", url);

        let content = self
            .fetch_bytes(&parsed_url)
            .await
            .map_err(|message| Error::Fetch {
                url: url.to_string(),
                message,
            })?;

        parse_feed(&content).map_err(|e| Error::fetch(url, e))
    }
}

fn ensure_content_size(size: usize) -> std::result::Result<(), String> {
    if size > MAX_FEED_BYTES {
        return Err(format!("feed too large ({} bytes)", size));
    }
    Ok(())
}
