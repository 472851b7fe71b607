mod fetcher;
mod models;
mod parser;

pub use fetcher::{FeedFetcher, FetchFeed};
pub use models::{FeedItem, FeedSource};
pub use parser::{parse_feed, ParsedFeed};
