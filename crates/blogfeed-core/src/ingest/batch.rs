use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::blog::{normalize_item, BlogPost};
use crate::feed::{FeedItem, FeedSource, FetchFeed};
use crate::storage::{BlogPostRepository, Database};
use crate::Result;

/// One recorded failure, attributed to the feed it happened in
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    pub feed: String,
    pub error: String,
}

/// Aggregate outcome of one pass over the feed sources
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchResult {
    /// Items attempted across all fetched feeds
    pub total_processed: u32,
    pub successful: u32,
    /// Failed items plus failed feed fetches
    pub failed: u32,
    pub errors: Vec<BatchError>,
    /// Absent from task log summaries
    #[serde(default)]
    pub posts: Vec<BlogPost>,
}

impl BatchResult {
    fn record_failure(&mut self, feed: &str, error: impl ToString) {
        self.failed += 1;
        self.errors.push(BatchError {
            feed: feed.to_string(),
            error: error.to_string(),
        });
    }

    /// Summary without the written rows, used for task log details
    pub fn summary(&self) -> serde_json::Value {
        serde_json::json!({
            "totalProcessed": self.total_processed,
            "successful": self.successful,
            "failed": self.failed,
            "errors": self.errors,
        })
    }
}

/// Run Fetch -> Normalize -> Write over every active source, in order.
///
/// At most `limit` items are taken from the head of each feed. Failures of a
/// single feed or item are logged and counted; they never stop the batch.
pub async fn process_feeds(
    fetcher: &dyn FetchFeed,
    db: &Database,
    sources: &[FeedSource],
    limit: usize,
) -> BatchResult {
    let repo = BlogPostRepository::new(db);
    let mut result = BatchResult::default();

    for source in sources {
        if !source.active {
            tracing::debug!("Skipping inactive feed '{}'", source.name);
            continue;
        }

        tracing::info!("Processing feed '{}'", source.name);

        let parsed = match fetcher.fetch(&source.url).await {
            Ok(parsed) => parsed,
            Err(e) => {
                tracing::error!("Failed to fetch feed '{}': {}", source.name, e);
                result.record_failure(&source.name, e);
                continue;
            }
        };

        let mut feed_successes = 0u32;
        for item in parsed.items.iter().take(limit) {
            result.total_processed += 1;

            match ingest_item(&repo, item, &source.name).await {
                Ok(post) => {
                    result.successful += 1;
                    feed_successes += 1;
                    result.posts.push(post);
                }
                Err(e) => {
                    let label = item
                        .link
                        .as_deref()
                        .or(item.title.as_deref())
                        .unwrap_or("(unknown item)");
                    tracing::warn!("Failed to ingest '{}' from '{}': {}", label, source.name, e);
                    result.record_failure(&source.name, format!("{}: {}", label, e));
                }
            }
        }

        tracing::info!("Feed '{}': {} posts written", source.name, feed_successes);
    }

    result
}

async fn ingest_item(repo: &BlogPostRepository<'_>, item: &FeedItem, source: &str) -> Result<BlogPost> {
    let draft = normalize_item(item, source, Utc::now())?;
    repo.upsert_by_external_url(&draft).await
}
