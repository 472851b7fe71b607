use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::schedule::Schedule;
use crate::config::AppConfig;
use crate::feed::{FeedFetcher, FeedSource, FetchFeed};
use crate::ingest::process_feeds;
use crate::storage::{Database, TaskLogRepository};
use crate::Result;

pub const FEED_INGEST_TASK: &str = "FeedIngest";
pub const TASK_LOG_CLEANUP_TASK: &str = "TaskLogCleanup";

/// A unit of work fired by the scheduler
#[async_trait]
pub trait ScheduledJob: Send + Sync {
    fn name(&self) -> &'static str;

    fn schedule(&self) -> Schedule;

    /// Run once. The returned JSON becomes the task log details.
    async fn execute(&self, now: DateTime<Utc>) -> Result<serde_json::Value>;
}

/// Daily ingestion of the configured feed sources into blog posts
pub struct FeedIngestJob {
    db: Arc<Database>,
    fetcher: Arc<dyn FetchFeed>,
    sources: Vec<FeedSource>,
    limit: usize,
    schedule: Schedule,
}

impl FeedIngestJob {
    pub fn new(
        db: Arc<Database>,
        fetcher: Arc<dyn FetchFeed>,
        sources: Vec<FeedSource>,
        limit: usize,
        schedule: Schedule,
    ) -> Self {
        Self {
            db,
            fetcher,
            sources,
            limit,
            schedule,
        }
    }

    pub fn from_config(db: Arc<Database>, config: &AppConfig) -> Result<Self> {
        let fetcher = FeedFetcher::new(&config.fetch)?;
        Ok(Self::new(
            db,
            Arc::new(fetcher),
            config.sources.clone(),
            config.fetch.item_limit,
            Schedule::daily(&config.schedule.ingest_at)?,
        ))
    }

    /// Override how many items are taken from each feed
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }
}

#[async_trait]
impl ScheduledJob for FeedIngestJob {
    fn name(&self) -> &'static str {
        FEED_INGEST_TASK
    }

    fn schedule(&self) -> Schedule {
        self.schedule
    }

    async fn execute(&self, _now: DateTime<Utc>) -> Result<serde_json::Value> {
        let result = process_feeds(self.fetcher.as_ref(), &self.db, &self.sources, self.limit).await;

        tracing::info!(
            "Feed ingestion finished: {} processed, {} successful, {} failed",
            result.total_processed,
            result.successful,
            result.failed
        );

        Ok(result.summary())
    }
}

/// Weekly purge of task logs past the retention window
pub struct TaskLogCleanupJob {
    db: Arc<Database>,
    retention_days: u32,
    schedule: Schedule,
}

impl TaskLogCleanupJob {
    pub fn new(db: Arc<Database>, retention_days: u32, schedule: Schedule) -> Self {
        Self {
            db,
            retention_days,
            schedule,
        }
    }

    pub fn from_config(db: Arc<Database>, config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            db,
            config.schedule.task_log_retention_days,
            Schedule::weekly(&config.schedule.cleanup_weekday, &config.schedule.cleanup_at)?,
        ))
    }
}

#[async_trait]
impl ScheduledJob for TaskLogCleanupJob {
    fn name(&self) -> &'static str {
        TASK_LOG_CLEANUP_TASK
    }

    fn schedule(&self) -> Schedule {
        self.schedule
    }

    async fn execute(&self, now: DateTime<Utc>) -> Result<serde_json::Value> {
        let deleted = TaskLogRepository::new(&self.db)
            .cleanup(self.retention_days, now)
            .await?;

        if deleted > 0 {
            tracing::info!("Cleaned up {} old task logs", deleted);
        }

        Ok(serde_json::json!({
            "deleted": deleted,
            "retentionDays": self.retention_days,
        }))
    }
}
