use std::sync::Arc;

use anyhow::Result;

use blogfeed_core::{
    ingest::BatchResult,
    scheduler::{execute_and_record, FeedIngestJob, SystemClock, TaskStatus},
    storage::Database,
    AppConfig,
};

pub async fn run(db: Arc<Database>, config: &AppConfig, limit: Option<usize>) -> Result<()> {
    let limit = limit.unwrap_or(config.fetch.item_limit);
    let job = FeedIngestJob::from_config(db.clone(), config)?.with_limit(limit);

    println!(
        "Ingesting {} sources (up to {} items each)...",
        config.active_sources().count(),
        limit
    );

    let log = execute_and_record(Arc::new(job), &db, &SystemClock).await?;
    let details = log.details.unwrap_or_default();

    if log.status == TaskStatus::Error {
        anyhow::bail!("ingest failed: {}", details);
    }

    let result: BatchResult = serde_json::from_str(&details)?;
    println!(
        "Processed {}: {} successful, {} failed.",
        result.total_processed, result.successful, result.failed
    );
    if !result.errors.is_empty() {
        println!("\nErrors:");
        for e in &result.errors {
            println!("  [{}] {}", e.feed, e.error);
        }
    }

    Ok(())
}
