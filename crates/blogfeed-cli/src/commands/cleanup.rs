use std::sync::Arc;

use anyhow::Result;

use blogfeed_core::{
    scheduler::{execute_and_record, SystemClock, TaskLogCleanupJob, TaskStatus},
    storage::Database,
    AppConfig,
};

pub async fn run(db: Arc<Database>, config: &AppConfig) -> Result<()> {
    println!(
        "Cleaning up task logs older than {} days...",
        config.schedule.task_log_retention_days
    );

    let job = TaskLogCleanupJob::from_config(db.clone(), config)?;
    let log = execute_and_record(Arc::new(job), &db, &SystemClock).await?;

    match log.status {
        TaskStatus::Success => println!("Done: {}", log.details.unwrap_or_default()),
        TaskStatus::Error => {
            anyhow::bail!("cleanup failed: {}", log.details.unwrap_or_default())
        }
    }

    Ok(())
}
