use anyhow::Result;

use blogfeed_core::storage::{Database, TaskLogRepository};

pub async fn run(db: &Database, limit: u32, task: Option<&str>) -> Result<()> {
    let logs = TaskLogRepository::new(db).list_recent(limit, task).await?;

    if logs.is_empty() {
        println!("No task logs.");
        return Ok(());
    }

    for log in &logs {
        println!(
            "{}  {:<15} {:<7} {}",
            log.created_at.with_timezone(&chrono::Local).format("%Y-%m-%d %H:%M:%S"),
            log.task_name,
            log.status.as_str(),
            log.details.as_deref().unwrap_or("")
        );
    }

    Ok(())
}
