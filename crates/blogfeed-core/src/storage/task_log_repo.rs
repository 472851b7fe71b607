use chrono::{DateTime, Duration, Utc};
use sqlx::FromRow;

use super::Database;
use crate::scheduler::{NewTaskLog, TaskLog, TaskStatus};
use crate::Result;

/// Repository for the append-only task log
pub struct TaskLogRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct TaskLogRow {
    id: i64,
    task_name: String,
    status: String,
    details: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<TaskLogRow> for TaskLog {
    fn from(row: TaskLogRow) -> Self {
        TaskLog {
            id: row.id,
            task_name: row.task_name,
            status: row.status.parse().unwrap_or(TaskStatus::Error),
            details: row.details,
            created_at: row.created_at,
        }
    }
}

impl<'a> TaskLogRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Append a task log stamped with the current time
    pub async fn create(&self, log: &NewTaskLog) -> Result<TaskLog> {
        self.create_at(log, Utc::now()).await
    }

    pub(crate) async fn create_at(&self, log: &NewTaskLog, created_at: DateTime<Utc>) -> Result<TaskLog> {
        let result = sqlx::query(
            r#"
            INSERT INTO task_logs (task_name, status, details, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&log.task_name)
        .bind(log.status.as_str())
        .bind(&log.details)
        .bind(created_at)
        .execute(self.db.pool())
        .await?;

        Ok(TaskLog {
            id: result.last_insert_rowid(),
            task_name: log.task_name.clone(),
            status: log.status,
            details: log.details.clone(),
            created_at,
        })
    }

    /// Most recent logs first, optionally for one task
    pub async fn list_recent(&self, limit: u32, task_name: Option<&str>) -> Result<Vec<TaskLog>> {
        let rows: Vec<TaskLogRow> = if let Some(name) = task_name {
            sqlx::query_as(
                r#"
                SELECT id, task_name, status, details, created_at
                FROM task_logs
                WHERE task_name = ?
                ORDER BY created_at DESC, id DESC
                LIMIT ?
                "#,
            )
            .bind(name)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?
        } else {
            sqlx::query_as(
                r#"
                SELECT id, task_name, status, details, created_at
                FROM task_logs
                ORDER BY created_at DESC, id DESC
                LIMIT ?
                "#,
            )
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?
        };

        Ok(rows.into_iter().map(TaskLog::from).collect())
    }

    /// Delete logs created before `cutoff`
    pub async fn delete_older_than(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM task_logs WHERE created_at < ?")
            .bind(cutoff)
            .execute(self.db.pool())
            .await?;

        Ok(result.rows_affected())
    }

    /// Delete logs older than the retention window, measured from `now`
    pub async fn cleanup(&self, retention_days: u32, now: DateTime<Utc>) -> Result<u64> {
        let cutoff = now - Duration::days(retention_days as i64);
        self.delete_older_than(cutoff).await
    }

    pub async fn count(&self) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM task_logs")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u32)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_and_list() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = TaskLogRepository::new(&db);

        repo.create(&NewTaskLog::success("FeedIngest", &serde_json::json!({"ok": true})))
            .await
            .unwrap();
        repo.create(&NewTaskLog::error("TaskLogCleanup", "disk full"))
            .await
            .unwrap();

        let all = repo.list_recent(10, None).await.unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].task_name, "TaskLogCleanup");
        assert_eq!(all[0].status, TaskStatus::Error);

        let ingest = repo.list_recent(10, Some("FeedIngest")).await.unwrap();
        assert_eq!(ingest.len(), 1);
        assert_eq!(ingest[0].status, TaskStatus::Success);
    }

    #[tokio::test]
    async fn test_cleanup_boundary() {
        let db = Database::new_in_memory().await.unwrap();
        let repo = TaskLogRepository::new(&db);
        let now = Utc::now();
        let log = NewTaskLog::success("FeedIngest", &serde_json::json!({}));

        let expired = repo
            .create_at(&log, now - Duration::days(30) - Duration::seconds(1))
            .await
            .unwrap();
        let recent = repo.create_at(&log, now - Duration::days(29)).await.unwrap();

        let deleted = repo.cleanup(30, now).await.unwrap();
        assert_eq!(deleted, 1);

        let remaining = repo.list_recent(10, None).await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, recent.id);
        assert_ne!(remaining[0].id, expired.id);
    }
}
