mod models;
mod schedule;
mod service;
mod tasks;

pub use models::{NewTaskLog, TaskLog, TaskStatus};
pub use schedule::{Clock, Schedule, SystemClock};
pub use service::{execute_and_record, JobRun, SchedulerHandle, SchedulerService};
pub use tasks::{FeedIngestJob, ScheduledJob, TaskLogCleanupJob, FEED_INGEST_TASK, TASK_LOG_CLEANUP_TASK};
