use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Outcome of one scheduled job execution
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TaskStatus {
    Success,
    Error,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Success => "SUCCESS",
            TaskStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "SUCCESS" => Ok(TaskStatus::Success),
            "ERROR" => Ok(TaskStatus::Error),
            other => Err(crate::Error::Other(format!("unknown task status '{}'", other))),
        }
    }
}

/// Audit record of one scheduled job execution
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskLog {
    pub id: i64,
    pub task_name: String,
    pub status: TaskStatus,
    /// JSON document for successful runs, the error message otherwise
    pub details: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Data required to append a task log
#[derive(Debug, Clone)]
pub struct NewTaskLog {
    pub task_name: String,
    pub status: TaskStatus,
    pub details: Option<String>,
}

impl NewTaskLog {
    pub fn success(task_name: &str, details: &serde_json::Value) -> Self {
        Self {
            task_name: task_name.to_string(),
            status: TaskStatus::Success,
            details: Some(details.to_string()),
        }
    }

    pub fn error(task_name: &str, message: impl Into<String>) -> Self {
        Self {
            task_name: task_name.to_string(),
            status: TaskStatus::Error,
            details: Some(message.into()),
        }
    }
}
