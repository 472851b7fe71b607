use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Credential allowed to call the authenticated HTTP endpoints
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiKey {
    pub id: Uuid,
    pub name: String,
    pub key: String,
    pub created_at: DateTime<Utc>,
    pub last_used_at: Option<DateTime<Utc>>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl ApiKey {
    pub fn is_active(&self) -> bool {
        self.revoked_at.is_none()
    }

    /// Key with everything but the prefix and last four characters hidden
    pub fn masked(&self) -> String {
        let tail_start = self.key.len().saturating_sub(4);
        let prefix_len = self.key.find('_').map(|i| i + 1).unwrap_or(0).min(tail_start);
        format!(
            "{}{}{}",
            &self.key[..prefix_len],
            "*".repeat(tail_start - prefix_len),
            &self.key[tail_start..]
        )
    }
}
