use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::Database;
use super::models::ApiKey;
use crate::{Error, Result};

const KEY_PREFIX: &str = "bf_";

/// Repository for API keys guarding the HTTP trigger endpoint
pub struct ApiKeyRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct ApiKeyRow {
    id: String,
    name: String,
    key: String,
    created_at: DateTime<Utc>,
    last_used_at: Option<DateTime<Utc>>,
    revoked_at: Option<DateTime<Utc>>,
}

impl From<ApiKeyRow> for ApiKey {
    fn from(row: ApiKeyRow) -> Self {
        ApiKey {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            name: row.name,
            key: row.key,
            created_at: row.created_at,
            last_used_at: row.last_used_at,
            revoked_at: row.revoked_at,
        }
    }
}

fn generate_key() -> String {
    format!("{}{}", KEY_PREFIX, Uuid::new_v4().simple())
}

impl<'a> ApiKeyRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Issue a new key labelled `name`
    pub async fn issue(&self, name: &str) -> Result<ApiKey> {
        let id = Uuid::new_v4();
        let key = generate_key();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO api_keys (id, name, key, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(name)
        .bind(&key)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        tracing::info!("Issued API key '{}' ({})", name, id);

        Ok(ApiKey {
            id,
            name: name.to_string(),
            key,
            created_at: now,
            last_used_at: None,
            revoked_at: None,
        })
    }

    pub async fn list(&self) -> Result<Vec<ApiKey>> {
        let rows: Vec<ApiKeyRow> = sqlx::query_as(
            r#"
            SELECT id, name, key, created_at, last_used_at, revoked_at
            FROM api_keys
            ORDER BY created_at ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(ApiKey::from).collect())
    }

    /// Revoke a key. Returns false when no active key has this id.
    pub async fn revoke(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE api_keys SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL",
        )
        .bind(Utc::now())
        .bind(id.to_string())
        .execute(self.db.pool())
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Resolve a presented key to an active API key and record its use
    pub async fn authenticate(&self, presented: &str) -> Result<ApiKey> {
        let row: Option<ApiKeyRow> = sqlx::query_as(
            r#"
            SELECT id, name, key, created_at, last_used_at, revoked_at
            FROM api_keys
            WHERE key = ? AND revoked_at IS NULL
            "#,
        )
        .bind(presented)
        .fetch_optional(self.db.pool())
        .await?;

        let mut api_key = row.map(ApiKey::from).ok_or(Error::Unauthorized)?;
        let now = Utc::now();

        sqlx::query("UPDATE api_keys SET last_used_at = ? WHERE id = ?")
            .bind(now)
            .bind(api_key.id.to_string())
            .execute(self.db.pool())
            .await?;

        api_key.last_used_at = Some(now);
        Ok(api_key)
    }
}
