use anyhow::{Context, Result};
use uuid::Uuid;

use blogfeed_core::storage::{ApiKeyRepository, Database};

pub async fn issue(db: &Database, name: &str) -> Result<()> {
    let key = ApiKeyRepository::new(db).issue(name).await?;

    println!("Issued API key '{}' ({})", key.name, key.id);
    println!("\n  {}\n", key.key);
    println!("Send it as `Authorization: Bearer <key>`. It will not be shown in full again.");

    Ok(())
}

pub async fn list(db: &Database) -> Result<()> {
    let keys = ApiKeyRepository::new(db).list().await?;

    if keys.is_empty() {
        println!("No API keys. Create one with `blogfeed api-key issue --name <label>`.");
        return Ok(());
    }

    for key in &keys {
        let state = if key.is_active() { "active" } else { "revoked" };
        let last_used = key
            .last_used_at
            .map(|t| t.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| "never".to_string());
        println!("  {}  {:<20} {:<8} {}  last used: {}", key.id, key.name, state, key.masked(), last_used);
    }

    Ok(())
}

pub async fn revoke(db: &Database, id: &str) -> Result<()> {
    let id = Uuid::parse_str(id).with_context(|| format!("'{}' is not a valid key id", id))?;

    if ApiKeyRepository::new(db).revoke(id).await? {
        println!("Revoked API key {}", id);
    } else {
        println!("No active API key with id {}", id);
    }

    Ok(())
}
