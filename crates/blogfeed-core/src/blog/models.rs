use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A blog post as stored in the database
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BlogPost {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
    pub body: String,
    pub is_show: bool,
    /// Name of the feed source the post was ingested from
    pub source: Option<String>,
    /// Original article URL; identifies ingested posts for upsert
    pub external_url: Option<String>,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Data required to create a blog post from a feed item
#[derive(Debug, Clone, PartialEq)]
pub struct NewBlogPost {
    pub title: String,
    pub slug: String,
    pub body: String,
    pub is_show: bool,
    pub source: String,
    pub external_url: String,
    pub published_at: DateTime<Utc>,
    pub image_url: Option<String>,
}
