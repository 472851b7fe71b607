use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use super::database::is_unique_violation;
use super::Database;
use crate::blog::{BlogPost, NewBlogPost};
use crate::{Error, Result};

/// Inserts give up after this many slug/unique-constraint collisions
const MAX_INSERT_ATTEMPTS: u32 = 5;

/// Repository for blog posts
pub struct BlogPostRepository<'a> {
    db: &'a Database,
}

#[derive(FromRow)]
struct BlogPostRow {
    id: String,
    title: String,
    slug: String,
    body: String,
    is_show: i32,
    source: Option<String>,
    external_url: Option<String>,
    published_at: DateTime<Utc>,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<BlogPostRow> for BlogPost {
    fn from(row: BlogPostRow) -> Self {
        BlogPost {
            id: Uuid::parse_str(&row.id).unwrap_or_default(),
            title: row.title,
            slug: row.slug,
            body: row.body,
            is_show: row.is_show != 0,
            source: row.source,
            external_url: row.external_url,
            published_at: row.published_at,
            image_url: row.image_url,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const SELECT_COLUMNS: &str = r#"
    SELECT id, title, slug, body, is_show, source, external_url,
           published_at, image_url, created_at, updated_at
    FROM blog_posts
"#;

impl<'a> BlogPostRepository<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Insert or refresh a post keyed by its external URL.
    ///
    /// A known URL only gets `title`, `body` and `updated_at` rewritten; slug,
    /// source, publication date, image and visibility keep their first-seen
    /// values. An unknown URL is inserted with a slug made unique by suffix.
    pub async fn upsert_by_external_url(&self, draft: &NewBlogPost) -> Result<BlogPost> {
        if let Some(existing) = self.find_by_external_url(&draft.external_url).await? {
            return self.refresh_content(existing.id, draft).await;
        }

        for _ in 0..MAX_INSERT_ATTEMPTS {
            let slug = self.available_slug(&draft.slug).await?;

            match self.insert(draft, &slug).await {
                Ok(post) => return Ok(post),
                Err(Error::Database(e)) if is_unique_violation(&e) => {
                    // Lost a race: either the URL or the slug was taken meanwhile
                    if let Some(existing) = self.find_by_external_url(&draft.external_url).await? {
                        return self.refresh_content(existing.id, draft).await;
                    }
                    tracing::debug!("Slug '{}' taken concurrently, retrying", slug);
                }
                Err(e) => return Err(e),
            }
        }

        Err(Error::Other(format!(
            "could not allocate a unique slug for '{}'",
            draft.slug
        )))
    }

    async fn refresh_content(&self, id: Uuid, draft: &NewBlogPost) -> Result<BlogPost> {
        let now = Utc::now();

        sqlx::query(
            r#"
            UPDATE blog_posts
            SET title = ?, body = ?, updated_at = ?
            WHERE id = ?
            "#,
        )
        .bind(&draft.title)
        .bind(&draft.body)
        .bind(now)
        .bind(id.to_string())
        .execute(self.db.pool())
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| Error::PostNotFound(id.to_string()))
    }

    async fn insert(&self, draft: &NewBlogPost, slug: &str) -> Result<BlogPost> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO blog_posts
            (id, title, slug, body, is_show, source, external_url, published_at, image_url, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(id.to_string())
        .bind(&draft.title)
        .bind(slug)
        .bind(&draft.body)
        .bind(draft.is_show as i32)
        .bind(&draft.source)
        .bind(&draft.external_url)
        .bind(draft.published_at)
        .bind(&draft.image_url)
        .bind(now)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        self.find_by_id(id)
            .await?
            .ok_or_else(|| Error::PostNotFound(id.to_string()))
    }

    /// First of `base`, `base-2`, `base-3`, ... not used by any post
    async fn available_slug(&self, base: &str) -> Result<String> {
        if !self.slug_exists(base).await? {
            return Ok(base.to_string());
        }

        let mut n = 2u32;
        loop {
            let candidate = format!("{}-{}", base, n);
            if !self.slug_exists(&candidate).await? {
                return Ok(candidate);
            }
            n += 1;
        }
    }

    async fn slug_exists(&self, slug: &str) -> Result<bool> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM blog_posts WHERE slug = ?")
            .bind(slug)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.is_some())
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<BlogPost>> {
        let row: Option<BlogPostRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE id = ?"))
            .bind(id.to_string())
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(BlogPost::from))
    }

    pub async fn find_by_slug(&self, slug: &str) -> Result<Option<BlogPost>> {
        let row: Option<BlogPostRow> = sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE slug = ?"))
            .bind(slug)
            .fetch_optional(self.db.pool())
            .await?;

        Ok(row.map(BlogPost::from))
    }

    pub async fn find_by_external_url(&self, url: &str) -> Result<Option<BlogPost>> {
        let row: Option<BlogPostRow> =
            sqlx::query_as(&format!("{SELECT_COLUMNS} WHERE external_url = ?"))
                .bind(url)
                .fetch_optional(self.db.pool())
                .await?;

        Ok(row.map(BlogPost::from))
    }

    /// Most recently published posts first
    pub async fn list(&self, limit: u32, only_visible: bool) -> Result<Vec<BlogPost>> {
        let filter = if only_visible { "WHERE is_show = 1" } else { "" };
        let query = format!(
            "{SELECT_COLUMNS} {filter} ORDER BY published_at DESC, created_at DESC LIMIT ?"
        );

        let rows: Vec<BlogPostRow> = sqlx::query_as(&query)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await?;

        Ok(rows.into_iter().map(BlogPost::from).collect())
    }

    pub async fn count(&self) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM blog_posts")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u32)
    }
}
