use anyhow::Result;

use blogfeed_core::storage::{BlogPostRepository, Database};

pub async fn run(db: &Database, limit: u32) -> Result<()> {
    let repo = BlogPostRepository::new(db);
    let posts = repo.list(limit, false).await?;

    if posts.is_empty() {
        println!("No blog posts yet. Run `blogfeed ingest` to import some.");
        return Ok(());
    }

    println!("Blog posts ({} of {}):\n", posts.len(), repo.count().await?);

    for post in &posts {
        let hidden = if post.is_show { "" } else { " [hidden]" };
        println!("  {}{}", post.title, hidden);
        println!(
            "    /{}  {}  {}",
            post.slug,
            post.published_at.format("%Y-%m-%d %H:%M"),
            post.source.as_deref().unwrap_or("-")
        );
        if let Some(url) = &post.external_url {
            println!("    {}", url);
        }
    }

    Ok(())
}
