use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};
use tokio::sync::watch;

use super::handlers;
use crate::feed::{FeedSource, FetchFeed};
use crate::storage::Database;
use crate::Result;

/// State shared by every request
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<Database>,
    pub fetcher: Arc<dyn FetchFeed>,
    /// Sources used when a trigger does not name any
    pub sources: Arc<Vec<FeedSource>>,
    pub default_limit: usize,
}

impl AppState {
    pub fn new(
        db: Arc<Database>,
        fetcher: Arc<dyn FetchFeed>,
        sources: Vec<FeedSource>,
        default_limit: usize,
    ) -> Self {
        Self {
            db,
            fetcher,
            sources: Arc::new(sources),
            default_limit,
        }
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(handlers::health))
        .route("/api/ingest", post(handlers::ingest_feeds))
        .route("/api/task-logs", get(handlers::list_task_logs))
        .with_state(state)
}

/// Serve the API on `addr` until `shutdown` flips to true
pub async fn serve(addr: SocketAddr, state: AppState, mut shutdown: watch::Receiver<bool>) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("HTTP API listening on {}", listener.local_addr()?);

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(async move {
            let _ = shutdown.wait_for(|stop| *stop).await;
        })
        .await?;

    tracing::info!("HTTP API stopped");
    Ok(())
}
