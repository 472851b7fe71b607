use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::sync::watch;
use tracing::info;

use blogfeed_core::{
    api::{self, AppState},
    feed::FeedFetcher,
    scheduler::{FeedIngestJob, SchedulerService, TaskLogCleanupJob},
    storage::Database,
    AppConfig,
};

/// Run the scheduler and HTTP API until Ctrl+C
pub async fn run(db: Arc<Database>, config: Arc<AppConfig>) -> Result<()> {
    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("invalid bind address '{}'", config.server.bind_addr))?;

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let shutdown_tx_clone = shutdown_tx.clone();
    tokio::spawn(async move {
        tokio::signal::ctrl_c().await.ok();
        info!("Received shutdown signal");
        let _ = shutdown_tx_clone.send(true);
    });

    let scheduler = if config.schedule.enabled {
        let service = SchedulerService::new(db.clone())
            .with_job(FeedIngestJob::from_config(db.clone(), &config)?)
            .with_job(TaskLogCleanupJob::from_config(db.clone(), &config)?);
        println!(
            "  Feed ingest: daily at {} ({} active sources)",
            config.schedule.ingest_at,
            config.active_sources().count()
        );
        println!(
            "  Task log cleanup: every {} at {} (keeping {} days)",
            config.schedule.cleanup_weekday,
            config.schedule.cleanup_at,
            config.schedule.task_log_retention_days
        );
        Some(service.start())
    } else {
        println!("  Scheduler disabled");
        None
    };

    let state = AppState::new(
        db.clone(),
        Arc::new(FeedFetcher::new(&config.fetch)?),
        config.sources.clone(),
        config.fetch.item_limit,
    );

    println!("blogfeed serving on http://{}. Press Ctrl+C to stop.", addr);

    let served = api::serve(addr, state, shutdown_rx).await;

    // The server also returns on bind failure; make sure the timers stop too
    let _ = shutdown_tx.send(true);
    if let Some(handle) = scheduler {
        handle.stop().await;
    }

    served?;
    println!("Stopped.");
    Ok(())
}
