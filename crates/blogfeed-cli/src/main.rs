use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use blogfeed_core::{storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "blogfeed")]
#[command(author, version, about = "RSS-to-blog ingestion daemon and admin tools")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a default configuration file
    Init,
    /// Run the scheduler and the HTTP API until Ctrl+C
    Serve,
    /// Ingest all configured feeds once
    Ingest {
        /// Items taken from the head of each feed
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Delete task logs past the retention window
    Cleanup,
    /// List configured feed sources
    Sources,
    /// List stored blog posts
    Posts {
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
    },
    /// Show recent task logs
    Logs {
        #[arg(short, long, default_value_t = 20)]
        limit: u32,
        /// Only show logs of this task
        #[arg(short, long)]
        task: Option<String>,
    },
    /// Manage API keys for the HTTP trigger
    ApiKey {
        #[command(subcommand)]
        action: ApiKeyAction,
    },
}

#[derive(Subcommand)]
enum ApiKeyAction {
    /// Issue a new key
    Issue {
        #[arg(short, long)]
        name: String,
    },
    /// List keys
    List,
    /// Revoke a key by id
    Revoke { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(AppConfig::config_path);
    let config = Arc::new(AppConfig::load_from(&config_path)?);

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    match cli.command {
        Commands::Init => commands::init::run(&config_path),
        Commands::Sources => commands::sources::run(&config, &config_path),
        command => run_with_database(command, config).await,
    }
}

async fn run_with_database(command: Commands, config: Arc<AppConfig>) -> Result<()> {
    let db = Arc::new(Database::new(&config).await?);

    match command {
        Commands::Serve => commands::serve::run(db, config).await,
        Commands::Ingest { limit } => commands::ingest::run(db, &config, limit).await,
        Commands::Cleanup => commands::cleanup::run(db, &config).await,
        Commands::Posts { limit } => commands::posts::run(&db, limit).await,
        Commands::Logs { limit, task } => commands::logs::run(&db, limit, task.as_deref()).await,
        Commands::ApiKey { action } => match action {
            ApiKeyAction::Issue { name } => commands::api_key::issue(&db, &name).await,
            ApiKeyAction::List => commands::api_key::list(&db).await,
            ApiKeyAction::Revoke { id } => commands::api_key::revoke(&db, &id).await,
        },
        Commands::Init | Commands::Sources => Ok(()),
    }
}
