pub mod api;
pub mod blog;
pub mod config;
pub mod error;
pub mod feed;
pub mod ingest;
pub mod scheduler;
pub mod storage;

pub use config::AppConfig;
pub use error::{Error, Result};
