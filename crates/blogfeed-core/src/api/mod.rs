mod error;
mod handlers;
mod models;
mod server;

pub use error::{ApiError, ApiResult};
pub use models::{IngestQuery, LogsQuery};
pub use server::{create_router, serve, AppState};
