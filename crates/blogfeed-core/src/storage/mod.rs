mod api_key_repo;
mod database;
mod models;
mod post_repo;
mod task_log_repo;

pub use api_key_repo::ApiKeyRepository;
pub use database::Database;
pub use models::ApiKey;
pub use post_repo::BlogPostRepository;
pub use task_log_repo::TaskLogRepository;
