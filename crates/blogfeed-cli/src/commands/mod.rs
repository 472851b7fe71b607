pub mod api_key;
pub mod cleanup;
pub mod ingest;
pub mod init;
pub mod logs;
pub mod posts;
pub mod serve;
pub mod sources;
