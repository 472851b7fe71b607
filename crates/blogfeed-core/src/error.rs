use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Failed to fetch feed {url}: {message}")]
    Fetch { url: String, message: String },

    #[error("Feed parsing error: {0}")]
    FeedParse(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid feed item: {0}")]
    InvalidItem(String),

    #[error("Blog post not found: {0}")]
    PostNotFound(String),

    #[error("Missing or invalid API key")]
    Unauthorized,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Wrap any failure that happened while retrieving or parsing `url`.
    pub fn fetch(url: &str, cause: impl std::fmt::Display) -> Self {
        Error::Fetch {
            url: url.to_string(),
            message: cause.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
