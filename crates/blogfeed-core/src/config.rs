use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::feed::FeedSource;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
    #[serde(default)]
    pub server: ServerConfig,
    /// Feed sources ingested by the scheduled job
    #[serde(default = "default_sources")]
    pub sources: Vec<FeedSource>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            fetch: FetchConfig::default(),
            schedule: ScheduleConfig::default(),
            server: ServerConfig::default(),
            sources: default_sources(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Data directory path
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
    /// Log level used when RUST_LOG is not set
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: default_log_level(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Request timeout in seconds
    #[serde(default = "default_timeout")]
    pub request_timeout_secs: u64,
    /// HTTP proxy URL for feed fetching (e.g., "http://127.0.0.1:7890" or "socks5://127.0.0.1:1080")
    #[serde(default)]
    pub proxy_url: Option<String>,
    /// Number of newest items taken from each feed per batch
    #[serde(default = "default_item_limit")]
    pub item_limit: usize,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_secs: default_timeout(),
            proxy_url: None,
            item_limit: default_item_limit(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Run the scheduled jobs at all
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Local time of the daily ingestion run ("HH:MM")
    #[serde(default = "default_ingest_at")]
    pub ingest_at: String,
    /// Weekday of the task log cleanup ("Mon".."Sun")
    #[serde(default = "default_cleanup_weekday")]
    pub cleanup_weekday: String,
    /// Local time of the weekly cleanup run ("HH:MM")
    #[serde(default = "default_cleanup_at")]
    pub cleanup_at: String,
    /// Task logs older than this are purged by the cleanup job
    #[serde(default = "default_task_log_retention_days")]
    pub task_log_retention_days: u32,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            enabled: default_true(),
            ingest_at: default_ingest_at(),
            cleanup_weekday: default_cleanup_weekday(),
            cleanup_at: default_cleanup_at(),
            task_log_retention_days: default_task_log_retention_days(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address the HTTP trigger endpoint listens on
    #[serde(default = "default_bind_addr")]
    pub bind_addr: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("blogfeed")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_timeout() -> u64 {
    30
}

fn default_item_limit() -> usize {
    10
}

fn default_ingest_at() -> String {
    "03:00".to_string()
}

fn default_cleanup_weekday() -> String {
    "Sun".to_string()
}

fn default_cleanup_at() -> String {
    "04:00".to_string()
}

fn default_task_log_retention_days() -> u32 {
    30
}

fn default_bind_addr() -> String {
    "127.0.0.1:8787".to_string()
}

fn default_sources() -> Vec<FeedSource> {
    vec![
        FeedSource::new("TechCrunch", "https://techcrunch.com/feed/"),
        FeedSource::new("The Verge", "https://www.theverge.com/rss/index.xml"),
        FeedSource::new("Hacker News", "https://hnrss.org/frontpage"),
    ]
}

/// Expand tilde (~) in path to user's home directory
fn expand_tilde(path: &Path) -> PathBuf {
    if let Some(path_str) = path.to_str() {
        if let Some(stripped) = path_str.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(stripped);
            }
        } else if path_str == "~" {
            if let Some(home) = dirs::home_dir() {
                return home;
            }
        }
    }
    path.to_path_buf()
}

impl AppConfig {
    /// Load configuration from the default location or return defaults
    pub fn load() -> crate::Result<Self> {
        Self::load_from(&Self::config_path())
    }

    /// Load configuration from an explicit path, falling back to defaults when absent
    pub fn load_from(path: &Path) -> crate::Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)?;
            Self::from_toml(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_toml(content: &str) -> crate::Result<Self> {
        toml::from_str(content).map_err(|e| crate::Error::Config(e.to_string()))
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> crate::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)
            .map_err(|e| crate::Error::Config(e.to_string()))?;
        std::fs::write(path, content)?;

        Ok(())
    }

    /// Get the configuration file path
    /// Always uses ~/.config/blogfeed/config.toml on all platforms
    pub fn config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".config")
            .join("blogfeed")
            .join("config.toml")
    }

    /// Get the database file path
    pub fn database_path(&self) -> PathBuf {
        self.data_dir().join("blogfeed.db")
    }

    /// Get the data directory (with tilde expansion)
    pub fn data_dir(&self) -> PathBuf {
        expand_tilde(&self.general.data_dir)
    }

    /// Sources with `active = true`, in configured order
    pub fn active_sources(&self) -> impl Iterator<Item = &FeedSource> {
        self.sources.iter().filter(|s| s.active)
    }
}
