use std::path::PathBuf;

use crate::settings::{MissingIdPolicy, SyncSettings};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub listing_base_url: String,
    pub category: String,
    pub currency: String,
    pub image_dir: PathBuf,
    pub max_pages: u32,
    pub missing_id_policy: MissingIdPolicy,
    pub skip_malformed: bool,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_secs: u64,
}

impl AppConfig {
    /// Builds the per-run pipeline settings from the loaded configuration.
    #[must_use]
    pub fn sync_settings(&self) -> SyncSettings {
        SyncSettings {
            base_url: self.listing_base_url.clone(),
            category: self.category.clone(),
            currency: self.currency.clone(),
            max_pages: self.max_pages,
            missing_id_policy: self.missing_id_policy,
            skip_malformed: self.skip_malformed,
        }
    }
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("listing_base_url", &self.listing_base_url)
            .field("category", &self.category)
            .field("currency", &self.currency)
            .field("image_dir", &self.image_dir)
            .field("max_pages", &self.max_pages)
            .field("missing_id_policy", &self.missing_id_policy)
            .field("skip_malformed", &self.skip_malformed)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_secs",
                &self.scraper_retry_backoff_base_secs,
            )
            .finish()
    }
}
