use std::path::PathBuf;

use chrono::{DateTime, Utc};

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
    pub companies_path: PathBuf,

    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,

    /// Epoch for first-ever ingestion runs: the window start used when no
    /// checkpoint exists yet for a (source, query) pair.
    pub scraper_start_date: DateTime<Utc>,
    pub scraper_window_minutes: i64,
    pub scraper_interval_secs: u64,
    pub scraper_max_runs: u32,
    pub scraper_page_limit: usize,
    pub scraper_request_timeout_secs: u64,
    pub scraper_user_agent: String,
    pub scraper_inter_request_delay_ms: u64,
    pub scraper_item_delay_ms: u64,
    pub scraper_max_retries: u32,
    pub scraper_retry_backoff_base_ms: u64,

    pub twitter_auth_token: Option<String>,
    pub twitter_csrf_token: Option<String>,
    pub twitter_bearer_token: Option<String>,
    pub twitter_transaction_id: Option<String>,
    pub twitter_tx_state_path: PathBuf,

    pub linkedin_li_at: Option<String>,
    pub linkedin_jsessionid: Option<String>,
    pub linkedin_state_path: PathBuf,

    pub classifier_endpoint: Option<String>,
    pub classifier_deployment: Option<String>,
    pub classifier_api_version: String,
    pub classifier_api_key: Option<String>,
    pub classifier_request_timeout_secs: u64,
    pub classify_delay_ms: u64,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("companies_path", &self.companies_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("scraper_start_date", &self.scraper_start_date)
            .field("scraper_window_minutes", &self.scraper_window_minutes)
            .field("scraper_interval_secs", &self.scraper_interval_secs)
            .field("scraper_max_runs", &self.scraper_max_runs)
            .field("scraper_page_limit", &self.scraper_page_limit)
            .field(
                "scraper_request_timeout_secs",
                &self.scraper_request_timeout_secs,
            )
            .field("scraper_user_agent", &self.scraper_user_agent)
            .field(
                "scraper_inter_request_delay_ms",
                &self.scraper_inter_request_delay_ms,
            )
            .field("scraper_item_delay_ms", &self.scraper_item_delay_ms)
            .field("scraper_max_retries", &self.scraper_max_retries)
            .field(
                "scraper_retry_backoff_base_ms",
                &self.scraper_retry_backoff_base_ms,
            )
            .field(
                "twitter_auth_token",
                &self.twitter_auth_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "twitter_csrf_token",
                &self.twitter_csrf_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "twitter_bearer_token",
                &self.twitter_bearer_token.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "twitter_transaction_id",
                &self.twitter_transaction_id.as_ref().map(|_| "[redacted]"),
            )
            .field("twitter_tx_state_path", &self.twitter_tx_state_path)
            .field(
                "linkedin_li_at",
                &self.linkedin_li_at.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "linkedin_jsessionid",
                &self.linkedin_jsessionid.as_ref().map(|_| "[redacted]"),
            )
            .field("linkedin_state_path", &self.linkedin_state_path)
            .field("classifier_endpoint", &self.classifier_endpoint)
            .field("classifier_deployment", &self.classifier_deployment)
            .field("classifier_api_version", &self.classifier_api_version)
            .field(
                "classifier_api_key",
                &self.classifier_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "classifier_request_timeout_secs",
                &self.classifier_request_timeout_secs,
            )
            .field("classify_delay_ms", &self.classify_delay_ms)
            .finish()
    }
}
