use thiserror::Error;

pub mod app_config;
pub mod classify;
pub mod companies;
pub mod config;
pub mod post;
pub mod workflow;

pub use app_config::{AppConfig, Environment};
pub use classify::{priority_for, Category, Priority};
pub use companies::{load_companies, CompaniesFile, CompanyConfig};
pub use config::{load_app_config, load_app_config_from_env};
pub use post::{EngagementMetrics, NormalizedPost, PostAuthor, Platform};
pub use workflow::WorkflowStatus;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for environment variable {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read companies file {path}: {source}")]
    CompaniesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse companies file: {0}")]
    CompaniesFileParse(#[from] serde_yaml::Error),
    #[error("companies file validation failed: {0}")]
    Validation(String),
}
