//! Shared configuration for the sovdb workspace: env-driven application
//! settings and the competitor roster file.

use std::path::PathBuf;

use thiserror::Error;

mod app_config;
mod competitors;
mod config;

pub use app_config::{AppConfig, Environment};
pub use competitors::{load_competitors, slugify, CompetitorRecord, CompetitorsFile};
pub use config::{load_app_config, load_app_config_from_env};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
    #[error("failed to read competitor roster at {path}: {source}")]
    RosterIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse competitor roster: {0}")]
    RosterParse(#[from] serde_yaml::Error),
    #[error("validation error: {0}")]
    Validation(String),
}
