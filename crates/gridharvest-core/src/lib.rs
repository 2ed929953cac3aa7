pub mod app_config;
pub mod config;
pub mod records;
pub mod sink;
pub mod stores;

pub use app_config::AppConfig;
pub use config::{load_app_config, load_app_config_from_env};
pub use records::{HarvestResult, PaginationStop, ProductRecord, SkippedEntry};
pub use sink::{load_run, write_failure_dump, write_run, OutputPaths, RunSummary, SinkError};
pub use stores::{
    load_stores, ImageRewrite, Lookup, ModalSelectors, PacingSettings, PaginationSettings,
    PauseRange, PriceLayout, ProgressSignal, ScrollStep, SelectorProfile, StoreProfile,
    StoresFile,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read stores file {path}: {source}")]
    StoresFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse stores file: {0}")]
    StoresFileParse(#[from] serde_yaml::Error),

    #[error("stores config validation failed: {0}")]
    Validation(String),
}
