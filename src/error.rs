use std::path::PathBuf;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors raised at the edges of the tool: reading exports, loading config,
/// and validating ranges before a plan is built.
#[derive(Error, Debug)]
pub enum OpsError {
    #[error("invalid date {0:?}, expected YYYY-MM-DD")]
    InvalidDate(String),

    #[error("range start {start} is after end {end}")]
    InvertedRange { start: NaiveDate, end: NaiveDate },

    #[error("unsupported input format for {}, expected .csv or .json", .0.display())]
    UnsupportedInput(PathBuf),

    #[error("unexpected JSON payload: {0}")]
    UnexpectedPayload(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("invalid config: {0}")]
    ConfigParse(#[from] toml::de::Error),

    #[error("invalid config value for {field}: {reason}")]
    ConfigValue { field: &'static str, reason: String },
}

pub type Result<T> = std::result::Result<T, OpsError>;
