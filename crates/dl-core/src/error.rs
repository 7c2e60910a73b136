use std::path::PathBuf;
use thiserror::Error;

use crate::models::RecordType;

/// All errors produced by the deposit/lending dashboard.
#[derive(Error, Debug)]
pub enum DashboardError {
    /// A file could not be opened or read from disk.
    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A CSV document could not be tokenised or decoded.
    #[error("Failed to parse CSV: {0}")]
    Csv(#[from] csv::Error),

    /// A JSON document could not be parsed.
    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// A row is missing a required field or carries an unparseable value.
    #[error("Malformed record at {source_name} line {line}: {reason}")]
    MalformedInput {
        source_name: String,
        line: u64,
        reason: String,
    },

    /// No rows were available to aggregate.
    #[error("Dataset is empty; nothing to aggregate")]
    EmptyDataset,

    /// A previous-period comparison was requested on too short a series.
    #[error("Not enough history in {view}: need at least {required} rows, found {available}")]
    InsufficientHistory {
        view: String,
        required: usize,
        available: usize,
    },

    /// Two rows share a period key but disagree on record type (strict mode).
    #[error("Period '{key}' mixes record types: first row is {first}, a later row is {conflicting}")]
    AmbiguousGrouping {
        key: String,
        first: RecordType,
        conflicting: RecordType,
    },

    /// A period selector matched no row.
    #[error("No period matches '{0}'")]
    UnknownPeriod(String),

    /// The range end precedes the range start.
    #[error("Invalid period range: '{to}' comes before '{from}'")]
    InvalidRange { from: String, to: String },

    /// The expected data path does not exist.
    #[error("Data path not found: {0}")]
    DataPathNotFound(PathBuf),

    /// No CSV files were found under the given directory.
    #[error("No CSV files found in {0}")]
    NoDataFiles(PathBuf),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Catch-all for errors from third-party crates via `anyhow`.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DashboardError {
    /// Whether the presentation layer should render a degraded page rather
    /// than abort.
    pub fn is_degradable(&self) -> bool {
        matches!(
            self,
            DashboardError::EmptyDataset | DashboardError::InsufficientHistory { .. }
        )
    }
}

/// Convenience alias used throughout the dashboard crates.
pub type Result<T> = std::result::Result<T, DashboardError>;
