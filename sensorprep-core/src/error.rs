//! Error types for the sensorprep-core crate.

use thiserror::Error;

/// Fatal error for a preprocessing run.
///
/// Any of these aborts the run and no output is produced. Recoverable
/// failures of the oversampling step use [`crate::steps::OversampleError`]
/// instead.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Cannot parse {value:?} in column '{column}' (row {row}) as a timestamp")]
    TimestampParse {
        column: String,
        row: usize,
        value: String,
    },

    #[error("Column '{column}' must be numeric for {step} (found {found})")]
    NonNumericColumn {
        column: String,
        step: &'static str,
        found: String,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl PrepError {
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    pub fn column_not_found(name: impl Into<String>) -> Self {
        Self::ColumnNotFound(name.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}

impl From<figment::Error> for PrepError {
    fn from(err: figment::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Convenience alias used across the crate.
pub type Result<T, E = PrepError> = std::result::Result<T, E>;
