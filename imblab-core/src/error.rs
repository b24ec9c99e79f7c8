//! Structured error type shared by every stage of the pipeline.
//!
//! The pipeline has no recovery logic: the first error aborts the run and is
//! reported to the caller as-is, so variants carry enough context (URL,
//! dataset, column) to be actionable from the CLI.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("network unreachable: {0}")]
    NetworkUnreachable(String),

    #[error("HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

    #[error("invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("archive error: {0}")]
    Archive(String),

    #[error("archive entry not found: {entry}")]
    MissingEntry { entry: String },

    #[error("parse error in {context}: {message}")]
    Parse { context: String, message: String },

    #[error("column not found: {0}")]
    ColumnNotFound(String),

    #[error("target must be binary 0/1, found '{0}'")]
    NonBinaryTarget(String),

    #[error("missing target value in row {row}")]
    MissingTarget { row: usize },

    #[error("invalid multiplication factor {0}: must be finite and positive")]
    InvalidFactor(f64),

    #[error("invalid dataset '{name}': {reason}")]
    InvalidDataset { name: String, reason: String },

    #[error("unknown dataset '{0}'")]
    UnknownDataset(String),

    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("dataframe error: {0}")]
    Frame(#[from] polars::error::PolarsError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl DatasetError {
    pub(crate) fn parse(context: impl Into<String>, message: impl ToString) -> Self {
        DatasetError::Parse {
            context: context.into(),
            message: message.to_string(),
        }
    }

    pub(crate) fn invalid(name: impl Into<String>, reason: impl Into<String>) -> Self {
        DatasetError::InvalidDataset {
            name: name.into(),
            reason: reason.into(),
        }
    }
}
