//! Error types for the ronda framework.
//!
//! This module defines the error type used throughout the ronda ecosystem,
//! covering data-contract validation, feature preparation, and model fitting.

use thiserror::Error;

/// The main error type for ronda operations.
///
/// Data-contract failures ([`MissingColumn`](Self::MissingColumn),
/// [`DateParse`](Self::DateParse), [`InvalidData`](Self::InvalidData)) are
/// kept distinct from modeling failures ([`ModelFit`](Self::ModelFit)) so
/// callers can tell a broken snapshot apart from a degenerate fit.
#[derive(Debug, Error)]
pub enum RondaError {
    /// Error when a required column is missing from the input table.
    #[error("Missing required column: {0}")]
    MissingColumn(String),

    /// Error when a date-like column holds a value that cannot be parsed.
    ///
    /// This is fatal: an unparseable date breaks the data-integrity
    /// precondition of the whole pipeline.
    #[error("Unparseable date in column '{column}': {value}")]
    DateParse {
        /// Name of the offending column.
        column: String,
        /// The value that failed to parse.
        value: String,
    },

    /// Error due to invalid or malformed data.
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Error when data is insufficient for the requested operation.
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Error when a maximum-likelihood fit does not converge or produces a
    /// non-finite optimum.
    #[error("Model fit failed: {0}")]
    ModelFit(String),

    /// Error from Polars operations.
    #[error("Polars error: {0}")]
    Polars(#[from] polars::error::PolarsError),

    /// Generic error for other cases.
    #[error("Error: {0}")]
    Other(String),
}

impl From<String> for RondaError {
    fn from(s: String) -> Self {
        Self::Other(s)
    }
}

impl From<&str> for RondaError {
    fn from(s: &str) -> Self {
        Self::Other(s.to_string())
    }
}

/// A specialized Result type for ronda operations.
///
/// This is a convenience type that uses [`RondaError`] as the error type.
pub type Result<T> = std::result::Result<T, RondaError>;
