//! Error types for analytics.

use thiserror::Error;

/// Result type for analytics.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors raised while computing analytics.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Polars error
    #[error("Polars error: {0}")]
    Polars(#[from] polars::prelude::PolarsError),

    /// Input frame lacks a required column
    #[error("Missing column: {0}")]
    MissingColumn(String),

    /// Parameter out of range
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Value could not be interpreted
    #[error("Parse error: {0}")]
    Parse(String),
}
