//! Error types for the sales_forecast crate

use thiserror::Error;

/// Custom error types for the sales_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// The uploaded bytes could not be parsed as a delimited table
    /// after both the UTF-8 and Latin-1 decoding attempts
    #[error("ingestion error: {0}")]
    Ingestion(String),

    /// A user-selected column does not exist in the parsed header
    #[error("column '{0}' not found in header")]
    MissingColumn(String),

    /// The cleaned series is too short for a downstream stage
    #[error("insufficient data: need at least {needed} points, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Model estimation failed for the requested orders
    #[error("fit error: {0}")]
    Fit(String),

    /// Error related to forecasting operations
    #[error("forecasting error: {0}")]
    Forecasting(String),

    /// A non-finite value was encountered during accuracy evaluation
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Error from invalid caller-supplied parameters
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;
