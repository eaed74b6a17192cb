//! Domain error types
//!
//! This module defines the error hierarchy for Sheetguard.
//! All errors are domain-specific and don't expose third-party types.

use thiserror::Error;

/// Main Sheetguard error type
///
/// Only configuration problems (including an invalid privacy budget) and I/O at the
/// edges are fatal to a run. Classification and per-value problems are absorbed by
/// the pipeline and surfaced in the report instead.
#[derive(Debug, Error)]
pub enum SheetguardError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Invalid privacy budget (epsilon must be finite and strictly positive)
    #[error("Invalid privacy budget: {0}")]
    InvalidBudget(String),

    /// Table shape errors (ragged columns, duplicate names)
    #[error("Table error: {0}")]
    Table(String),

    /// Classification oracle errors
    #[error("Oracle error: {0}")]
    Oracle(#[from] OracleError),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// Generic errors with context
    #[error("{0}")]
    Other(String),
}

/// Classification oracle errors
///
/// Errors that occur when talking to the external text-classification service.
/// These errors don't expose third-party HTTP client types.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum OracleError {
    /// Failed to reach the oracle
    #[error("Failed to connect to classification oracle: {0}")]
    ConnectionFailed(String),

    /// The call exceeded its deadline
    #[error("Classification request timed out: {0}")]
    Timeout(String),

    /// Rate limit exceeded (429)
    #[error("Rate limit exceeded: {0}")]
    RateLimited(String),

    /// Server error (5xx)
    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    /// Client error (4xx)
    #[error("Client error: {status} - {message}")]
    ClientError { status: u16, message: String },

    /// Response envelope could not be read
    #[error("Invalid response from oracle: {0}")]
    InvalidResponse(String),

    /// The run was cancelled while the call was in flight
    #[error("Classification request cancelled")]
    Cancelled,
}

impl OracleError {
    /// Whether a second attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ConnectionFailed(_)
                | Self::Timeout(_)
                | Self::RateLimited(_)
                | Self::ServerError { .. }
        )
    }
}

impl From<std::io::Error> for SheetguardError {
    fn from(err: std::io::Error) -> Self {
        SheetguardError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for SheetguardError {
    fn from(err: serde_json::Error) -> Self {
        SheetguardError::Serialization(err.to_string())
    }
}

impl From<toml::de::Error> for SheetguardError {
    fn from(err: toml::de::Error) -> Self {
        SheetguardError::Configuration(format!("TOML parse error: {err}"))
    }
}

impl From<csv::Error> for SheetguardError {
    fn from(err: csv::Error) -> Self {
        SheetguardError::Io(format!("CSV error: {err}"))
    }
}
