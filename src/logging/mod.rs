//! Logging and observability
//!
//! Structured logging with:
//! - Human-readable console output on stderr
//! - Configurable log levels (`RUST_LOG` wins when set)
//! - Optional JSON file logging with rotation
//!
//! Sample values never appear in log records. Column names, categories and
//! counts do.
//!
//! # Example
//!
//! ```no_run
//! use sheetguard::logging::init_logging;
//! use sheetguard::config::LoggingConfig;
//!
//! let config = LoggingConfig::default();
//! let _guard = init_logging("info", &config).expect("Failed to initialize logging");
//!
//! tracing::info!("Application started");
//! ```

pub mod structured;

pub use structured::{init_logging, LoggingGuard};

/// Log a pipeline stage transition
///
/// # Example
///
/// ```no_run
/// use sheetguard::log_stage_transition;
///
/// log_stage_transition!("loaded", "classified", 4);
/// ```
#[macro_export]
macro_rules! log_stage_transition {
    ($from:expr, $to:expr, $columns:expr) => {
        tracing::info!(
            from = $from,
            to = $to,
            columns = $columns,
            "Pipeline stage transition"
        );
    };
}

/// Log the verdict reached for one column
///
/// # Example
///
/// ```no_run
/// use sheetguard::log_column_verdict;
///
/// log_column_verdict!("CPF", "identifier", true, "oracle");
/// ```
#[macro_export]
macro_rules! log_column_verdict {
    ($column:expr, $category:expr, $sensitive:expr, $provenance:expr) => {
        tracing::debug!(
            column = %$column,
            category = %$category,
            sensitive = $sensitive,
            provenance = %$provenance,
            "Column classified"
        );
    };
}

/// Log an error with context
///
/// # Example
///
/// ```no_run
/// use sheetguard::log_error_with_context;
/// use sheetguard::domain::SheetguardError;
///
/// let error = SheetguardError::Configuration("Invalid config".to_string());
/// log_error_with_context!(&error, "Failed to load configuration");
/// ```
#[macro_export]
macro_rules! log_error_with_context {
    ($error:expr, $context:expr) => {
        tracing::error!(
            error = %$error,
            context = $context,
            "Error occurred"
        );
    };
}

/// Log a retry attempt
///
/// # Example
///
/// ```no_run
/// use sheetguard::log_retry_attempt;
///
/// log_retry_attempt!(1, 2, "Connection timeout");
/// ```
#[macro_export]
macro_rules! log_retry_attempt {
    ($attempt:expr, $max_attempts:expr, $reason:expr) => {
        tracing::warn!(
            attempt = $attempt,
            max_attempts = $max_attempts,
            reason = %$reason,
            "Retrying oracle call"
        );
    };
}
