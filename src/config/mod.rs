//! Configuration management for Sheetguard.
//!
//! # Overview
//!
//! Sheetguard reads an optional TOML file with support for:
//! - Environment variable substitution (`${VAR_NAME}`)
//! - `SHEETGUARD_*` environment overrides
//! - Default values for every setting
//! - Validation before any data is touched
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use sheetguard::config::load_config;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = load_config("sheetguard.toml")?;
//! println!("Oracle model: {}", config.oracle.model);
//! println!("Default epsilon: {}", config.noise.default_epsilon);
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration Structure
//!
//! - [`ApplicationConfig`] - Log level
//! - [`OracleConfig`] - Classification oracle backend, endpoint, retries, concurrency
//! - [`PipelineConfig`] - Sampling, fallback policy, masking
//! - [`NoiseConfig`] - Laplace mechanism parameters
//! - [`AuditConfig`] - Audit trail
//! - [`LoggingConfig`] - Local file logging
//!
//! # Example Configuration
//!
//! ```toml
//! [application]
//! log_level = "info"
//!
//! [oracle]
//! backend = "openai"
//! model = "gpt-4o-mini"
//! api_key = "${OPENAI_API_KEY}"
//! max_concurrency = 4
//!
//! [pipeline]
//! sample_size = 10
//! fallback = "fail_closed"
//!
//! [noise]
//! default_epsilon = 1.0
//! round_decimals = 2
//! ```

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::{load_config, load_config_or_default};
pub use schema::{
    ApplicationConfig, AuditConfig, FallbackPolicy, LoggingConfig, NoiseConfig, OracleBackend,
    OracleConfig, PipelineConfig, RetryConfig, SheetguardConfig,
};
pub use secret::{secret_string, SecretString, SecretValue};
