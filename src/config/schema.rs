//! Configuration schema types
//!
//! Maps the `sheetguard.toml` file onto typed sections. Every section has a
//! `Default` so a run can proceed without a configuration file.

use crate::config::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main Sheetguard configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SheetguardConfig {
    /// Application-level settings
    #[serde(default)]
    pub application: ApplicationConfig,

    /// Classification oracle settings
    #[serde(default)]
    pub oracle: OracleConfig,

    /// Profiling, policy and masking settings
    #[serde(default)]
    pub pipeline: PipelineConfig,

    /// Laplace noise settings
    #[serde(default)]
    pub noise: NoiseConfig,

    /// Audit trail settings
    #[serde(default)]
    pub audit: AuditConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl SheetguardConfig {
    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        self.oracle.validate()?;
        self.pipeline.validate()?;
        self.noise.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ApplicationConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// Which oracle implementation classifies columns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum OracleBackend {
    /// OpenAI-compatible chat completions endpoint
    #[default]
    Openai,
    /// Offline keyword/shape rules
    Keywords,
}

impl std::str::FromStr for OracleBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "openai" => Ok(Self::Openai),
            "keywords" => Ok(Self::Keywords),
            other => Err(format!(
                "Invalid oracle backend '{other}'. Must be one of: openai, keywords"
            )),
        }
    }
}

/// Retry configuration for oracle calls
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Additional attempts after the first failure
    #[serde(default = "default_max_retries")]
    pub max_retries: usize,

    /// Initial delay in milliseconds
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Maximum delay in milliseconds
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Backoff multiplier
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: default_max_retries(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            backoff_multiplier: default_backoff_multiplier(),
        }
    }
}

/// Classification oracle configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OracleConfig {
    /// Backend implementation
    #[serde(default)]
    pub backend: OracleBackend,

    /// Base URL of the chat completions API
    #[serde(default = "default_oracle_base_url")]
    pub base_url: String,

    /// Model name sent with each request
    #[serde(default = "default_oracle_model")]
    pub model: String,

    /// API key, stored securely in memory and zeroized on drop
    #[serde(default)]
    pub api_key: Option<SecretString>,

    /// Per-call timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,

    /// Number of columns classified concurrently
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Optional keyword library TOML file for the keywords backend
    #[serde(default)]
    pub keyword_library: Option<PathBuf>,

    /// Retry configuration
    #[serde(default)]
    pub retry: RetryConfig,
}

impl Default for OracleConfig {
    fn default() -> Self {
        Self {
            backend: OracleBackend::default(),
            base_url: default_oracle_base_url(),
            model: default_oracle_model(),
            api_key: None,
            timeout_seconds: default_timeout_seconds(),
            max_concurrency: default_max_concurrency(),
            keyword_library: None,
            retry: RetryConfig::default(),
        }
    }
}

impl OracleConfig {
    /// Whether a non-empty API key is configured
    ///
    /// The key is only checked when the OpenAI oracle is built, so that
    /// `finalize` can run from a checkpoint without credentials.
    pub fn has_api_key(&self) -> bool {
        use secrecy::ExposeSecret;

        self.api_key
            .as_ref()
            .map(|k| !k.expose_secret().is_empty())
            .unwrap_or(false)
    }

    fn validate(&self) -> Result<(), String> {
        if self.backend == OracleBackend::Openai {
            let parsed = url::Url::parse(&self.base_url)
                .map_err(|e| format!("oracle.base_url is not a valid URL: {e}"))?;
            if parsed.scheme() != "http" && parsed.scheme() != "https" {
                return Err("oracle.base_url must start with http:// or https://".to_string());
            }

            if self.model.trim().is_empty() {
                return Err("oracle.model cannot be empty".to_string());
            }
        }

        if self.timeout_seconds == 0 {
            return Err("oracle.timeout_seconds must be greater than 0".to_string());
        }

        if self.max_concurrency == 0 || self.max_concurrency > 64 {
            return Err(format!(
                "oracle.max_concurrency must be between 1 and 64, got {}",
                self.max_concurrency
            ));
        }

        if let Some(ref path) = self.keyword_library {
            if path.extension().and_then(|s| s.to_str()) != Some("toml") {
                return Err(format!(
                    "oracle.keyword_library must be a TOML file: {}",
                    path.display()
                ));
            }
        }

        if self.retry.backoff_multiplier < 1.0 {
            return Err("oracle.retry.backoff_multiplier must be at least 1.0".to_string());
        }

        Ok(())
    }
}

/// What happens to a column whose classification failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FallbackPolicy {
    /// Quarantine (remove) columns that could not be classified
    #[default]
    FailClosed,
    /// Keep unclassified columns unchanged, as non-sensitive
    FailOpen,
}

impl std::str::FromStr for FallbackPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "fail_closed" => Ok(Self::FailClosed),
            "fail_open" => Ok(Self::FailOpen),
            other => Err(format!(
                "Invalid fallback '{other}'. Must be one of: fail_closed, fail_open"
            )),
        }
    }
}

/// Profiling, policy and masking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Maximum representative values sent to the oracle per column
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,

    /// Handling of columns the oracle could not classify
    #[serde(default)]
    pub fallback: FallbackPolicy,

    /// Marker appended to masked text
    #[serde(default = "default_mask_marker")]
    pub mask_marker: String,

    /// Characters kept by text masking
    #[serde(default = "default_mask_prefix_len")]
    pub mask_prefix_len: usize,

    /// Suffix appended to masked column names
    #[serde(default = "default_masked_suffix")]
    pub masked_suffix: String,

    /// Remove financial/demographic columns that are not numeric instead of deferring them
    #[serde(default)]
    pub drop_non_numeric_deferred: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            sample_size: default_sample_size(),
            fallback: FallbackPolicy::default(),
            mask_marker: default_mask_marker(),
            mask_prefix_len: default_mask_prefix_len(),
            masked_suffix: default_masked_suffix(),
            drop_non_numeric_deferred: false,
        }
    }
}

impl PipelineConfig {
    fn validate(&self) -> Result<(), String> {
        if self.sample_size == 0 || self.sample_size > 100 {
            return Err(format!(
                "pipeline.sample_size must be between 1 and 100, got {}",
                self.sample_size
            ));
        }
        if self.mask_marker.is_empty() {
            return Err("pipeline.mask_marker cannot be empty".to_string());
        }
        Ok(())
    }
}

/// Laplace noise configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NoiseConfig {
    /// Epsilon used when the caller does not supply one
    #[serde(default = "default_epsilon")]
    pub default_epsilon: f64,

    /// Assumed maximum contribution of a single record
    #[serde(default = "default_sensitivity")]
    pub sensitivity: f64,

    /// Decimal places kept after adding noise (omit to keep full precision)
    #[serde(default = "default_round_decimals")]
    pub round_decimals: Option<u32>,

    /// Leave exact zeros untouched
    #[serde(default)]
    pub preserve_zeros: bool,

    /// Fixed random seed, for reproducible test runs only
    #[serde(default)]
    pub seed: Option<u64>,

    /// Suffix appended to noised column names
    #[serde(default = "default_noised_suffix")]
    pub noised_suffix: String,
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            default_epsilon: default_epsilon(),
            sensitivity: default_sensitivity(),
            round_decimals: default_round_decimals(),
            preserve_zeros: false,
            seed: None,
            noised_suffix: default_noised_suffix(),
        }
    }
}

impl NoiseConfig {
    fn validate(&self) -> Result<(), String> {
        if !self.default_epsilon.is_finite() || self.default_epsilon <= 0.0 {
            return Err(format!(
                "noise.default_epsilon must be a finite positive number, got {}",
                self.default_epsilon
            ));
        }
        if !self.sensitivity.is_finite() || self.sensitivity <= 0.0 {
            return Err(format!(
                "noise.sensitivity must be a finite positive number, got {}",
                self.sensitivity
            ));
        }
        if let Some(decimals) = self.round_decimals {
            if decimals > 10 {
                return Err(format!(
                    "noise.round_decimals must be at most 10, got {decimals}"
                ));
            }
        }
        Ok(())
    }
}

/// Audit trail configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditConfig {
    /// Enable audit logging
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Audit log file path
    #[serde(default = "default_audit_log_path")]
    pub log_path: PathBuf,

    /// Use JSON lines instead of plain text
    #[serde(default = "default_true")]
    pub json_format: bool,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            log_path: default_audit_log_path(),
            json_format: true,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Enable local file logging
    #[serde(default)]
    pub local_enabled: bool,

    /// Local log directory
    #[serde(default = "default_local_path")]
    pub local_path: String,

    /// Log rotation strategy (daily, hourly, never)
    #[serde(default = "default_local_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_local_path(),
            local_rotation: default_local_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_rotations = ["daily", "hourly", "never"];
        if !valid_rotations.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid logging.local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid_rotations.join(", ")
            ));
        }
        if self.local_enabled && self.local_path.is_empty() {
            return Err("logging.local_path cannot be empty when local logging is enabled".into());
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_true() -> bool {
    true
}

fn default_oracle_base_url() -> String {
    "https://api.openai.com".to_string()
}

fn default_oracle_model() -> String {
    "gpt-4o-mini".to_string()
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_max_concurrency() -> usize {
    4
}

fn default_max_retries() -> usize {
    1
}

fn default_initial_delay_ms() -> u64 {
    500
}

fn default_max_delay_ms() -> u64 {
    10000
}

fn default_backoff_multiplier() -> f64 {
    2.0
}

fn default_sample_size() -> usize {
    10
}

fn default_mask_marker() -> String {
    "***".to_string()
}

fn default_mask_prefix_len() -> usize {
    5
}

fn default_masked_suffix() -> String {
    "_masked".to_string()
}

fn default_epsilon() -> f64 {
    1.0
}

fn default_sensitivity() -> f64 {
    1.0
}

fn default_round_decimals() -> Option<u32> {
    Some(2)
}

fn default_noised_suffix() -> String {
    "_noised".to_string()
}

fn default_audit_log_path() -> PathBuf {
    PathBuf::from("./audit/sheetguard.log")
}

fn default_local_path() -> String {
    "./logs".to_string()
}

fn default_local_rotation() -> String {
    "daily".to_string()
}
