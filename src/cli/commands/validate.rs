//! Validate config command implementation
//!
//! This module implements the `validate-config` command for validating
//! the Sheetguard configuration file.

use crate::config::{load_config, OracleBackend};
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(config_path = %config_path, "Validating configuration");

        println!("🔍 Validating configuration file: {config_path}");
        println!();

        // load_config validates as its last step
        let config = match load_config(config_path) {
            Ok(c) => {
                println!("✅ Configuration is valid");
                c
            }
            Err(e) => {
                println!("❌ Configuration is invalid");
                println!("   Error: {e}");
                return Ok(2); // Configuration error exit code
            }
        };

        println!();
        println!("Configuration Summary:");
        println!("  Log Level: {}", config.application.log_level);
        match config.oracle.backend {
            OracleBackend::Openai => {
                println!("  Oracle: openai ({})", config.oracle.model);
                println!("  Oracle Endpoint: {}", config.oracle.base_url);
                println!(
                    "  API Key: {}",
                    if config.oracle.has_api_key() {
                        "configured"
                    } else {
                        "missing"
                    }
                );
            }
            OracleBackend::Keywords => {
                println!(
                    "  Oracle: keywords ({})",
                    config
                        .oracle
                        .keyword_library
                        .as_ref()
                        .map(|p| p.display().to_string())
                        .unwrap_or_else(|| "built-in library".to_string())
                );
            }
        }
        println!("  Max Concurrency: {}", config.oracle.max_concurrency);
        println!("  Retries: {}", config.oracle.retry.max_retries);
        println!("  Sample Size: {}", config.pipeline.sample_size);
        println!("  Fallback: {:?}", config.pipeline.fallback);
        println!("  Default Epsilon: {}", config.noise.default_epsilon);
        println!("  Sensitivity: {}", config.noise.sensitivity);
        println!(
            "  Audit Log: {}",
            if config.audit.enabled {
                config.audit.log_path.display().to_string()
            } else {
                "disabled".to_string()
            }
        );
        println!();

        if config.oracle.backend == OracleBackend::Openai && !config.oracle.has_api_key() {
            println!("⚠️  No API key: `run` and `prepare` will fail until one is set");
            println!("   (SHEETGUARD_ORACLE_API_KEY or OPENAI_API_KEY)");
            println!();
        }

        Ok(0)
    }
}
