//! Init command implementation
//!
//! This module implements the `init` command for generating a sample
//! configuration file.

use clap::Args;
use std::fs;
use std::path::Path;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Path where to create the configuration file
    #[arg(short, long, default_value = "sheetguard.toml")]
    pub output: String,

    /// Include example values and comments
    #[arg(long)]
    pub with_examples: bool,

    /// Overwrite existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        tracing::info!(output = %self.output, "Initializing configuration file");

        println!("📝 Initializing Sheetguard configuration");
        println!();

        if Path::new(&self.output).exists() && !self.force {
            println!("❌ Configuration file already exists: {}", self.output);
            println!("   Use --force to overwrite");
            return Ok(2); // Configuration error exit code
        }

        let config_content = if self.with_examples {
            Self::generate_config_with_examples()
        } else {
            Self::generate_minimal_config()
        };

        match fs::write(&self.output, config_content) {
            Ok(_) => {
                println!("✅ Configuration file created: {}", self.output);
                println!();
                println!("Next steps:");
                println!("  1. Edit {} with your settings", self.output);
                println!("  2. Export OPENAI_API_KEY, or set oracle.backend = \"keywords\"");
                println!("     to classify offline");
                println!("  3. Validate configuration: sheetguard validate-config");
                println!("  4. Anonymize a file: sheetguard run data.csv --epsilon 1.0");
                println!();
                Ok(0)
            }
            Err(e) => {
                println!("❌ Failed to write configuration file");
                println!("   Error: {e}");
                Ok(5) // Fatal error exit code
            }
        }
    }

    /// Generate minimal configuration
    fn generate_minimal_config() -> String {
        r#"# Sheetguard Configuration File

[application]
log_level = "info"

[oracle]
backend = "openai"  # openai | keywords
model = "gpt-4o-mini"
api_key = "${OPENAI_API_KEY}"

[pipeline]
fallback = "fail_closed"  # fail_closed | fail_open

[noise]
default_epsilon = 1.0

[audit]
enabled = true
log_path = "./audit/sheetguard.log"
"#
        .to_string()
    }

    /// Generate configuration with examples and comments
    fn generate_config_with_examples() -> String {
        r#"# Sheetguard Configuration File
#
# Every setting has a default; delete what you do not need to change.
# Values of the form ${VAR} are read from the environment (or a .env file).
# Any setting can also be overridden with SHEETGUARD_<SECTION>_<KEY>.

# ============================================================================
# Application Settings
# ============================================================================
[application]
# Log level (trace, debug, info, warn, error)
log_level = "info"

# ============================================================================
# Classification Oracle
# ============================================================================
[oracle]
# Backend: "openai" (chat completions API) or "keywords" (offline rules)
backend = "openai"

# OpenAI-compatible endpoint and model
base_url = "https://api.openai.com"
model = "gpt-4o-mini"

# API key (required for the openai backend)
api_key = "${OPENAI_API_KEY}"

# Per-call timeout in seconds
timeout_seconds = 30

# Columns classified concurrently (1-64)
max_concurrency = 4

# Custom keyword library for the keywords backend
# keyword_library = "./patterns/column_keywords.toml"

[oracle.retry]
# Extra attempts after a transient failure (timeouts, 429, 5xx)
max_retries = 1
initial_delay_ms = 500
max_delay_ms = 10000
backoff_multiplier = 2.0

# ============================================================================
# Pipeline
# ============================================================================
[pipeline]
# Distinct non-null values sent to the oracle per column (1-100)
sample_size = 10

# What to do with a column the oracle could not classify:
# - fail_closed: remove it and report it as quarantined
# - fail_open: keep it unchanged
fallback = "fail_closed"

# Text masking: keep the first mask_prefix_len characters, then the marker
mask_prefix_len = 5
mask_marker = "***"
masked_suffix = "_masked"

# Remove financial/demographic columns that are not numeric instead of
# passing them through to the noise stage
drop_non_numeric_deferred = false

# ============================================================================
# Laplace Noise
# ============================================================================
[noise]
# Privacy budget used when --epsilon is not given (smaller = more noise)
default_epsilon = 1.0

# Assumed maximum contribution of a single record
sensitivity = 1.0

# Decimal places kept after noising
round_decimals = 2

# Leave exact zeros untouched
preserve_zeros = false

noised_suffix = "_noised"

# Fixed seed for reproducible output. Testing only: never set in production.
# seed = 42

# ============================================================================
# Audit Trail
# ============================================================================
[audit]
enabled = true
log_path = "./audit/sheetguard.log"
json_format = true

# ============================================================================
# Logging
# ============================================================================
[logging]
# Write JSON logs to rotating files in addition to the console
local_enabled = false
local_path = "./logs"
local_rotation = "daily"  # daily | hourly | never
"#
        .to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SheetguardConfig;

    #[test]
    fn test_init_args_defaults() {
        let args = InitArgs {
            output: "sheetguard.toml".to_string(),
            with_examples: false,
            force: false,
        };

        assert_eq!(args.output, "sheetguard.toml");
        assert!(!args.with_examples);
        assert!(!args.force);
    }

    #[test]
    fn test_generated_configs_parse() {
        for content in [
            InitArgs::generate_minimal_config(),
            InitArgs::generate_config_with_examples(),
        ] {
            let content = content.replace("${OPENAI_API_KEY}", "sk-test");
            let config: SheetguardConfig = toml::from_str(&content).unwrap();
            assert!(config.validate().is_ok());
            assert!(config.oracle.has_api_key());
        }
    }

    #[tokio::test]
    async fn test_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let output = dir.path().join("sheetguard.toml");
        std::fs::write(&output, "# existing").unwrap();

        let args = InitArgs {
            output: output.display().to_string(),
            with_examples: false,
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "# existing");
    }
}
