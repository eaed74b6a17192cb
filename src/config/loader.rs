//! Configuration loader with TOML parsing and environment variable overrides

use super::schema::SheetguardConfig;
use super::secret::secret_string;
use crate::domain::errors::SheetguardError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// This function:
/// 1. Reads the TOML file
/// 2. Performs environment variable substitution (`${VAR}` syntax)
/// 3. Parses the TOML into [`SheetguardConfig`]
/// 4. Applies environment variable overrides (`SHEETGUARD_*` prefix)
/// 5. Validates the configuration
///
/// # Errors
///
/// Returns [`SheetguardError::Configuration`] if the file is missing or unreadable,
/// if a referenced environment variable is unset, or if validation fails.
///
/// # Examples
///
/// ```no_run
/// use sheetguard::config::loader::load_config;
///
/// let config = load_config("sheetguard.toml").expect("Failed to load config");
/// ```
pub fn load_config(path: impl AsRef<Path>) -> Result<SheetguardConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(SheetguardError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|e| {
        SheetguardError::Configuration(format!(
            "Failed to read configuration file {}: {}",
            path.display(),
            e
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: SheetguardConfig = toml::from_str(&contents)
        .map_err(|e| SheetguardError::Configuration(format!("Failed to parse TOML: {e}")))?;

    finish(&mut config)?;
    Ok(config)
}

/// Loads configuration from `path` when it exists, otherwise starts from defaults
///
/// Environment overrides and validation are applied in both cases, so a run
/// without a configuration file still picks up `SHEETGUARD_*` and `OPENAI_API_KEY`.
pub fn load_config_or_default(path: impl AsRef<Path>) -> Result<SheetguardConfig> {
    let path = path.as_ref();
    if path.exists() {
        return load_config(path);
    }

    tracing::debug!(
        path = %path.display(),
        "Configuration file not found, using defaults"
    );
    let mut config = SheetguardConfig::default();
    finish(&mut config)?;
    Ok(config)
}

fn finish(config: &mut SheetguardConfig) -> Result<()> {
    apply_env_overrides(config)?;
    config.validate().map_err(|e| {
        SheetguardError::Configuration(format!("Configuration validation failed: {e}"))
    })
}

/// Substitutes environment variables in the format `${VAR_NAME}`
///
/// Comment lines are copied through untouched.
///
/// # Errors
///
/// Returns an error listing every referenced variable that is not set
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| SheetguardError::Configuration(format!("Invalid substitution pattern: {e}")))?;
    let mut result = String::with_capacity(input.len());
    let mut missing_vars: Vec<String> = Vec::new();

    for line in input.lines() {
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for cap in re.captures_iter(line) {
            let var_name = &cap[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    processed_line = processed_line.replace(&format!("${{{var_name}}}"), &value);
                }
                Err(_) => {
                    if !missing_vars.iter().any(|v| v == var_name) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(SheetguardError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

fn parse_override<T: std::str::FromStr>(name: &str, raw: &str) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    raw.trim().parse().map_err(|e| {
        SheetguardError::Configuration(format!("Invalid value '{raw}' for {name}: {e}"))
    })
}

/// Applies environment variable overrides using the `SHEETGUARD_*` prefix
///
/// Variables follow the pattern `SHEETGUARD_<SECTION>_<KEY>`, for example
/// `SHEETGUARD_ORACLE_MODEL` or `SHEETGUARD_NOISE_DEFAULT_EPSILON`.
/// `OPENAI_API_KEY` is honoured when no key was configured any other way.
fn apply_env_overrides(config: &mut SheetguardConfig) -> Result<()> {
    let var = |name: &str| std::env::var(name).ok();

    // Application
    if let Some(val) = var("SHEETGUARD_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }

    // Oracle
    if let Some(val) = var("SHEETGUARD_ORACLE_BACKEND") {
        config.oracle.backend = val
            .parse()
            .map_err(SheetguardError::Configuration)?;
    }
    if let Some(val) = var("SHEETGUARD_ORACLE_BASE_URL") {
        config.oracle.base_url = val;
    }
    if let Some(val) = var("SHEETGUARD_ORACLE_MODEL") {
        config.oracle.model = val;
    }
    if let Some(val) = var("SHEETGUARD_ORACLE_API_KEY") {
        config.oracle.api_key = Some(secret_string(val));
    } else if config.oracle.api_key.is_none() {
        if let Some(val) = var("OPENAI_API_KEY").filter(|v| !v.is_empty()) {
            config.oracle.api_key = Some(secret_string(val));
        }
    }
    if let Some(val) = var("SHEETGUARD_ORACLE_TIMEOUT_SECONDS") {
        config.oracle.timeout_seconds = parse_override("SHEETGUARD_ORACLE_TIMEOUT_SECONDS", &val)?;
    }
    if let Some(val) = var("SHEETGUARD_ORACLE_MAX_CONCURRENCY") {
        config.oracle.max_concurrency = parse_override("SHEETGUARD_ORACLE_MAX_CONCURRENCY", &val)?;
    }
    if let Some(val) = var("SHEETGUARD_ORACLE_KEYWORD_LIBRARY") {
        config.oracle.keyword_library = Some(val.into());
    }
    if let Some(val) = var("SHEETGUARD_ORACLE_RETRY_MAX_RETRIES") {
        config.oracle.retry.max_retries =
            parse_override("SHEETGUARD_ORACLE_RETRY_MAX_RETRIES", &val)?;
    }

    // Pipeline
    if let Some(val) = var("SHEETGUARD_PIPELINE_SAMPLE_SIZE") {
        config.pipeline.sample_size = parse_override("SHEETGUARD_PIPELINE_SAMPLE_SIZE", &val)?;
    }
    if let Some(val) = var("SHEETGUARD_PIPELINE_FALLBACK") {
        config.pipeline.fallback = val
            .parse()
            .map_err(SheetguardError::Configuration)?;
    }

    // Noise
    if let Some(val) = var("SHEETGUARD_NOISE_DEFAULT_EPSILON") {
        config.noise.default_epsilon = parse_override("SHEETGUARD_NOISE_DEFAULT_EPSILON", &val)?;
    }
    if let Some(val) = var("SHEETGUARD_NOISE_SENSITIVITY") {
        config.noise.sensitivity = parse_override("SHEETGUARD_NOISE_SENSITIVITY", &val)?;
    }
    if let Some(val) = var("SHEETGUARD_NOISE_SEED") {
        config.noise.seed = Some(parse_override("SHEETGUARD_NOISE_SEED", &val)?);
    }

    // Audit
    if let Some(val) = var("SHEETGUARD_AUDIT_ENABLED") {
        config.audit.enabled = val.parse().unwrap_or(true);
    }
    if let Some(val) = var("SHEETGUARD_AUDIT_LOG_PATH") {
        config.audit.log_path = val.into();
    }

    // Logging
    if let Some(val) = var("SHEETGUARD_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(true);
    }
    if let Some(val) = var("SHEETGUARD_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }

    Ok(())
}
