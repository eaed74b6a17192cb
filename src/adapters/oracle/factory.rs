//! Oracle factory
//!
//! Creates the configured classification oracle behind a trait object.

use super::{ClassificationOracle, KeywordOracle, OpenAiOracle};
use crate::config::{OracleBackend, OracleConfig};
use crate::domain::{Result, SheetguardError};
use std::sync::Arc;

/// Create a classification oracle based on the configuration
///
/// # Errors
///
/// Returns [`SheetguardError::Configuration`] if the backend cannot be built, for
/// example when the API key is missing or the keyword library does not parse.
pub fn create_oracle(config: &OracleConfig) -> Result<Arc<dyn ClassificationOracle>> {
    match config.backend {
        OracleBackend::Openai => {
            tracing::info!(
                base_url = %config.base_url,
                model = %config.model,
                "Creating OpenAI classification oracle"
            );
            let oracle = OpenAiOracle::new(config)?;
            Ok(Arc::new(oracle) as Arc<dyn ClassificationOracle>)
        }
        OracleBackend::Keywords => {
            let oracle = match config.keyword_library {
                Some(ref path) => {
                    tracing::info!(path = %path.display(), "Loading keyword library");
                    KeywordOracle::from_file(path)
                }
                None => KeywordOracle::builtin(),
            }
            .map_err(|e| SheetguardError::Configuration(format!("{e:#}")))?;

            tracing::info!(
                rules = oracle.rule_count(),
                "Creating keyword classification oracle"
            );
            Ok(Arc::new(oracle) as Arc<dyn ClassificationOracle>)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keywords_backend() {
        let config = OracleConfig {
            backend: OracleBackend::Keywords,
            ..OracleConfig::default()
        };
        let oracle = create_oracle(&config).unwrap();
        assert_eq!(oracle.name(), "keywords");
    }

    #[test]
    fn test_missing_library_file() {
        let config = OracleConfig {
            backend: OracleBackend::Keywords,
            keyword_library: Some("does/not/exist.toml".into()),
            ..OracleConfig::default()
        };
        assert!(matches!(
            create_oracle(&config),
            Err(SheetguardError::Configuration(_))
        ));
    }

    #[test]
    fn test_openai_backend_without_key() {
        let config = OracleConfig::default();
        assert!(create_oracle(&config).is_err());
    }
}
