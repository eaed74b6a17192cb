//! Classification oracle trait definition
//!
//! A classification oracle takes a column name plus a handful of sample values and
//! answers with structured text naming a sensitivity category. Remote language
//! models, rule-based engines and test stubs all sit behind this one interface.

use crate::anonymization::models::ColumnProfile;
use crate::domain::OracleError;
use async_trait::async_trait;

/// Trait for classification oracle implementations
///
/// Implementations return the oracle's raw answer. Parsing and normalization happen
/// in the classifier, so a backend never needs to validate its own output.
///
/// # Example
///
/// ```
/// use async_trait::async_trait;
/// use sheetguard::adapters::oracle::ClassificationOracle;
/// use sheetguard::anonymization::models::ColumnProfile;
/// use sheetguard::domain::OracleError;
///
/// struct AlwaysFinancial;
///
/// #[async_trait]
/// impl ClassificationOracle for AlwaysFinancial {
///     fn name(&self) -> &str {
///         "always-financial"
///     }
///
///     async fn classify(&self, _profile: &ColumnProfile) -> Result<String, OracleError> {
///         Ok(r#"{"category": "financial", "sensitive": true, "rationale": "stub"}"#.into())
///     }
/// }
/// ```
#[async_trait]
pub trait ClassificationOracle: Send + Sync {
    /// Short backend name used in logs and reports
    fn name(&self) -> &str;

    /// Classify one column
    ///
    /// # Errors
    ///
    /// Returns an [`OracleError`] when the backend cannot produce an answer. Retryable
    /// errors are retried by the caller; see [`OracleError::is_retryable`].
    async fn classify(&self, profile: &ColumnProfile) -> Result<String, OracleError>;
}
