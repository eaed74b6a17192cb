//! Sensitivity classifier
//!
//! Wraps a [`ClassificationOracle`] with the runtime policy around it: per-call
//! timeout, retry with exponential backoff, cancellation, bounded concurrency,
//! answer parsing and verdict normalization.
//!
//! Classification never fails. Every problem degrades the affected column to a
//! conservative verdict whose provenance records what went wrong, and the run
//! carries on with the remaining columns.

use crate::adapters::oracle::ClassificationOracle;
use crate::anonymization::models::{Category, ClassificationVerdict, ColumnProfile};
use crate::config::OracleConfig;
use crate::domain::OracleError;
use futures::stream::{self, StreamExt};
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Runtime settings for oracle calls
#[derive(Debug, Clone)]
pub struct ClassifierSettings {
    /// Deadline for one oracle call
    pub timeout: Duration,
    /// Additional attempts after a retryable failure
    pub max_retries: usize,
    /// Delay before the first retry
    pub initial_delay: Duration,
    /// Upper bound on any retry delay
    pub max_delay: Duration,
    /// Growth factor between consecutive delays
    pub backoff_multiplier: f64,
    /// Columns classified at the same time
    pub max_concurrency: usize,
}

impl Default for ClassifierSettings {
    fn default() -> Self {
        Self::from_config(&OracleConfig::default())
    }
}

impl ClassifierSettings {
    /// Derive settings from the `[oracle]` configuration section
    pub fn from_config(config: &OracleConfig) -> Self {
        Self {
            timeout: Duration::from_secs(config.timeout_seconds),
            max_retries: config.retry.max_retries,
            initial_delay: Duration::from_millis(config.retry.initial_delay_ms),
            max_delay: Duration::from_millis(config.retry.max_delay_ms),
            backoff_multiplier: config.retry.backoff_multiplier,
            max_concurrency: config.max_concurrency.max(1),
        }
    }

    fn delay_for(&self, attempt: usize) -> Duration {
        let factor = self
            .backoff_multiplier
            .powi(attempt.saturating_sub(1) as i32);
        self.initial_delay.mul_f64(factor).min(self.max_delay)
    }
}

/// Column classifier backed by an oracle
pub struct Classifier {
    oracle: Arc<dyn ClassificationOracle>,
    settings: ClassifierSettings,
    cancel: Option<watch::Receiver<bool>>,
}

impl Classifier {
    /// Create a classifier
    pub fn new(oracle: Arc<dyn ClassificationOracle>, settings: ClassifierSettings) -> Self {
        Self {
            oracle,
            settings,
            cancel: None,
        }
    }

    /// Abort in-flight oracle calls once `cancel` turns `true`
    ///
    /// Cancelled columns degrade to an unclassified verdict.
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Name of the oracle backend
    pub fn oracle_name(&self) -> &str {
        self.oracle.name()
    }

    /// Runtime settings in use
    pub fn settings(&self) -> &ClassifierSettings {
        &self.settings
    }

    /// Classify every profile, preserving input order
    pub async fn classify_all(&self, profiles: &[ColumnProfile]) -> Vec<ClassificationVerdict> {
        stream::iter(profiles)
            .map(|profile| self.classify(profile))
            .buffered(self.settings.max_concurrency.max(1))
            .collect()
            .await
    }

    /// Classify one column
    pub async fn classify(&self, profile: &ColumnProfile) -> ClassificationVerdict {
        let verdict = if profile.is_empty() {
            ClassificationVerdict::empty_sample()
        } else {
            match self.call_with_retry(profile).await {
                Ok(answer) => parse_verdict(&answer).unwrap_or_else(|| {
                    tracing::warn!(
                        column = %profile.name,
                        oracle = self.oracle.name(),
                        "Oracle answer could not be parsed"
                    );
                    ClassificationVerdict::unavailable()
                }),
                Err(e) => {
                    tracing::warn!(
                        column = %profile.name,
                        oracle = self.oracle.name(),
                        error = %e,
                        "Column left unclassified"
                    );
                    ClassificationVerdict::unclassified(e)
                }
            }
        };

        crate::log_column_verdict!(
            profile.name,
            verdict.category,
            verdict.sensitive,
            verdict.provenance
        );
        verdict
    }

    async fn call_with_retry(&self, profile: &ColumnProfile) -> Result<String, OracleError> {
        let max_attempts = self.settings.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.call_once(profile).await {
                Ok(answer) => return Ok(answer),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    let delay = self.settings.delay_for(attempt);
                    crate::log_retry_attempt!(attempt, max_attempts, e);
                    self.backoff(delay).await?;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn call_once(&self, profile: &ColumnProfile) -> Result<String, OracleError> {
        let call = async {
            match tokio::time::timeout(self.settings.timeout, self.oracle.classify(profile)).await
            {
                Ok(result) => result,
                Err(_) => Err(OracleError::Timeout(format!(
                    "no answer within {}s",
                    self.settings.timeout.as_secs_f64()
                ))),
            }
        };

        match self.cancel.clone() {
            Some(mut rx) => {
                if *rx.borrow() {
                    return Err(OracleError::Cancelled);
                }
                tokio::select! {
                    result = call => result,
                    _ = wait_for_cancel(&mut rx) => Err(OracleError::Cancelled),
                }
            }
            None => call.await,
        }
    }

    /// Sleep before the next attempt, cut short by cancellation
    async fn backoff(&self, delay: Duration) -> Result<(), OracleError> {
        match self.cancel.clone() {
            Some(mut rx) => {
                if *rx.borrow() {
                    return Err(OracleError::Cancelled);
                }
                tokio::select! {
                    _ = tokio::time::sleep(delay) => Ok(()),
                    _ = wait_for_cancel(&mut rx) => Err(OracleError::Cancelled),
                }
            }
            None => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

async fn wait_for_cancel(rx: &mut watch::Receiver<bool>) {
    loop {
        if rx.changed().await.is_err() {
            // Sender gone, cancellation can no longer happen
            std::future::pending::<()>().await;
        }
        if *rx.borrow() {
            return;
        }
    }
}

/// Parse an oracle answer into a normalized verdict
///
/// Accepts a JSON object, optionally wrapped in prose or a Markdown code fence,
/// with English (`category`, `sensitive`, `rationale`) or Portuguese
/// (`tipo_coluna`, `eh_sensivel`, `explicacao`) keys. Returns `None` when no
/// object with a category can be found.
///
/// ```
/// use sheetguard::anonymization::classifier::parse_verdict;
/// use sheetguard::anonymization::models::Category;
///
/// let verdict = parse_verdict(r#"{"tipo_coluna": "financeiro", "eh_sensivel": true}"#).unwrap();
/// assert_eq!(verdict.category, Category::Financial);
/// assert!(verdict.sensitive);
/// ```
pub fn parse_verdict(answer: &str) -> Option<ClassificationVerdict> {
    let start = answer.find('{')?;
    let end = answer.rfind('}')?;
    if end < start {
        return None;
    }

    let value: Value = serde_json::from_str(&answer[start..=end]).ok()?;
    let object = value.as_object()?;

    let category = lookup(object, &["category", "tipo_coluna", "categoria"])?
        .as_str()
        .filter(|s| !s.trim().is_empty())?;

    let claimed =
        lookup(object, &["sensitive", "eh_sensivel", "is_sensitive"]).and_then(parse_flag);

    let rationale = lookup(object, &["rationale", "explicacao", "explanation", "reason"])
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    Some(ClassificationVerdict::from_oracle(
        Category::parse(category),
        claimed,
        rationale,
    ))
}

fn lookup<'a>(object: &'a Map<String, Value>, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| object.get(*k))
}

fn parse_flag(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.trim().to_lowercase().as_str() {
            "true" | "yes" | "sim" => Some(true),
            "false" | "no" | "nao" | "não" => Some(false),
            _ => None,
        },
        Value::Number(n) => n.as_i64().map(|n| n != 0),
        _ => None,
    }
}
