//! Main anonymization engine
//!
//! [`AnonymizationEngine`] builds every pipeline component from a
//! [`SheetguardConfig`] and drives a table through the pipeline, writing an
//! audit entry after each completed phase.
//!
//! # Examples
//!
//! ```no_run
//! use sheetguard::anonymization::AnonymizationEngine;
//! use sheetguard::config::{OracleBackend, SheetguardConfig};
//!
//! # async fn example(table: sheetguard::domain::Table) -> anyhow::Result<()> {
//! let mut config = SheetguardConfig::default();
//! config.oracle.backend = OracleBackend::Keywords;
//!
//! let engine = AnonymizationEngine::new(config)?;
//!
//! // Phase one stops at the budget decision
//! let awaiting = engine.prepare("clientes.csv", table).await?;
//! println!("{}", awaiting.report().format_console());
//!
//! // Phase two, once the caller has picked epsilon
//! let finalized = engine.finalize(&awaiting, 0.5)?;
//! println!("{} columns released", finalized.final_table.column_count());
//! # Ok(())
//! # }
//! ```

use crate::adapters::oracle::{create_oracle, ClassificationOracle};
use crate::anonymization::{
    audit::AuditLogger,
    classifier::{Classifier, ClassifierSettings},
    noise::{NoiseInjector, PrivacyBudget},
    pipeline::{AwaitingBudget, Finalized, Pipeline},
    policy::PolicyResolver,
    profiler::ColumnProfiler,
    redaction::RedactionEngine,
};
use crate::config::SheetguardConfig;
use crate::domain::Table;
use anyhow::{anyhow, Context, Result};
use std::sync::Arc;
use tokio::sync::watch;

/// Main anonymization engine
///
/// Owns one configured instance of every stage. The engine itself holds no
/// per-run state, so a single engine can process any number of tables.
pub struct AnonymizationEngine {
    config: SheetguardConfig,
    profiler: ColumnProfiler,
    classifier: Classifier,
    resolver: PolicyResolver,
    redaction: RedactionEngine,
    audit_logger: AuditLogger,
}

impl AnonymizationEngine {
    /// Create a new anonymization engine
    ///
    /// Builds the oracle selected by `config.oracle.backend`.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Configuration validation fails
    /// - The oracle cannot be created (missing API key, bad keyword library)
    /// - Audit logger initialization fails
    pub fn new(config: SheetguardConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| anyhow!(e))
            .context("Invalid sheetguard configuration")?;

        let oracle = create_oracle(&config.oracle).context("Failed to create classification oracle")?;
        Self::with_oracle(config, oracle)
    }

    /// Create an engine around an existing oracle
    ///
    /// The `[oracle]` section still supplies timeouts, retries and concurrency.
    pub fn with_oracle(
        config: SheetguardConfig,
        oracle: Arc<dyn ClassificationOracle>,
    ) -> Result<Self> {
        let audit_logger = AuditLogger::from_config(&config.audit)?;
        let classifier = Classifier::new(oracle, ClassifierSettings::from_config(&config.oracle));

        tracing::debug!(
            oracle = classifier.oracle_name(),
            fallback = ?config.pipeline.fallback,
            sample_size = config.pipeline.sample_size,
            audit = audit_logger.is_enabled(),
            "Anonymization engine ready"
        );

        Ok(Self {
            profiler: ColumnProfiler::new(config.pipeline.sample_size),
            classifier,
            resolver: PolicyResolver::from_config(&config.pipeline),
            redaction: RedactionEngine::from_config(&config.pipeline),
            audit_logger,
            config,
        })
    }

    /// Degrade in-flight oracle calls to "unclassified" once `cancel` turns `true`
    pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
        self.classifier = self.classifier.with_cancellation(cancel);
        self
    }

    /// Configuration in use
    pub fn config(&self) -> &SheetguardConfig {
        &self.config
    }

    /// Classify and redact `table`, stopping before noise injection
    ///
    /// # Errors
    ///
    /// Oracle problems never fail this call; only a broken table or an audit
    /// write failure does.
    pub async fn prepare(&self, source: &str, table: Table) -> Result<AwaitingBudget> {
        tracing::info!(
            source = %source,
            rows = table.row_count(),
            columns = table.column_count(),
            oracle = self.classifier.oracle_name(),
            "Preparing table"
        );

        let classified = Pipeline::load(source, table)
            .classify(&self.profiler, &self.classifier)
            .await;
        let profiles = classified.profiles().to_vec();

        let redacted = classified
            .into_redacted(&self.resolver, &self.redaction)
            .context("Redaction failed")?;
        tracing::info!(
            run_id = %redacted.run_id(),
            kept = redacted.intermediate().column_count(),
            deferred = redacted.deferred().len(),
            "Intermediate table ready"
        );
        let awaiting = redacted.await_budget();

        self.audit_logger
            .log_stage(source, awaiting.report(), &profiles)
            .context("Failed to write audit entry")?;

        Ok(awaiting)
    }

    /// Apply noise to a prepared run with the caller's `epsilon`
    ///
    /// # Errors
    ///
    /// Rejects an invalid budget before anything is noised. The error wraps a
    /// [`SheetguardError::InvalidBudget`](crate::domain::SheetguardError::InvalidBudget).
    pub fn finalize(&self, awaiting: &AwaitingBudget, epsilon: f64) -> Result<Finalized> {
        let budget = PrivacyBudget::new(epsilon)?;
        let mut injector = NoiseInjector::from_config(&self.config.noise);

        let finalized = awaiting
            .finalize(&budget, &mut injector)
            .context("Noise injection failed")?;

        self.audit_logger
            .log_stage(awaiting.source(), &finalized.report, &[])
            .context("Failed to write audit entry")?;

        tracing::info!(
            run_id = %finalized.report.run_id,
            epsilon = epsilon,
            columns = finalized.final_table.column_count(),
            "Run finalized"
        );
        Ok(finalized)
    }

    /// Run the whole pipeline with an explicit `epsilon`
    pub async fn run(&self, source: &str, table: Table, epsilon: f64) -> Result<Finalized> {
        // Fail fast on a bad budget, before spending oracle calls
        PrivacyBudget::new(epsilon)?;

        let awaiting = self.prepare(source, table).await?;
        self.finalize(&awaiting, epsilon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OracleBackend;
    use crate::domain::{Column, SheetguardError};

    fn config(dir: &std::path::Path) -> SheetguardConfig {
        let mut config = SheetguardConfig::default();
        config.oracle.backend = OracleBackend::Keywords;
        config.audit.log_path = dir.join("audit.log");
        config.noise.seed = Some(5);
        config
    }

    fn table() -> Table {
        Table::new(vec![
            Column::from_raw("CPF", &["123.456.789-09", "987.654.321-00"]),
            Column::from_raw("Idade", &["34", "51"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_engine_creation() {
        let dir = tempfile::tempdir().unwrap();
        let engine = AnonymizationEngine::new(config(dir.path())).unwrap();
        assert_eq!(engine.config().oracle.backend, OracleBackend::Keywords);
    }

    #[test]
    fn test_engine_rejects_invalid_config() {
        let mut config = SheetguardConfig::default();
        config.pipeline.sample_size = 0;
        assert!(AnonymizationEngine::new(config).is_err());
    }

    #[tokio::test]
    async fn test_run_writes_audit_per_phase() {
        let dir = tempfile::tempdir().unwrap();
        let engine = AnonymizationEngine::new(config(dir.path())).unwrap();

        let finalized = engine.run("pessoas.csv", table(), 1.0).await.unwrap();
        assert_eq!(finalized.final_table.column_names(), ["Idade_noised"]);

        let audit = std::fs::read_to_string(dir.path().join("audit.log")).unwrap();
        assert_eq!(audit.lines().count(), 2);
        assert!(!audit.contains("123.456.789-09"));
    }

    #[tokio::test]
    async fn test_invalid_epsilon_is_budget_error() {
        let dir = tempfile::tempdir().unwrap();
        let engine = AnonymizationEngine::new(config(dir.path())).unwrap();

        let err = engine.run("pessoas.csv", table(), 0.0).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<SheetguardError>(),
            Some(SheetguardError::InvalidBudget(_))
        ));
        // Nothing ran, so nothing was audited
        assert!(!dir.path().join("audit.log").exists());
    }
}
