//! Pipeline state machine
//!
//! `loaded → classified → redacted → awaiting_budget → finalized`
//!
//! Each state is its own type and every transition consumes the previous one,
//! so a run can only move forward. [`AwaitingBudget`] is the suspension point:
//! noise is only applied once the caller hands over a [`PrivacyBudget`], and the
//! state can be checkpointed to disk so that a separate process can finish the
//! run without classifying again.
//!
//! # Examples
//!
//! ```no_run
//! use sheetguard::adapters::oracle::KeywordOracle;
//! use sheetguard::anonymization::classifier::{Classifier, ClassifierSettings};
//! use sheetguard::anonymization::noise::{NoiseInjector, PrivacyBudget};
//! use sheetguard::anonymization::pipeline::Pipeline;
//! use sheetguard::anonymization::{ColumnProfiler, PolicyResolver, RedactionEngine};
//! use std::sync::Arc;
//!
//! # async fn example(table: sheetguard::domain::Table) -> sheetguard::domain::Result<()> {
//! let classifier = Classifier::new(
//!     Arc::new(KeywordOracle::builtin().expect("builtin library")),
//!     ClassifierSettings::default(),
//! );
//!
//! let awaiting = Pipeline::load("clientes.csv", table)
//!     .classify(&ColumnProfiler::default(), &classifier)
//!     .await
//!     .redact(&PolicyResolver::default(), &RedactionEngine::default())?;
//!
//! let finalized = awaiting.finalize(&PrivacyBudget::new(1.0)?, &mut NoiseInjector::default())?;
//! println!("{}", finalized.report.format_console());
//! # Ok(())
//! # }
//! ```

use crate::anonymization::classifier::Classifier;
use crate::anonymization::models::{ClassificationVerdict, ColumnProfile, PolicyAction};
use crate::anonymization::noise::{NoiseInjector, PrivacyBudget};
use crate::anonymization::policy::PolicyResolver;
use crate::anonymization::profiler::ColumnProfiler;
use crate::anonymization::redaction::{ColumnRedaction, RedactedTable, RedactionEngine};
use crate::anonymization::report::ClassificationReport;
use crate::domain::{Result, SheetguardError, Table};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

/// Checkpoint layout version
const CHECKPOINT_VERSION: u32 = 1;

/// Pipeline states, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineState {
    Loaded,
    Classified,
    Redacted,
    AwaitingBudget,
    Finalized,
}

impl PipelineState {
    /// Snake-case name of the state
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Loaded => "loaded",
            Self::Classified => "classified",
            Self::Redacted => "redacted",
            Self::AwaitingBudget => "awaiting_budget",
            Self::Finalized => "finalized",
        }
    }
}

impl fmt::Display for PipelineState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A loaded table, nothing done yet
#[derive(Debug, Clone)]
pub struct Pipeline {
    run_id: Uuid,
    source: String,
    table: Table,
}

impl Pipeline {
    /// Start a run over `table`; `source` names it in reports and audit entries
    pub fn load(source: impl Into<String>, table: Table) -> Self {
        Self {
            run_id: Uuid::new_v4(),
            source: source.into(),
            table,
        }
    }

    /// Use a caller-chosen run identifier
    pub fn with_run_id(mut self, run_id: Uuid) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::Loaded
    }

    /// Input table
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Profile every column and classify it
    ///
    /// Never fails: oracle problems degrade individual verdicts.
    pub async fn classify(self, profiler: &ColumnProfiler, classifier: &Classifier) -> Classified {
        let profiles = profiler.profile_table(&self.table);
        let verdicts = classifier.classify_all(&profiles).await;

        crate::log_stage_transition!(
            PipelineState::Loaded.as_str(),
            PipelineState::Classified.as_str(),
            profiles.len()
        );

        Classified {
            run_id: self.run_id,
            source: self.source,
            table: self.table,
            profiles,
            verdicts,
        }
    }
}

/// Every column has a verdict
#[derive(Debug, Clone)]
pub struct Classified {
    run_id: Uuid,
    source: String,
    table: Table,
    profiles: Vec<ColumnProfile>,
    verdicts: Vec<ClassificationVerdict>,
}

impl Classified {
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::Classified
    }

    /// Input table, untouched
    pub fn table(&self) -> &Table {
        &self.table
    }

    /// Column profiles, in column order
    pub fn profiles(&self) -> &[ColumnProfile] {
        &self.profiles
    }

    /// Verdicts, in column order
    pub fn verdicts(&self) -> &[ClassificationVerdict] {
        &self.verdicts
    }

    /// Resolve an action per column, then mask and remove columns
    ///
    /// # Errors
    ///
    /// Only fails if the intermediate table cannot be assembled, which would
    /// indicate a broken input table.
    pub fn into_redacted(
        self,
        resolver: &PolicyResolver,
        engine: &RedactionEngine,
    ) -> Result<Redacted> {
        let actions: Vec<PolicyAction> = self
            .profiles
            .iter()
            .zip(&self.verdicts)
            .map(|(profile, verdict)| resolver.resolve(&profile.name, verdict, profile.kind))
            .collect();

        let redacted = engine.apply(&self.table, &actions)?;
        let report = ClassificationReport::for_redaction(
            self.run_id,
            &self.profiles,
            &self.verdicts,
            &redacted,
            resolver,
        );
        crate::log_stage_transition!(
            PipelineState::Classified.as_str(),
            PipelineState::Redacted.as_str(),
            redacted.table.column_count()
        );

        Ok(Redacted {
            source: self.source,
            redacted,
            report,
        })
    }

    /// Shorthand for [`into_redacted`](Self::into_redacted) followed by
    /// [`Redacted::await_budget`]
    pub fn redact(
        self,
        resolver: &PolicyResolver,
        engine: &RedactionEngine,
    ) -> Result<AwaitingBudget> {
        Ok(self.into_redacted(resolver, engine)?.await_budget())
    }
}

/// Columns removed and masked; deferred columns not yet noised
#[derive(Debug, Clone, PartialEq)]
pub struct Redacted {
    source: String,
    redacted: RedactedTable,
    report: ClassificationReport,
}

impl Redacted {
    pub fn run_id(&self) -> Uuid {
        self.report.run_id
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::Redacted
    }

    /// Intermediate table
    pub fn intermediate(&self) -> &Table {
        &self.redacted.table
    }

    /// Intermediate names of the columns that will wait for noise
    pub fn deferred(&self) -> &[String] {
        &self.redacted.deferred
    }

    /// Per-column redaction details, in input column order
    pub fn columns(&self) -> &[ColumnRedaction] {
        &self.redacted.columns
    }

    pub fn report(&self) -> &ClassificationReport {
        &self.report
    }

    /// Suspend the run until a privacy budget is supplied
    pub fn await_budget(self) -> AwaitingBudget {
        let mut report = self.report;
        report.state = PipelineState::AwaitingBudget;

        crate::log_stage_transition!(
            PipelineState::Redacted.as_str(),
            PipelineState::AwaitingBudget.as_str(),
            self.redacted.deferred.len()
        );

        AwaitingBudget {
            version: CHECKPOINT_VERSION,
            source: self.source,
            redacted: self.redacted,
            report,
        }
    }
}

/// Redacted run suspended until the caller supplies a privacy budget
///
/// Holds everything noise injection needs: the intermediate table, the
/// deferred-column list and the report so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AwaitingBudget {
    version: u32,
    source: String,
    redacted: RedactedTable,
    report: ClassificationReport,
}

impl AwaitingBudget {
    pub fn run_id(&self) -> Uuid {
        self.report.run_id
    }

    pub fn state(&self) -> PipelineState {
        PipelineState::AwaitingBudget
    }

    /// Name of the input the run started from
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Intermediate table (removed and masked, not yet noised)
    pub fn intermediate(&self) -> &Table {
        &self.redacted.table
    }

    /// Intermediate names of the columns waiting for noise
    pub fn deferred(&self) -> &[String] {
        &self.redacted.deferred
    }

    /// Report up to this point
    pub fn report(&self) -> &ClassificationReport {
        &self.report
    }

    /// Persist this state as JSON
    pub fn save_checkpoint(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string(self)?;
        std::fs::write(path, json)?;
        tracing::info!(
            run_id = %self.report.run_id,
            path = %path.display(),
            deferred = self.redacted.deferred.len(),
            "Checkpoint saved"
        );
        Ok(())
    }

    /// Restore a state written by [`save_checkpoint`](Self::save_checkpoint)
    ///
    /// # Errors
    ///
    /// Fails when the file cannot be read, is not a checkpoint, was written by
    /// an incompatible version, or lists deferred columns missing from its table.
    pub fn load_checkpoint(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            SheetguardError::Io(format!("Cannot read checkpoint {}: {e}", path.display()))
        })?;
        let state: Self = serde_json::from_str(&json)?;

        if state.version != CHECKPOINT_VERSION {
            return Err(SheetguardError::Validation(format!(
                "Checkpoint version {} is not supported (expected {CHECKPOINT_VERSION})",
                state.version
            )));
        }
        state.redacted.table.validate()?;
        if let Some(missing) = state
            .redacted
            .deferred
            .iter()
            .find(|name| state.redacted.table.column(name).is_none())
        {
            return Err(SheetguardError::Validation(format!(
                "Checkpoint defers column '{missing}' which its table does not contain"
            )));
        }

        tracing::info!(
            run_id = %state.report.run_id,
            path = %path.display(),
            "Checkpoint loaded"
        );
        Ok(state)
    }

    /// Apply noise with the caller's budget
    ///
    /// Borrows `self`, so a failed attempt can be retried with other settings.
    pub fn finalize(
        &self,
        budget: &PrivacyBudget,
        injector: &mut NoiseInjector,
    ) -> Result<Finalized> {
        let noised = injector.inject(&self.redacted.table, &self.redacted.deferred, budget)?;

        let mut report = self.report.clone();
        report.record_noise(&noised, budget.epsilon());

        crate::log_stage_transition!(
            PipelineState::AwaitingBudget.as_str(),
            PipelineState::Finalized.as_str(),
            noised.table.column_count()
        );

        Ok(Finalized {
            source: self.source.clone(),
            intermediate: self.redacted.table.clone(),
            final_table: noised.table,
            report,
        })
    }
}

/// Terminal state
#[derive(Debug, Clone, PartialEq)]
pub struct Finalized {
    /// Name of the input the run started from
    pub source: String,
    /// Table after removal and masking
    pub intermediate: Table,
    /// Table after noise injection
    pub final_table: Table,
    /// Complete report
    pub report: ClassificationReport,
}

impl Finalized {
    pub fn state(&self) -> PipelineState {
        PipelineState::Finalized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::oracle::KeywordOracle;
    use crate::anonymization::classifier::ClassifierSettings;
    use crate::anonymization::report::ColumnOutcome;
    use crate::domain::Column;
    use std::sync::Arc;

    fn table() -> Table {
        Table::new(vec![
            Column::from_raw("Nome", &["Ana Souza", "Bruno Lima"]),
            Column::from_raw("CEP", &["01310-100", "20040-002"]),
            Column::from_raw("Salario", &["4500", "3800"]),
            Column::from_raw("Produto", &["Caneta", "Lápis"]),
        ])
        .unwrap()
    }

    fn classifier() -> Classifier {
        Classifier::new(
            Arc::new(KeywordOracle::builtin().unwrap()),
            ClassifierSettings::default(),
        )
    }

    async fn awaiting() -> AwaitingBudget {
        Pipeline::load("clientes.csv", table())
            .classify(&ColumnProfiler::default(), &classifier())
            .await
            .redact(&PolicyResolver::default(), &RedactionEngine::default())
            .unwrap()
    }

    #[tokio::test]
    async fn test_states_advance() {
        let pipeline = Pipeline::load("clientes.csv", table());
        assert_eq!(pipeline.state(), PipelineState::Loaded);

        let classified = pipeline
            .classify(&ColumnProfiler::default(), &classifier())
            .await;
        assert_eq!(classified.state(), PipelineState::Classified);
        assert_eq!(classified.verdicts().len(), 4);
        assert_eq!(classified.table(), &table());

        let awaiting = classified
            .redact(&PolicyResolver::default(), &RedactionEngine::default())
            .unwrap();
        assert_eq!(awaiting.state(), PipelineState::AwaitingBudget);
        assert_eq!(awaiting.deferred(), ["Salario"]);
        assert_eq!(
            awaiting.intermediate().column_names(),
            ["CEP_masked", "Salario", "Produto"]
        );

        let finalized = awaiting
            .finalize(
                &PrivacyBudget::new(1.0).unwrap(),
                &mut NoiseInjector::default().with_seed(1),
            )
            .unwrap();
        assert_eq!(finalized.state(), PipelineState::Finalized);
        assert_eq!(
            finalized.final_table.column_names(),
            ["CEP_masked", "Salario_noised", "Produto"]
        );
        assert_eq!(finalized.intermediate, *awaiting.intermediate());
        assert_eq!(
            finalized.report.entry("Salario").unwrap().outcome,
            ColumnOutcome::Noised
        );
    }

    #[tokio::test]
    async fn test_redacted_step_exposes_intermediate_table() {
        let redacted = Pipeline::load("clientes.csv", table())
            .classify(&ColumnProfiler::default(), &classifier())
            .await
            .into_redacted(&PolicyResolver::default(), &RedactionEngine::default())
            .unwrap();

        assert_eq!(redacted.state(), PipelineState::Redacted);
        assert_eq!(redacted.report().state, PipelineState::Redacted);
        assert_eq!(
            redacted.intermediate().column_names(),
            ["CEP_masked", "Salario", "Produto"]
        );
        assert_eq!(redacted.deferred(), ["Salario"]);
        assert_eq!(redacted.columns().len(), 4);
        assert_eq!(redacted.columns()[0].action, PolicyAction::Remove);

        let run_id = redacted.run_id();
        let intermediate = redacted.intermediate().clone();
        let awaiting = redacted.await_budget();
        assert_eq!(awaiting.state(), PipelineState::AwaitingBudget);
        assert_eq!(awaiting.report().state, PipelineState::AwaitingBudget);
        assert_eq!(awaiting.run_id(), run_id);
        assert_eq!(awaiting.intermediate(), &intermediate);
    }

    #[tokio::test]
    async fn test_checkpoint_round_trip() {
        let awaiting = awaiting().await;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clientes.checkpoint.json");

        awaiting.save_checkpoint(&path).unwrap();
        let restored = AwaitingBudget::load_checkpoint(&path).unwrap();

        assert_eq!(restored, awaiting);
        assert_eq!(restored.run_id(), awaiting.run_id());
    }

    #[tokio::test]
    async fn test_checkpoint_version_checked() {
        let mut awaiting = awaiting().await;
        awaiting.version = 99;
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("old.checkpoint.json");
        awaiting.save_checkpoint(&path).unwrap();

        assert!(matches!(
            AwaitingBudget::load_checkpoint(&path),
            Err(SheetguardError::Validation(_))
        ));
    }

    #[test]
    fn test_missing_checkpoint() {
        let result = AwaitingBudget::load_checkpoint(Path::new("/nonexistent/run.checkpoint.json"));
        assert!(matches!(result, Err(SheetguardError::Io(_))));
    }
}
