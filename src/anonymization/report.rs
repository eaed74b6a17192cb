//! Classification report
//!
//! One entry per input column, in input order, recording the verdict, the
//! action taken and any per-value anomalies. Removed columns stay in the report
//! for audit even though they are gone from the artifacts.

use crate::anonymization::models::{
    Category, ClassificationVerdict, ColumnAnomaly, ColumnProfile, PolicyAction,
    VerdictProvenance,
};
use crate::anonymization::noise::NoisedTable;
use crate::anonymization::pipeline::PipelineState;
use crate::anonymization::policy::PolicyResolver;
use crate::anonymization::redaction::RedactedTable;
use crate::domain::{Result, ScalarKind};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use uuid::Uuid;

const RULE: &str = "═══════════════════════════════════════════════════════════════\n";
const THIN_RULE: &str = "───────────────────────────────────────────────────────────────\n";

/// What became of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnOutcome {
    /// Dropped by policy
    Removed,
    /// Dropped because its verdict was degraded and the fallback is fail-closed
    Quarantined,
    /// Truncated to a prefix plus marker
    MaskedText,
    /// Day reset to the first of the month
    MaskedDate,
    /// Passed through, waiting for a privacy budget
    AwaitingNoise,
    /// Laplace noise applied
    Noised,
    /// Passed through unchanged
    Kept,
}

impl ColumnOutcome {
    const ALL: [ColumnOutcome; 7] = [
        Self::Removed,
        Self::Quarantined,
        Self::MaskedText,
        Self::MaskedDate,
        Self::AwaitingNoise,
        Self::Noised,
        Self::Kept,
    ];

    fn from_action(action: PolicyAction, quarantined: bool) -> Self {
        match action {
            PolicyAction::Remove if quarantined => Self::Quarantined,
            PolicyAction::Remove => Self::Removed,
            PolicyAction::MaskText => Self::MaskedText,
            PolicyAction::MaskDate => Self::MaskedDate,
            PolicyAction::DeferForNoise => Self::AwaitingNoise,
            PolicyAction::None => Self::Kept,
        }
    }
}

impl fmt::Display for ColumnOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Removed => "removed",
            Self::Quarantined => "quarantined",
            Self::MaskedText => "masked_text",
            Self::MaskedDate => "masked_date",
            Self::AwaitingNoise => "awaiting_noise",
            Self::Noised => "noised",
            Self::Kept => "kept",
        };
        f.write_str(label)
    }
}

/// Report line for one input column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportEntry {
    /// Name in the input table
    pub column: String,
    /// Name in the latest artifact, `None` when removed
    pub output_column: Option<String>,
    /// Inferred scalar kind
    pub kind: ScalarKind,
    /// Verdict category
    pub category: Category,
    /// Verdict sensitivity flag
    pub sensitive: bool,
    /// Verdict rationale
    pub rationale: String,
    /// Where the verdict came from
    pub provenance: VerdictProvenance,
    /// Resolved policy action
    pub action: PolicyAction,
    /// What became of the column
    pub outcome: ColumnOutcome,
    /// Values passed through instead of transformed
    pub anomalies: Vec<ColumnAnomaly>,
}

/// Ordered per-column report of one pipeline run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassificationReport {
    /// Run identifier, shared with the audit log
    pub run_id: Uuid,
    /// When the report was last updated
    pub generated_at: DateTime<Utc>,
    /// Pipeline state the report describes
    pub state: PipelineState,
    /// Privacy budget used for noise, once supplied
    pub epsilon: Option<f64>,
    /// One entry per input column, in input order
    pub entries: Vec<ReportEntry>,
}

impl ClassificationReport {
    /// Build the report for a redacted table
    ///
    /// `profiles`, `verdicts` and `redacted.columns` must be in input column order.
    pub fn for_redaction(
        run_id: Uuid,
        profiles: &[ColumnProfile],
        verdicts: &[ClassificationVerdict],
        redacted: &RedactedTable,
        resolver: &PolicyResolver,
    ) -> Self {
        let entries = profiles
            .iter()
            .zip(verdicts)
            .zip(&redacted.columns)
            .map(|((profile, verdict), redaction)| ReportEntry {
                column: profile.name.clone(),
                output_column: redaction.output.clone(),
                kind: profile.kind,
                category: verdict.category.clone(),
                sensitive: verdict.sensitive,
                rationale: verdict.rationale.clone(),
                provenance: verdict.provenance,
                action: redaction.action,
                outcome: ColumnOutcome::from_action(
                    redaction.action,
                    resolver.is_quarantined(verdict),
                ),
                anomalies: redaction.anomalies.clone(),
            })
            .collect();

        Self {
            run_id,
            generated_at: Utc::now(),
            state: PipelineState::Redacted,
            epsilon: None,
            entries,
        }
    }

    /// Record the outcome of the noise stage
    pub fn record_noise(&mut self, noised: &NoisedTable, epsilon: f64) {
        for column in &noised.columns {
            let entry = self.entries.iter_mut().find(|e| {
                e.outcome == ColumnOutcome::AwaitingNoise
                    && e.output_column.as_deref() == Some(column.source.as_str())
            });
            if let Some(entry) = entry {
                entry.output_column = Some(column.output.clone());
                entry.outcome = ColumnOutcome::Noised;
                entry.anomalies.extend(column.anomalies.iter().cloned());
            }
        }

        self.epsilon = Some(epsilon);
        self.state = PipelineState::Finalized;
        self.generated_at = Utc::now();
    }

    /// Entry for an input column
    pub fn entry(&self, column: &str) -> Option<&ReportEntry> {
        self.entries.iter().find(|e| e.column == column)
    }

    /// Number of columns with the given outcome
    pub fn count(&self, outcome: ColumnOutcome) -> usize {
        self.entries.iter().filter(|e| e.outcome == outcome).count()
    }

    /// Columns whose verdict did not come from a usable oracle answer
    pub fn degraded(&self) -> impl Iterator<Item = &ReportEntry> {
        self.entries.iter().filter(|e| {
            matches!(
                e.provenance,
                VerdictProvenance::Unavailable | VerdictProvenance::Unclassified
            )
        })
    }

    /// Format report for console output
    pub fn format_console(&self) -> String {
        let mut output = String::new();

        output.push('\n');
        output.push_str(RULE);
        output.push_str("              SHEETGUARD CLASSIFICATION REPORT                 \n");
        output.push_str(RULE);
        output.push('\n');

        output.push_str("📊 SUMMARY\n");
        output.push_str(THIN_RULE);
        output.push_str(&format!("  Run ID:             {}\n", self.run_id));
        output.push_str(&format!("  State:              {}\n", self.state));
        output.push_str(&format!("  Columns Analyzed:   {}\n", self.entries.len()));
        match self.epsilon {
            Some(epsilon) => output.push_str(&format!("  Privacy Budget (ε): {epsilon}\n")),
            None => output.push_str("  Privacy Budget (ε): not yet supplied\n"),
        }
        for outcome in ColumnOutcome::ALL {
            let count = self.count(outcome);
            if count > 0 {
                output.push_str(&format!("  {:20}{:>4}\n", format!("{outcome}:"), count));
            }
        }
        output.push('\n');

        if !self.entries.is_empty() {
            output.push_str("🔍 COLUMNS\n");
            output.push_str(THIN_RULE);
            for entry in &self.entries {
                output.push_str(&format!(
                    "  {:24} {:18} {:16} → {}\n",
                    entry.column,
                    entry.category.to_string(),
                    entry.outcome.to_string(),
                    entry.output_column.as_deref().unwrap_or("-"),
                ));
                if !entry.rationale.is_empty() {
                    output.push_str(&format!("      {}\n", entry.rationale));
                }
            }
            output.push('\n');
        }

        let warnings: Vec<String> = self
            .entries
            .iter()
            .flat_map(|entry| {
                entry
                    .anomalies
                    .iter()
                    .map(move |anomaly| format!("{}: {}", entry.column, anomaly))
            })
            .chain(
                self.degraded()
                    .map(|entry| format!("{}: {}", entry.column, entry.rationale)),
            )
            .collect();

        if !warnings.is_empty() {
            output.push_str("⚠️  WARNINGS\n");
            output.push_str(THIN_RULE);
            for warning in &warnings {
                output.push_str(&format!("  • {warning}\n"));
            }
            output.push('\n');
        }

        output.push_str(RULE);
        output.push('\n');

        output
    }

    /// Format report as JSON
    pub fn format_json(&self) -> std::result::Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write report to file as pretty JSON
    pub fn write_to_file(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, self.format_json()?)?;
        Ok(())
    }
}
