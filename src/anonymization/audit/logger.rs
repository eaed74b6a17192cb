//! Audit logger for pipeline stages

use crate::anonymization::models::ColumnProfile;
use crate::anonymization::report::ClassificationReport;
use crate::config::AuditConfig;
use anyhow::{Context, Result};
use serde::Serialize;
use sha2::{Digest, Sha256};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Audit log entry
#[derive(Debug, Serialize)]
struct AuditLogEntry {
    timestamp: String,
    run_id: String,
    state: String,
    source: String,
    epsilon: Option<f64>,
    columns: Vec<AuditColumn>,
}

/// Audit column entry (with hashed sample)
#[derive(Debug, Serialize)]
struct AuditColumn {
    column: String,
    category: String,
    action: String,
    outcome: String,
    provenance: String,
    /// SHA-256 of the sampled values (never log plaintext)
    sample_hash: Option<String>,
}

/// Append-only audit trail of pipeline runs
pub struct AuditLogger {
    log_path: PathBuf,
    json_format: bool,
    enabled: bool,
}

impl AuditLogger {
    /// Create a new audit logger
    pub fn new(log_path: PathBuf, json_format: bool, enabled: bool) -> Result<Self> {
        if enabled {
            if let Some(parent) = log_path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create audit log directory: {}", parent.display())
                })?;
            }
        }

        Ok(Self {
            log_path,
            json_format,
            enabled,
        })
    }

    /// Create an audit logger from the `[audit]` configuration section
    pub fn from_config(config: &AuditConfig) -> Result<Self> {
        Self::new(config.log_path.clone(), config.json_format, config.enabled)
    }

    /// A logger that writes nothing
    pub fn disabled() -> Self {
        Self {
            log_path: PathBuf::new(),
            json_format: true,
            enabled: false,
        }
    }

    /// Whether entries are written
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Log a completed stage
    ///
    /// `profiles` supplies the sample digests; pass an empty slice when the
    /// profiles are no longer available (e.g. after resuming from a checkpoint).
    pub fn log_stage(
        &self,
        source: &str,
        report: &ClassificationReport,
        profiles: &[ColumnProfile],
    ) -> Result<()> {
        if !self.enabled {
            return Ok(());
        }

        let entry = AuditLogEntry {
            timestamp: report.generated_at.to_rfc3339(),
            run_id: report.run_id.to_string(),
            state: report.state.to_string(),
            source: source.to_string(),
            epsilon: report.epsilon,
            columns: report
                .entries
                .iter()
                .map(|e| AuditColumn {
                    column: e.column.clone(),
                    category: e.category.to_string(),
                    action: e.action.to_string(),
                    outcome: e.outcome.to_string(),
                    provenance: e.provenance.to_string(),
                    sample_hash: profiles
                        .iter()
                        .find(|p| p.name == e.column)
                        .map(|p| self.hash_sample(&p.sample)),
                })
                .collect(),
        };

        self.write_entry(&entry)
    }

    /// Hash sampled values using SHA-256
    fn hash_sample(&self, sample: &[String]) -> String {
        let mut hasher = Sha256::new();
        for value in sample {
            hasher.update(value.as_bytes());
            hasher.update([0u8]);
        }
        let result = hasher.finalize();
        format!("{result:x}")
    }

    /// Write an audit entry to the log file
    fn write_entry(&self, entry: &AuditLogEntry) -> Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .with_context(|| format!("Failed to open audit log: {}", self.log_path.display()))?;

        if self.json_format {
            let json_line =
                serde_json::to_string(entry).context("Failed to serialize audit entry")?;
            writeln!(file, "{json_line}").context("Failed to write audit entry")?;
        } else {
            let actions: Vec<String> = entry
                .columns
                .iter()
                .map(|c| format!("{}={}", c.column, c.outcome))
                .collect();
            writeln!(
                file,
                "[{}] Run: {} | State: {} | Source: {} | Columns: {} | {}",
                entry.timestamp,
                entry.run_id,
                entry.state,
                entry.source,
                entry.columns.len(),
                actions.join(", ")
            )
            .context("Failed to write audit entry")?;
        }

        Ok(())
    }
}
