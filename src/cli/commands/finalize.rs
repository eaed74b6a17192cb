//! Finalize command implementation
//!
//! Resumes a prepared run from its checkpoint and applies Laplace noise with
//! the privacy budget chosen on the command line. No oracle is contacted.

use super::{load_command_config, ArtifactPaths};
use crate::adapters::csv::write_table;
use crate::anonymization::audit::AuditLogger;
use crate::anonymization::{AwaitingBudget, NoiseInjector, PrivacyBudget};
use anyhow::Context;
use clap::Args;
use std::path::{Path, PathBuf};

/// Arguments for the finalize command
#[derive(Args, Debug)]
pub struct FinalizeArgs {
    /// Checkpoint written by `prepare`
    pub checkpoint: PathBuf,

    /// Privacy budget; smaller means more noise
    #[arg(short, long, allow_negative_numbers = true)]
    pub epsilon: f64,

    /// Directory for the output files (defaults to the checkpoint's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

impl FinalizeArgs {
    /// Execute the finalize command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!(
            checkpoint = %self.checkpoint.display(),
            epsilon = self.epsilon,
            "Starting finalize command"
        );

        let Some(config) = load_command_config(config_path) else {
            return Ok(2);
        };

        let budget = match PrivacyBudget::new(self.epsilon) {
            Ok(budget) => budget,
            Err(e) => {
                tracing::error!(error = %e, "Invalid privacy budget");
                eprintln!("❌ {e}");
                return Ok(2);
            }
        };

        let awaiting = AwaitingBudget::load_checkpoint(&self.checkpoint)
            .with_context(|| format!("Failed to resume from {}", self.checkpoint.display()))?;
        let audit = AuditLogger::from_config(&config.audit)?;
        let mut injector = NoiseInjector::from_config(&config.noise);

        let finalized = awaiting.finalize(&budget, &mut injector)?;
        audit.log_stage(awaiting.source(), &finalized.report, &[])?;

        let output_dir = self
            .output_dir
            .clone()
            .or_else(|| self.checkpoint.parent().map(Path::to_path_buf));
        let paths = ArtifactPaths::for_input(Path::new(awaiting.source()), output_dir.as_deref());
        write_table(&finalized.final_table, paths.final_table())?;
        finalized.report.write_to_file(&paths.report())?;

        println!("{}", finalized.report.format_console());
        println!("✅ Final table: {}", paths.final_table().display());
        println!("✅ Report:      {}", paths.report().display());
        Ok(0)
    }
}
