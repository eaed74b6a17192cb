//! Prepare command implementation
//!
//! Runs classification and redaction, then stops at the privacy-budget
//! decision. The suspended run is written as a checkpoint that `finalize`
//! picks up later, possibly in another process.

use super::{load_command_config, ArtifactPaths};
use crate::adapters::csv::{read_table, write_table};
use crate::anonymization::AnonymizationEngine;
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the prepare command
#[derive(Args, Debug)]
pub struct PrepareArgs {
    /// CSV file to anonymize (header row required)
    pub input: PathBuf,

    /// Directory for the output files (defaults to the input's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,
}

impl PrepareArgs {
    /// Execute the prepare command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting prepare command");

        let Some(config) = load_command_config(config_path) else {
            return Ok(2);
        };
        let default_epsilon = config.noise.default_epsilon;

        let engine = match AnonymizationEngine::new(config) {
            Ok(engine) => engine.with_cancellation(shutdown_signal),
            Err(e) => {
                crate::log_error_with_context!(e, "Failed to create anonymization engine");
                eprintln!("❌ Failed to initialize: {e:#}");
                return Ok(2);
            }
        };

        let table = read_table(&self.input)?;
        let source = self.input.display().to_string();
        let awaiting = engine.prepare(&source, table).await?;

        let paths = ArtifactPaths::for_input(&self.input, self.output_dir.as_deref());
        write_table(awaiting.intermediate(), paths.anonymized())?;
        awaiting.save_checkpoint(&paths.checkpoint())?;
        awaiting.report().write_to_file(&paths.report())?;

        println!("{}", awaiting.report().format_console());
        println!("✅ Intermediate table: {}", paths.anonymized().display());
        println!("✅ Checkpoint:         {}", paths.checkpoint().display());
        println!("✅ Report:             {}", paths.report().display());
        println!();

        if awaiting.deferred().is_empty() {
            println!("No columns need noise; the intermediate table is final.");
        } else {
            println!(
                "{} column(s) await a privacy budget: {}",
                awaiting.deferred().len(),
                awaiting.deferred().join(", ")
            );
            println!("Next step:");
            println!(
                "  sheetguard finalize {} --epsilon {default_epsilon}",
                paths.checkpoint().display()
            );
        }
        Ok(0)
    }
}
