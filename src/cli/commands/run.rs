//! Run command implementation
//!
//! Classifies, redacts and noises a CSV file in a single invocation, writing
//! both the intermediate and the final table plus the report.

use super::{load_command_config, ArtifactPaths};
use crate::adapters::csv::{read_table, write_table};
use crate::anonymization::{AnonymizationEngine, PrivacyBudget};
use clap::Args;
use std::path::PathBuf;
use tokio::sync::watch;

/// Arguments for the run command
#[derive(Args, Debug)]
pub struct RunArgs {
    /// CSV file to anonymize (header row required)
    pub input: PathBuf,

    /// Privacy budget; smaller means more noise (defaults to noise.default_epsilon)
    #[arg(short, long, allow_negative_numbers = true)]
    pub epsilon: Option<f64>,

    /// Directory for the output files (defaults to the input's directory)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Print the report as JSON instead of the console summary
    #[arg(long)]
    pub json: bool,
}

impl RunArgs {
    /// Execute the run command
    pub async fn execute(
        &self,
        config_path: &str,
        shutdown_signal: watch::Receiver<bool>,
    ) -> anyhow::Result<i32> {
        tracing::info!(input = %self.input.display(), "Starting run command");

        let Some(config) = load_command_config(config_path) else {
            return Ok(2); // Configuration error exit code
        };

        let epsilon = self.epsilon.unwrap_or(config.noise.default_epsilon);
        if let Err(e) = PrivacyBudget::new(epsilon) {
            tracing::error!(error = %e, "Invalid privacy budget");
            eprintln!("❌ {e}");
            return Ok(2);
        }

        let engine = match AnonymizationEngine::new(config) {
            Ok(engine) => engine.with_cancellation(shutdown_signal.clone()),
            Err(e) => {
                crate::log_error_with_context!(e, "Failed to create anonymization engine");
                eprintln!("❌ Failed to initialize: {e:#}");
                return Ok(2);
            }
        };

        let table = read_table(&self.input)?;
        println!(
            "🚀 Anonymizing {} ({} rows, {} columns)...",
            self.input.display(),
            table.row_count(),
            table.column_count()
        );

        let source = self.input.display().to_string();
        let finalized = engine.run(&source, table, epsilon).await?;

        let paths = ArtifactPaths::for_input(&self.input, self.output_dir.as_deref());
        write_table(&finalized.intermediate, paths.anonymized())?;
        write_table(&finalized.final_table, paths.final_table())?;
        finalized.report.write_to_file(&paths.report())?;

        if self.json {
            println!("{}", finalized.report.format_json()?);
        } else {
            println!("{}", finalized.report.format_console());
        }

        if *shutdown_signal.borrow() {
            println!("⚠️  Run interrupted: columns still being classified were left unclassified");
        }

        println!("✅ Intermediate table: {}", paths.anonymized().display());
        println!("✅ Final table:        {}", paths.final_table().display());
        println!("✅ Report:             {}", paths.report().display());
        Ok(0)
    }
}
