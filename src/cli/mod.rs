//! CLI interface and argument parsing
//!
//! This module provides the command-line interface for Sheetguard using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Sheetguard - spreadsheet anonymizer
#[derive(Parser, Debug)]
#[command(name = "sheetguard")]
#[command(version, about, long_about = None)]
#[command(author = "Sheetguard Contributors")]
pub struct Cli {
    /// Path to configuration file (defaults are used when it does not exist)
    #[arg(short, long, default_value = "sheetguard.toml", env = "SHEETGUARD_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "SHEETGUARD_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify, redact and noise a CSV file in one go
    Run(commands::run::RunArgs),

    /// Classify and redact a CSV file, then stop and wait for a privacy budget
    Prepare(commands::prepare::PrepareArgs),

    /// Apply noise to a prepared run from its checkpoint
    Finalize(commands::finalize::FinalizeArgs),

    /// Validate configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Initialize a new configuration file
    Init(commands::init::InitArgs),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_run() {
        let cli = Cli::parse_from(["sheetguard", "run", "clientes.csv"]);
        assert_eq!(cli.config, "sheetguard.toml");
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.input.to_str(), Some("clientes.csv"));
                assert_eq!(args.epsilon, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_run_with_epsilon() {
        let cli = Cli::parse_from([
            "sheetguard",
            "run",
            "clientes.csv",
            "--epsilon",
            "0.5",
            "--output-dir",
            "out",
        ]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.epsilon, Some(0.5));
                assert_eq!(args.output_dir.as_deref().and_then(|p| p.to_str()), Some("out"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_parse_with_config() {
        let cli = Cli::parse_from(["sheetguard", "--config", "custom.toml", "validate-config"]);
        assert_eq!(cli.config, "custom.toml");
        assert!(matches!(cli.command, Commands::ValidateConfig(_)));
    }

    #[test]
    fn test_cli_parse_with_log_level() {
        let cli = Cli::parse_from(["sheetguard", "--log-level", "debug", "prepare", "a.csv"]);
        assert_eq!(cli.log_level, Some("debug".to_string()));
        assert!(matches!(cli.command, Commands::Prepare(_)));
    }

    #[test]
    fn test_cli_finalize_requires_epsilon() {
        assert!(Cli::try_parse_from(["sheetguard", "finalize", "a.checkpoint.json"]).is_err());

        let cli = Cli::parse_from([
            "sheetguard",
            "finalize",
            "a.checkpoint.json",
            "--epsilon",
            "2",
        ]);
        assert!(matches!(cli.command, Commands::Finalize(ref args) if args.epsilon == 2.0));
    }

    #[test]
    fn test_cli_parse_init() {
        let cli = Cli::parse_from(["sheetguard", "init"]);
        assert!(matches!(cli.command, Commands::Init(_)));
    }
}
