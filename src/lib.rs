// Sheetguard - LGPD-oriented spreadsheet anonymizer
// Copyright (c) 2025 Sheetguard Contributors
// Licensed under the MIT License

//! # Sheetguard - spreadsheet anonymizer
//!
//! Sheetguard anonymizes tabular datasets by classifying the sensitivity of each
//! column and applying a category-specific policy: removal, partial masking, or
//! Laplace noise under a differential-privacy budget.
//!
//! ## Overview
//!
//! A run goes through five states:
//!
//! - **loaded**: a table of named columns, supplied by a loader such as [`adapters::csv`]
//! - **classified**: every column has a verdict from a classification oracle
//! - **redacted**: identifiers removed, quasi-identifiers masked
//! - **awaiting_budget**: financial and demographic columns wait for a privacy budget
//! - **finalized**: Laplace noise applied, final table and report available
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`anonymization`] - Profiling, classification, policy, redaction, noise, reporting
//! - [`adapters`] - External integrations (classification oracles, CSV files)
//! - [`domain`] - Table model and error types
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use sheetguard::adapters::csv::{read_table, write_table};
//! use sheetguard::anonymization::AnonymizationEngine;
//! use sheetguard::config::load_config_or_default;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = load_config_or_default("sheetguard.toml")?;
//!     let engine = AnonymizationEngine::new(config)?;
//!
//!     let table = read_table("clientes.csv")?;
//!     let awaiting = engine.prepare("clientes.csv", table).await?;
//!     write_table(awaiting.intermediate(), "clientes_anonymized.csv")?;
//!
//!     // The privacy budget is the caller's decision
//!     let finalized = engine.finalize(&awaiting, 1.0)?;
//!     write_table(&finalized.final_table, "clientes_dp.csv")?;
//!
//!     println!("{}", finalized.report.format_console());
//!     Ok(())
//! }
//! ```
//!
//! ## Classification Oracles
//!
//! Any type implementing [`adapters::oracle::ClassificationOracle`] can classify
//! columns. Two backends ship with the crate:
//!
//! - [`adapters::oracle::OpenAiOracle`] - OpenAI-compatible chat completions
//! - [`adapters::oracle::KeywordOracle`] - offline header and value-shape rules
//!
//! Oracle failures never abort a run. A column whose verdict could not be
//! obtained is removed and reported as quarantined (`fallback = "fail_closed"`),
//! or kept unchanged with `fallback = "fail_open"`.
//!
//! ## Error Handling
//!
//! Library functions return [`domain::Result`], built on [`domain::SheetguardError`].
//! An invalid privacy budget is the only fatal pipeline error:
//!
//! ```rust
//! use sheetguard::anonymization::PrivacyBudget;
//! use sheetguard::domain::SheetguardError;
//!
//! assert!(matches!(PrivacyBudget::new(-1.0), Err(SheetguardError::InvalidBudget(_))));
//! ```

pub mod adapters;
pub mod anonymization;
pub mod cli;
pub mod config;
pub mod domain;
pub mod logging;
