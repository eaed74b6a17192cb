//! Anonymization pipeline for Sheetguard
//!
//! Turns a loaded table plus per-column sensitivity verdicts into removal,
//! masking and Laplace-noise transformations.
//!
//! # Architecture
//!
//! The pipeline consists of:
//! - **Profiling**: Bounded, deterministic sample of each column
//! - **Classification**: One oracle call per column, degraded verdicts on failure
//! - **Policy**: Fixed lookup from verdict to action, with a fail-closed fallback
//! - **Redaction**: Removal and masking into an intermediate table
//! - **Noise**: Laplace mechanism on deferred columns, once a budget is supplied
//! - **Audit**: Structured logging with hashed sample values
//!
//! # Usage
//!
//! ```rust,ignore
//! use sheetguard::anonymization::AnonymizationEngine;
//!
//! let engine = AnonymizationEngine::new(config)?;
//! let awaiting = engine.prepare("clientes.csv", table).await?;
//! let finalized = engine.finalize(&awaiting, 1.0)?;
//! ```

pub mod audit;
pub mod classifier;
pub mod engine;
pub mod models;
pub mod noise;
pub mod pipeline;
pub mod policy;
pub mod profiler;
pub mod redaction;
pub mod report;

// Re-export main types
pub use classifier::{Classifier, ClassifierSettings};
pub use engine::AnonymizationEngine;
pub use models::{Category, ClassificationVerdict, ColumnProfile, PolicyAction};
pub use noise::{LaplaceMechanism, NoiseInjector, PrivacyBudget};
pub use pipeline::{AwaitingBudget, Finalized, Pipeline, PipelineState, Redacted};
pub use policy::PolicyResolver;
pub use profiler::ColumnProfiler;
pub use redaction::RedactionEngine;
pub use report::{ClassificationReport, ColumnOutcome, ReportEntry};
