//! External system integrations for Sheetguard.
//!
//! - [`oracle`] - Classification oracles (OpenAI chat completions, offline keywords)
//! - [`csv`] - CSV loader and writer
//!
//! # Design Pattern
//!
//! Adapters follow the **Adapter Pattern** to isolate external dependencies and
//! enable testing with stub implementations. The oracle layer is a trait so the
//! pipeline never depends on a particular model vendor.
//!
//! ```rust,no_run
//! use sheetguard::adapters::oracle::create_oracle;
//! use sheetguard::config::{OracleBackend, OracleConfig};
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = OracleConfig {
//!     backend: OracleBackend::Keywords,
//!     ..OracleConfig::default()
//! };
//! let oracle = create_oracle(&config)?;
//! println!("Classifying with {}", oracle.name());
//! # Ok(())
//! # }
//! ```

pub mod csv;
pub mod oracle;
