//! Domain models and types for Sheetguard.
//!
//! # Overview
//!
//! The domain layer provides:
//! - **Tabular data** ([`Table`], [`Column`], [`CellValue`], [`ScalarKind`])
//! - **Error types** ([`SheetguardError`], [`OracleError`])
//! - **Result type alias** ([`Result`])
//!
//! # Example
//!
//! ```rust
//! use sheetguard::domain::{Column, Table};
//!
//! # fn example() -> sheetguard::domain::Result<()> {
//! let table = Table::new(vec![
//!     Column::from_raw("Nome", &["Ana Souza", "Bruno Lima"]),
//!     Column::from_raw("Salario", &["4500.00", "3800.50"]),
//! ])?;
//! assert_eq!(table.row_count(), 2);
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod result;
pub mod table;

pub use errors::{OracleError, SheetguardError};
pub use result::Result;
pub use table::{CellValue, Column, ScalarKind, Table};
