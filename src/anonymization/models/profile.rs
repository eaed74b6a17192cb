//! Column profiles handed to the classification oracle

use crate::domain::ScalarKind;
use serde::{Deserialize, Serialize};

/// Bounded, immutable summary of one column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnProfile {
    /// Column header
    pub name: String,
    /// Inferred scalar kind
    pub kind: ScalarKind,
    /// First distinct non-null values, in row order, rendered as text
    pub sample: Vec<String>,
    /// Number of non-null cells in the column
    pub non_null: usize,
}

impl ColumnProfile {
    /// Whether the column had no values to sample
    pub fn is_empty(&self) -> bool {
        self.sample.is_empty()
    }
}
