//! Per-value anomaly flags surfaced in the report

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a value was passed through instead of transformed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    /// Date masking could not parse the value as a date
    NotMaskable,
    /// Noise injection met a value that is not a number
    NotNumeric,
    /// Noise injection met a missing value
    Null,
}

impl fmt::Display for AnomalyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::NotMaskable => "not maskable",
            Self::NotNumeric => "not numeric",
            Self::Null => "null",
        };
        f.write_str(label)
    }
}

/// Rows of one column that share an anomaly
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnAnomaly {
    /// What went wrong
    pub kind: AnomalyKind,
    /// Zero-based row indices, ascending
    pub rows: Vec<usize>,
}

impl fmt::Display for ColumnAnomaly {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} value(s) {}", self.rows.len(), self.kind)
    }
}

/// Collects anomalous rows per kind, in first-seen order
#[derive(Debug, Default)]
pub(crate) struct AnomalyCollector {
    anomalies: Vec<ColumnAnomaly>,
}

impl AnomalyCollector {
    pub(crate) fn flag(&mut self, kind: AnomalyKind, row: usize) {
        match self.anomalies.iter_mut().find(|a| a.kind == kind) {
            Some(anomaly) => anomaly.rows.push(row),
            None => self.anomalies.push(ColumnAnomaly {
                kind,
                rows: vec![row],
            }),
        }
    }

    pub(crate) fn finish(self) -> Vec<ColumnAnomaly> {
        self.anomalies
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collector_groups_by_kind() {
        let mut collector = AnomalyCollector::default();
        collector.flag(AnomalyKind::Null, 1);
        collector.flag(AnomalyKind::NotNumeric, 2);
        collector.flag(AnomalyKind::Null, 4);

        let anomalies = collector.finish();
        assert_eq!(anomalies.len(), 2);
        assert_eq!(anomalies[0].rows, [1, 4]);
        assert_eq!(anomalies[0].to_string(), "2 value(s) null");
    }
}
