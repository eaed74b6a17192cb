//! Data models shared by the anonymization stages

pub mod anomaly;
pub mod profile;
pub mod verdict;

pub use anomaly::{AnomalyKind, ColumnAnomaly};
pub use profile::ColumnProfile;
pub use verdict::{Category, ClassificationVerdict, PolicyAction, VerdictProvenance};
