//! Column profiler
//!
//! Pure function of the input table: one [`ColumnProfile`] per column, in column
//! order, each carrying the first distinct non-null values up to the sample size.

use crate::anonymization::models::ColumnProfile;
use crate::domain::{Column, Table};

/// Builds column profiles with a fixed sample bound
#[derive(Debug, Clone, Copy)]
pub struct ColumnProfiler {
    sample_size: usize,
}

impl Default for ColumnProfiler {
    fn default() -> Self {
        Self { sample_size: 10 }
    }
}

impl ColumnProfiler {
    /// Create a profiler keeping at most `sample_size` values per column
    pub fn new(sample_size: usize) -> Self {
        Self { sample_size }
    }

    /// Profile every column of `table`
    pub fn profile_table(&self, table: &Table) -> Vec<ColumnProfile> {
        table
            .columns()
            .iter()
            .map(|column| self.profile_column(column))
            .collect()
    }

    /// Profile a single column
    ///
    /// An all-null column yields an empty sample and kind `text`.
    pub fn profile_column(&self, column: &Column) -> ColumnProfile {
        let mut sample: Vec<String> = Vec::with_capacity(self.sample_size);
        let mut non_null = 0;

        for value in column.non_null() {
            non_null += 1;
            if sample.len() < self.sample_size {
                let rendered = value.to_string();
                if !sample.contains(&rendered) {
                    sample.push(rendered);
                }
            }
        }

        ColumnProfile {
            name: column.name.clone(),
            kind: column.kind(),
            sample,
            non_null,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScalarKind;

    fn table() -> Table {
        Table::new(vec![
            Column::from_raw("Nome", &["Ana", "", "Bruno", "Ana", "Carla"]),
            Column::from_raw("Salario", &["4500", "3800.5", "", "", "1200"]),
            Column::from_raw("Vazio", &["", "", "", "", ""]),
            Column::from_raw(
                "Nascimento",
                &["1990-03-15", "1985-12-01", "", "2001-07-30", "1970-01-09"],
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_profile_one_per_column_in_order() {
        let profiles = ColumnProfiler::default().profile_table(&table());
        let names: Vec<_> = profiles.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, ["Nome", "Salario", "Vazio", "Nascimento"]);
    }

    #[test]
    fn test_sample_skips_nulls_and_duplicates() {
        let profiles = ColumnProfiler::default().profile_table(&table());
        assert_eq!(profiles[0].sample, ["Ana", "Bruno", "Carla"]);
        assert_eq!(profiles[0].non_null, 4);
        assert_eq!(profiles[1].sample, ["4500", "3800.5", "1200"]);
        assert_eq!(profiles[1].kind, ScalarKind::Numeric);
        assert_eq!(profiles[3].kind, ScalarKind::Date);
    }

    #[test]
    fn test_sample_is_bounded() {
        let profiles = ColumnProfiler::new(2).profile_table(&table());
        assert_eq!(profiles[0].sample, ["Ana", "Bruno"]);
        assert_eq!(profiles[0].non_null, 4);
    }

    #[test]
    fn test_all_null_column_profiles_as_empty_text() {
        let profiles = ColumnProfiler::default().profile_table(&table());
        assert!(profiles[2].is_empty());
        assert_eq!(profiles[2].kind, ScalarKind::Text);
        assert_eq!(profiles[2].non_null, 0);
    }
}
