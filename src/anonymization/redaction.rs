//! Redaction engine
//!
//! Applies `remove`, `mask_text` and `mask_date` actions column by column and
//! records which columns are deferred for noise. Pure transformation: the input
//! table is borrowed, never mutated, and row count and order are preserved.

use crate::anonymization::models::anomaly::AnomalyCollector;
use crate::anonymization::models::{AnomalyKind, ColumnAnomaly, PolicyAction};
use crate::config::PipelineConfig;
use crate::domain::table::{BR_DATE_FORMAT, DATETIME_FORMATS, DATE_FORMAT};
use crate::domain::{CellValue, Column, Result, SheetguardError, Table};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

/// Keep the first `prefix_len` characters of `value` and append `marker`
///
/// Short values are still suffixed, so nothing is ever left fully exposed.
///
/// ```
/// use sheetguard::anonymization::redaction::mask_text;
///
/// assert_eq!(mask_text("Rua dos Bobos, 123", 5, "***"), "Rua d***");
/// assert_eq!(mask_text("Oi", 5, "***"), "Oi***");
/// ```
pub fn mask_text(value: &str, prefix_len: usize, marker: &str) -> String {
    let mut masked: String = value.chars().take(prefix_len).collect();
    masked.push_str(marker);
    masked
}

/// Reset the day of a textual date to the first of its month
///
/// Accepts `%Y-%m-%d`, `%Y-%m-%dT%H:%M:%S`, `%Y-%m-%d %H:%M:%S` and `%d/%m/%Y`,
/// answering in the same layout with any time of day kept. Returns `None` when
/// the text is not a date in one of those layouts.
///
/// ```
/// use sheetguard::anonymization::redaction::mask_date;
///
/// assert_eq!(mask_date("1990-03-15").as_deref(), Some("1990-03-01"));
/// assert_eq!(mask_date("15/03/1990").as_deref(), Some("01/03/1990"));
/// assert_eq!(mask_date("soon"), None);
/// ```
pub fn mask_date(value: &str) -> Option<String> {
    let value = value.trim();

    for format in [DATE_FORMAT, BR_DATE_FORMAT] {
        if let Ok(date) = NaiveDate::parse_from_str(value, format) {
            return Some(first_of_month(date).format(format).to_string());
        }
    }
    for format in DATETIME_FORMATS {
        if let Ok(datetime) = NaiveDateTime::parse_from_str(value, format) {
            let masked = first_of_month(datetime.date()).and_time(datetime.time());
            return Some(masked.format(format).to_string());
        }
    }
    None
}

fn first_of_month(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Pick `candidate`, or `candidate_2`, `candidate_3`... if it is already taken
pub(crate) fn unique_name(candidate: String, taken: &[String]) -> String {
    if !taken.contains(&candidate) {
        return candidate;
    }
    (2..)
        .map(|n| format!("{candidate}_{n}"))
        .find(|name| !taken.contains(name))
        .unwrap_or(candidate)
}

/// What happened to one input column
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnRedaction {
    /// Name in the input table
    pub source: String,
    /// Name in the intermediate table, `None` when removed
    pub output: Option<String>,
    /// Action applied
    pub action: PolicyAction,
    /// Values passed through instead of masked
    pub anomalies: Vec<ColumnAnomaly>,
}

/// Output of the redaction stage
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedactedTable {
    /// Intermediate table
    pub table: Table,
    /// Intermediate names of columns awaiting noise, in column order
    pub deferred: Vec<String>,
    /// One entry per input column, in input order
    pub columns: Vec<ColumnRedaction>,
}

/// Masking parameters
#[derive(Debug, Clone)]
pub struct RedactionEngine {
    mask_prefix_len: usize,
    mask_marker: String,
    masked_suffix: String,
}

impl Default for RedactionEngine {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl RedactionEngine {
    /// Create an engine from the `[pipeline]` configuration section
    pub fn from_config(config: &PipelineConfig) -> Self {
        Self {
            mask_prefix_len: config.mask_prefix_len,
            mask_marker: config.mask_marker.clone(),
            masked_suffix: config.masked_suffix.clone(),
        }
    }

    /// Apply one action per column
    ///
    /// # Errors
    ///
    /// Returns [`SheetguardError::Validation`] when `actions` does not have one
    /// entry per column.
    pub fn apply(&self, table: &Table, actions: &[PolicyAction]) -> Result<RedactedTable> {
        if actions.len() != table.column_count() {
            return Err(SheetguardError::Validation(format!(
                "Expected {} policy actions, got {}",
                table.column_count(),
                actions.len()
            )));
        }

        let mut output_columns: Vec<Column> = Vec::with_capacity(table.column_count());
        let mut taken: Vec<String> = table.column_names().iter().map(|s| s.to_string()).collect();
        let mut deferred = Vec::new();
        let mut columns = Vec::with_capacity(table.column_count());

        for (column, action) in table.columns().iter().zip(actions) {
            let mut anomalies = Vec::new();
            let output = match action {
                PolicyAction::Remove => None,
                PolicyAction::MaskText | PolicyAction::MaskDate => {
                    let (values, found) = match action {
                        PolicyAction::MaskDate => self.mask_date_column(column),
                        _ => (self.mask_text_column(column), Vec::new()),
                    };
                    anomalies = found;
                    let name = unique_name(
                        format!("{}{}", column.name, self.masked_suffix),
                        &taken,
                    );
                    taken.push(name.clone());
                    output_columns.push(Column::new(name.clone(), values));
                    Some(name)
                }
                PolicyAction::DeferForNoise => {
                    deferred.push(column.name.clone());
                    output_columns.push(column.clone());
                    Some(column.name.clone())
                }
                PolicyAction::None => {
                    output_columns.push(column.clone());
                    Some(column.name.clone())
                }
            };

            tracing::debug!(
                column = %column.name,
                action = %action,
                output = output.as_deref().unwrap_or("-"),
                anomalies = anomalies.len(),
                "Column redacted"
            );

            columns.push(ColumnRedaction {
                source: column.name.clone(),
                output,
                action: *action,
                anomalies,
            });
        }

        let table = Table::with_row_count(output_columns, table.row_count())?;

        Ok(RedactedTable {
            table,
            deferred,
            columns,
        })
    }

    fn mask_text_column(&self, column: &Column) -> Vec<CellValue> {
        column
            .values
            .iter()
            .map(|value| match value {
                CellValue::Null => CellValue::Null,
                other => CellValue::Text(mask_text(
                    &other.to_string(),
                    self.mask_prefix_len,
                    &self.mask_marker,
                )),
            })
            .collect()
    }

    fn mask_date_column(&self, column: &Column) -> (Vec<CellValue>, Vec<ColumnAnomaly>) {
        let mut anomalies = AnomalyCollector::default();
        let values = column
            .values
            .iter()
            .enumerate()
            .map(|(row, value)| match value {
                CellValue::Null => CellValue::Null,
                CellValue::Date(date) => CellValue::Date(first_of_month(*date)),
                CellValue::DateTime(datetime) => CellValue::DateTime(
                    first_of_month(datetime.date()).and_time(datetime.time()),
                ),
                CellValue::Text(text) => match mask_date(text) {
                    Some(masked) => CellValue::Text(masked),
                    None => {
                        anomalies.flag(AnomalyKind::NotMaskable, row);
                        value.clone()
                    }
                },
                CellValue::Number(_) => {
                    anomalies.flag(AnomalyKind::NotMaskable, row);
                    value.clone()
                }
            })
            .collect();
        (values, anomalies.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> Table {
        Table::new(vec![
            Column::from_raw("Nome", &["Ana Souza", "Bruno Lima", "Carla Dias"]),
            Column::from_raw("Endereco", &["Rua dos Bobos, 123", "Oi", ""]),
            Column::from_raw("Nascimento", &["1990-03-15", "", "15/08/1985"]),
            Column::from_raw("Salario", &["4500", "3800.5", "1200"]),
            Column::from_raw("Produto", &["Caneta", "Lápis", "Borracha"]),
        ])
        .unwrap()
    }

    const ACTIONS: [PolicyAction; 5] = [
        PolicyAction::Remove,
        PolicyAction::MaskText,
        PolicyAction::MaskDate,
        PolicyAction::DeferForNoise,
        PolicyAction::None,
    ];

    #[test]
    fn test_mask_text_counts_characters() {
        assert_eq!(mask_text("São Paulo", 5, "***"), "São P***");
        assert_eq!(mask_text("", 5, "***"), "***");
    }

    #[test]
    fn test_mask_date_layouts() {
        assert_eq!(mask_date("1990-03-15").as_deref(), Some("1990-03-01"));
        assert_eq!(
            mask_date("1990-03-15T08:30:00").as_deref(),
            Some("1990-03-01T08:30:00")
        );
        assert_eq!(
            mask_date("1990-03-15 08:30:00").as_deref(),
            Some("1990-03-01 08:30:00")
        );
        assert_eq!(mask_date("1990-02-30"), None);
    }

    #[test]
    fn test_apply_preserves_rows_and_drops_removed() {
        let input = table();
        let redacted = RedactionEngine::default().apply(&input, &ACTIONS).unwrap();

        assert_eq!(redacted.table.row_count(), input.row_count());
        assert_eq!(
            redacted.table.column_names(),
            ["Endereco_masked", "Nascimento_masked", "Salario", "Produto"]
        );
        assert_eq!(redacted.deferred, ["Salario"]);
        assert_eq!(redacted.columns.len(), 5);
        assert_eq!(redacted.columns[0].output, None);
    }

    #[test]
    fn test_apply_masks_values() {
        let redacted = RedactionEngine::default().apply(&table(), &ACTIONS).unwrap();

        let address = redacted.table.column("Endereco_masked").unwrap();
        assert_eq!(address.values[0], CellValue::Text("Rua d***".into()));
        assert_eq!(address.values[1], CellValue::Text("Oi***".into()));
        assert_eq!(address.values[2], CellValue::Null);

        let birth = redacted.table.column("Nascimento_masked").unwrap();
        assert_eq!(birth.values[0].to_string(), "1990-03-01");
        assert_eq!(birth.values[1], CellValue::Null);
        assert_eq!(birth.values[2], CellValue::Text("01/08/1985".into()));

        assert_eq!(redacted.table.column("Salario"), table().column("Salario"));
    }

    #[test]
    fn test_unparseable_dates_flagged() {
        let input = Table::new(vec![Column::from_raw(
            "Data",
            &["2020-01-20", "amanhã", "42"],
        )])
        .unwrap();
        let redacted = RedactionEngine::default()
            .apply(&input, &[PolicyAction::MaskDate])
            .unwrap();

        let column = &redacted.columns[0];
        assert_eq!(column.anomalies.len(), 1);
        assert_eq!(column.anomalies[0].kind, AnomalyKind::NotMaskable);
        assert_eq!(column.anomalies[0].rows, [1, 2]);

        let values = &redacted.table.column("Data_masked").unwrap().values;
        assert_eq!(values[1], CellValue::Text("amanhã".into()));
        assert_eq!(values[2], CellValue::Number(42.0));
    }

    #[test]
    fn test_masked_name_collision() {
        let input = Table::new(vec![
            Column::from_raw("CEP", &["01310-100"]),
            Column::from_raw("CEP_masked", &["x"]),
        ])
        .unwrap();
        let redacted = RedactionEngine::default()
            .apply(&input, &[PolicyAction::MaskText, PolicyAction::None])
            .unwrap();
        assert_eq!(
            redacted.table.column_names(),
            ["CEP_masked_2", "CEP_masked"]
        );
    }

    #[test]
    fn test_action_count_mismatch() {
        let result = RedactionEngine::default().apply(&table(), &[PolicyAction::None]);
        assert!(matches!(result, Err(SheetguardError::Validation(_))));
    }

    #[test]
    fn test_redaction_is_deterministic() {
        let engine = RedactionEngine::default();
        assert_eq!(
            engine.apply(&table(), &ACTIONS).unwrap(),
            engine.apply(&table(), &ACTIONS).unwrap()
        );
    }

    #[test]
    fn test_all_removed_keeps_row_count() {
        let input = table();
        let redacted = RedactionEngine::default()
            .apply(&input, &[PolicyAction::Remove; 5])
            .unwrap();
        assert_eq!(redacted.table.column_count(), 0);
        assert_eq!(redacted.table.row_count(), 3);
    }
}
