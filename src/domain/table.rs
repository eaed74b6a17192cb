//! Tabular data model
//!
//! A [`Table`] is an ordered set of named [`Column`]s that all share the same row
//! order and row count. Loaders hand the pipeline raw text cells, which are typed
//! through [`CellValue::infer`].

use super::errors::SheetguardError;
use super::result::Result;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Accepted ISO date layout
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Accepted ISO datetime layouts, the first one is used for output
pub const DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S"];

/// Day-first date layout used by Brazilian spreadsheets
///
/// Values in this layout stay [`CellValue::Text`] so they are written back the
/// way they were read, but they count as dates when a column's kind is inferred.
pub const BR_DATE_FORMAT: &str = "%d/%m/%Y";

/// A single scalar cell
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum CellValue {
    /// Missing value
    Null,
    /// Numeric magnitude
    Number(f64),
    /// Free text
    Text(String),
    /// Calendar date
    Date(NaiveDate),
    /// Date with time of day
    DateTime(NaiveDateTime),
}

impl CellValue {
    /// Infer a typed value from raw loader text
    ///
    /// Numbers written with a leading zero (`"01310"`) or a sign prefix other than `-`
    /// stay text, so postal codes, document numbers and phone numbers survive intact.
    ///
    /// # Examples
    ///
    /// ```
    /// use sheetguard::domain::CellValue;
    ///
    /// assert_eq!(CellValue::infer(""), CellValue::Null);
    /// assert_eq!(CellValue::infer("4500.50"), CellValue::Number(4500.5));
    /// assert_eq!(CellValue::infer("01310-100"), CellValue::Text("01310-100".into()));
    /// assert!(matches!(CellValue::infer("1990-03-15"), CellValue::Date(_)));
    /// assert_eq!(CellValue::infer(" Ana "), CellValue::Text("Ana".into()));
    /// ```
    pub fn infer(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
        {
            return Self::Null;
        }

        if let Ok(date) = NaiveDate::parse_from_str(trimmed, DATE_FORMAT) {
            return Self::Date(date);
        }
        for format in DATETIME_FORMATS {
            if let Ok(datetime) = NaiveDateTime::parse_from_str(trimmed, format) {
                return Self::DateTime(datetime);
            }
        }

        if looks_numeric(trimmed) {
            if let Ok(number) = trimmed.parse::<f64>() {
                if number.is_finite() {
                    return Self::Number(number);
                }
            }
        }

        Self::Text(trimmed.to_string())
    }

    /// Check if the value is missing
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Numeric magnitude, if any
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Scalar kind of a non-null value
    ///
    /// Text in the day-first layout reports [`ScalarKind::Date`].
    pub fn kind(&self) -> Option<ScalarKind> {
        match self {
            Self::Null => None,
            Self::Number(_) => Some(ScalarKind::Numeric),
            Self::Text(s) if is_day_first_date(s) => Some(ScalarKind::Date),
            Self::Text(_) => Some(ScalarKind::Text),
            Self::Date(_) | Self::DateTime(_) => Some(ScalarKind::Date),
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => Ok(()),
            Self::Number(n) => write!(f, "{}", format_number(*n)),
            Self::Text(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{}", d.format(DATE_FORMAT)),
            Self::DateTime(dt) => write!(f, "{}", dt.format(DATETIME_FORMATS[0])),
        }
    }
}

fn is_day_first_date(s: &str) -> bool {
    NaiveDate::parse_from_str(s.trim(), BR_DATE_FORMAT).is_ok()
}

/// Render a number without a trailing `.0` for integral values
fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{n:.0}")
    } else {
        format!("{n}")
    }
}

/// Plain decimal literal: optional `-`, digits, optional fraction, no leading zero
fn looks_numeric(s: &str) -> bool {
    let digits = s.strip_prefix('-').unwrap_or(s);
    let (int_part, frac_part) = match digits.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (digits, None),
    };

    if int_part.is_empty() || !int_part.bytes().all(|b| b.is_ascii_digit()) {
        return false;
    }
    if int_part.len() > 1 && int_part.starts_with('0') {
        return false;
    }
    match frac_part {
        Some(f) => !f.is_empty() && f.bytes().all(|b| b.is_ascii_digit()),
        None => true,
    }
}

/// Inferred scalar kind of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScalarKind {
    /// Free text (also the kind of all-null or mixed columns)
    Text,
    /// Every non-null value is a number
    Numeric,
    /// More than half of the non-null values are dates or datetimes
    Date,
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Numeric => write!(f, "numeric"),
            Self::Date => write!(f, "date"),
        }
    }
}

/// A named column of cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    /// Column header
    pub name: String,
    /// Cells in row order
    pub values: Vec<CellValue>,
}

impl Column {
    /// Create a column from typed values
    pub fn new(name: impl Into<String>, values: Vec<CellValue>) -> Self {
        Self {
            name: name.into(),
            values,
        }
    }

    /// Create a column from raw text cells, inferring each value
    pub fn from_raw<S: AsRef<str>>(name: impl Into<String>, raw: &[S]) -> Self {
        Self::new(
            name,
            raw.iter().map(|s| CellValue::infer(s.as_ref())).collect(),
        )
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if the column has no rows
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate over non-null values in row order
    pub fn non_null(&self) -> impl Iterator<Item = &CellValue> {
        self.values.iter().filter(|v| !v.is_null())
    }

    /// Infer the column's scalar kind from its non-null values
    ///
    /// A numeric column must be numeric throughout. A date column only needs a
    /// strict majority of dates, so a few typos do not turn it into free text;
    /// the stray values are reported when the column is masked.
    pub fn kind(&self) -> ScalarKind {
        let mut total = 0usize;
        let mut numbers = 0usize;
        let mut dates = 0usize;
        for kind in self.non_null().filter_map(CellValue::kind) {
            total += 1;
            match kind {
                ScalarKind::Numeric => numbers += 1,
                ScalarKind::Date => dates += 1,
                ScalarKind::Text => {}
            }
        }

        if total > 0 && numbers == total {
            ScalarKind::Numeric
        } else if dates * 2 > total {
            ScalarKind::Date
        } else {
            ScalarKind::Text
        }
    }

    /// Return the same cells under a new header
    pub fn renamed(self, name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: self.values,
        }
    }
}

/// Rectangular table of named columns
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<Column>,
    row_count: usize,
}

impl Table {
    /// Create a table, inferring the row count from the first column
    ///
    /// # Errors
    ///
    /// Returns [`SheetguardError::Table`] if columns differ in length or if two
    /// columns share a name.
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let row_count = columns.first().map(Column::len).unwrap_or(0);
        Self::with_row_count(columns, row_count)
    }

    /// Create a table with an explicit row count
    ///
    /// Keeps the row count meaningful even when every column has been removed.
    pub fn with_row_count(columns: Vec<Column>, row_count: usize) -> Result<Self> {
        let table = Self { columns, row_count };
        table.validate()?;
        Ok(table)
    }

    /// Build a table from a header row and data rows
    pub fn from_rows(headers: Vec<String>, rows: Vec<Vec<CellValue>>) -> Result<Self> {
        let row_count = rows.len();
        let mut columns: Vec<Column> = headers
            .into_iter()
            .map(|name| Column::new(name, Vec::with_capacity(row_count)))
            .collect();

        for (idx, row) in rows.into_iter().enumerate() {
            if row.len() != columns.len() {
                return Err(SheetguardError::Table(format!(
                    "Row {} has {} cells, expected {}",
                    idx + 1,
                    row.len(),
                    columns.len()
                )));
            }
            for (column, value) in columns.iter_mut().zip(row) {
                column.values.push(value);
            }
        }

        Self::with_row_count(columns, row_count)
    }

    /// Check the row-count and unique-name invariants
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for column in &self.columns {
            if column.len() != self.row_count {
                return Err(SheetguardError::Table(format!(
                    "Column '{}' has {} rows, expected {}",
                    column.name,
                    column.len(),
                    self.row_count
                )));
            }
            if !seen.insert(column.name.as_str()) {
                return Err(SheetguardError::Table(format!(
                    "Duplicate column name '{}'",
                    column.name
                )));
            }
        }
        Ok(())
    }

    /// Number of rows
    pub fn row_count(&self) -> usize {
        self.row_count
    }

    /// Number of columns
    pub fn column_count(&self) -> usize {
        self.columns.len()
    }

    /// Columns in order
    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    /// Look up a column by name
    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Column names in order
    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    /// Consume the table and return its columns
    pub fn into_columns(self) -> Vec<Column> {
        self.columns
    }

    /// Cells of one row, in column order
    pub fn row(&self, index: usize) -> Option<Vec<&CellValue>> {
        if index >= self.row_count {
            return None;
        }
        Some(self.columns.iter().map(|c| &c.values[index]).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_values() {
        assert_eq!(CellValue::infer("   "), CellValue::Null);
        assert_eq!(CellValue::infer("NaN"), CellValue::Null);
        assert_eq!(CellValue::infer("42"), CellValue::Number(42.0));
        assert_eq!(CellValue::infer("-3.25"), CellValue::Number(-3.25));
        assert_eq!(CellValue::infer("0.5"), CellValue::Number(0.5));
        assert_eq!(
            CellValue::infer("1990-03-15"),
            CellValue::Date(NaiveDate::from_ymd_opt(1990, 3, 15).unwrap())
        );
        assert!(matches!(
            CellValue::infer("2024-01-15T10:30:00"),
            CellValue::DateTime(_)
        ));
    }

    #[test]
    fn test_infer_keeps_identifier_shapes_as_text() {
        for raw in ["01310100", "+5511999990000", "123.456.789-00", "1e5", "inf", "12."] {
            assert_eq!(
                CellValue::infer(raw),
                CellValue::Text(raw.to_string()),
                "{raw} should stay text"
            );
        }
    }

    #[test]
    fn test_display() {
        assert_eq!(CellValue::Number(1500.0).to_string(), "1500");
        assert_eq!(CellValue::Number(1500.25).to_string(), "1500.25");
        assert_eq!(CellValue::Null.to_string(), "");
        assert_eq!(CellValue::infer("1990-03-15").to_string(), "1990-03-15");
    }

    #[test]
    fn test_column_kind() {
        assert_eq!(Column::from_raw("a", &["1", "", "2.5"]).kind(), ScalarKind::Numeric);
        assert_eq!(
            Column::from_raw("b", &["1990-01-01", "2000-12-31 08:00:00"]).kind(),
            ScalarKind::Date
        );
        assert_eq!(Column::from_raw("c", &["1", "x"]).kind(), ScalarKind::Text);
        assert_eq!(Column::from_raw("d", &["", ""]).kind(), ScalarKind::Text);
    }

    #[test]
    fn test_day_first_dates_stay_text_but_count_as_dates() {
        let value = CellValue::infer("15/03/1990");
        assert_eq!(value, CellValue::Text("15/03/1990".into()));
        assert_eq!(value.kind(), Some(ScalarKind::Date));
        assert_eq!(CellValue::infer("31/02/1990").kind(), Some(ScalarKind::Text));

        assert_eq!(
            Column::from_raw("Nascimento", &["15/03/1990", "22/07/1985"]).kind(),
            ScalarKind::Date
        );
    }

    #[test]
    fn test_date_column_tolerates_stray_values() {
        assert_eq!(
            Column::from_raw("a", &["1990-03-15", "1985-07-22", "desconhecido"]).kind(),
            ScalarKind::Date
        );
        assert_eq!(
            Column::from_raw("b", &["15/03/1990", "", "1985-07-22", "?", "01/01/2000"]).kind(),
            ScalarKind::Date
        );
        // Half is not a majority
        assert_eq!(
            Column::from_raw("c", &["1990-03-15", "desconhecido"]).kind(),
            ScalarKind::Text
        );
        // One stray value still makes a number column text
        assert_eq!(Column::from_raw("d", &["1", "2", "x"]).kind(), ScalarKind::Text);
    }

    #[test]
    fn test_infer_trims_text() {
        assert_eq!(
            CellValue::infer("  Rua dos Bobos  "),
            CellValue::Text("Rua dos Bobos".into())
        );
        assert_eq!(CellValue::infer(" 42 "), CellValue::Number(42.0));
    }

    #[test]
    fn test_table_rejects_ragged_columns() {
        let result = Table::new(vec![
            Column::from_raw("a", &["1", "2"]),
            Column::from_raw("b", &["1"]),
        ]);
        assert!(matches!(result, Err(SheetguardError::Table(_))));
    }

    #[test]
    fn test_table_rejects_duplicate_names() {
        let result = Table::new(vec![
            Column::from_raw("a", &["1"]),
            Column::from_raw("a", &["2"]),
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_from_rows() {
        let table = Table::from_rows(
            vec!["x".into(), "y".into()],
            vec![
                vec![CellValue::Number(1.0), CellValue::Text("a".into())],
                vec![CellValue::Null, CellValue::Text("b".into())],
            ],
        )
        .unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names(), vec!["x", "y"]);
        assert_eq!(table.row(1).unwrap()[1], &CellValue::Text("b".into()));
        assert!(table.row(2).is_none());
    }

    #[test]
    fn test_row_count_survives_without_columns() {
        let table = Table::with_row_count(vec![], 7).unwrap();
        assert_eq!(table.row_count(), 7);
        assert_eq!(table.column_count(), 0);
    }
}
