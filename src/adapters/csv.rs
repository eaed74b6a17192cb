//! CSV table loader and writer
//!
//! The first record is the header row. Every cell is typed through
//! [`CellValue::infer`]; nulls are written back as empty fields.

use crate::domain::{CellValue, Result, SheetguardError, Table};
use std::io::{Read, Write};
use std::path::Path;

/// Read a table from a CSV file
///
/// # Errors
///
/// Returns an error if the file cannot be opened, has no header row, or has
/// records whose length differs from the header.
pub fn read_table(path: impl AsRef<Path>) -> Result<Table> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|e| {
        SheetguardError::Io(format!("Failed to open {}: {}", path.display(), e))
    })?;
    let table = read_table_from(file)?;

    tracing::info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "Table loaded"
    );
    Ok(table)
}

/// Read a table from any CSV source
pub fn read_table_from<R: Read>(reader: R) -> Result<Table> {
    let mut reader = ::csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(::csv::Trim::Headers)
        .from_reader(reader);

    let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();
    if headers.is_empty() {
        return Err(SheetguardError::Table("CSV input has no header row".to_string()));
    }

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(CellValue::infer).collect());
    }

    Table::from_rows(headers, rows)
}

/// Write a table to a CSV file, creating parent directories as needed
pub fn write_table(table: &Table, path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path).map_err(|e| {
        SheetguardError::Io(format!("Failed to create {}: {}", path.display(), e))
    })?;
    write_table_to(table, file)?;

    tracing::info!(
        path = %path.display(),
        rows = table.row_count(),
        columns = table.column_count(),
        "Table written"
    );
    Ok(())
}

/// Write a table to any CSV sink
pub fn write_table_to<W: Write>(table: &Table, writer: W) -> Result<()> {
    let mut writer = ::csv::Writer::from_writer(writer);
    writer.write_record(table.column_names())?;

    for index in 0..table.row_count() {
        if let Some(row) = table.row(index) {
            writer.write_record(row.iter().map(|cell| cell.to_string()))?;
        }
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ScalarKind;

    const SAMPLE: &str = "Nome,CEP,Salario,Nascimento\n\
                          Ana Souza,01310-100,4500.00,1990-03-15\n\
                          Bruno Lima,,3800.5,\n";

    #[test]
    fn test_read_infers_cells() {
        let table = read_table_from(SAMPLE.as_bytes()).unwrap();
        assert_eq!(table.row_count(), 2);
        assert_eq!(table.column_names(), ["Nome", "CEP", "Salario", "Nascimento"]);

        let cep = table.column("CEP").unwrap();
        assert_eq!(cep.values[0], CellValue::Text("01310-100".into()));
        assert_eq!(cep.values[1], CellValue::Null);
        assert_eq!(table.column("Salario").unwrap().kind(), ScalarKind::Numeric);
        assert_eq!(table.column("Nascimento").unwrap().kind(), ScalarKind::Date);
    }

    #[test]
    fn test_ragged_record_rejected() {
        let input = "a,b\n1,2\n3\n";
        assert!(read_table_from(input.as_bytes()).is_err());
    }

    #[test]
    fn test_write_then_read_keeps_shape() {
        let table = read_table_from(SAMPLE.as_bytes()).unwrap();
        let mut out = Vec::new();
        write_table_to(&table, &mut out).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Nome,CEP,Salario,Nascimento\n"));
        assert!(text.contains("Bruno Lima,,3800.5,\n"));
        assert!(text.contains("Ana Souza,01310-100,4500,1990-03-15\n"));
    }

    #[test]
    fn test_write_table_creates_directories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.csv");
        let table = read_table_from(SAMPLE.as_bytes()).unwrap();
        write_table(&table, &path).unwrap();
        assert!(path.exists());
        assert_eq!(read_table(&path).unwrap().row_count(), 2);
    }
}
