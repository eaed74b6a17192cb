//! Integration tests for logging functionality
//!
//! The global subscriber can only be installed once per process, so every
//! check that needs it lives in a single test.

use sheetguard::adapters::csv::write_table;
use sheetguard::config::LoggingConfig;
use sheetguard::domain::{Column, Table};
use sheetguard::logging::init_logging;
use tempfile::TempDir;

#[test]
fn test_logging_config_default() {
    let config = LoggingConfig::default();
    assert!(!config.local_enabled);
    assert_eq!(config.local_rotation, "daily");
}

#[test]
fn test_invalid_level_rejected() {
    let result = init_logging("verbose", &LoggingConfig::default());
    assert!(result.is_err());
}

#[test]
fn test_file_logging_writes_json_records() {
    let temp_dir = TempDir::new().unwrap();
    let log_path = temp_dir.path().join("logs");

    let config = LoggingConfig {
        local_enabled: true,
        local_path: log_path.to_string_lossy().to_string(),
        local_rotation: "never".to_string(),
    };

    let guard = init_logging("info", &config).expect("first initialization succeeds");
    assert!(log_path.exists());

    // A second subscriber cannot be installed
    assert!(init_logging("info", &LoggingConfig::default()).is_err());

    let table = Table::new(vec![Column::from_raw("Produto", &["Caneta", "Lápis"])]).unwrap();
    write_table(&table, temp_dir.path().join("produtos.csv")).unwrap();
    drop(guard);

    let content: String = std::fs::read_dir(&log_path)
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_name().to_string_lossy().starts_with("sheetguard.log"))
        .map(|entry| std::fs::read_to_string(entry.path()).unwrap())
        .collect();

    assert!(content.contains("Table written"));
    let first = content.lines().next().unwrap();
    let record: serde_json::Value = serde_json::from_str(first).unwrap();
    assert!(record.get("level").is_some());
    // Cell values never reach the log
    assert!(!content.contains("Caneta"));
}
