//! CLI command implementations
//!
//! This module contains all CLI command implementations.

pub mod finalize;
pub mod init;
pub mod prepare;
pub mod run;
pub mod validate;

use crate::config::{load_config_or_default, SheetguardConfig};
use std::path::{Path, PathBuf};

/// Load the configuration for a command, printing the failure
///
/// Returns `None` on any configuration error; callers exit with code 2.
pub(crate) fn load_command_config(config_path: &str) -> Option<SheetguardConfig> {
    match load_config_or_default(config_path) {
        Ok(config) => Some(config),
        Err(e) => {
            tracing::error!(error = %e, config_path = %config_path, "Configuration failed");
            eprintln!("❌ {e}");
            None
        }
    }
}

/// File names of the artifacts written for one input
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ArtifactPaths {
    dir: PathBuf,
    stem: String,
}

impl ArtifactPaths {
    /// Artifacts for `input`, next to it unless `output_dir` is given
    pub(crate) fn for_input(input: &Path, output_dir: Option<&Path>) -> Self {
        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "table".to_string());
        let dir = match output_dir {
            Some(dir) => dir.to_path_buf(),
            None => input
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(".")),
        };
        Self { dir, stem }
    }

    /// Intermediate table
    pub(crate) fn anonymized(&self) -> PathBuf {
        self.dir.join(format!("{}_anonymized.csv", self.stem))
    }

    /// Suspended pipeline state
    pub(crate) fn checkpoint(&self) -> PathBuf {
        self.dir.join(format!("{}.checkpoint.json", self.stem))
    }

    /// Classification report
    pub(crate) fn report(&self) -> PathBuf {
        self.dir.join(format!("{}_report.json", self.stem))
    }

    /// Final, noised table
    pub(crate) fn final_table(&self) -> PathBuf {
        self.dir.join(format!("{}_dp.csv", self.stem))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifacts_next_to_input() {
        let paths = ArtifactPaths::for_input(Path::new("data/clientes.csv"), None);
        assert_eq!(paths.anonymized(), Path::new("data/clientes_anonymized.csv"));
        assert_eq!(paths.checkpoint(), Path::new("data/clientes.checkpoint.json"));
        assert_eq!(paths.report(), Path::new("data/clientes_report.json"));
        assert_eq!(paths.final_table(), Path::new("data/clientes_dp.csv"));
    }

    #[test]
    fn test_artifacts_in_output_dir() {
        let paths = ArtifactPaths::for_input(Path::new("clientes.csv"), Some(Path::new("out")));
        assert_eq!(paths.final_table(), Path::new("out/clientes_dp.csv"));

        let paths = ArtifactPaths::for_input(Path::new("clientes.csv"), None);
        assert_eq!(paths.anonymized(), Path::new("./clientes_anonymized.csv"));
    }
}
