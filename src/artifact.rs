/// Records passed between pipeline stages

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::Result;
use crate::schema::{read_yaml_file, write_yaml_file};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataIngestionArtifact {
    pub raw_data_file_path: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataValidationArtifact {
    pub validation_status: bool,
    pub message: String,
    pub validation_report_file_path: PathBuf,
}

impl fmt::Display for DataValidationArtifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "status={} message={:?} report={}",
            self.validation_status,
            self.message,
            self.validation_report_file_path.display()
        )
    }
}

/// On-disk validation report. The format follows the file extension:
/// `.json` is written as pretty JSON, anything else as YAML.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    pub validation_status: bool,
    pub message: String,
}

impl ValidationReport {
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if is_json(path) {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(path, serde_json::to_string_pretty(self)?)?;
            Ok(())
        } else {
            write_yaml_file(path, self, true)
        }
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if is_json(path) {
            let content = std::fs::read_to_string(path)?;
            Ok(serde_json::from_str(&content)?)
        } else {
            read_yaml_file(path)
        }
    }
}

fn is_json(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("json"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_format_follows_extension() {
        let dir = tempfile::tempdir().unwrap();
        let report = ValidationReport {
            validation_status: false,
            message: "Expected 4 columns but found 3. ".to_string(),
        };

        let json_path = dir.path().join("report.json");
        report.save(&json_path).unwrap();
        let raw = std::fs::read_to_string(&json_path).unwrap();
        assert!(raw.trim_start().starts_with('{'));
        assert_eq!(ValidationReport::load(&json_path).unwrap(), report);

        let yaml_path = dir.path().join("deep").join("report.yaml");
        report.save(&yaml_path).unwrap();
        let raw = std::fs::read_to_string(&yaml_path).unwrap();
        assert!(raw.contains("validation_status: false"));
        assert_eq!(ValidationReport::load(&yaml_path).unwrap(), report);
    }
}
