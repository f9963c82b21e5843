/// DataValidation: structural checks of the raw dataset against the schema
///
/// Only column count and presence of the declared categorical columns are
/// checked. Types, value ranges, null ratios and row counts are not.

use tracing::{error, info};

use crate::artifact::{DataIngestionArtifact, DataValidationArtifact, ValidationReport};
use crate::config::DataValidationConfig;
use crate::error::Result;
use crate::schema::SchemaDescriptor;
use crate::table::Table;

/// Outcome of a single structural check
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckResult {
    pub passed: bool,
    pub message: String,
}

pub struct DataValidation {
    ingestion_artifact: DataIngestionArtifact,
    config: DataValidationConfig,
    schema: SchemaDescriptor,
}

impl DataValidation {
    /// Loads the schema named by `config`; a missing or malformed schema file
    /// fails here rather than mid-validation.
    pub fn new(
        ingestion_artifact: DataIngestionArtifact,
        config: DataValidationConfig,
    ) -> Result<Self> {
        let schema = SchemaDescriptor::load(&config.schema_file_path)?;
        Ok(Self::with_schema(ingestion_artifact, config, schema))
    }

    pub fn with_schema(
        ingestion_artifact: DataIngestionArtifact,
        config: DataValidationConfig,
        schema: SchemaDescriptor,
    ) -> Self {
        Self {
            ingestion_artifact,
            config,
            schema,
        }
    }

    pub fn validate_number_of_columns(&self, table: &Table) -> CheckResult {
        let expected = self.schema.column_count();
        let found = table.num_columns();

        if found == expected {
            CheckResult {
                passed: true,
                message: "All columns are present. ".to_string(),
            }
        } else {
            CheckResult {
                passed: false,
                message: format!("Expected {} columns but found {}. ", expected, found),
            }
        }
    }

    pub fn is_column_present(&self, table: &Table) -> CheckResult {
        let missing: Vec<&str> = self
            .schema
            .categorical_columns
            .iter()
            .map(String::as_str)
            .filter(|column| !table.has_column(column))
            .collect();

        if missing.is_empty() {
            CheckResult {
                passed: true,
                message: "All categorical columns are present.".to_string(),
            }
        } else {
            error!("{} categorical columns are missing: {:?}", missing.len(), missing);
            CheckResult {
                passed: false,
                message: format!("Some categorical columns are missing: {}.", missing.join(", ")),
            }
        }
    }

    /// Run both checks on `table` and combine them into one status and message.
    pub fn validate(&self, table: &Table) -> ValidationReport {
        let count = self.validate_number_of_columns(table);
        info!("Column count check passed: {}", count.passed);

        let categorical = self.is_column_present(table);
        if categorical.passed {
            info!("All categorical columns are present");
        }

        ValidationReport {
            validation_status: count.passed && categorical.passed,
            message: format!("{}{}", count.message, categorical.message),
        }
    }

    pub fn initiate_data_validation(&self) -> Result<DataValidationArtifact> {
        info!("Validating data");
        let table = Table::read_csv(&self.ingestion_artifact.raw_data_file_path)?;

        let report = self.validate(&table);
        let report_path = &self.config.validation_report_file_path;
        report.save(report_path)?;
        info!("Validation report saved to {}", report_path.display());

        let artifact = DataValidationArtifact {
            validation_status: report.validation_status,
            message: report.message,
            validation_report_file_path: report_path.clone(),
        };
        info!("Data validation artifact: {}", artifact);
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::ColumnSpec;
    use std::path::PathBuf;

    fn schema() -> SchemaDescriptor {
        SchemaDescriptor {
            columns: ["Sentence", "Word", "POS", "Tag"]
                .iter()
                .map(|c| ColumnSpec::Name(c.to_string()))
                .collect(),
            categorical_columns: vec!["POS".to_string(), "Tag".to_string()],
        }
    }

    fn validation() -> DataValidation {
        let pipeline = crate::config::TrainingPipelineConfig::with_root("unused");
        DataValidation::with_schema(
            DataIngestionArtifact {
                raw_data_file_path: PathBuf::from("unused.csv"),
            },
            DataValidationConfig::new(&pipeline),
            schema(),
        )
    }

    fn table(columns: &[&str]) -> Table {
        Table::new(columns.iter().map(|c| c.to_string()).collect())
    }

    #[test]
    fn test_matching_table_passes() {
        let report = validation().validate(&table(&["Sentence", "Word", "POS", "Tag"]));
        assert!(report.validation_status);
        assert_eq!(
            report.message,
            "All columns are present. All categorical columns are present."
        );
    }

    #[test]
    fn test_missing_categorical_column_named() {
        let report = validation().validate(&table(&["Sentence", "Word", "POS", "Extra"]));
        assert!(!report.validation_status);
        assert!(report.message.starts_with("All columns are present. "));
        assert!(report.message.contains("missing: Tag"));
    }

    #[test]
    fn test_wrong_column_count_fails() {
        let report = validation().validate(&table(&["Sentence", "Word", "POS", "Tag", "Extra"]));
        assert!(!report.validation_status);
        assert!(report.message.contains("Expected 4 columns but found 5"));
        assert!(report.message.ends_with("All categorical columns are present."));
    }
}
