/// Schema descriptor and YAML file helpers

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use crate::error::{PipelineError, Result};

/// One entry of the schema's `columns` list: either a bare name or a
/// single-key `{name: type}` map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ColumnSpec {
    Name(String),
    Typed(BTreeMap<String, String>),
}

impl ColumnSpec {
    pub fn name(&self) -> Option<&str> {
        match self {
            ColumnSpec::Name(name) => Some(name.as_str()),
            ColumnSpec::Typed(map) => map.keys().next().map(String::as_str),
        }
    }
}

/// Declared column layout of the raw dataset. Read-only once loaded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaDescriptor {
    pub columns: Vec<ColumnSpec>,
    #[serde(default)]
    pub categorical_columns: Vec<String>,
}

impl SchemaDescriptor {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let schema: SchemaDescriptor = read_yaml_file(path).map_err(|e| match e {
            PipelineError::YamlError(source) => PipelineError::InvalidSchema {
                path: path.display().to_string(),
                reason: source.to_string(),
            },
            other => other,
        })?;

        debug!(
            "Loaded schema from {}: {} columns, {} categorical",
            path.display(),
            schema.column_count(),
            schema.categorical_columns.len()
        );
        Ok(schema)
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

pub fn read_yaml_file<T: DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let content = std::fs::read_to_string(path.as_ref())?;
    Ok(serde_yaml::from_str(&content)?)
}

/// Serialize `content` as YAML, creating parent directories. An existing file
/// is removed first when `replace` is set, otherwise it is overwritten.
pub fn write_yaml_file<T: Serialize>(path: impl AsRef<Path>, content: &T, replace: bool) -> Result<()> {
    let path = path.as_ref();
    if replace && path.exists() {
        std::fs::remove_file(path)?;
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, serde_yaml::to_string(content)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCHEMA: &str = r#"
columns:
  - Sentence: category
  - Word: category
  - POS: category
  - Tag: category

categorical_columns:
  - Sentence
  - Word
  - POS
  - Tag
"#;

    #[test]
    fn test_load_schema_with_typed_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(&path, SCHEMA).unwrap();

        let schema = SchemaDescriptor::load(&path).unwrap();
        assert_eq!(schema.column_count(), 4);
        assert_eq!(schema.columns[1].name(), Some("Word"));
        assert_eq!(schema.categorical_columns, vec!["Sentence", "Word", "POS", "Tag"]);
    }

    #[test]
    fn test_bare_column_names() {
        let schema: SchemaDescriptor =
            serde_yaml::from_str("columns: [Word, Tag]\ncategorical_columns: [Tag]\n").unwrap();
        assert_eq!(schema.column_count(), 2);
        assert_eq!(schema.columns[0], ColumnSpec::Name("Word".to_string()));
    }

    #[test]
    fn test_invalid_schema_names_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schema.yaml");
        std::fs::write(&path, "categorical_columns: [Tag]\n").unwrap();

        let err = SchemaDescriptor::load(&path).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidSchema { .. }));
    }

    #[test]
    fn test_write_yaml_file_replaces() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("out.yaml");

        write_yaml_file(&path, &vec!["a", "b"], false).unwrap();
        write_yaml_file(&path, &vec!["c"], true).unwrap();

        let loaded: Vec<String> = read_yaml_file(&path).unwrap();
        assert_eq!(loaded, vec!["c"]);
    }
}
