/// Pipeline configuration
///
/// Constants for the artifact layout, environment-backed connection settings
/// and the per-run path configs handed to each stage.

use chrono::Local;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{PipelineError, Result};

// MongoDB
pub const DATABASE_NAME: &str = "ner-mlops";
pub const COLLECTION_NAME: &str = "ner-mlops-data";

// Logging
pub const LOG_DIR: &str = "logs";

// Pipeline
pub const PIPELINE_NAME: &str = "ner";
pub const ARTIFACT_DIR: &str = "artifact";
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d--%H-%M-%S";

// Files
pub const MODEL_FILE_NAME: &str = "model.h5";
pub const FILE_NAME: &str = "data.csv";
pub const SCHEMA_FILE_PATH: &str = "config/schema.yaml";

// Data ingestion
pub const DATA_INGESTION_DIR_NAME: &str = "data_ingestion";
pub const DATA_INGESTION_RAW_DATA_DIR: &str = "raw_data";

// Data validation
pub const DATA_VALIDATION_DIR_NAME: &str = "data_validation";
pub const DATA_VALIDATION_REPORT_FILE_NAME: &str = "report.yaml";

// Environment variables
pub const ENV_MONGODB_URI: &str = "MONGODB_URI";
pub const ENV_DATABASE_NAME: &str = "DATABASE_NAME";
pub const ENV_AZURE_TENANT_ID: &str = "AZURE_TENANT_ID";
pub const ENV_AZURE_CLIENT_ID: &str = "AZURE_CLIENT_ID";
pub const ENV_AZURE_CLIENT_SECRET: &str = "AZURE_CLIENT_SECRET";
pub const ENV_AZURE_STORAGE_ACCOUNT_URL: &str = "AZURE_STORAGE_ACCOUNT_URL";
pub const ENV_BLOB_STORAGE_INSTANCE_NAME: &str = "BLOB_STORAGE_INSTANCE_NAME";

/// Load `.env` from the working directory if one exists.
pub fn load_dotenv() {
    match dotenvy::dotenv() {
        Ok(path) => debug!("Loaded environment from {}", path.display()),
        Err(e) => debug!("No .env file loaded: {}", e),
    }
}

fn require<F>(lookup: &F, var: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(var) {
        Some(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(PipelineError::MissingEnv { var: var.to_string() }),
    }
}

fn env_lookup(var: &str) -> Option<String> {
    std::env::var(var).ok()
}

/// Connection settings for the document database
#[derive(Debug, Clone)]
pub struct MongoSettings {
    pub connection_uri: String,
    pub database_name: String,
}

impl MongoSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    /// Build settings from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let connection_uri = require(&lookup, ENV_MONGODB_URI)?;
        let database_name = lookup(ENV_DATABASE_NAME)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| DATABASE_NAME.to_string());

        Ok(Self {
            connection_uri,
            database_name,
        })
    }
}

/// Service-principal credentials and endpoint for the storage account
#[derive(Clone)]
pub struct AzureSettings {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
    pub storage_account_url: String,
}

impl std::fmt::Debug for AzureSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AzureSettings")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("storage_account_url", &self.storage_account_url)
            .finish()
    }
}

impl AzureSettings {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            tenant_id: require(&lookup, ENV_AZURE_TENANT_ID)?,
            client_id: require(&lookup, ENV_AZURE_CLIENT_ID)?,
            client_secret: require(&lookup, ENV_AZURE_CLIENT_SECRET)?,
            storage_account_url: require(&lookup, ENV_AZURE_STORAGE_ACCOUNT_URL)?,
        })
    }

    /// Storage account name, taken from the first host label of the account URL
    /// (`https://<account>.blob.core.windows.net`).
    pub fn account_name(&self) -> Result<String> {
        let url = azure_core::Url::parse(&self.storage_account_url).map_err(|e| {
            PipelineError::ConfigError(format!(
                "Invalid {}: {} ({})",
                ENV_AZURE_STORAGE_ACCOUNT_URL, self.storage_account_url, e
            ))
        })?;

        url.host_str()
            .and_then(|host| host.split('.').next())
            .filter(|account| !account.is_empty())
            .map(str::to_string)
            .ok_or_else(|| {
                PipelineError::ConfigError(format!(
                    "No account name in {}: {}",
                    ENV_AZURE_STORAGE_ACCOUNT_URL, self.storage_account_url
                ))
            })
    }
}

/// Default blob container, if one is configured.
pub fn default_container() -> Option<String> {
    env_lookup(ENV_BLOB_STORAGE_INSTANCE_NAME).filter(|name| !name.trim().is_empty())
}

/// Top-level layout for one pipeline run
#[derive(Debug, Clone)]
pub struct TrainingPipelineConfig {
    pub pipeline_name: String,
    pub artifact_dir: PathBuf,
    pub timestamp: String,
}

impl TrainingPipelineConfig {
    /// Timestamped run directory under `artifact/`.
    pub fn new() -> Self {
        Self::with_root(ARTIFACT_DIR)
    }

    pub fn with_root(root: impl AsRef<Path>) -> Self {
        let timestamp = Local::now().format(TIMESTAMP_FORMAT).to_string();
        Self {
            pipeline_name: PIPELINE_NAME.to_string(),
            artifact_dir: root.as_ref().join(&timestamp),
            timestamp,
        }
    }
}

impl Default for TrainingPipelineConfig {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone)]
pub struct DataIngestionConfig {
    pub data_ingestion_dir: PathBuf,
    pub raw_data_file_path: PathBuf,
    pub collection_name: String,
}

impl DataIngestionConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let data_ingestion_dir = pipeline.artifact_dir.join(DATA_INGESTION_DIR_NAME);
        let raw_data_file_path = data_ingestion_dir
            .join(DATA_INGESTION_RAW_DATA_DIR)
            .join(FILE_NAME);

        Self {
            data_ingestion_dir,
            raw_data_file_path,
            collection_name: COLLECTION_NAME.to_string(),
        }
    }

    pub fn with_collection(mut self, collection_name: impl Into<String>) -> Self {
        self.collection_name = collection_name.into();
        self
    }
}

#[derive(Debug, Clone)]
pub struct DataValidationConfig {
    pub data_validation_dir: PathBuf,
    pub validation_report_file_path: PathBuf,
    pub schema_file_path: PathBuf,
}

impl DataValidationConfig {
    pub fn new(pipeline: &TrainingPipelineConfig) -> Self {
        let data_validation_dir = pipeline.artifact_dir.join(DATA_VALIDATION_DIR_NAME);
        let validation_report_file_path =
            data_validation_dir.join(DATA_VALIDATION_REPORT_FILE_NAME);

        Self {
            data_validation_dir,
            validation_report_file_path,
            schema_file_path: PathBuf::from(SCHEMA_FILE_PATH),
        }
    }

    pub fn with_schema(mut self, schema_file_path: impl Into<PathBuf>) -> Self {
        self.schema_file_path = schema_file_path.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_mongo_settings_require_uri() {
        let err = MongoSettings::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(matches!(err, PipelineError::MissingEnv { ref var } if var == ENV_MONGODB_URI));
    }

    #[test]
    fn test_mongo_settings_database_override() {
        let settings = MongoSettings::from_lookup(lookup_from(&[
            (ENV_MONGODB_URI, "mongodb://localhost:27017"),
        ]))
        .unwrap();
        assert_eq!(settings.database_name, DATABASE_NAME);

        let settings = MongoSettings::from_lookup(lookup_from(&[
            (ENV_MONGODB_URI, "mongodb://localhost:27017"),
            (ENV_DATABASE_NAME, "ner-staging"),
        ]))
        .unwrap();
        assert_eq!(settings.database_name, "ner-staging");
    }

    #[test]
    fn test_azure_settings_fail_fast() {
        let err = AzureSettings::from_lookup(lookup_from(&[
            (ENV_AZURE_TENANT_ID, "tenant"),
            (ENV_AZURE_CLIENT_ID, "client"),
            (ENV_AZURE_STORAGE_ACCOUNT_URL, "https://acct.blob.core.windows.net"),
        ]))
        .unwrap_err();
        assert!(
            matches!(err, PipelineError::MissingEnv { ref var } if var == ENV_AZURE_CLIENT_SECRET)
        );
    }

    #[test]
    fn test_account_name_from_url() {
        let settings = AzureSettings::from_lookup(lookup_from(&[
            (ENV_AZURE_TENANT_ID, "tenant"),
            (ENV_AZURE_CLIENT_ID, "client"),
            (ENV_AZURE_CLIENT_SECRET, "secret"),
            (ENV_AZURE_STORAGE_ACCOUNT_URL, "https://nermodels.blob.core.windows.net/"),
        ]))
        .unwrap();
        assert_eq!(settings.account_name().unwrap(), "nermodels");
        assert!(!format!("{:?}", settings).contains("\"secret\""));
    }

    #[test]
    fn test_artifact_layout() {
        let pipeline = TrainingPipelineConfig::with_root("/tmp/artifacts");
        let ingestion = DataIngestionConfig::new(&pipeline);
        let validation = DataValidationConfig::new(&pipeline);

        assert!(ingestion
            .raw_data_file_path
            .ends_with("data_ingestion/raw_data/data.csv"));
        assert!(validation
            .validation_report_file_path
            .ends_with("data_validation/report.yaml"));
        assert!(ingestion.raw_data_file_path.starts_with(&pipeline.artifact_dir));
        assert_eq!(ingestion.collection_name, COLLECTION_NAME);
    }
}
