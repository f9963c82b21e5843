use azure_core::error::ErrorKind;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Blob {path} not found in container {container}")]
    BlobNotFound { container: String, path: String },

    #[error("Container {container} already exists")]
    ContainerAlreadyExists { container: String },

    #[error("Storage network error: {0}")]
    StorageNetwork(String),

    #[error("Azure storage error: {0}")]
    AzureStorageError(String),

    #[error("Azure SDK error: {0}")]
    AzureError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Environment variable {var} is not set")]
    MissingEnv { var: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Invalid schema {path}: {reason}")]
    InvalidSchema { path: String, reason: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("CSV error: {0}")]
    CsvError(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

impl PipelineError {
    /// True for the one outcome callers are expected to handle as a normal result.
    pub fn is_not_found(&self) -> bool {
        matches!(self, PipelineError::BlobNotFound { .. })
    }
}

impl From<azure_core::Error> for PipelineError {
    fn from(err: azure_core::Error) -> Self {
        match err.kind() {
            ErrorKind::Io => PipelineError::StorageNetwork(err.to_string()),
            ErrorKind::HttpResponse { status, error_code } => PipelineError::AzureStorageError(
                format!(
                    "status {:?} ({}): {}",
                    status,
                    error_code.as_deref().unwrap_or("no error code"),
                    err
                ),
            ),
            _ => PipelineError::AzureError(err.to_string()),
        }
    }
}

impl From<mongodb::error::Error> for PipelineError {
    fn from(err: mongodb::error::Error) -> Self {
        PipelineError::DatabaseError(err.to_string())
    }
}
