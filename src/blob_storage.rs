/// BlobStorage: model and file artifacts in a blob container
///
/// `BlobStorage` holds the artifact contract (existence, upload, download,
/// container creation, account diagnostics) on top of a `BlobBackend`.
/// Every call is a single attempt: no retry, backoff or resume.

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::error::{PipelineError, Result};

/// Address of a remote object
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlobRef {
    pub container: String,
    pub path: String,
}

impl BlobRef {
    pub fn new(container: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            container: container.into(),
            path: path.into(),
        }
    }

    /// `model_directory/model_name`, or just `model_name` without a directory.
    pub fn model(container: impl Into<String>, model_name: &str, model_directory: Option<&str>) -> Self {
        let path = match model_directory.map(|d| d.trim_end_matches('/')) {
            Some(dir) if !dir.is_empty() => format!("{}/{}", dir, model_name),
            _ => model_name.to_string(),
        };
        Self::new(container, path)
    }
}

impl std::fmt::Display for BlobRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.container, self.path)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountInfo {
    pub sku_name: String,
    pub account_kind: String,
}

/// Storage operations a backend must provide.
///
/// Implementations report a missing blob as `PipelineError::BlobNotFound` and
/// an existing container as `PipelineError::ContainerAlreadyExists`; those two
/// are the outcomes the client treats as expected.
#[async_trait]
pub trait BlobBackend: Send + Sync {
    /// Fetch blob metadata; succeeds only if the blob exists.
    async fn get_properties(&self, blob: &BlobRef) -> Result<()>;

    /// Write `data`, replacing any existing blob.
    async fn put(&self, blob: &BlobRef, data: Bytes) -> Result<()>;

    async fn get(&self, blob: &BlobRef) -> Result<Vec<u8>>;

    async fn create_container(&self, container: &str) -> Result<()>;

    async fn account_info(&self) -> Result<AccountInfo>;
}

pub struct BlobStorage {
    backend: Arc<dyn BlobBackend>,
}

impl BlobStorage {
    pub fn new(backend: Arc<dyn BlobBackend>) -> Self {
        Self { backend }
    }

    /// Whether a blob exists. A missing blob is `Ok(false)`, never an error.
    pub async fn is_file_available(&self, container: &str, path: &str) -> Result<bool> {
        let blob = BlobRef::new(container, path);
        debug!("Checking blob {}", blob);

        match self.backend.get_properties(&blob).await {
            Ok(()) => {
                info!("Blob {} is available", blob);
                Ok(true)
            }
            Err(e) if e.is_not_found() => {
                warn!("Blob {} not found", blob);
                Ok(false)
            }
            Err(e) => {
                error!("Checking blob {} failed: {}", blob, e);
                Err(e)
            }
        }
    }

    /// Upload a local file, overwriting whatever is stored at `remote_path`.
    /// The local file is deleted afterwards when `remove` is set and the
    /// upload succeeded.
    pub async fn upload_file(
        &self,
        local_path: impl AsRef<Path>,
        remote_path: &str,
        container: &str,
        remove: bool,
    ) -> Result<()> {
        let local_path = local_path.as_ref();
        let blob = BlobRef::new(container, remote_path);
        info!("Uploading {} to {}", local_path.display(), blob);

        let data = tokio::fs::read(local_path).await?;
        let size = data.len();

        if let Err(e) = self.backend.put(&blob, Bytes::from(data)).await {
            match &e {
                PipelineError::StorageNetwork(_) => {
                    error!("Network error while uploading to {}: {}", blob, e)
                }
                _ => error!("Storage error while uploading to {}: {}", blob, e),
            }
            return Err(e);
        }
        info!("Uploaded {} bytes to {}", size, blob);

        if remove {
            tokio::fs::remove_file(local_path).await?;
            debug!("Removed local file {}", local_path.display());
        }
        Ok(())
    }

    /// Download a blob and write its bytes verbatim to `save_path`.
    ///
    /// A missing blob is `PipelineError::BlobNotFound` and nothing is written.
    pub async fn download_file(
        &self,
        remote_path: &str,
        container: &str,
        save_path: impl AsRef<Path>,
    ) -> Result<()> {
        let save_path = save_path.as_ref();
        let blob = BlobRef::new(container, remote_path);

        if !self.is_file_available(container, remote_path).await? {
            return Err(PipelineError::BlobNotFound {
                container: blob.container,
                path: blob.path,
            });
        }

        info!("Downloading {} to {}", blob, save_path.display());
        let data = self
            .backend
            .get(&blob)
            .await
            .inspect_err(|e| error!("Error downloading {}: {}", blob, e))?;

        if let Some(dir) = save_path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }
        tokio::fs::write(save_path, &data).await?;

        info!("Downloaded {} bytes to {}", data.len(), save_path.display());
        Ok(())
    }

    pub async fn upload_model(
        &self,
        local_path: impl AsRef<Path>,
        model_name: &str,
        container: &str,
        model_directory: Option<&str>,
        remove: bool,
    ) -> Result<()> {
        let blob = BlobRef::model(container, model_name, model_directory);
        self.upload_file(local_path, &blob.path, &blob.container, remove)
            .await
    }

    pub async fn download_model(
        &self,
        model_name: &str,
        container: &str,
        model_directory: Option<&str>,
        save_path: impl AsRef<Path>,
    ) -> Result<()> {
        let blob = BlobRef::model(container, model_name, model_directory);
        self.download_file(&blob.path, &blob.container, save_path)
            .await
    }

    /// Create a container. An existing container is not an error.
    pub async fn create_container(&self, container: &str) -> Result<()> {
        match self.backend.create_container(container).await {
            Ok(()) => {
                info!("Container {} created", container);
                Ok(())
            }
            Err(PipelineError::ContainerAlreadyExists { .. }) => {
                info!("Container {} already exists", container);
                Ok(())
            }
            Err(e) => {
                error!("Creating container {} failed: {}", container, e);
                Err(e)
            }
        }
    }

    /// Log SKU and account kind. Diagnostic only: failures are logged and dropped.
    pub async fn log_account_info(&self) {
        match self.backend.account_info().await {
            Ok(info) => info!(
                "Storage account: sku={} kind={}",
                info.sku_name, info.account_kind
            ),
            Err(e) => warn!("Could not fetch storage account info: {}", e),
        }
    }
}

/// Blob backend held in process memory
#[derive(Default)]
pub struct MemoryBlobBackend {
    containers: RwLock<HashMap<String, HashMap<String, Bytes>>>,
    offline: RwLock<bool>,
}

impl MemoryBlobBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// While offline every call fails with `PipelineError::StorageNetwork`.
    pub fn set_offline(&self, offline: bool) {
        *self.offline.write() = offline;
    }

    pub fn blob_count(&self, container: &str) -> usize {
        self.containers
            .read()
            .get(container)
            .map(HashMap::len)
            .unwrap_or(0)
    }

    fn check_online(&self) -> Result<()> {
        if *self.offline.read() {
            return Err(PipelineError::StorageNetwork(
                "connection refused".to_string(),
            ));
        }
        Ok(())
    }

    fn missing_container(container: &str) -> PipelineError {
        PipelineError::AzureStorageError(format!("container {} does not exist", container))
    }
}

#[async_trait]
impl BlobBackend for MemoryBlobBackend {
    async fn get_properties(&self, blob: &BlobRef) -> Result<()> {
        self.get(blob).await.map(|_| ())
    }

    async fn put(&self, blob: &BlobRef, data: Bytes) -> Result<()> {
        self.check_online()?;
        let mut containers = self.containers.write();
        let container = containers
            .get_mut(&blob.container)
            .ok_or_else(|| Self::missing_container(&blob.container))?;
        container.insert(blob.path.clone(), data);
        Ok(())
    }

    async fn get(&self, blob: &BlobRef) -> Result<Vec<u8>> {
        self.check_online()?;
        self.containers
            .read()
            .get(&blob.container)
            .and_then(|container| container.get(&blob.path))
            .map(|data| data.to_vec())
            .ok_or_else(|| PipelineError::BlobNotFound {
                container: blob.container.clone(),
                path: blob.path.clone(),
            })
    }

    async fn create_container(&self, container: &str) -> Result<()> {
        self.check_online()?;
        let mut containers = self.containers.write();
        if containers.contains_key(container) {
            return Err(PipelineError::ContainerAlreadyExists {
                container: container.to_string(),
            });
        }
        containers.insert(container.to_string(), HashMap::new());
        Ok(())
    }

    async fn account_info(&self) -> Result<AccountInfo> {
        self.check_online()?;
        Ok(AccountInfo {
            sku_name: "Standard_LRS".to_string(),
            account_kind: "StorageV2".to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_path() {
        assert_eq!(BlobRef::model("models", "model.h5", None).path, "model.h5");
        assert_eq!(BlobRef::model("models", "model.h5", Some("")).path, "model.h5");
        assert_eq!(
            BlobRef::model("models", "model.onnx", Some("ner/v2/")).path,
            "ner/v2/model.onnx"
        );
    }

    #[tokio::test]
    async fn test_existence_check_errors_other_than_not_found() {
        let backend = Arc::new(MemoryBlobBackend::new());
        let storage = BlobStorage::new(backend.clone());
        storage.create_container("models").await.unwrap();

        assert!(!storage.is_file_available("models", "missing.bin").await.unwrap());

        backend.set_offline(true);
        let err = storage
            .is_file_available("models", "missing.bin")
            .await
            .unwrap_err();
        assert!(matches!(err, PipelineError::StorageNetwork(_)));
    }

    #[tokio::test]
    async fn test_account_info_never_fails() {
        let backend = Arc::new(MemoryBlobBackend::new());
        backend.set_offline(true);
        BlobStorage::new(backend).log_account_info().await;
    }
}
