/// AzureBlobBackend: `BlobBackend` over Azure Blob Storage
///
/// Authenticates as a service principal (tenant id, client id, secret) and
/// addresses the account named in the storage account URL. Block blobs are
/// written whole with `put_block_blob`, which replaces any existing blob.

use async_trait::async_trait;
use azure_core::error::ErrorKind;
use azure_core::StatusCode;
use azure_identity::ClientSecretCredential;
use azure_storage::prelude::*;
use azure_storage_blobs::prelude::*;
use bytes::Bytes;
use std::sync::Arc;
use tracing::{debug, info};

use crate::blob_storage::{AccountInfo, BlobBackend, BlobRef};
use crate::config::AzureSettings;
use crate::error::{PipelineError, Result};

const AUTHORITY_HOST: &str = "https://login.microsoftonline.com";
const CONTAINER_ALREADY_EXISTS: &str = "ContainerAlreadyExists";

pub struct AzureBlobBackend {
    blob_service_client: BlobServiceClient,
    account_name: String,
}

impl AzureBlobBackend {
    /// Build the service client. No request is made until the first operation.
    pub fn new(settings: &AzureSettings) -> Result<Self> {
        let account_name = settings.account_name()?;
        info!("Connecting to Azure Storage account {}", account_name);

        let authority_host = azure_core::Url::parse(AUTHORITY_HOST)
            .map_err(|e| PipelineError::ConfigError(format!("Invalid authority host: {}", e)))?;
        let credential = ClientSecretCredential::new(
            azure_core::new_http_client(),
            authority_host,
            settings.tenant_id.clone(),
            settings.client_id.clone(),
            settings.client_secret.clone(),
        );
        let credentials = StorageCredentials::token_credential(Arc::new(credential));
        let blob_service_client = BlobServiceClient::new(account_name.clone(), credentials);

        Ok(Self {
            blob_service_client,
            account_name,
        })
    }

    pub fn account_name(&self) -> &str {
        &self.account_name
    }

    fn blob_client(&self, blob: &BlobRef) -> BlobClient {
        self.blob_service_client
            .container_client(&blob.container)
            .blob_client(&blob.path)
    }
}

fn http_status(err: &azure_core::Error) -> Option<(StatusCode, Option<&str>)> {
    match err.kind() {
        ErrorKind::HttpResponse { status, error_code } => Some((*status, error_code.as_deref())),
        _ => None,
    }
}

fn blob_error(err: azure_core::Error, blob: &BlobRef) -> PipelineError {
    let not_found = matches!(http_status(&err), Some((status, _)) if status == StatusCode::NotFound);
    if not_found {
        PipelineError::BlobNotFound {
            container: blob.container.clone(),
            path: blob.path.clone(),
        }
    } else {
        err.into()
    }
}

#[async_trait]
impl BlobBackend for AzureBlobBackend {
    async fn get_properties(&self, blob: &BlobRef) -> Result<()> {
        debug!("Getting properties of {}", blob);
        self.blob_client(blob)
            .get_properties()
            .await
            .map_err(|e| blob_error(e, blob))?;
        Ok(())
    }

    async fn put(&self, blob: &BlobRef, data: Bytes) -> Result<()> {
        debug!("Putting {} bytes to {}", data.len(), blob);
        self.blob_client(blob)
            .put_block_blob(data)
            .await
            .map_err(|e| blob_error(e, blob))?;
        Ok(())
    }

    async fn get(&self, blob: &BlobRef) -> Result<Vec<u8>> {
        debug!("Getting content of {}", blob);
        self.blob_client(blob)
            .get_content()
            .await
            .map_err(|e| blob_error(e, blob))
    }

    async fn create_container(&self, container: &str) -> Result<()> {
        debug!("Creating container {}", container);
        match self.blob_service_client.container_client(container).create().await {
            Ok(_) => Ok(()),
            Err(e) => {
                let exists = matches!(
                    http_status(&e),
                    Some((status, code)) if status == StatusCode::Conflict
                        && code.map_or(true, |c| c == CONTAINER_ALREADY_EXISTS)
                );
                if exists {
                    Err(PipelineError::ContainerAlreadyExists {
                        container: container.to_string(),
                    })
                } else {
                    Err(e.into())
                }
            }
        }
    }

    async fn account_info(&self) -> Result<AccountInfo> {
        let response = self.blob_service_client.get_account_information().await?;
        Ok(AccountInfo {
            sku_name: response.sku_name,
            account_kind: response.account_kind,
        })
    }
}
