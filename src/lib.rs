/// NER Pipeline - dataset ingestion, validation and model artifact storage
///
/// Architecture:
/// 1. DocumentStore: reads whole collections from MongoDB
/// 2. NerData + Table: collection -> table with the NER column fixes applied
/// 3. DataIngestion / DataValidation: feature store CSV and schema report
/// 4. BlobStorage: model artifacts in Azure Blob Storage

pub mod artifact;
pub mod azure_blob;
pub mod blob_storage;
pub mod config;
pub mod document_store;
pub mod error;
pub mod ingestion;
pub mod logging;
pub mod ner_data;
pub mod pipeline;
pub mod schema;
pub mod table;
pub mod validation;

pub use artifact::{DataIngestionArtifact, DataValidationArtifact, ValidationReport};
pub use azure_blob::AzureBlobBackend;
pub use blob_storage::{BlobBackend, BlobRef, BlobStorage, MemoryBlobBackend};
pub use document_store::{DocumentSource, InMemoryDocumentSource, MongoDocumentStore};
pub use error::{PipelineError, Result};
pub use pipeline::TrainingPipeline;
pub use table::Table;
