/// DocumentStore: read access to the document database
///
/// `DocumentSource` is the seam the dataset loader reads through. The MongoDB
/// implementation owns one client for the lifetime of a pipeline run; callers
/// construct it once and share it by `Arc`.

use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, Bson, Document};
use mongodb::Client;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::{debug, info};

use crate::config::MongoSettings;
use crate::error::{PipelineError, Result};

pub type Record = Map<String, Value>;

#[async_trait]
pub trait DocumentSource: Send + Sync {
    /// Database used when a caller does not name one.
    fn default_database(&self) -> &str;

    /// Every document in `database.collection`, as flat JSON records.
    async fn fetch_all(&self, database: &str, collection: &str) -> Result<Vec<Record>>;
}

/// MongoDB-backed document source
pub struct MongoDocumentStore {
    client: Client,
    database_name: String,
}

impl MongoDocumentStore {
    /// Connect using the configured connection string.
    pub async fn connect(settings: &MongoSettings) -> Result<Self> {
        info!("Connecting to MongoDB: database={}", settings.database_name);

        let client = Client::with_uri_str(&settings.connection_uri)
            .await
            .map_err(|e| PipelineError::DatabaseError(format!("Connection failed: {}", e)))?;

        info!("MongoDB connection successful");
        Ok(Self {
            client,
            database_name: settings.database_name.clone(),
        })
    }
}

#[async_trait]
impl DocumentSource for MongoDocumentStore {
    fn default_database(&self) -> &str {
        &self.database_name
    }

    async fn fetch_all(&self, database: &str, collection: &str) -> Result<Vec<Record>> {
        debug!("Fetching all documents from {}.{}", database, collection);

        let cursor = self
            .client
            .database(database)
            .collection::<Document>(collection)
            .find(doc! {})
            .await?;
        let documents: Vec<Document> = cursor.try_collect().await?;

        let records = documents
            .into_iter()
            .map(document_to_record)
            .collect::<Result<Vec<_>>>()?;

        debug!("Fetched {} documents from {}.{}", records.len(), database, collection);
        Ok(records)
    }
}

fn document_to_record(document: Document) -> Result<Record> {
    match Bson::Document(document).into_relaxed_extjson() {
        Value::Object(map) => Ok(map),
        other => Err(PipelineError::DatabaseError(format!(
            "Document did not convert to an object: {}",
            other
        ))),
    }
}

/// In-memory document source keyed by (database, collection)
pub struct InMemoryDocumentSource {
    database_name: String,
    collections: RwLock<HashMap<(String, String), Vec<Record>>>,
}

impl InMemoryDocumentSource {
    pub fn new(database_name: impl Into<String>) -> Self {
        Self {
            database_name: database_name.into(),
            collections: RwLock::new(HashMap::new()),
        }
    }

    pub fn insert_many(&self, database: &str, collection: &str, records: Vec<Record>) {
        self.collections
            .write()
            .entry((database.to_string(), collection.to_string()))
            .or_default()
            .extend(records);
    }
}

#[async_trait]
impl DocumentSource for InMemoryDocumentSource {
    fn default_database(&self) -> &str {
        &self.database_name
    }

    async fn fetch_all(&self, database: &str, collection: &str) -> Result<Vec<Record>> {
        // A missing collection reads as empty, as it does in MongoDB.
        Ok(self
            .collections
            .read()
            .get(&(database.to_string(), collection.to_string()))
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::oid::ObjectId;
    use serde_json::json;

    #[test]
    fn test_document_to_record_keeps_field_order() {
        let document = doc! {
            "_id": ObjectId::new(),
            "Sentence #": "Sentence: 1",
            "Word": "Thousands",
            "Count": 3_i32,
        };

        let record = document_to_record(document).unwrap();
        let keys: Vec<&str> = record.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["_id", "Sentence #", "Word", "Count"]);
        assert_eq!(record["Count"], json!(3));
    }

    #[tokio::test]
    async fn test_in_memory_missing_collection_is_empty() {
        let source = InMemoryDocumentSource::new("ner-mlops");
        let records = source.fetch_all("ner-mlops", "absent").await.unwrap();
        assert!(records.is_empty());
        assert_eq!(source.default_database(), "ner-mlops");
    }
}
