/// DataIngestion: database collection -> feature store CSV

use tracing::{error, info};

use crate::artifact::DataIngestionArtifact;
use crate::config::DataIngestionConfig;
use crate::error::Result;
use crate::ner_data::NerData;
use crate::table::Table;

pub struct DataIngestion {
    config: DataIngestionConfig,
    data: NerData,
}

impl DataIngestion {
    pub fn new(config: DataIngestionConfig, data: NerData) -> Self {
        Self { config, data }
    }

    /// Load the configured collection and save it to the feature store.
    pub async fn export_data_into_feature_store(&self) -> Result<Table> {
        info!("Importing data from collection {}", self.config.collection_name);

        let table = self
            .data
            .export_collection_as_table(&self.config.collection_name, None)
            .await
            .inspect_err(|e| error!("Error importing data from MongoDB: {}", e))?;

        let (rows, columns) = table.shape();
        info!("Data imported with shape: ({}, {})", rows, columns);

        let raw_data_file_path = &self.config.raw_data_file_path;
        if let Some(dir) = raw_data_file_path.parent() {
            tokio::fs::create_dir_all(dir).await?;
        }

        info!("Saving imported data into feature store: {}", raw_data_file_path.display());
        table.write_csv(raw_data_file_path)?;

        Ok(table)
    }

    pub async fn initiate_data_ingestion(&self) -> Result<DataIngestionArtifact> {
        info!("Initiating data ingestion");
        self.export_data_into_feature_store().await?;

        let artifact = DataIngestionArtifact {
            raw_data_file_path: self.config.raw_data_file_path.clone(),
        };
        info!("Data ingestion artifact: {:?}", artifact);
        Ok(artifact)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TrainingPipelineConfig;
    use crate::document_store::InMemoryDocumentSource;
    use serde_json::json;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_ingestion_writes_raw_file() {
        let dir = tempfile::tempdir().unwrap();
        let pipeline = TrainingPipelineConfig::with_root(dir.path());
        let config = DataIngestionConfig::new(&pipeline).with_collection("words");

        let source = Arc::new(InMemoryDocumentSource::new("ner-mlops"));
        let record = match json!({"Sentence #": "Sentence: 1", "Word": "Thousands", "POS": "NNS", "Tag": "O"}) {
            serde_json::Value::Object(map) => map,
            _ => unreachable!(),
        };
        source.insert_many("ner-mlops", "words", vec![record]);

        let ingestion = DataIngestion::new(config.clone(), NerData::new(source));
        let artifact = ingestion.initiate_data_ingestion().await.unwrap();

        assert_eq!(artifact.raw_data_file_path, config.raw_data_file_path);
        let written = std::fs::read_to_string(&artifact.raw_data_file_path).unwrap();
        assert!(written.starts_with("Sentence,Word,POS,Tag"));
    }
}
