/// TrainingPipeline: runs ingestion then validation for one run directory

use std::sync::Arc;
use tracing::info;

use crate::artifact::{DataIngestionArtifact, DataValidationArtifact};
use crate::config::{DataIngestionConfig, DataValidationConfig, TrainingPipelineConfig};
use crate::document_store::DocumentSource;
use crate::error::Result;
use crate::ingestion::DataIngestion;
use crate::ner_data::NerData;
use crate::validation::DataValidation;

pub struct TrainingPipeline {
    source: Arc<dyn DocumentSource>,
    pub ingestion_config: DataIngestionConfig,
    pub validation_config: DataValidationConfig,
}

#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub ingestion: DataIngestionArtifact,
    pub validation: DataValidationArtifact,
}

impl TrainingPipeline {
    pub fn new(source: Arc<dyn DocumentSource>, config: &TrainingPipelineConfig) -> Self {
        Self {
            source,
            ingestion_config: DataIngestionConfig::new(config),
            validation_config: DataValidationConfig::new(config),
        }
    }

    pub async fn start_data_ingestion(&self) -> Result<DataIngestionArtifact> {
        DataIngestion::new(
            self.ingestion_config.clone(),
            NerData::new(self.source.clone()),
        )
        .initiate_data_ingestion()
        .await
    }

    pub fn start_data_validation(
        &self,
        ingestion: DataIngestionArtifact,
    ) -> Result<DataValidationArtifact> {
        DataValidation::new(ingestion, self.validation_config.clone())?.initiate_data_validation()
    }

    pub async fn run(&self) -> Result<PipelineOutcome> {
        info!("Starting training pipeline");
        let ingestion = self.start_data_ingestion().await?;
        let validation = self.start_data_validation(ingestion.clone())?;
        info!(
            "Training pipeline finished: validation_status={}",
            validation.validation_status
        );
        Ok(PipelineOutcome {
            ingestion,
            validation,
        })
    }
}
