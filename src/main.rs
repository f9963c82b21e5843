use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};

use ner_pipeline::config::{
    self, AzureSettings, MongoSettings, TrainingPipelineConfig, ARTIFACT_DIR, LOG_DIR,
    MODEL_FILE_NAME, SCHEMA_FILE_PATH,
};
use ner_pipeline::{
    AzureBlobBackend, BlobStorage, DataIngestionArtifact, MongoDocumentStore, TrainingPipeline,
};

#[derive(Parser)]
#[command(name = "ner-pipeline", version, about = "NER dataset pipeline and model artifact storage")]
struct Cli {
    /// Root directory for per-run artifacts
    #[arg(long, global = true, default_value = ARTIFACT_DIR)]
    artifact_dir: PathBuf,

    /// Directory for log files
    #[arg(long, global = true, default_value = LOG_DIR)]
    log_dir: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Ingest the dataset and validate it
    Run {
        #[arg(long)]
        collection: Option<String>,
        #[arg(long, default_value = SCHEMA_FILE_PATH)]
        schema: PathBuf,
    },
    /// Export the collection into the feature store
    Ingest {
        #[arg(long)]
        collection: Option<String>,
    },
    /// Validate an existing raw data file
    Validate {
        #[arg(long)]
        raw_data: PathBuf,
        #[arg(long, default_value = SCHEMA_FILE_PATH)]
        schema: PathBuf,
    },
    /// Blob storage operations
    Blob {
        /// Container; defaults to BLOB_STORAGE_INSTANCE_NAME
        #[arg(long, global = true)]
        container: Option<String>,
        #[command(subcommand)]
        command: BlobCommand,
    },
}

#[derive(Subcommand)]
enum BlobCommand {
    /// Check whether a blob exists
    Exists { path: String },
    /// Upload a local file; the local copy is removed unless --keep is given
    Upload {
        file: PathBuf,
        #[arg(long)]
        to: Option<String>,
        #[arg(long)]
        keep: bool,
    },
    /// Download a blob to a local file
    Download {
        path: String,
        #[arg(long)]
        save_to: PathBuf,
    },
    /// Upload a model file under an optional directory
    PushModel {
        file: PathBuf,
        #[arg(long, default_value = MODEL_FILE_NAME)]
        name: String,
        #[arg(long)]
        directory: Option<String>,
        #[arg(long)]
        keep: bool,
    },
    /// Download a model file from an optional directory
    PullModel {
        #[arg(long, default_value = MODEL_FILE_NAME)]
        name: String,
        #[arg(long)]
        directory: Option<String>,
        #[arg(long)]
        save_to: PathBuf,
    },
    /// Create the container if it does not exist
    CreateContainer,
    /// Log storage account SKU and kind
    AccountInfo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    config::load_dotenv();
    let cli = Cli::parse();

    let pipeline_config = TrainingPipelineConfig::with_root(&cli.artifact_dir);
    let _guard = ner_pipeline::logging::init(&cli.log_dir, &format!("{}.log", pipeline_config.timestamp))
        .context("Failed to initialize logging")?;

    let result = run(cli.command, pipeline_config).await;
    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn run(command: Command, pipeline_config: TrainingPipelineConfig) -> anyhow::Result<()> {
    match command {
        Command::Run { collection, schema } => {
            let pipeline = build_pipeline(&pipeline_config, collection, schema).await?;
            let outcome = pipeline.run().await?;
            println!("{}", outcome.validation);
        }
        Command::Ingest { collection } => {
            let pipeline =
                build_pipeline(&pipeline_config, collection, PathBuf::from(SCHEMA_FILE_PATH)).await?;
            let artifact = pipeline.start_data_ingestion().await?;
            println!("{}", artifact.raw_data_file_path.display());
        }
        Command::Validate { raw_data, schema } => {
            let config = config::DataValidationConfig::new(&pipeline_config).with_schema(schema);
            let artifact = ner_pipeline::validation::DataValidation::new(
                DataIngestionArtifact {
                    raw_data_file_path: raw_data,
                },
                config,
            )?
            .initiate_data_validation()?;
            println!("{}", artifact);
        }
        Command::Blob { container, command } => {
            let container = container
                .or_else(config::default_container)
                .context("No container given and BLOB_STORAGE_INSTANCE_NAME is not set")?;
            let settings = AzureSettings::from_env()?;
            let storage = BlobStorage::new(Arc::new(AzureBlobBackend::new(&settings)?));
            run_blob(&storage, &container, command).await?;
        }
    }
    Ok(())
}

async fn build_pipeline(
    pipeline_config: &TrainingPipelineConfig,
    collection: Option<String>,
    schema: PathBuf,
) -> anyhow::Result<TrainingPipeline> {
    let settings = MongoSettings::from_env()?;
    let store = MongoDocumentStore::connect(&settings).await?;

    let mut pipeline = TrainingPipeline::new(Arc::new(store), pipeline_config);
    if let Some(collection) = collection {
        pipeline.ingestion_config = pipeline.ingestion_config.with_collection(collection);
    }
    pipeline.validation_config = pipeline.validation_config.with_schema(schema);
    info!("Artifacts for this run: {}", pipeline_config.artifact_dir.display());
    Ok(pipeline)
}

async fn run_blob(storage: &BlobStorage, container: &str, command: BlobCommand) -> anyhow::Result<()> {
    match command {
        BlobCommand::Exists { path } => {
            println!("{}", storage.is_file_available(container, &path).await?);
        }
        BlobCommand::Upload { file, to, keep } => {
            let remote = match to {
                Some(remote) => remote,
                None => file
                    .file_name()
                    .map(|name| name.to_string_lossy().into_owned())
                    .context("Upload source has no file name; pass --to")?,
            };
            storage.upload_file(&file, &remote, container, !keep).await?;
        }
        BlobCommand::Download { path, save_to } => {
            storage.download_file(&path, container, &save_to).await?;
        }
        BlobCommand::PushModel {
            file,
            name,
            directory,
            keep,
        } => {
            storage
                .upload_model(&file, &name, container, directory.as_deref(), !keep)
                .await?;
        }
        BlobCommand::PullModel {
            name,
            directory,
            save_to,
        } => {
            storage
                .download_model(&name, container, directory.as_deref(), &save_to)
                .await?;
        }
        BlobCommand::CreateContainer => storage.create_container(container).await?,
        BlobCommand::AccountInfo => storage.log_account_info().await,
    }
    Ok(())
}
