/// Logging setup: console at INFO plus a per-run DEBUG log file under `logs/`.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::filter::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::Layer;

use crate::error::Result;

// Azure SDK and HTTP client internals are noisy at DEBUG
const QUIET_TARGETS: &str = "azure_core=warn,azure_storage=warn,azure_storage_blobs=warn,azure_identity=warn,reqwest=warn,hyper=warn,mongodb=warn";

fn filter(base: &str) -> EnvFilter {
    EnvFilter::new(format!("{},{}", base, QUIET_TARGETS))
}

/// Install the global subscriber. The returned guard must be held for the
/// lifetime of the process so buffered file output is flushed on exit.
pub fn init(log_dir: impl AsRef<Path>, file_name: &str) -> Result<WorkerGuard> {
    let log_dir = log_dir.as_ref();
    std::fs::create_dir_all(log_dir)?;

    let console_level = std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());
    let console_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_filter(filter(&console_level));

    let file_appender = tracing_appender::rolling::never(log_dir, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(filter("debug"));

    tracing_subscriber::registry()
        .with(console_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}
