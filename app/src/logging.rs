use std::error::Error;
use std::fs;
use std::path::Path;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Sends every event to `log_file`; the terminal belongs to the panel.
///
/// `RUST_LOG` wins over `default_filter` when set. Keep the returned guard alive
/// until exit so buffered lines get flushed.
pub fn init(log_file: &Path, default_filter: &str) -> Result<WorkerGuard, Box<dyn Error>> {
    let directory = log_file
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(directory)?;
    let file_name = log_file
        .file_name()
        .ok_or_else(|| format!("log file path has no file name: {}", log_file.display()))?;

    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(default_filter))?;

    let file_appender = tracing_appender::rolling::never(directory, file_name);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .with_writer(non_blocking)
        .with_filter(env_filter);

    tracing_subscriber::registry().with(file_layer).try_init()?;

    tracing::info!(log_file = %log_file.display(), "logging initialized");
    Ok(guard)
}
