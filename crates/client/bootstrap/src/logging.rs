//! Tracing subscriber setup.
use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::config::LogConfig;

const LOG_FILE: &str = "client.log";

/// Install the global subscriber: stderr plus an optional log file.
///
/// `RUST_LOG` refines the filter; the default level is `info`. Keep the
/// returned guard alive for as long as the process should write to the file.
pub fn setup_logging(config: &LogConfig) -> Result<Option<WorkerGuard>> {
    let env_filter = EnvFilter::builder()
        .with_default_directive(tracing::Level::INFO.into())
        .from_env_lossy();

    let stderr_layer = tracing_subscriber::fmt::layer().with_writer(std::io::stderr);

    let (file_layer, guard, log_dir) = if config.to_file {
        let log_dir = log_directory(config);
        std::fs::create_dir_all(&log_dir)
            .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

        let file_appender = tracing_appender::rolling::never(&log_dir, LOG_FILE);
        let (non_blocking_file, guard) = tracing_appender::non_blocking(file_appender);
        let layer = tracing_subscriber::fmt::layer()
            .with_writer(non_blocking_file)
            .with_ansi(false);

        (Some(layer), Some(guard), Some(log_dir))
    } else {
        (None, None, None)
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    match log_dir {
        Some(dir) => tracing::info!("Log file: {}", dir.join(LOG_FILE).display()),
        None => tracing::info!("Logging to stderr only"),
    }

    Ok(guard)
}

/// Directory the log file is written to.
///
/// - `RIQA_LOG_DIR` when set
/// - otherwise `<platform cache dir>/riqa/logs`
/// - falling back to `<temp dir>/riqa/logs`
pub fn log_directory(config: &LogConfig) -> PathBuf {
    if let Some(dir) = &config.directory {
        return dir.clone();
    }

    directories::ProjectDirs::from("", "", "riqa")
        .map(|dirs| dirs.cache_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("riqa"))
        .join("logs")
}
