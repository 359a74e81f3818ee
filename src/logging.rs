use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Sends tracing output to a daily log file under `<data_dir>/logs`. The
/// terminal belongs to the TUI, so nothing is written to stdout or stderr.
///
/// `RUST_LOG` overrides `default_level`. Keep the returned guard alive until
/// exit so buffered lines are flushed.
pub fn init(data_dir: &Path, default_level: &str) -> Result<WorkerGuard> {
    let log_dir = data_dir.join("logs");
    fs::create_dir_all(&log_dir).with_context(|| format!("creating {:?}", log_dir))?;

    let appender = RollingFileAppender::new(Rotation::DAILY, &log_dir, "todos.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let subscriber = tracing_subscriber::registry().with(env_filter).with(
        tracing_subscriber::fmt::layer()
            .with_writer(writer)
            .with_ansi(false)
            .with_target(true),
    );
    tracing::subscriber::set_global_default(subscriber)
        .context("installing tracing subscriber")?;

    tracing::info!(dir = %log_dir.display(), "logging initialized");
    Ok(guard)
}
