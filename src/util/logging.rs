use std::path::Path;

use anyhow::Result;

use crate::config::EditorSettings;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_FILE_PREFIX: &str = "fretchart.log";

/// Filter directives for the editor and its library crates.
pub fn log_filter(verbose: bool) -> EnvFilter {
    let level = if verbose { "debug" } else { "info" };
    EnvFilter::new(format!(
        "fretchart={level},chart_model={level},chart_timing={level},warn"
    ))
}

/// Initialize the logging system with tracing.
///
/// Records emitted through the `log` facade by the model and timing crates
/// are forwarded into the same subscriber. If `log_dir` is provided, logs are
/// also written to a daily rolling file in that directory.
pub fn init_logging(log_dir: Option<&Path>, verbose: bool) -> Result<()> {
    let registry = tracing_subscriber::registry().with(log_filter(verbose));

    if let Some(dir) = log_dir {
        std::fs::create_dir_all(dir)?;
        let file_appender = RollingFileAppender::new(Rotation::DAILY, dir, LOG_FILE_PREFIX);
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

        // The writer thread must outlive every log call; init_logging runs once per process.
        std::mem::forget(guard);

        registry
            .with(fmt::layer().with_target(true))
            .with(fmt::layer().with_writer(non_blocking).with_ansi(false))
            .try_init()?;
    } else {
        registry.with(fmt::layer().with_target(true)).try_init()?;
    }

    Ok(())
}

/// Initialize logging from the `log_dir` and `verbose_logging` settings.
pub fn init_from_settings(settings: &EditorSettings) -> Result<()> {
    init_logging(settings.log_dir.as_deref().map(Path::new), settings.verbose_logging)
}
