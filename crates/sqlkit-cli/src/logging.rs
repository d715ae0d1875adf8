//! Logging setup for the sqlkit binary
//!
//! Human-readable events go to stderr so command output on stdout stays
//! clean. `--log-file` adds a JSON layer written through a non-blocking
//! appender. `RUST_LOG` takes precedence over both default filters.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, Layer, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "warn,sqlkit=info,sqlkit_services=info,sqlkit_interchange=info,sqlkit_drivers=info,sqlkit_driver_mysql=info,sqlkit_driver_sqlite=info";

const VERBOSE_FILTER: &str = "info,sqlkit=debug,sqlkit_core=debug,sqlkit_services=debug,sqlkit_interchange=debug,sqlkit_drivers=debug,sqlkit_driver_mysql=debug,sqlkit_driver_sqlite=debug";

/// Logging configuration
#[derive(Debug, Clone, Default)]
pub struct LoggingConfig {
    /// Raise the default filter to debug for sqlkit crates
    pub verbose: bool,
    /// Also write JSON logs to this file
    pub log_file: Option<PathBuf>,
}

impl LoggingConfig {
    pub fn default_filter(&self) -> &'static str {
        if self.verbose { VERBOSE_FILTER } else { DEFAULT_FILTER }
    }

    fn env_filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_filter()))
    }
}

/// Install the global subscriber.
///
/// The returned guard flushes the JSON file writer on drop and must be held
/// until the program exits.
pub fn init(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let mut layers = Vec::new();

    let console_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(config.verbose)
        .with_file(false)
        .with_line_number(false)
        .with_filter(config.env_filter())
        .boxed();
    layers.push(console_layer);

    let mut guard = None;
    if let Some(path) = &config.log_file {
        let (dir, file_name) = split_log_path(path)?;
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;

        let file_appender = tracing_appender::rolling::never(&dir, file_name);
        let (non_blocking, worker_guard) = tracing_appender::non_blocking(file_appender);
        guard = Some(worker_guard);

        let json_layer = fmt::layer()
            .with_target(true)
            .with_thread_ids(true)
            .with_file(true)
            .with_line_number(true)
            .with_ansi(false)
            .json()
            .with_current_span(true)
            .with_span_list(true)
            .with_writer(non_blocking)
            .with_filter(config.env_filter())
            .boxed();
        layers.push(json_layer);
    }

    tracing_subscriber::registry()
        .with(layers)
        .try_init()
        .context("Logging was already initialized")?;

    tracing::debug!(
        verbose = config.verbose,
        log_file = ?config.log_file,
        "logging initialized"
    );

    Ok(guard)
}

fn split_log_path(path: &Path) -> Result<(PathBuf, String)> {
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("Log file path has no file name: {}", path.display()))?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    Ok((dir, file_name))
}
