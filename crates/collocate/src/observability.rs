//! Logging and tracing setup.
//!
//! Human-readable events go to stderr. When a log path or directory is
//! configured, events are also written as JSON lines through a non-blocking
//! file writer.

use std::path::PathBuf;

use anyhow::Context;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, fmt};

const LOG_PATH_ENV: &str = "COLLOCATE_LOG_PATH";
const LOG_DIR_ENV: &str = "COLLOCATE_LOG_DIR";
const LOG_FILE_PREFIX: &str = "collocate.jsonl";

/// Where JSONL logs are written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    /// One fixed file.
    File(PathBuf),
    /// Daily rolling files in a directory.
    Directory(PathBuf),
}

/// Resolved logging destinations.
#[derive(Debug, Clone, Default)]
pub struct ObservabilityConfig {
    /// JSONL destination, if any.
    pub target: Option<LogTarget>,
}

impl ObservabilityConfig {
    /// Resolve the log destination.
    ///
    /// Precedence: `COLLOCATE_LOG_PATH`, `COLLOCATE_LOG_DIR`, then the
    /// configured `log_dir`.
    pub fn from_env_with_overrides(config_log_dir: Option<PathBuf>) -> Self {
        let target = std::env::var_os(LOG_PATH_ENV)
            .filter(|v| !v.is_empty())
            .map(|p| LogTarget::File(PathBuf::from(p)))
            .or_else(|| {
                std::env::var_os(LOG_DIR_ENV)
                    .filter(|v| !v.is_empty())
                    .map(|d| LogTarget::Directory(PathBuf::from(d)))
            })
            .or_else(|| config_log_dir.map(LogTarget::Directory));
        Self { target }
    }
}

/// Build the event filter.
///
/// `RUST_LOG` wins when set; otherwise `-q` selects errors only, `-v` debug,
/// `-vv` trace, and the configured level applies by default.
pub fn env_filter(quiet: bool, verbose: u8, config_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }
    let level = if quiet {
        "error"
    } else {
        match verbose {
            0 => config_level,
            1 => "debug",
            _ => "trace",
        }
    };
    EnvFilter::new(level)
}

/// Install the global subscriber.
///
/// Keep the returned guard alive for the life of the process so buffered
/// file logs are flushed on exit.
pub fn init_observability(
    config: &ObservabilityConfig,
    filter: EnvFilter,
) -> anyhow::Result<Option<WorkerGuard>> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact();

    let (file_layer, guard) = match &config.target {
        Some(target) => {
            let appender = file_appender(target)?;
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .json()
                .with_current_span(true)
                .with_writer(writer);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .context("failed to install tracing subscriber")?;
    Ok(guard)
}

fn file_appender(target: &LogTarget) -> anyhow::Result<RollingFileAppender> {
    match target {
        LogTarget::File(path) => {
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map_or_else(|| PathBuf::from("."), PathBuf::from);
            let name = path
                .file_name()
                .with_context(|| format!("log path has no file name: {}", path.display()))?;
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            Ok(tracing_appender::rolling::never(dir, name))
        }
        LogTarget::Directory(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("failed to create log directory {}", dir.display()))?;
            Ok(tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX))
        }
    }
}
