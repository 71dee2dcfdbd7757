//! Log output for the cinema driver
//!
//! Console output is always on, compact or JSON. A plain-text copy can be
//! written to a file through a non-blocking appender.

use std::fs::File;
use std::path::PathBuf;

use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

pub use tracing_appender::non_blocking::WorkerGuard as LogGuard;

/// Filter directives, e.g. `debug` or `info,screenx_cinema::sync=debug`
pub const FILTER_ENV: &str = "CINEMA_LOG";

/// Set to `json` to force JSON console output
pub const FORMAT_ENV: &str = "CINEMA_LOG_FORMAT";

const DEFAULT_FILTER: &str = "info";

/// Console line format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

impl LogFormat {
    /// The environment wins over the command line when it names a format
    pub fn resolve(requested_json: bool, env_value: Option<&str>) -> Self {
        match env_value.map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("json") => LogFormat::Json,
            Some(v) if v.eq_ignore_ascii_case("compact") || v.eq_ignore_ascii_case("text") => LogFormat::Compact,
            _ if requested_json => LogFormat::Json,
            _ => LogFormat::Compact,
        }
    }
}

/// Driver logging options (`--log-file`, `--json-logs`)
#[derive(Debug, Clone, Default)]
pub struct LogConfig {
    pub log_file: Option<PathBuf>,
    pub json: bool,
}

impl LogConfig {
    pub fn format(&self) -> LogFormat {
        LogFormat::resolve(self.json, std::env::var(FORMAT_ENV).ok().as_deref())
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LogInitError {
    #[error("Failed to create log file {}: {source}", .path.display())]
    File {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Logging already initialized: {0}")]
    AlreadySet(#[from] tracing_subscriber::util::TryInitError),
}

fn env_filter() -> EnvFilter {
    EnvFilter::try_from_env(FILTER_ENV)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER))
}

/// Install the global subscriber
///
/// The returned guard flushes the log file when dropped; keep it alive for
/// the program duration.
pub fn init_logging(config: &LogConfig) -> Result<Option<LogGuard>, LogInitError> {
    let format = config.format();

    let (file_layer, guard) = match &config.log_file {
        Some(path) => {
            let file = File::create(path).map_err(|source| LogInitError::File {
                path: path.clone(),
                source,
            })?;
            let (writer, guard) = tracing_appender::non_blocking(file);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_file(true)
                .with_line_number(true);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    let (json_layer, compact_layer) = match format {
        LogFormat::Json => (Some(fmt::layer().json().with_file(true).with_line_number(true)), None),
        LogFormat::Compact => (None, Some(fmt::layer().compact().with_target(true))),
    };

    tracing_subscriber::registry()
        .with(env_filter())
        .with(file_layer)
        .with(json_layer)
        .with(compact_layer)
        .try_init()?;

    tracing::info!(
        target: "screenx_cinema",
        version = env!("CARGO_PKG_VERSION"),
        format = ?format,
        log_file = ?config.log_file,
        "Logging initialized"
    );

    Ok(guard)
}
