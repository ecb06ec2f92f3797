//! # Observability
//!
//! Centralized tracing setup for the Beacon workspace.
//!
//! Binaries call [`init`] or [`init_with_config`] once at startup and use the
//! standard `tracing` macros everywhere else. Library crates never install a
//! subscriber themselves.
//!
//! Two output modes are supported:
//!
//! - [`OutputMode::Stderr`]: compact human-readable lines on stderr.
//! - [`OutputMode::JsonFile`]: one JSON object per line appended to
//!   `~/.beacon/logs/beacon.jsonl` (or [`LogConfig::log_path`]), optionally
//!   mirrored to stderr.
//!
//! ```rust,ignore
//! fn main() {
//!     observability::init_with_config(observability::LogConfig {
//!         service_name: "beacon".into(),
//!         default_level: "debug".into(),
//!         mode: observability::OutputMode::JsonFile,
//!         also_stderr: true,
//!         ..Default::default()
//!     });
//!     tracing::info!("ready");
//! }
//! ```

mod file;
mod json_layer;

pub use file::{default_log_path, CentralLogWriter};
pub use json_layer::LogEntry;

use std::path::PathBuf;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Where log lines are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Compact lines on stderr only.
    #[default]
    Stderr,
    /// Structured JSONL appended to a log file.
    JsonFile,
}

/// Configuration for the logging system.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Name of the service, included in every JSONL line.
    pub service_name: String,

    /// Default log level filter (e.g., "debug", "info", "warn").
    /// Can be overridden by `RUST_LOG` environment variable.
    pub default_level: String,

    /// Optional custom log file path for [`OutputMode::JsonFile`].
    pub log_path: Option<PathBuf>,

    /// Also emit logs to stderr when writing to a file.
    pub also_stderr: bool,

    /// Output mode.
    pub mode: OutputMode,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".into(),
            default_level: "info".into(),
            log_path: None,
            also_stderr: false,
            mode: OutputMode::Stderr,
        }
    }
}

/// Initialize the observability layer with default settings.
pub fn init(service_name: &str) {
    init_with_config(LogConfig {
        service_name: service_name.into(),
        ..Default::default()
    });
}

/// Initialize the observability layer with custom configuration.
///
/// Installing a second global subscriber is a no-op, so calling this from
/// several tests in one process is harmless. If the JSONL file cannot be
/// opened the subscriber falls back to stderr.
pub fn init_with_config(config: LogConfig) {
    if config.mode == OutputMode::JsonFile {
        match file::init_file_subscriber(&config) {
            Ok(()) => return,
            Err(e) => eprintln!("observability: falling back to stderr: {}", e),
        }
    }

    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter(&config.default_level))
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact()
        .finish()
        .try_init();
}

/// Build an env filter from `RUST_LOG`, falling back to `default_level`.
pub(crate) fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}
