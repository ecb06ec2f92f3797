//! Logging initialization for the Beacon host.
//!
//! Thin wrapper over the `observability` package so binaries pick the output
//! mode from the environment in one place.

use crate::Paths;
use observability::{LogConfig, OutputMode};

/// Initialize logging for `service_name`.
///
/// `BEACON_OBS_MODE=dev` writes JSONL to `<base_dir>/logs/beacon.jsonl` and
/// mirrors to stderr; any other value (or none) logs compact lines to stderr.
/// `RUST_LOG` overrides `level`.
pub fn init_logging(service_name: &str, level: &str, paths: &Paths) {
    let mode = parse_mode(std::env::var("BEACON_OBS_MODE").ok().as_deref());

    observability::init_with_config(LogConfig {
        service_name: service_name.into(),
        default_level: parse_level(level).as_str().to_ascii_lowercase(),
        log_path: Some(paths.log_file()),
        also_stderr: true,
        mode,
    });
}

fn parse_mode(raw: Option<&str>) -> OutputMode {
    match raw.map(|s| s.trim().to_ascii_lowercase()).as_deref() {
        Some("dev") | Some("development") => OutputMode::JsonFile,
        _ => OutputMode::Stderr,
    }
}

/// Parse a log level string into a tracing Level.
pub fn parse_level(level: &str) -> tracing::Level {
    match level.to_lowercase().as_str() {
        "trace" => tracing::Level::TRACE,
        "debug" => tracing::Level::DEBUG,
        "info" => tracing::Level::INFO,
        "warn" | "warning" => tracing::Level::WARN,
        "error" => tracing::Level::ERROR,
        _ => tracing::Level::INFO,
    }
}
