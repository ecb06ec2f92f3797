//! Configuration, paths and logging setup for the Beacon host.

mod config;
mod error;
mod logging;
mod paths;

pub use config::{
    Config, DEFAULT_JOURNAL_CAPACITY, DEFAULT_LOG_LEVEL, DEFAULT_REQUEST_TIMEOUT_SECS,
    DEFAULT_RETRY_CAPACITY, DEFAULT_RETRY_INTERVAL_SECS, DEFAULT_STORAGE_NAMESPACE,
};
pub use error::{CoreError, CoreResult};
pub use logging::{init_logging, parse_level};
pub use paths::Paths;
