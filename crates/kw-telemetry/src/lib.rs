//! # Keyward Telemetry
//!
//! Logging for every Keyward component.
//!
//! ## Components
//!
//! - [`Logger`]: the logging port injected into caches, limiters, stores and
//!   the key manager. Defaults to [`NoopLogger`]; [`TracingLogger`] forwards
//!   to `tracing`; [`RecordingLogger`] captures events for tests.
//! - [`init_tracing`]: installs a `tracing-subscriber` registry for binaries
//!   that embed Keyward.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kw_telemetry::{init_tracing, TelemetryConfig, TracingLogger};
//!
//! init_tracing(&TelemetryConfig::from_env())?;
//! let logger = std::sync::Arc::new(TracingLogger);
//! ```
//!
//! ## Environment Variables
//!
//! | Variable | Default | Description |
//! |----------|---------|-------------|
//! | `KEYWARD_SERVICE_NAME` | `keyward` | Service name attached to events |
//! | `KEYWARD_LOG_LEVEL` / `RUST_LOG` | `info` | Log level filter |
//! | `KEYWARD_JSON_LOGS` | `false` | JSON formatted output |

mod config;
mod logging;
mod tracing_setup;

pub use config::TelemetryConfig;
pub use logging::{LogLevel, LogRecord, Logger, NoopLogger, RecordingLogger, TracingLogger};
pub use tracing_setup::init_tracing;

use std::sync::Arc;
use thiserror::Error;

/// Telemetry initialization errors
#[derive(Error, Debug)]
pub enum TelemetryError {
    #[error("Failed to initialize tracing subscriber: {0}")]
    TracerInit(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

/// Shared handle to an injected logger.
pub type SharedLogger = Arc<dyn Logger>;

/// The default logger: discards everything.
pub fn noop_logger() -> SharedLogger {
    Arc::new(NoopLogger)
}
