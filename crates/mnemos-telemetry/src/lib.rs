//! # Mnemos Telemetry
//!
//! Logging setup for applications that embed Mnemos.
//!
//! The engine never installs a subscriber itself. It emits `tracing` events:
//!
//! | Level | Events |
//! |-------|--------|
//! | `info` | file created, loaded, migrated to a new version |
//! | `debug` | I/O retries, watcher events, reconciled bindables |
//! | `warn` | tolerated decode mismatches, swallowed watcher failures |
//!
//! Call [`init_logging`] once at startup to render them.
//!
//! # Example
//!
//! ```rust,ignore
//! use mnemos_telemetry::{init_logging, LogConfig};
//!
//! init_logging(&LogConfig::production())?;
//! ```

#![doc(html_root_url = "https://docs.rs/mnemos-telemetry/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod error;
pub mod logging;

pub use error::TelemetryError;
pub use logging::{create_env_filter, init_logging, LogConfig, LogFormat, ENGINE_TARGETS};

/// Result type for telemetry operations.
pub type TelemetryResult<T> = Result<T, TelemetryError>;
