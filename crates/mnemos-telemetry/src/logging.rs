//! Structured logging for applications embedding Mnemos.
//!
//! The engine crates log through `tracing` with a `config` field naming the
//! configuration type and a `path` field naming the file. This module
//! installs a `tracing-subscriber` registry that renders those events.
//!
//! # Example
//!
//! ```rust,ignore
//! use mnemos_telemetry::{init_logging, LogConfig};
//!
//! let config = LogConfig::development().with_engine_level("trace");
//! init_logging(&config)?;
//! ```

use crate::error::TelemetryError;
use crate::TelemetryResult;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};

/// Log targets of the engine crates.
pub const ENGINE_TARGETS: [&str; 3] = ["mnemos_core", "mnemos_codec", "mnemos_config"];

/// Output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per event.
    #[default]
    Json,
    /// Multi-line human-readable output.
    Pretty,
    /// Single-line human-readable output.
    Compact,
}

/// Logging configuration.
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Whether logging is installed at all.
    pub enabled: bool,

    /// Base filter directive (e.g. "info", "warn,my_app=debug").
    pub level: String,

    /// Level override for the engine crates, if any.
    pub engine_level: Option<String>,

    /// Output format.
    pub format: LogFormat,

    /// Whether to include file/line info.
    pub file_line_info: bool,

    /// Whether to include thread names (the watcher runs on `mnemos-watcher`).
    pub thread_names: bool,

    /// Whether to include the target (module path).
    pub include_target: bool,

    /// Whether a non-empty `RUST_LOG` replaces the configured directives.
    pub use_env: bool,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            level: "info".to_string(),
            engine_level: None,
            format: LogFormat::Json,
            file_line_info: false,
            thread_names: false,
            include_target: true,
            use_env: true,
        }
    }
}

impl LogConfig {
    /// Human-readable output with engine debug events.
    #[must_use]
    pub fn development() -> Self {
        Self {
            level: "info".to_string(),
            engine_level: Some("debug".to_string()),
            format: LogFormat::Pretty,
            file_line_info: true,
            thread_names: true,
            ..Self::default()
        }
    }

    /// JSON output, engine limited to warnings.
    #[must_use]
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            engine_level: Some("warn".to_string()),
            format: LogFormat::Json,
            use_env: false,
            ..Self::default()
        }
    }

    /// Set the base directive.
    pub fn with_level(mut self, level: impl Into<String>) -> Self {
        self.level = level.into();
        self
    }

    /// Set the engine level override.
    pub fn with_engine_level(mut self, level: impl Into<String>) -> Self {
        self.engine_level = Some(level.into());
        self
    }

    /// Set the output format.
    pub fn with_format(mut self, format: LogFormat) -> Self {
        self.format = format;
        self
    }

    /// The directives this configuration filters with, ignoring `RUST_LOG`.
    pub fn filter_directives(&self) -> String {
        let mut directives = self.level.trim().to_string();
        if let Some(engine) = &self.engine_level {
            for target in ENGINE_TARGETS {
                if !directives.is_empty() {
                    directives.push(',');
                }
                directives.push_str(target);
                directives.push('=');
                directives.push_str(engine.trim());
            }
        }
        directives
    }

    fn env_filter(&self) -> TelemetryResult<EnvFilter> {
        if self.use_env {
            if let Ok(from_env) = std::env::var(EnvFilter::DEFAULT_ENV) {
                if !from_env.trim().is_empty() {
                    return create_env_filter(&from_env);
                }
            }
        }
        create_env_filter(&self.filter_directives())
    }
}

/// Install the global subscriber.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` for bad directives and
/// `TelemetryError::LoggingInit` if a global subscriber is already set.
pub fn init_logging(config: &LogConfig) -> TelemetryResult<()> {
    if !config.enabled {
        return Ok(());
    }

    let filter = config.env_filter()?;

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_file(config.file_line_info)
        .with_line_number(config.file_line_info)
        .with_thread_names(config.thread_names)
        .with_target(config.include_target);

    let layer = match config.format {
        LogFormat::Json => fmt_layer.json().boxed(),
        LogFormat::Pretty => fmt_layer.pretty().boxed(),
        LogFormat::Compact => fmt_layer.compact().boxed(),
    };

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .try_init()
        .map_err(|e| TelemetryError::LoggingInit(e.to_string()))
}

/// Parse filter directives.
///
/// # Errors
///
/// Returns `TelemetryError::InvalidFilter` if the directives are invalid.
pub fn create_env_filter(directives: &str) -> TelemetryResult<EnvFilter> {
    EnvFilter::try_new(directives).map_err(|e| TelemetryError::InvalidFilter {
        directives: directives.to_string(),
        reason: e.to_string(),
    })
}
