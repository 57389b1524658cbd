//! # Mnemos
//!
//! **Typed configuration files that stay in sync with your code**
//!
//! Mnemos persists a strongly-typed configuration object to a single file and
//! keeps the in-memory copy and the file consistent:
//!
//! - **Create or load** – the file is written from defaults the first time and
//!   read back on every later start
//! - **Versioned** – when the code's configuration version changes, the file is
//!   migrated by merging the persisted values or by overwriting them
//! - **Required members** – unset required members are reported together
//! - **Hot-reload** – external edits of [`Bindable`](core::Bindable) members
//!   reach their subscribers without a restart
//! - **JSON or TOML** – hints and notices are written as comments
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use mnemos::prelude::*;
//!
//! #[derive(Debug, Clone)]
//! struct AppConfig {
//!     port: u16,
//!     log_level: Bindable<String>,
//! }
//!
//! impl Default for AppConfig {
//!     fn default() -> Self {
//!         Self { port: 8080, log_level: Bindable::new("info".into()) }
//!     }
//! }
//!
//! impl Section for AppConfig {
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::new()
//!             .leaf("port", |c| &c.port, |c| &mut c.port)
//!             .bindable("log_level", |c| &c.log_level, |c| &mut c.log_level)
//!     }
//! }
//!
//! impl ConfigType for AppConfig {
//!     const VERSION: ConfigVersion = ConfigVersion::new(1, 0, 0, 0);
//! }
//!
//! fn main() -> ConfigResult<()> {
//!     let config = ConfigStore::global().get_or_create::<AppConfig>()?;
//!     config.read().log_level.subscribe(|new, old| {
//!         println!("log level changed from {old} to {new}");
//!     });
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ConfigStore ─► ConfigFileController<T> ─► DocumentCodec ─► file
//!                        │
//!                        └─► BindableWatcher ─► Bindable subscribers
//! ```

#![doc(html_root_url = "https://docs.rs/mnemos/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Re-export core types
pub use mnemos_core as core;

// Re-export codecs
pub use mnemos_codec as codec;

// Re-export the lifecycle engine
pub use mnemos_config as config;

// Re-export logging setup
pub use mnemos_telemetry as telemetry;

/// Prelude module for convenient imports.
///
/// # Example
///
/// ```rust,ignore
/// use mnemos::prelude::*;
/// ```
pub mod prelude {
    pub use mnemos_core::{
        Bindable, ConfigError, ConfigFileInfo, ConfigResult, ConfigSettings, ConfigType,
        ConfigVersion, Schema, Section, SubscriptionId, VersionChangeReaction,
    };

    pub use mnemos_config::{ConfigHandle, ConfigStore, ControllerState, RetryPolicy};

    pub use mnemos_telemetry::{init_logging, LogConfig};
}
