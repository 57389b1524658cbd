//! # Mnemos Test
//!
//! Shared test utilities for Mnemos crates.
//!
//! - [`TempConfigDir`] - throwaway directory with file and JSON helpers
//! - [`NotificationRecorder`] - captures bindable notifications, with waiting
//! - Sample configuration types: [`AppConfig`], [`AppConfigV2`], [`PersonConfig`]
//!
//! ## Example
//!
//! ```
//! use mnemos_test::{AppConfig, NotificationRecorder};
//!
//! let config = AppConfig::default();
//! let recorder = NotificationRecorder::new();
//! recorder.attach(&config.log_level);
//!
//! config.log_level.set_new_value("debug".to_string());
//! assert_eq!(recorder.count(), 1);
//! ```

#![doc(html_root_url = "https://docs.rs/mnemos-test/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod dir;
mod fixtures;
mod recorder;

pub use dir::TempConfigDir;
pub use fixtures::{AppConfig, AppConfigV2, PersonConfig, RunMode, ServerSection};
pub use recorder::NotificationRecorder;
