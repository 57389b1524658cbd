//! # Mnemos Config
//!
//! The configuration lifecycle engine.
//!
//! - [`ConfigStore`] - type-indexed registry, the main entry point
//! - [`ConfigFileController`] - keeps one live instance and its file in sync
//! - [`ConfigHandle`] - shared access to a live instance
//! - [`BindableWatcher`] - hot-reload of bindable members
//! - [`RetryPolicy`] - bounded retry for file access
//!
//! # Overview
//!
//! ```text
//! application ──► ConfigStore ──► ConfigFileController<T> ──► file (JSON / TOML)
//!                                        │
//!                                        └──► BindableWatcher ──► Bindable slots
//! ```
//!
//! Every synchronous call leaves the live instance and the file consistent.
//! The watcher only ever touches bindable members.

#![doc(html_root_url = "https://docs.rs/mnemos-config/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

mod controller;
mod handle;
mod io;
mod store;
mod watcher;

pub use controller::{validate_instance, ConfigFileController, ControllerState};
pub use handle::ConfigHandle;
pub use io::RetryPolicy;
pub use store::ConfigStore;
pub use watcher::{BindableWatcher, Reconciler};
