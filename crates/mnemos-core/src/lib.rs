//! # Mnemos Core
//!
//! Core types for the Mnemos configuration engine.
//!
//! - [`ConfigVersion`] - four-part version of a configuration shape
//! - [`ConfigSettings`] - where and how a configuration file is kept
//! - [`Section`] / [`ConfigType`] - traits describing configuration types
//! - [`Schema`] - ordered member descriptor driving encode, decode and merge
//! - [`Bindable`] - observable member updated by hot-reload
//! - [`Document`] - the structured document exchanged with codecs
//! - [`merge()`] - the merge engine
//! - [`ConfigError`] - error type shared by every Mnemos crate

#![doc(html_root_url = "https://docs.rs/mnemos-core/0.1.0")]
#![warn(missing_docs)]
#![forbid(unsafe_code)]

pub mod bindable;
pub mod document;
mod error;
pub mod merge;
pub mod schema;
mod settings;
mod version;

pub use bindable::{Bindable, SlotChange, SubscriptionId};
pub use document::{Document, Entry, Node, REQUIRED_NOTICE, VERSION_COMMENTS, VERSION_KEY};
pub use error::{ConfigError, ConfigResult};
pub use merge::{merge, MergeOutcome};
pub use schema::{ConfigType, DecodeMode, LeafValue, Member, MemberKind, Schema, Section};
pub use settings::{
    ConfigFileInfo, ConfigSettings, ResolvedSettings, VersionChangeReaction,
    DEFAULT_EXTENSION, DEFAULT_WATCH_SETTLE_DELAY,
};
pub use version::ConfigVersion;
