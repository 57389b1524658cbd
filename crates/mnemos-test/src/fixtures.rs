//! Sample configuration types.
//!
//! - [`AppConfig`] - leaves, an enum, a nested section, a bindable and an
//!   ignored member
//! - [`AppConfigV2`] - the next version of `AppConfig`, persisted to the same
//!   file name: `port` removed, `retries` added
//! - [`PersonConfig`] - two required members and a timestamp leaf

use chrono::{DateTime, TimeZone, Utc};
use mnemos_core::{Bindable, ConfigType, ConfigVersion, Schema, Section};
use serde::{Deserialize, Serialize};

/// Operating mode, persisted as a snake_case string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunMode {
    /// Normal operation.
    #[default]
    Standard,
    /// Read-only maintenance.
    Maintenance,
}

/// Nested server section.
#[derive(Debug, Clone, PartialEq)]
pub struct ServerSection {
    /// Bind host.
    pub host: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Section for ServerSection {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .leaf("host", |s| &s.host, |s| &mut s.host)
            .required()
            .leaf("timeout_secs", |s| &s.timeout_secs, |s| &mut s.timeout_secs)
            .hint("Request timeout in seconds")
    }
}

/// General-purpose sample configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    /// Application name.
    pub name: String,
    /// Listen port.
    pub port: u16,
    /// Operating mode.
    pub mode: RunMode,
    /// Server section.
    pub server: ServerSection,
    /// Log level, hot-reloadable.
    pub log_level: Bindable<String>,
    /// Runtime-only value, never persisted.
    pub cache_dir: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: "mnemos".to_string(),
            port: 8080,
            mode: RunMode::Standard,
            server: ServerSection::default(),
            log_level: Bindable::new("info".to_string()),
            cache_dir: String::new(),
        }
    }
}

impl Section for AppConfig {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .leaf("name", |c| &c.name, |c| &mut c.name)
            .required()
            .hint("Application name")
            .leaf("port", |c| &c.port, |c| &mut c.port)
            .leaf("mode", |c| &c.mode, |c| &mut c.mode)
            .nested("server", |c| &c.server, |c| &mut c.server)
            .bindable("log_level", |c| &c.log_level, |c| &mut c.log_level)
            .hint("Changes are applied without a restart")
            .leaf("cache_dir", |c| &c.cache_dir, |c| &mut c.cache_dir)
            .ignored()
    }
}

impl ConfigType for AppConfig {
    const VERSION: ConfigVersion = ConfigVersion::new(1, 0, 0, 0);
}

/// Second version of [`AppConfig`], sharing its file name.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfigV2 {
    /// Application name.
    pub name: String,
    /// Server section.
    pub server: ServerSection,
    /// Log level, hot-reloadable.
    pub log_level: Bindable<String>,
    /// Retry count, new in this version.
    pub retries: u8,
}

impl Default for AppConfigV2 {
    fn default() -> Self {
        Self {
            name: "mnemos".to_string(),
            server: ServerSection::default(),
            log_level: Bindable::new("info".to_string()),
            retries: 3,
        }
    }
}

impl Section for AppConfigV2 {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .leaf("name", |c| &c.name, |c| &mut c.name)
            .required()
            .nested("server", |c| &c.server, |c| &mut c.server)
            .bindable("log_level", |c| &c.log_level, |c| &mut c.log_level)
            .leaf("retries", |c| &c.retries, |c| &mut c.retries)
    }
}

impl ConfigType for AppConfigV2 {
    const VERSION: ConfigVersion = ConfigVersion::new(2, 0, 0, 0);

    fn type_name() -> &'static str {
        "AppConfig"
    }
}

/// Configuration with required members and no usable default.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonConfig {
    /// Required.
    pub full_name: String,
    /// Required.
    pub birth_date: DateTime<Utc>,
    /// Optional.
    pub email: String,
}

impl PersonConfig {
    /// A fully populated instance.
    pub fn sample() -> Self {
        Self {
            full_name: "Ada Lovelace".to_string(),
            birth_date: Utc
                .with_ymd_and_hms(1815, 12, 10, 0, 0, 0)
                .single()
                .unwrap_or_default(),
            email: "ada@example.com".to_string(),
        }
    }
}

impl Section for PersonConfig {
    fn schema() -> Schema<Self> {
        Schema::<Self>::new()
            .leaf("full_name", |p| &p.full_name, |p| &mut p.full_name)
            .required()
            .leaf("birth_date", |p| &p.birth_date, |p| &mut p.birth_date)
            .required()
            .leaf("email", |p| &p.email, |p| &mut p.email)
    }
}

impl ConfigType for PersonConfig {
    const VERSION: ConfigVersion = ConfigVersion::new(1, 0, 0, 0);
}
