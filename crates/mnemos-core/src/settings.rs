//! Per-type configuration file settings.
//!
//! [`ConfigSettings`] is what callers provide (every field optional);
//! [`ResolvedSettings`] is the fully-defaulted form the file controller works
//! with. Resolution happens once, before the first file access.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{ConfigError, ConfigResult};

/// Extension used when none is configured.
pub const DEFAULT_EXTENSION: &str = "json";

/// Settle delay between a file event and the hot-reload pass.
pub const DEFAULT_WATCH_SETTLE_DELAY: Duration = Duration::from_millis(100);

const RESERVED_CHARS: &[char] = &['<', '>', ':', '"', '/', '\\', '|', '?', '*'];

/// What to do when the persisted version differs from the code's version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VersionChangeReaction {
    /// Keep every persisted value whose member still exists, then rewrite the
    /// file under the new version.
    #[default]
    MergeThenOverwrite,
    /// Discard persisted values and rewrite the file from the in-memory instance.
    ForceOverwrite,
}

/// Settings for one configuration type's file.
///
/// # Example
///
/// ```
/// use mnemos_core::{ConfigSettings, VersionChangeReaction};
///
/// let settings = ConfigSettings::new()
///     .file_name("app")
///     .file_extension("toml")
///     .version_change_reaction(VersionChangeReaction::ForceOverwrite);
///
/// let resolved = settings.resolve("AppConfig").unwrap();
/// assert!(resolved.full_path().ends_with("app.toml"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigSettings {
    file_name: Option<String>,
    file_extension: Option<String>,
    directory: Option<PathBuf>,
    version_change_reaction: VersionChangeReaction,
    auto_create_directory: bool,
    watch_enabled: bool,
    watch_settle_delay: Duration,
}

impl Default for ConfigSettings {
    fn default() -> Self {
        Self {
            file_name: None,
            file_extension: None,
            directory: None,
            version_change_reaction: VersionChangeReaction::default(),
            auto_create_directory: true,
            watch_enabled: true,
            watch_settle_delay: DEFAULT_WATCH_SETTLE_DELAY,
        }
    }
}

impl ConfigSettings {
    /// Create settings with every field at its default.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the file name (without extension). Defaults to the type name.
    #[must_use]
    pub fn file_name(mut self, name: impl Into<String>) -> Self {
        self.file_name = Some(name.into());
        self
    }

    /// Set the file extension (without the dot). Defaults to `json`.
    #[must_use]
    pub fn file_extension(mut self, extension: impl Into<String>) -> Self {
        self.file_extension = Some(extension.into());
        self
    }

    /// Set the directory holding the file. Defaults to the program's base directory.
    #[must_use]
    pub fn directory(mut self, directory: impl Into<PathBuf>) -> Self {
        self.directory = Some(directory.into());
        self
    }

    /// Set the reaction to a version change.
    #[must_use]
    pub fn version_change_reaction(mut self, reaction: VersionChangeReaction) -> Self {
        self.version_change_reaction = reaction;
        self
    }

    /// Create the directory on first write if it doesn't exist. Default is true.
    #[must_use]
    pub fn auto_create_directory(mut self, enabled: bool) -> Self {
        self.auto_create_directory = enabled;
        self
    }

    /// Watch the file for external edits of bindable members. Default is true.
    #[must_use]
    pub fn watch_enabled(mut self, enabled: bool) -> Self {
        self.watch_enabled = enabled;
        self
    }

    /// Delay between a file event and reading the file. Default is 100ms.
    #[must_use]
    pub fn watch_settle_delay(mut self, delay: Duration) -> Self {
        self.watch_settle_delay = delay;
        self
    }

    /// Resolve unset fields and validate the result.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSettings`] if the file name or extension
    /// is unusable, or if the directory doesn't exist while auto-creation is
    /// disabled. Returns [`ConfigError::Io`] if the program directory can't be
    /// determined.
    pub fn resolve(&self, type_name: &str) -> ConfigResult<ResolvedSettings> {
        let file_name = non_empty(self.file_name.as_deref()).unwrap_or(type_name);
        validate_file_part("file_name", file_name)?;

        let extension = non_empty(self.file_extension.as_deref())
            .map(|e| e.trim_start_matches('.'))
            .unwrap_or(DEFAULT_EXTENSION);
        validate_file_part("file_extension", extension)?;

        let directory = match &self.directory {
            Some(dir) if !dir.as_os_str().is_empty() => dir.clone(),
            _ => program_base_directory()?,
        };
        if !self.auto_create_directory && !directory.is_dir() {
            return Err(ConfigError::invalid_settings(
                "directory",
                format!(
                    "{} doesn't exist and automatic directory creation is disabled",
                    directory.display()
                ),
            ));
        }

        let full_path = directory.join(format!("{file_name}.{extension}"));
        Ok(ResolvedSettings {
            info: ConfigFileInfo {
                file_name: file_name.to_string(),
                extension: extension.to_string(),
                directory,
                full_path,
            },
            version_change_reaction: self.version_change_reaction,
            auto_create_directory: self.auto_create_directory,
            watch_enabled: self.watch_enabled,
            watch_settle_delay: self.watch_settle_delay,
        })
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn validate_file_part(field: &'static str, value: &str) -> ConfigResult<()> {
    if value.is_empty() {
        return Err(ConfigError::invalid_settings(field, "can't be empty"));
    }
    if let Some(c) = value
        .chars()
        .find(|c| RESERVED_CHARS.contains(c) || c.is_control())
    {
        return Err(ConfigError::invalid_settings(
            field,
            format!("'{value}' contains the reserved character {c:?}"),
        ));
    }
    if value == "." || value == ".." {
        return Err(ConfigError::invalid_settings(
            field,
            format!("'{value}' is not a file name"),
        ));
    }
    Ok(())
}

fn program_base_directory() -> ConfigResult<PathBuf> {
    let from_exe = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    match from_exe {
        Some(dir) => Ok(dir),
        None => std::env::current_dir().map_err(|e| ConfigError::io(".", 1, e)),
    }
}

/// Where a configuration lives on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFileInfo {
    /// File name without extension.
    pub file_name: String,
    /// Extension without the dot.
    pub extension: String,
    /// Directory holding the file.
    pub directory: PathBuf,
    /// `directory/file_name.extension`.
    pub full_path: PathBuf,
}

/// Fully resolved settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedSettings {
    info: ConfigFileInfo,
    version_change_reaction: VersionChangeReaction,
    auto_create_directory: bool,
    watch_enabled: bool,
    watch_settle_delay: Duration,
}

impl ResolvedSettings {
    /// File location details.
    pub fn file_info(&self) -> &ConfigFileInfo {
        &self.info
    }

    /// Full path of the configuration file.
    pub fn full_path(&self) -> &Path {
        &self.info.full_path
    }

    /// Directory of the configuration file.
    pub fn directory(&self) -> &Path {
        &self.info.directory
    }

    /// File extension without the dot.
    pub fn extension(&self) -> &str {
        &self.info.extension
    }

    /// Reaction to a version change.
    pub fn version_change_reaction(&self) -> VersionChangeReaction {
        self.version_change_reaction
    }

    /// Whether missing directories are created.
    pub fn auto_create_directory(&self) -> bool {
        self.auto_create_directory
    }

    /// Whether hot-reload of bindable members is enabled.
    pub fn watch_enabled(&self) -> bool {
        self.watch_enabled
    }

    /// Settle delay for the hot-reload watcher.
    pub fn watch_settle_delay(&self) -> Duration {
        self.watch_settle_delay
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = ConfigSettings::default();
        let resolved = settings.resolve("SampleConfig").unwrap();
        assert_eq!(resolved.file_info().file_name, "SampleConfig");
        assert_eq!(resolved.extension(), "json");
        assert!(resolved.full_path().ends_with("SampleConfig.json"));
        assert_eq!(
            resolved.version_change_reaction(),
            VersionChangeReaction::MergeThenOverwrite
        );
        assert!(resolved.auto_create_directory());
        assert!(resolved.watch_enabled());
        assert_eq!(resolved.watch_settle_delay(), DEFAULT_WATCH_SETTLE_DELAY);
    }

    #[test]
    fn test_explicit_values() {
        let dir = std::env::temp_dir();
        let resolved = ConfigSettings::new()
            .file_name("custom")
            .file_extension(".toml")
            .directory(&dir)
            .resolve("Ignored")
            .unwrap();

        assert_eq!(resolved.full_path(), dir.join("custom.toml"));
        assert_eq!(resolved.extension(), "toml");
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let resolved = ConfigSettings::new()
            .file_name("  ")
            .file_extension("")
            .resolve("AppConfig")
            .unwrap();
        assert!(resolved.full_path().ends_with("AppConfig.json"));
    }

    #[test]
    fn test_rejects_reserved_characters() {
        let err = ConfigSettings::new()
            .file_name("bad/name")
            .resolve("T")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSettings {
                field: "file_name",
                ..
            }
        ));

        let err = ConfigSettings::new()
            .file_extension("js?n")
            .resolve("T")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSettings {
                field: "file_extension",
                ..
            }
        ));
    }

    #[test]
    fn test_missing_directory_without_auto_create() {
        let missing = std::env::temp_dir().join("mnemos-settings-does-not-exist-7f3a");
        let err = ConfigSettings::new()
            .directory(&missing)
            .auto_create_directory(false)
            .resolve("T")
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::InvalidSettings {
                field: "directory",
                ..
            }
        ));

        // Allowed when the directory will be created on demand.
        assert!(ConfigSettings::new().directory(&missing).resolve("T").is_ok());
    }
}
