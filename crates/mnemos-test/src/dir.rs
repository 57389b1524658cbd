//! Temporary configuration directories.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use mnemos_core::ConfigSettings;
use serde_json::Value;
use tempfile::TempDir;

/// A temporary directory for configuration files, removed on drop.
///
/// File helpers panic on failure; they are meant for tests.
#[derive(Debug)]
pub struct TempConfigDir {
    dir: TempDir,
}

impl Default for TempConfigDir {
    fn default() -> Self {
        Self::new()
    }
}

impl TempConfigDir {
    /// Create a fresh directory.
    pub fn new() -> Self {
        Self {
            dir: TempDir::new().expect("failed to create temporary directory"),
        }
    }

    /// The directory path.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Settings pointing at this directory, with a short watcher settle delay.
    pub fn settings(&self) -> ConfigSettings {
        ConfigSettings::new()
            .directory(self.path())
            .watch_settle_delay(Duration::from_millis(20))
    }

    /// Path of a file in this directory.
    pub fn file(&self, name: &str) -> PathBuf {
        self.path().join(name)
    }

    /// Whether the file exists.
    pub fn exists(&self, name: &str) -> bool {
        self.file(name).is_file()
    }

    /// Read a file as text.
    pub fn read(&self, name: &str) -> String {
        fs::read_to_string(self.file(name))
            .unwrap_or_else(|e| panic!("failed to read {name}: {e}"))
    }

    /// Overwrite a file.
    pub fn write(&self, name: &str, contents: &str) {
        fs::write(self.file(name), contents)
            .unwrap_or_else(|e| panic!("failed to write {name}: {e}"));
    }

    /// Read a JSON file, skipping `//` comment lines.
    pub fn read_json(&self, name: &str) -> Value {
        let text: Vec<String> = self
            .read(name)
            .lines()
            .filter(|line| !line.trim_start().starts_with("//"))
            .map(str::to_string)
            .collect();
        serde_json::from_str(&text.join("\n"))
            .unwrap_or_else(|e| panic!("{name} is not valid JSON: {e}"))
    }

    /// Edit a JSON file in place. Comments are dropped.
    pub fn edit_json(&self, name: &str, edit: impl FnOnce(&mut Value)) {
        let mut value = self.read_json(name);
        edit(&mut value);
        let text = serde_json::to_string_pretty(&value)
            .unwrap_or_else(|e| panic!("failed to render {name}: {e}"));
        self.write(name, &text);
    }
}
