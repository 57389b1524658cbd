//! Shared access to a live configuration instance.

use std::sync::Arc;

use mnemos_core::ConfigFileInfo;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// State shared by a controller and every handle it hands out.
pub(crate) struct Shared<T> {
    pub(crate) instance: RwLock<T>,
    pub(crate) info: RwLock<ConfigFileInfo>,
}

impl<T> Shared<T> {
    pub(crate) fn new(instance: T, info: ConfigFileInfo) -> Self {
        Self {
            instance: RwLock::new(instance),
            info: RwLock::new(info),
        }
    }
}

/// A handle to a live configuration instance.
///
/// Handles are cheap to clone and stay valid for the life of the store entry,
/// including across reloads, migrations and settings changes: the instance is
/// always updated in place.
///
/// Mutating through [`write`](Self::write) changes memory only. Use the
/// store's `update` or `persist` to write the file.
pub struct ConfigHandle<T> {
    shared: Arc<Shared<T>>,
}

impl<T> ConfigHandle<T> {
    pub(crate) fn new(shared: Arc<Shared<T>>) -> Self {
        Self { shared }
    }

    /// Lock the instance for reading.
    pub fn read(&self) -> RwLockReadGuard<'_, T> {
        self.shared.instance.read()
    }

    /// Lock the instance for writing.
    pub fn write(&self) -> RwLockWriteGuard<'_, T> {
        self.shared.instance.write()
    }

    /// Where the instance is persisted.
    pub fn info(&self) -> ConfigFileInfo {
        self.shared.info.read().clone()
    }

    /// Whether both handles refer to the same live instance.
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.shared, &other.shared)
    }
}

impl<T: Clone> ConfigHandle<T> {
    /// Copy the current instance.
    pub fn snapshot(&self) -> T {
        self.shared.instance.read().clone()
    }
}

impl<T> Clone for ConfigHandle<T> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<T> std::fmt::Debug for ConfigHandle<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigHandle")
            .field("path", &self.shared.info.read().full_path)
            .finish_non_exhaustive()
    }
}
