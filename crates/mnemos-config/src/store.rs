//! Type-indexed configuration store.
//!
//! The store keeps one registration per configuration type, keyed by
//! [`TypeId`]. A registration holds the type's file controller (once
//! created), its registered settings and its registered initial instance,
//! all behind a mutex dedicated to that type.
//!
//! # Example
//!
//! ```no_run
//! use mnemos_config::ConfigStore;
//! use mnemos_core::{ConfigSettings, ConfigType, ConfigVersion, Schema, Section};
//!
//! #[derive(Debug, Clone, Default)]
//! struct AppConfig {
//!     port: u16,
//! }
//!
//! impl Section for AppConfig {
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::new().leaf("port", |c| &c.port, |c| &mut c.port)
//!     }
//! }
//!
//! impl ConfigType for AppConfig {
//!     const VERSION: ConfigVersion = ConfigVersion::new(1, 0, 0, 0);
//! }
//!
//! # fn main() -> Result<(), mnemos_core::ConfigError> {
//! let store = ConfigStore::new();
//! store.set_settings::<AppConfig>(ConfigSettings::new().directory("/etc/myapp"))?;
//!
//! let config = store.get_or_create::<AppConfig>()?;
//! let mut next = config.snapshot();
//! next.port = 9090;
//! store.update(next)?;
//! # Ok(())
//! # }
//! ```
//!
//! # Thread Safety
//!
//! Operations on different types never contend. Operations on the same type
//! are serialized by its registration mutex. Bindable subscribers run while
//! that mutex is held (except during hot-reload), so a subscriber must not
//! call back into the store for the same type.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use mnemos_core::{ConfigError, ConfigResult, ConfigSettings, ConfigType};
use parking_lot::Mutex;

use crate::controller::{validate_instance, ConfigFileController, ControllerState};
use crate::handle::ConfigHandle;
use crate::io::RetryPolicy;

trait ErasedRegistration: Send + Sync {
    fn type_name(&self) -> &'static str;
    fn is_active(&self) -> bool;
    fn dispose(&self);
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

struct Registration<T: ConfigType> {
    state: Mutex<RegistrationState<T>>,
}

struct RegistrationState<T: ConfigType> {
    controller: Option<ConfigFileController<T>>,
    settings: Option<ConfigSettings>,
    initial: Option<T>,
}

impl<T: ConfigType> Registration<T> {
    fn new() -> Self {
        Self {
            state: Mutex::new(RegistrationState {
                controller: None,
                settings: None,
                initial: None,
            }),
        }
    }
}

impl<T: ConfigType> ErasedRegistration for Registration<T> {
    fn type_name(&self) -> &'static str {
        T::type_name()
    }

    fn is_active(&self) -> bool {
        self.state.lock().controller.is_some()
    }

    fn dispose(&self) {
        if let Some(mut controller) = self.state.lock().controller.take() {
            controller.dispose();
        }
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Registry of live configurations, one per type.
pub struct ConfigStore {
    registrations: DashMap<TypeId, Arc<dyn ErasedRegistration>>,
    retry: RetryPolicy,
}

impl Default for ConfigStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registrations: DashMap::new(),
            retry: RetryPolicy::default(),
        }
    }

    /// The process-wide store, created on first use.
    pub fn global() -> &'static ConfigStore {
        static GLOBAL: OnceLock<ConfigStore> = OnceLock::new();
        GLOBAL.get_or_init(ConfigStore::new)
    }

    /// Set the retry budget used for file access.
    #[must_use]
    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    fn registration<T: ConfigType>(&self) -> ConfigResult<Arc<Registration<T>>> {
        let erased = Arc::clone(
            self.registrations
                .entry(TypeId::of::<T>())
                .or_insert_with(|| Arc::new(Registration::<T>::new()) as Arc<dyn ErasedRegistration>)
                .value(),
        );
        erased
            .into_any()
            .downcast::<Registration<T>>()
            .map_err(|_| ConfigError::lifecycle(T::type_name(), "registry lookup"))
    }

    /// Return the live configuration of type `T`, creating it on first use.
    ///
    /// On first use the registered initial instance (or `T::default()`) is
    /// validated, its file is located from the registered settings (or
    /// [`ConfigType::default_settings`]) and the initialization protocol runs.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] if the type's version is unset or a
    /// required member is at its default value, and any error raised while
    /// creating or loading the file.
    pub fn get_or_create<T: ConfigType>(&self) -> ConfigResult<ConfigHandle<T>> {
        let registration = self.registration::<T>()?;
        // Held across creation so concurrent first calls build one controller.
        let mut state = registration.state.lock();
        if let Some(controller) = &state.controller {
            return Ok(controller.handle());
        }

        let instance = state.initial.clone().unwrap_or_default();
        validate_instance(&T::schema(), &instance)?;
        let resolved = state
            .settings
            .clone()
            .unwrap_or_else(T::default_settings)
            .resolve(T::type_name())?;
        let controller = ConfigFileController::open(instance, resolved, self.retry)?;

        tracing::debug!(
            config = T::type_name(),
            state = %controller.state(),
            "registered configuration"
        );
        let handle = controller.handle();
        state.controller = Some(controller);
        Ok(handle)
    }

    fn with_controller<T: ConfigType, R>(
        &self,
        operation: &'static str,
        f: impl FnOnce(&mut ConfigFileController<T>, Option<&T>) -> ConfigResult<R>,
    ) -> ConfigResult<R> {
        let registration = self.registration::<T>()?;
        let mut guard = registration.state.lock();
        let state = &mut *guard;
        let controller = state
            .controller
            .as_mut()
            .ok_or_else(|| ConfigError::lifecycle(T::type_name(), operation))?;
        f(controller, state.initial.as_ref())
    }

    /// Validate `value`, merge it onto the live instance and write the file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Lifecycle`] if [`get_or_create`](Self::get_or_create)
    /// wasn't called for `T`, and [`ConfigError::Validation`] if a required
    /// member of `value` is unset.
    pub fn update<T: ConfigType>(&self, value: T) -> ConfigResult<()> {
        self.with_controller::<T, _>("update", |controller, _| controller.update(&value))
    }

    /// Merge the registered initial instance (or `T::default()`) onto the
    /// live instance and write the file.
    pub fn restore_to_default<T: ConfigType>(&self) -> ConfigResult<()> {
        self.with_controller::<T, _>("restore_to_default", |controller, initial| {
            let template = initial.cloned().unwrap_or_default();
            controller.restore_to_default(&template)
        })
    }

    /// Reload the file into the live instance, ignoring any version
    /// difference. Unsaved edits of persisted members are discarded.
    pub fn restore_from_file<T: ConfigType>(&self) -> ConfigResult<()> {
        self.with_controller::<T, _>("restore_from_file", |controller, _| {
            controller.restore_from_file()
        })
    }

    /// Rewrite the file from the live instance as it is now.
    pub fn persist<T: ConfigType>(&self) -> ConfigResult<()> {
        self.with_controller::<T, _>("persist", |controller, _| controller.persist())
    }

    /// Register settings for `T`.
    ///
    /// If `T` already has a live instance, a replacement controller is built
    /// at the new location and adopts that instance, so outstanding handles
    /// stay valid. If the replacement fails the current controller is kept.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidSettings`] for unusable settings, and any
    /// error raised while initializing the new location.
    pub fn set_settings<T: ConfigType>(&self, settings: ConfigSettings) -> ConfigResult<()> {
        let resolved = settings.resolve(T::type_name())?;
        let registration = self.registration::<T>()?;
        let mut state = registration.state.lock();

        if let Some(current) = state.controller.as_mut() {
            current.stop_watching();
            let shared = Arc::clone(current.shared());
            match ConfigFileController::adopt(shared, resolved, self.retry) {
                Ok(replacement) => {
                    let mut previous = std::mem::replace(current, replacement);
                    previous.dispose();
                    tracing::info!(
                        config = T::type_name(),
                        path = %current.file_info().full_path.display(),
                        "configuration moved to new settings"
                    );
                }
                Err(e) => {
                    current.rearm();
                    return Err(e);
                }
            }
        }
        state.settings = Some(settings);
        Ok(())
    }

    /// Register the instance used to create `T` and to restore defaults.
    ///
    /// Has no effect on an already created live instance.
    pub fn set_initial_instance<T: ConfigType>(&self, instance: T) -> ConfigResult<()> {
        let registration = self.registration::<T>()?;
        registration.state.lock().initial = Some(instance);
        Ok(())
    }

    /// Lifecycle state of `T`'s controller, or `None` if it wasn't created.
    pub fn state<T: ConfigType>(&self) -> Option<ControllerState> {
        let registration = self.registration::<T>().ok()?;
        let state = registration.state.lock();
        state.controller.as_ref().map(ConfigFileController::state)
    }

    /// Whether the hot-reload watcher of `T` is running.
    pub fn is_watching<T: ConfigType>(&self) -> bool {
        self.registration::<T>().is_ok_and(|registration| {
            registration
                .state
                .lock()
                .controller
                .as_ref()
                .is_some_and(ConfigFileController::is_watching)
        })
    }

    /// Dispose `T`'s controller. Registered settings and initial instance
    /// are kept; the next [`get_or_create`](Self::get_or_create) starts over.
    ///
    /// Returns `false` if there was no live instance.
    pub fn dispose<T: ConfigType>(&self) -> bool {
        let Ok(registration) = self.registration::<T>() else {
            return false;
        };
        let controller = registration.state.lock().controller.take();
        match controller {
            Some(mut controller) => {
                controller.dispose();
                true
            }
            None => false,
        }
    }

    /// Dispose every controller and forget every registration.
    pub fn clear(&self) {
        let registrations: Vec<Arc<dyn ErasedRegistration>> = self
            .registrations
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        self.registrations.clear();
        for registration in registrations {
            tracing::debug!(config = registration.type_name(), "clearing configuration");
            registration.dispose();
        }
    }

    /// Number of types with a live instance.
    pub fn len(&self) -> usize {
        self.registrations
            .iter()
            .filter(|entry| entry.value().is_active())
            .count()
    }

    /// Whether no type has a live instance.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigStore")
            .field("registrations", &self.registrations.len())
            .field("retry", &self.retry)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemos_test::{AppConfig, PersonConfig, TempConfigDir};
    use std::time::Duration;

    fn store() -> ConfigStore {
        ConfigStore::new().with_retry_policy(RetryPolicy::new(2, Duration::from_millis(1)))
    }

    #[test]
    fn test_operations_before_create_are_lifecycle_errors() {
        let store = store();
        assert!(matches!(
            store.update(AppConfig::default()),
            Err(ConfigError::Lifecycle { operation: "update", .. })
        ));
        assert!(matches!(
            store.restore_to_default::<AppConfig>(),
            Err(ConfigError::Lifecycle { .. })
        ));
        assert!(matches!(
            store.restore_from_file::<AppConfig>(),
            Err(ConfigError::Lifecycle { .. })
        ));
        assert!(matches!(
            store.persist::<AppConfig>(),
            Err(ConfigError::Lifecycle { .. })
        ));
        assert_eq!(store.state::<AppConfig>(), None);
    }

    #[test]
    fn test_get_or_create_is_cached() {
        let dir = TempConfigDir::new();
        let store = store();
        store
            .set_settings::<AppConfig>(dir.settings().watch_enabled(false))
            .unwrap();

        let first = store.get_or_create::<AppConfig>().unwrap();
        let second = store.get_or_create::<AppConfig>().unwrap();
        assert!(first.ptr_eq(&second));
        assert_eq!(store.state::<AppConfig>(), Some(ControllerState::Created));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_required_defaults_rejected() {
        let dir = TempConfigDir::new();
        let store = store();
        store.set_settings::<PersonConfig>(dir.settings()).unwrap();

        let err = store.get_or_create::<PersonConfig>().unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(!dir.exists("PersonConfig.json"));

        store
            .set_initial_instance(PersonConfig::sample())
            .unwrap();
        assert!(store.get_or_create::<PersonConfig>().is_ok());
    }

    #[test]
    fn test_restore_to_default_uses_initial_instance() {
        let dir = TempConfigDir::new();
        let store = store();
        store.set_settings::<PersonConfig>(dir.settings()).unwrap();
        store.set_initial_instance(PersonConfig::sample()).unwrap();
        let handle = store.get_or_create::<PersonConfig>().unwrap();

        let mut edited = handle.snapshot();
        edited.full_name = "Someone Else".into();
        store.update(edited).unwrap();
        assert_eq!(handle.read().full_name, "Someone Else");

        store.restore_to_default::<PersonConfig>().unwrap();
        assert_eq!(handle.read().full_name, PersonConfig::sample().full_name);
        assert_eq!(
            dir.read_json("PersonConfig.json")["full_name"],
            PersonConfig::sample().full_name
        );
    }

    #[test]
    fn test_set_settings_moves_file_and_keeps_handle() {
        let first_dir = TempConfigDir::new();
        let second_dir = TempConfigDir::new();
        let store = store();
        store
            .set_settings::<AppConfig>(first_dir.settings())
            .unwrap();
        let handle = store.get_or_create::<AppConfig>().unwrap();
        handle.write().port = 4242;

        store
            .set_settings::<AppConfig>(second_dir.settings().file_extension("toml"))
            .unwrap();

        assert!(second_dir.exists("AppConfig.toml"));
        assert!(second_dir.read("AppConfig.toml").contains("port = 4242"));
        assert_eq!(handle.info().extension, "toml");
        assert!(handle.ptr_eq(&store.get_or_create::<AppConfig>().unwrap()));
        assert!(store.is_watching::<AppConfig>());
    }

    #[test]
    fn test_set_settings_failure_keeps_old_controller() {
        let dir = TempConfigDir::new();
        let store = store();
        store.set_settings::<AppConfig>(dir.settings()).unwrap();
        let handle = store.get_or_create::<AppConfig>().unwrap();

        dir.write("broken.json", "{ not json");
        let err = store
            .set_settings::<AppConfig>(dir.settings().file_name("broken"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::Decode { .. }));
        assert_eq!(handle.info().file_name, "AppConfig");
        assert!(store.is_watching::<AppConfig>());
    }

    #[test]
    fn test_invalid_settings_rejected() {
        let store = store();
        let err = store
            .set_settings::<AppConfig>(ConfigSettings::new().file_name("a|b"))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSettings { .. }));
    }

    #[test]
    fn test_dispose_and_clear() {
        let dir = TempConfigDir::new();
        let store = store();
        store.set_settings::<AppConfig>(dir.settings()).unwrap();
        let first = store.get_or_create::<AppConfig>().unwrap();

        assert!(store.dispose::<AppConfig>());
        assert!(!store.dispose::<AppConfig>());
        assert!(store.is_empty());

        // Settings survive dispose.
        let second = store.get_or_create::<AppConfig>().unwrap();
        assert!(!first.ptr_eq(&second));
        assert_eq!(store.state::<AppConfig>(), Some(ControllerState::Loaded));

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.state::<AppConfig>(), None);
    }
}
