//! The per-type file controller.
//!
//! A [`ConfigFileController`] owns the link between one live configuration
//! instance and its file. It runs the initialization protocol on creation and
//! on every reload:
//!
//! 1. Stop the hot-reload watcher
//! 2. Missing file: write the live instance → [`ControllerState::Created`]
//! 3. Version mismatch (unless forced): apply the configured
//!    [`VersionChangeReaction`] and rewrite → [`ControllerState::Migrated`]
//! 4. Otherwise: decode exactly, check required members, merge onto the live
//!    instance and rewrite only if values differ → [`ControllerState::Loaded`]
//! 5. Deliver bindable notifications, then re-arm the watcher
//!
//! Notifications are always delivered after the instance lock is released
//! and after the file is written.

use std::fmt;
use std::path::Path;
use std::sync::Arc;

use mnemos_codec::{codec_for_extension, DocumentCodec};
use mnemos_core::{
    ConfigError, ConfigFileInfo, ConfigResult, ConfigType, DecodeMode, Document, MergeOutcome,
    ResolvedSettings, Schema, VersionChangeReaction,
};

use crate::handle::{ConfigHandle, Shared};
use crate::io::{self, RetryPolicy};
use crate::watcher::{BindableWatcher, Reconciler};

/// Lifecycle state of a controller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControllerState {
    /// Not initialized yet.
    Uninitialized,
    /// The file didn't exist and was written from the live instance.
    Created,
    /// The file was read and merged.
    Loaded,
    /// The file had another version and was reconciled and rewritten.
    Migrated,
    /// The controller was disposed.
    Disposed,
}

impl fmt::Display for ControllerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Uninitialized => "uninitialized",
            Self::Created => "created",
            Self::Loaded => "loaded",
            Self::Migrated => "migrated",
            Self::Disposed => "disposed",
        };
        f.write_str(label)
    }
}

/// Check that `T` is usable and that `instance` has every required member set.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] if `T::VERSION` is unset, if the schema
/// uses a reserved or duplicate member name, or if required members of
/// `instance` hold their default value.
pub fn validate_instance<T: ConfigType>(schema: &Schema<T>, instance: &T) -> ConfigResult<()> {
    check_type::<T>(schema)?;
    check_required(schema, instance, None)
}

fn check_type<T: ConfigType>(schema: &Schema<T>) -> ConfigResult<()> {
    if !T::VERSION.is_set() {
        return Err(ConfigError::invalid_definition(
            T::type_name(),
            "VERSION",
            "must not be 0.0.0.0",
        ));
    }
    schema.check_definition(T::type_name())
}

fn check_required<T: ConfigType>(
    schema: &Schema<T>,
    instance: &T,
    path: Option<&Path>,
) -> ConfigResult<()> {
    let missing = schema.missing_required(instance);
    match ConfigError::missing_members(T::type_name(), &missing, path.map(Path::to_path_buf)) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Keeps one live configuration instance synchronized with its file.
pub struct ConfigFileController<T: ConfigType> {
    shared: Arc<Shared<T>>,
    schema: Arc<Schema<T>>,
    codec: Arc<dyn DocumentCodec>,
    settings: ResolvedSettings,
    retry: RetryPolicy,
    state: ControllerState,
    bindables: Vec<String>,
    watcher: Option<BindableWatcher>,
}

impl<T: ConfigType> ConfigFileController<T> {
    /// Create a controller for a new live instance and run the initialization
    /// protocol.
    pub fn open(instance: T, settings: ResolvedSettings, retry: RetryPolicy) -> ConfigResult<Self> {
        let shared = Arc::new(Shared::new(instance, settings.file_info().clone()));
        Self::adopt(shared, settings, retry)
    }

    /// Create a controller for an existing live instance, typically after a
    /// settings change. Outstanding handles keep working.
    pub(crate) fn adopt(
        shared: Arc<Shared<T>>,
        settings: ResolvedSettings,
        retry: RetryPolicy,
    ) -> ConfigResult<Self> {
        let schema = T::schema();
        check_type::<T>(&schema)?;

        let bindables = schema.bindable_paths();
        let mut controller = Self {
            shared,
            schema: Arc::new(schema),
            codec: codec_for_extension(settings.extension()),
            settings,
            retry,
            state: ControllerState::Uninitialized,
            bindables,
            watcher: None,
        };
        controller.initialize(false)?;
        Ok(controller)
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ControllerState {
        self.state
    }

    /// A handle to the live instance.
    pub fn handle(&self) -> ConfigHandle<T> {
        ConfigHandle::new(Arc::clone(&self.shared))
    }

    pub(crate) fn shared(&self) -> &Arc<Shared<T>> {
        &self.shared
    }

    /// Where the instance is persisted.
    pub fn file_info(&self) -> &ConfigFileInfo {
        self.settings.file_info()
    }

    /// Dotted paths of the bindable members.
    pub fn bindable_members(&self) -> &[String] {
        &self.bindables
    }

    /// Whether the hot-reload watcher is running.
    pub fn is_watching(&self) -> bool {
        self.watcher.as_ref().is_some_and(BindableWatcher::is_running)
    }

    /// Validate `value`, merge it onto the live instance and write the file.
    pub fn update(&mut self, value: &T) -> ConfigResult<()> {
        self.ensure_active("update")?;
        check_required(&self.schema, value, None)?;
        self.merge_and_write(value)
    }

    /// Merge a default or template instance onto the live instance and write
    /// the file. Required members are not checked.
    pub fn restore_to_default(&mut self, template: &T) -> ConfigResult<()> {
        self.ensure_active("restore_to_default")?;
        self.merge_and_write(template)
    }

    fn merge_and_write(&mut self, value: &T) -> ConfigResult<()> {
        self.stop_watching();
        let outcome = self.schema.merge(&mut self.shared.instance.write(), value);
        let written = self.write_live();
        outcome.dispatch();
        self.arm_watcher();
        written
    }

    /// Reload from the file, ignoring any version difference.
    pub fn restore_from_file(&mut self) -> ConfigResult<()> {
        self.ensure_active("restore_from_file")?;
        self.initialize(true)
    }

    /// Rewrite the file from the live instance as it is now.
    pub fn persist(&mut self) -> ConfigResult<()> {
        self.ensure_active("persist")?;
        self.stop_watching();
        let written = self.write_live();
        self.arm_watcher();
        written
    }

    /// Stop the watcher and mark the controller as disposed.
    pub fn dispose(&mut self) {
        self.stop_watching();
        if self.state != ControllerState::Disposed {
            tracing::debug!(config = T::type_name(), "disposed configuration controller");
        }
        self.state = ControllerState::Disposed;
    }

    /// Restart the watcher after it was stopped by a failed replacement.
    pub(crate) fn rearm(&mut self) {
        if self.state != ControllerState::Disposed {
            *self.shared.info.write() = self.settings.file_info().clone();
            self.arm_watcher();
        }
    }

    pub(crate) fn stop_watching(&mut self) {
        if let Some(mut watcher) = self.watcher.take() {
            watcher.stop();
        }
    }

    fn ensure_active(&self, operation: &'static str) -> ConfigResult<()> {
        if self.state == ControllerState::Disposed {
            Err(ConfigError::lifecycle(T::type_name(), operation))
        } else {
            Ok(())
        }
    }

    fn initialize(&mut self, forced: bool) -> ConfigResult<()> {
        self.stop_watching();
        let result = self.run_protocol(forced);
        if let Err(e) = &result {
            tracing::warn!(
                config = T::type_name(),
                error = %e,
                "configuration file initialization failed"
            );
        }
        self.arm_watcher();
        result
    }

    fn run_protocol(&mut self, forced: bool) -> ConfigResult<()> {
        let path = self.settings.full_path().to_path_buf();
        let config = T::type_name();

        let (state, outcome, written) = if path.is_file() {
            self.load(&path, forced)?
        } else {
            let written = self.write_live();
            if written.is_ok() {
                tracing::info!(config, path = %path.display(), "created configuration file");
            }
            (ControllerState::Created, MergeOutcome::default(), written)
        };

        outcome.dispatch();
        written?;

        self.state = state;
        *self.shared.info.write() = self.settings.file_info().clone();
        Ok(())
    }

    fn load(
        &self,
        path: &Path,
        forced: bool,
    ) -> ConfigResult<(ControllerState, MergeOutcome, ConfigResult<()>)> {
        let config = T::type_name();
        let text = io::read_to_string(path, &self.retry)?;
        let doc = self.codec.decode(&text).map_err(|e| e.with_path(path))?;
        let persisted = doc.version();

        if !forced && persisted != Some(T::VERSION) {
            let reaction = self.settings.version_change_reaction();
            let outcome = match reaction {
                VersionChangeReaction::ForceOverwrite => MergeOutcome::default(),
                VersionChangeReaction::MergeThenOverwrite => {
                    let mut scratch = self.shared.instance.read().clone();
                    self.schema
                        .decode_into(&mut scratch, &doc, DecodeMode::Tolerant)?;
                    self.schema.merge(&mut self.shared.instance.write(), &scratch)
                }
            };
            let written = self.write_live();
            tracing::info!(
                config,
                path = %path.display(),
                from = %persisted.map_or_else(|| "unknown".to_string(), |v| v.to_string()),
                to = %T::VERSION,
                ?reaction,
                "migrated configuration file"
            );
            return Ok((ControllerState::Migrated, outcome, written));
        }

        let mut scratch = self.shared.instance.read().clone();
        self.schema
            .decode_into(&mut scratch, &doc, DecodeMode::Exact)
            .map_err(|e| e.with_type_name(config).with_path(path))?;
        check_required(&self.schema, &scratch, Some(path))?;

        let outcome = self.schema.merge(&mut self.shared.instance.write(), &scratch);
        // Compare in persisted form; the codec may drop values it can't represent.
        let written = self.encode_live().and_then(|current| {
            let text = self.codec.encode(&current)?;
            if self.codec.decode(&text)?.same_values(&doc) {
                return Ok(());
            }
            tracing::debug!(config, path = %path.display(), "rewriting configuration file");
            self.write_text(&text)
        });
        tracing::info!(
            config,
            path = %path.display(),
            changed = outcome.changed_members().len(),
            "loaded configuration file"
        );
        Ok((ControllerState::Loaded, outcome, written))
    }

    fn encode_live(&self) -> ConfigResult<Document> {
        let body = self.schema.encode(&self.shared.instance.read())?;
        Ok(Document::with_version(T::VERSION, body))
    }

    fn write_live(&self) -> ConfigResult<()> {
        let doc = self.encode_live()?;
        self.write_document(&doc)
    }

    fn write_document(&self, doc: &Document) -> ConfigResult<()> {
        let text = self.codec.encode(doc)?;
        self.write_text(&text)
    }

    fn write_text(&self, text: &str) -> ConfigResult<()> {
        io::write(
            self.settings.full_path(),
            text,
            self.settings.auto_create_directory(),
            &self.retry,
        )
    }

    fn arm_watcher(&mut self) {
        if !self.settings.watch_enabled()
            || self.bindables.is_empty()
            || matches!(
                self.state,
                ControllerState::Uninitialized | ControllerState::Disposed
            )
            || self.watcher.is_some()
        {
            return;
        }

        let path = self.settings.full_path().to_path_buf();
        match BindableWatcher::spawn(&path, self.settings.watch_settle_delay(), self.reconciler()) {
            Ok(watcher) => self.watcher = Some(watcher),
            Err(e) => tracing::warn!(
                config = T::type_name(),
                error = %e,
                "hot-reload disabled for configuration"
            ),
        }
    }

    fn reconciler(&self) -> Reconciler {
        let shared = Arc::clone(&self.shared);
        let schema = Arc::clone(&self.schema);
        let codec = Arc::clone(&self.codec);
        let path = self.settings.full_path().to_path_buf();
        let retry = self.retry;

        Arc::new(move || {
            let text = io::read_to_string(&path, &retry)?;
            let doc = codec.decode(&text)?;
            let changes = {
                let live = shared.instance.read();
                let mut scratch = live.clone();
                schema.decode_into(&mut scratch, &doc, DecodeMode::Tolerant)?;
                schema.stage_bindables(&live, &scratch)
            };
            let changed = changes.len();
            for change in changes {
                tracing::info!(
                    config = T::type_name(),
                    member = change.member(),
                    "bindable member changed on disk"
                );
                change.dispatch();
            }
            Ok(changed)
        })
    }
}

impl<T: ConfigType> Drop for ConfigFileController<T> {
    fn drop(&mut self) {
        self.stop_watching();
    }
}

impl<T: ConfigType> fmt::Debug for ConfigFileController<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConfigFileController")
            .field("config", &T::type_name())
            .field("path", &self.settings.full_path())
            .field("state", &self.state)
            .field("watching", &self.is_watching())
            .finish_non_exhaustive()
    }
}
