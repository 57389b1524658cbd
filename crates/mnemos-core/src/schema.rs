//! Schema descriptors for configuration types.
//!
//! A configuration type describes its members once, through [`Section::schema`].
//! The resulting [`Schema`] is an ordered list of [`Member`]s, each tagged with
//! its [`MemberKind`]:
//!
//! - **Leaf** - a plain value converted through `serde_json::Value`
//! - **Nested** - a structured sub-section with its own schema
//! - **Bindable** - a [`Bindable`] slot whose changes are observable
//!
//! Everything that walks a configuration value (encoding, decoding, merging,
//! the required-member check and the hot-reload pass) is driven by the schema,
//! so no runtime reflection is needed.
//!
//! # Example
//!
//! ```
//! use mnemos_core::{Bindable, ConfigType, ConfigVersion, Schema, Section};
//!
//! #[derive(Debug, Clone, Default)]
//! struct Server {
//!     host: String,
//!     port: u16,
//! }
//!
//! impl Section for Server {
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::new()
//!             .leaf("host", |s| &s.host, |s| &mut s.host)
//!             .required()
//!             .leaf("port", |s| &s.port, |s| &mut s.port)
//!             .hint("TCP port to listen on")
//!     }
//! }
//!
//! #[derive(Debug, Clone, Default)]
//! struct AppConfig {
//!     server: Server,
//!     log_level: Bindable<String>,
//! }
//!
//! impl Section for AppConfig {
//!     fn schema() -> Schema<Self> {
//!         Schema::<Self>::new()
//!             .nested("server", |c| &c.server, |c| &mut c.server)
//!             .bindable("log_level", |c| &c.log_level, |c| &mut c.log_level)
//!     }
//! }
//!
//! impl ConfigType for AppConfig {
//!     const VERSION: ConfigVersion = ConfigVersion::new(1, 0, 0, 0);
//! }
//!
//! let schema = AppConfig::schema();
//! assert_eq!(schema.missing_required(&AppConfig::default()), vec!["server.host"]);
//! assert_eq!(schema.bindable_paths(), vec!["log_level"]);
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::bindable::{Bindable, SlotChange};
use crate::document::{Document, Entry, Node, VERSION_KEY};
use crate::error::{ConfigError, ConfigResult};
use crate::merge::{self, MergeOutcome};
use crate::settings::ConfigSettings;
use crate::version::ConfigVersion;

/// A structured type that can appear in a configuration document.
pub trait Section: Default + Clone + Send + Sync + 'static {
    /// Describe the members of this type.
    fn schema() -> Schema<Self>;
}

/// The root type of a configuration file.
pub trait ConfigType: Section {
    /// Version of the configuration shape. Must not be all zeros.
    const VERSION: ConfigVersion;

    /// Name used in errors, logs and as the default file name.
    ///
    /// Defaults to the unqualified Rust type name.
    fn type_name() -> &'static str {
        short_type_name::<Self>()
    }

    /// Settings used when none were registered for this type.
    fn default_settings() -> ConfigSettings {
        ConfigSettings::default()
    }
}

fn short_type_name<T: ?Sized>() -> &'static str {
    let full = std::any::type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}

/// Values that can be stored in a leaf or bindable member.
pub trait LeafValue:
    Serialize + DeserializeOwned + PartialEq + Clone + Default + Send + Sync + 'static
{
}

impl<V> LeafValue for V where
    V: Serialize + DeserializeOwned + PartialEq + Clone + Default + Send + Sync + 'static
{
}

/// How strictly a document is decoded into a typed value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeMode {
    /// Any value that can't be converted to its member's type is an error.
    Exact,
    /// Unconvertible values are logged and skipped.
    Tolerant,
}

/// Type-erased access to a leaf member.
pub trait LeafAccess<T>: Send + Sync {
    /// Convert the member's value to a document value.
    fn encode(&self, owner: &T) -> ConfigResult<Value>;
    /// Convert `raw` back and store it in the member.
    fn decode(&self, owner: &mut T, raw: &Value, path: &str) -> ConfigResult<()>;
    /// Copy the member from `source`; returns `true` if the value changed.
    fn copy(&self, target: &mut T, source: &T) -> bool;
    /// Whether the member holds its type's default value.
    fn is_default(&self, owner: &T) -> bool;
}

/// Type-erased access to a bindable member.
pub trait BindableAccess<T>: Send + Sync {
    /// Convert the current value to a document value.
    fn encode(&self, owner: &T) -> ConfigResult<Value>;
    /// Convert `raw` back and replace the slot with a fresh one holding it.
    fn decode(&self, owner: &mut T, raw: &Value, path: &str) -> ConfigResult<()>;
    /// Swap `target`'s slot to `source`'s value without notifying.
    fn stage(&self, target: &T, source: &T, path: &str) -> Option<SlotChange>;
    /// Whether the slot holds its type's default value.
    fn is_default(&self, owner: &T) -> bool;
}

/// Type-erased access to a nested section.
pub trait NestedAccess<T>: Send + Sync {
    /// Encode the section.
    fn encode(&self, owner: &T) -> ConfigResult<Document>;
    /// Decode `doc` into the section.
    fn decode(&self, owner: &mut T, doc: &Document, mode: DecodeMode, path: &str)
        -> ConfigResult<()>;
    /// Merge `source`'s section onto `target`'s.
    fn merge(&self, target: &mut T, source: &T, path: &str, outcome: &mut MergeOutcome);
    /// Collect required members of the section still at their default.
    fn missing_required(&self, owner: &T, path: &str, out: &mut Vec<String>);
    /// Collect bindable member paths of the section.
    fn bindable_paths(&self, path: &str, out: &mut Vec<String>);
    /// Stage bindable changes of the section.
    fn stage_bindables(&self, live: &T, scratch: &T, path: &str, out: &mut Vec<SlotChange>);
    /// Collect definition mistakes of the section.
    fn definition_errors(&self, path: &str, out: &mut Vec<String>);
    /// Whether the section encodes the same as a default section.
    fn is_default(&self, owner: &T) -> bool;
}

/// The kind of a member, with its accessor.
pub enum MemberKind<T> {
    /// A plain value.
    Leaf(Box<dyn LeafAccess<T>>),
    /// A structured sub-section.
    Nested(Box<dyn NestedAccess<T>>),
    /// An observable value.
    Bindable(Box<dyn BindableAccess<T>>),
}

impl<T> MemberKind<T> {
    /// Short name of the kind, for logs.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Leaf(_) => "leaf",
            Self::Nested(_) => "nested",
            Self::Bindable(_) => "bindable",
        }
    }
}

/// One described member of a configuration type.
pub struct Member<T> {
    name: &'static str,
    required: bool,
    ignored: bool,
    hints: Vec<String>,
    kind: MemberKind<T>,
}

impl<T> Member<T> {
    /// Member name as persisted.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the member must be set to a non-default value.
    pub fn is_required(&self) -> bool {
        self.required
    }

    /// Whether the member is excluded from persistence and merging.
    pub fn is_ignored(&self) -> bool {
        self.ignored
    }

    /// Comment lines written above the member.
    pub fn hints(&self) -> &[String] {
        &self.hints
    }

    /// The member's kind and accessor.
    pub fn kind(&self) -> &MemberKind<T> {
        &self.kind
    }
}

/// Ordered description of a configuration type's members.
pub struct Schema<T> {
    members: Vec<Member<T>>,
}

impl<T> Default for Schema<T> {
    fn default() -> Self {
        Self {
            members: Vec::new(),
        }
    }
}

impl<T> std::fmt::Debug for Schema<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut list = f.debug_list();
        for member in &self.members {
            list.entry(&format_args!("{} ({})", member.name, member.kind.label()));
        }
        list.finish()
    }
}

pub(crate) fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

impl<T: Send + Sync + 'static> Schema<T> {
    /// Create an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn push(mut self, name: &'static str, kind: MemberKind<T>) -> Self {
        self.members.push(Member {
            name,
            required: false,
            ignored: false,
            hints: Vec::new(),
            kind,
        });
        self
    }

    /// Add a leaf member.
    #[must_use]
    pub fn leaf<V: LeafValue>(
        self,
        name: &'static str,
        get: fn(&T) -> &V,
        get_mut: fn(&mut T) -> &mut V,
    ) -> Self {
        self.push(name, MemberKind::Leaf(Box::new(LeafField { get, get_mut })))
    }

    /// Add a nested section.
    #[must_use]
    pub fn nested<N: Section>(
        self,
        name: &'static str,
        get: fn(&T) -> &N,
        get_mut: fn(&mut T) -> &mut N,
    ) -> Self {
        self.push(
            name,
            MemberKind::Nested(Box::new(NestedField {
                get,
                get_mut,
                schema: N::schema(),
            })),
        )
    }

    /// Add a bindable member.
    #[must_use]
    pub fn bindable<V: LeafValue>(
        self,
        name: &'static str,
        get: fn(&T) -> &Bindable<V>,
        get_mut: fn(&mut T) -> &mut Bindable<V>,
    ) -> Self {
        self.push(
            name,
            MemberKind::Bindable(Box::new(BindableField { get, get_mut })),
        )
    }

    /// Mark the last added member as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        if let Some(member) = self.members.last_mut() {
            member.required = true;
        }
        self
    }

    /// Exclude the last added member from persistence and merging.
    #[must_use]
    pub fn ignored(mut self) -> Self {
        if let Some(member) = self.members.last_mut() {
            member.ignored = true;
        }
        self
    }

    /// Attach a comment line to the last added member.
    #[must_use]
    pub fn hint(mut self, text: impl Into<String>) -> Self {
        if let Some(member) = self.members.last_mut() {
            member.hints.push(text.into());
        }
        self
    }

    /// Members in declaration order.
    pub fn members(&self) -> &[Member<T>] {
        &self.members
    }

    pub(crate) fn active_members(&self) -> impl Iterator<Item = &Member<T>> {
        self.members.iter().filter(|m| !m.ignored)
    }

    /// Reject reserved or duplicate member names.
    ///
    /// `type_name` is used for the error; the first offending member path is
    /// reported.
    pub fn check_definition(&self, type_name: &str) -> ConfigResult<()> {
        let mut errors = Vec::new();
        if self.members.iter().any(|m| m.name == VERSION_KEY) {
            errors.push(VERSION_KEY.to_string());
        }
        self.definition_errors_at("", &mut errors);
        match errors.first() {
            Some(member) => Err(ConfigError::invalid_definition(
                type_name,
                member.as_str(),
                "uses a reserved or duplicate name",
            )),
            None => Ok(()),
        }
    }

    fn definition_errors_at(&self, prefix: &str, out: &mut Vec<String>) {
        for (index, member) in self.members.iter().enumerate() {
            let path = join_path(prefix, member.name);
            if member.name.is_empty() || self.members[..index].iter().any(|m| m.name == member.name) {
                out.push(path.clone());
            }
            if let MemberKind::Nested(nested) = &member.kind {
                nested.definition_errors(&path, out);
            }
        }
    }

    /// Encode `value` as a document, without the version entry.
    pub fn encode(&self, value: &T) -> ConfigResult<Document> {
        let mut doc = Document::new();
        for member in self.active_members() {
            let entry = match &member.kind {
                MemberKind::Leaf(access) => Entry::value(member.name, access.encode(value)?),
                MemberKind::Bindable(access) => Entry::value(member.name, access.encode(value)?),
                MemberKind::Nested(access) => Entry::section(member.name, access.encode(value)?),
            };
            doc.push(
                entry
                    .with_required(member.required)
                    .with_hints(member.hints.iter().cloned()),
            );
        }
        Ok(doc)
    }

    /// Decode `doc` into `target`, matching entries by member name.
    ///
    /// Members without an entry keep their current value; entries without a
    /// member are ignored.
    pub fn decode_into(&self, target: &mut T, doc: &Document, mode: DecodeMode) -> ConfigResult<()> {
        self.decode_at(target, doc, mode, "")
    }

    pub(crate) fn decode_at(
        &self,
        target: &mut T,
        doc: &Document,
        mode: DecodeMode,
        prefix: &str,
    ) -> ConfigResult<()> {
        for member in self.active_members() {
            let Some(node) = doc.get(member.name) else {
                continue;
            };
            let path = join_path(prefix, member.name);
            let result = match (&member.kind, node) {
                (MemberKind::Leaf(access), node) => access.decode(target, &node.to_value(), &path),
                (MemberKind::Bindable(access), node) => {
                    access.decode(target, &node.to_value(), &path)
                }
                (MemberKind::Nested(access), Node::Section(inner)) => {
                    access.decode(target, inner, mode, &path)
                }
                (MemberKind::Nested(_), Node::Value(raw)) => Err(ConfigError::decode(format!(
                    "member '{path}' should be a section, found {raw}"
                ))),
            };
            match (result, mode) {
                (Ok(()), _) => {}
                (Err(e), DecodeMode::Tolerant) => {
                    tracing::warn!(member = %path, error = %e, "skipping persisted value");
                }
                (Err(e), DecodeMode::Exact) => return Err(e),
            }
        }
        Ok(())
    }

    /// Dotted paths of required members still holding their default value.
    pub fn missing_required(&self, value: &T) -> Vec<String> {
        let mut out = Vec::new();
        self.missing_required_at(value, "", &mut out);
        out
    }

    pub(crate) fn missing_required_at(&self, value: &T, prefix: &str, out: &mut Vec<String>) {
        for member in self.active_members() {
            let path = join_path(prefix, member.name);
            let is_default = match &member.kind {
                MemberKind::Leaf(access) => access.is_default(value),
                MemberKind::Bindable(access) => access.is_default(value),
                MemberKind::Nested(access) => access.is_default(value),
            };
            if member.required && is_default {
                out.push(path.clone());
            }
            if let MemberKind::Nested(access) = &member.kind {
                access.missing_required(value, &path, out);
            }
        }
    }

    /// Dotted paths of all bindable members.
    pub fn bindable_paths(&self) -> Vec<String> {
        let mut out = Vec::new();
        self.bindable_paths_at("", &mut out);
        out
    }

    pub(crate) fn bindable_paths_at(&self, prefix: &str, out: &mut Vec<String>) {
        for member in self.active_members() {
            let path = join_path(prefix, member.name);
            match &member.kind {
                MemberKind::Bindable(_) => out.push(path),
                MemberKind::Nested(access) => access.bindable_paths(&path, out),
                MemberKind::Leaf(_) => {}
            }
        }
    }

    /// Move differing bindable values from `scratch` into `live`'s slots.
    ///
    /// Only bindable members are touched. The returned changes must be
    /// dispatched to notify subscribers.
    pub fn stage_bindables(&self, live: &T, scratch: &T) -> Vec<SlotChange> {
        let mut out = Vec::new();
        self.stage_bindables_at(live, scratch, "", &mut out);
        out
    }

    pub(crate) fn stage_bindables_at(
        &self,
        live: &T,
        scratch: &T,
        prefix: &str,
        out: &mut Vec<SlotChange>,
    ) {
        for member in self.active_members() {
            let path = join_path(prefix, member.name);
            match &member.kind {
                MemberKind::Bindable(access) => out.extend(access.stage(live, scratch, &path)),
                MemberKind::Nested(access) => access.stage_bindables(live, scratch, &path, out),
                MemberKind::Leaf(_) => {}
            }
        }
    }

    /// Merge `source` onto `target`. See [`merge::merge`].
    pub fn merge(&self, target: &mut T, source: &T) -> MergeOutcome {
        merge::merge(self, target, source)
    }
}

struct LeafField<T, V> {
    get: fn(&T) -> &V,
    get_mut: fn(&mut T) -> &mut V,
}

fn to_value<V: Serialize>(value: &V) -> ConfigResult<Value> {
    serde_json::to_value(value).map_err(|e| ConfigError::encode(e.to_string()))
}

fn from_value<V: DeserializeOwned>(raw: &Value, path: &str) -> ConfigResult<V> {
    V::deserialize(raw).map_err(|e| ConfigError::cast(path, raw, std::any::type_name::<V>(), e))
}

impl<T: Send + Sync, V: LeafValue> LeafAccess<T> for LeafField<T, V> {
    fn encode(&self, owner: &T) -> ConfigResult<Value> {
        to_value((self.get)(owner))
    }

    fn decode(&self, owner: &mut T, raw: &Value, path: &str) -> ConfigResult<()> {
        *(self.get_mut)(owner) = from_value(raw, path)?;
        Ok(())
    }

    fn copy(&self, target: &mut T, source: &T) -> bool {
        let incoming = (self.get)(source);
        let slot = (self.get_mut)(target);
        if slot == incoming {
            return false;
        }
        *slot = incoming.clone();
        true
    }

    fn is_default(&self, owner: &T) -> bool {
        *(self.get)(owner) == V::default()
    }
}

struct BindableField<T, V> {
    get: fn(&T) -> &Bindable<V>,
    get_mut: fn(&mut T) -> &mut Bindable<V>,
}

impl<T: Send + Sync, V: LeafValue> BindableAccess<T> for BindableField<T, V> {
    fn encode(&self, owner: &T) -> ConfigResult<Value> {
        to_value(&(self.get)(owner).current_value())
    }

    fn decode(&self, owner: &mut T, raw: &Value, path: &str) -> ConfigResult<()> {
        *(self.get_mut)(owner) = Bindable::new(from_value(raw, path)?);
        Ok(())
    }

    fn stage(&self, target: &T, source: &T, path: &str) -> Option<SlotChange> {
        let incoming = (self.get)(source).current_value();
        (self.get)(target)
            .stage(incoming)
            .map(|notify| SlotChange::new(path.to_string(), notify))
    }

    fn is_default(&self, owner: &T) -> bool {
        (self.get)(owner).current_value() == V::default()
    }
}

struct NestedField<T, N> {
    get: fn(&T) -> &N,
    get_mut: fn(&mut T) -> &mut N,
    schema: Schema<N>,
}

impl<T: Send + Sync, N: Section> NestedAccess<T> for NestedField<T, N> {
    fn encode(&self, owner: &T) -> ConfigResult<Document> {
        self.schema.encode((self.get)(owner))
    }

    fn decode(
        &self,
        owner: &mut T,
        doc: &Document,
        mode: DecodeMode,
        path: &str,
    ) -> ConfigResult<()> {
        self.schema.decode_at((self.get_mut)(owner), doc, mode, path)
    }

    fn merge(&self, target: &mut T, source: &T, path: &str, outcome: &mut MergeOutcome) {
        merge::merge_at(
            &self.schema,
            (self.get_mut)(target),
            (self.get)(source),
            path,
            outcome,
        );
    }

    fn missing_required(&self, owner: &T, path: &str, out: &mut Vec<String>) {
        self.schema.missing_required_at((self.get)(owner), path, out);
    }

    fn bindable_paths(&self, path: &str, out: &mut Vec<String>) {
        self.schema.bindable_paths_at(path, out);
    }

    fn stage_bindables(&self, live: &T, scratch: &T, path: &str, out: &mut Vec<SlotChange>) {
        self.schema
            .stage_bindables_at((self.get)(live), (self.get)(scratch), path, out);
    }

    fn definition_errors(&self, path: &str, out: &mut Vec<String>) {
        self.schema.definition_errors_at(path, out);
    }

    fn is_default(&self, owner: &T) -> bool {
        match (
            self.schema.encode((self.get)(owner)),
            self.schema.encode(&N::default()),
        ) {
            (Ok(current), Ok(default)) => current.same_values(&default),
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Limits {
        max_connections: u32,
        burst: Bindable<u32>,
    }

    impl Section for Limits {
        fn schema() -> Schema<Self> {
            Schema::<Self>::new()
                .leaf("max_connections", |l| &l.max_connections, |l| &mut l.max_connections)
                .required()
                .bindable("burst", |l| &l.burst, |l| &mut l.burst)
        }
    }

    #[derive(Debug, Clone, Default, PartialEq)]
    struct Sample {
        name: String,
        debug: bool,
        limits: Limits,
        theme: Bindable<String>,
        scratch: String,
    }

    impl Section for Sample {
        fn schema() -> Schema<Self> {
            Schema::<Self>::new()
                .leaf("name", |s| &s.name, |s| &mut s.name)
                .required()
                .hint("Display name")
                .leaf("debug", |s| &s.debug, |s| &mut s.debug)
                .nested("limits", |s| &s.limits, |s| &mut s.limits)
                .bindable("theme", |s| &s.theme, |s| &mut s.theme)
                .leaf("scratch", |s| &s.scratch, |s| &mut s.scratch)
                .ignored()
        }
    }

    impl ConfigType for Sample {
        const VERSION: ConfigVersion = ConfigVersion::new(1, 0, 0, 0);
    }

    fn populated() -> Sample {
        Sample {
            name: "demo".into(),
            debug: true,
            limits: Limits {
                max_connections: 10,
                burst: Bindable::new(3),
            },
            theme: Bindable::new("dark".into()),
            scratch: "not persisted".into(),
        }
    }

    #[test]
    fn test_type_name_is_unqualified() {
        assert_eq!(Sample::type_name(), "Sample");
    }

    #[test]
    fn test_encode_skips_ignored_and_keeps_order() {
        let doc = Sample::schema().encode(&populated()).unwrap();
        let names: Vec<_> = doc.entries().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["name", "debug", "limits", "theme"]);
        assert_eq!(
            doc.to_value(),
            json!({
                "name": "demo",
                "debug": true,
                "limits": {"max_connections": 10, "burst": 3},
                "theme": "dark",
            })
        );
        let first = &doc.entries()[0];
        assert!(first.required);
        assert_eq!(first.hints, vec!["Display name".to_string()]);
    }

    #[test]
    fn test_decode_matches_by_name() {
        let doc = Document::from_value(json!({
            "name": "loaded",
            "limits": {"burst": 9},
            "unknown": 1,
        }))
        .unwrap();
        let mut target = populated();
        Sample::schema()
            .decode_into(&mut target, &doc, DecodeMode::Exact)
            .unwrap();

        assert_eq!(target.name, "loaded");
        assert!(target.debug, "absent members keep their value");
        assert_eq!(target.limits.max_connections, 10);
        assert_eq!(target.limits.burst.current_value(), 9);
    }

    #[test]
    fn test_decode_exact_reports_cast_errors() {
        let doc = Document::from_value(json!({"limits": {"max_connections": "many"}})).unwrap();
        let mut target = Sample::default();
        let err = Sample::schema()
            .decode_into(&mut target, &doc, DecodeMode::Exact)
            .unwrap_err();

        match err {
            ConfigError::Cast { member, target, .. } => {
                assert_eq!(member, "limits.max_connections");
                assert_eq!(target, "u32");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_decode_tolerant_skips_cast_errors() {
        let doc = Document::from_value(json!({"name": "kept", "debug": "yes"})).unwrap();
        let mut target = Sample::default();
        Sample::schema()
            .decode_into(&mut target, &doc, DecodeMode::Tolerant)
            .unwrap();
        assert_eq!(target.name, "kept");
        assert!(!target.debug);
    }

    #[test]
    fn test_missing_required_is_dotted() {
        let schema = Sample::schema();
        assert_eq!(
            schema.missing_required(&Sample::default()),
            vec!["name".to_string(), "limits.max_connections".to_string()]
        );
        assert!(schema.missing_required(&populated()).is_empty());
    }

    #[test]
    fn test_bindable_paths() {
        assert_eq!(Sample::schema().bindable_paths(), vec!["limits.burst", "theme"]);
    }

    #[test]
    fn test_stage_bindables_touches_only_bindables() {
        let schema = Sample::schema();
        let live = populated();
        let mut scratch = live.clone();
        scratch.name = "other".into();
        scratch.theme = Bindable::new("light".into());

        let changes = schema.stage_bindables(&live, &scratch);
        assert_eq!(changes.len(), 1);
        assert_eq!(changes[0].member(), "theme");
        assert_eq!(live.theme.current_value(), "light");
        assert_eq!(live.name, "demo");
    }

    #[test]
    fn test_check_definition() {
        #[derive(Debug, Clone, Default)]
        struct Bad {
            a: u8,
        }
        impl Section for Bad {
            fn schema() -> Schema<Self> {
                Schema::<Self>::new()
                    .leaf("a", |b| &b.a, |b| &mut b.a)
                    .leaf("a", |b| &b.a, |b| &mut b.a)
            }
        }
        #[derive(Debug, Clone, Default)]
        struct Reserved {
            v: u8,
        }
        impl Section for Reserved {
            fn schema() -> Schema<Self> {
                Schema::<Self>::new().leaf(VERSION_KEY, |r| &r.v, |r| &mut r.v)
            }
        }

        assert!(Sample::schema().check_definition("Sample").is_ok());
        let err = Bad::schema().check_definition("Bad").unwrap_err();
        assert!(matches!(err, ConfigError::Validation { .. }));
        assert!(Reserved::schema().check_definition("Reserved").is_err());
    }

    #[test]
    fn test_chrono_leaf() {
        #[derive(Debug, Clone, Default)]
        struct Stamped {
            at: chrono::DateTime<chrono::Utc>,
        }
        impl Section for Stamped {
            fn schema() -> Schema<Self> {
                Schema::<Self>::new().leaf("at", |s| &s.at, |s| &mut s.at).required()
            }
        }

        let schema = Stamped::schema();
        let value = Stamped {
            at: chrono::DateTime::from_timestamp(1_700_000_000, 0).unwrap_or_default(),
        };
        let doc = schema.encode(&value).unwrap();
        let mut back = Stamped::default();
        assert_eq!(schema.missing_required(&back), vec!["at"]);
        schema.decode_into(&mut back, &doc, DecodeMode::Exact).unwrap();
        assert_eq!(back.at, value.at);
    }
}
