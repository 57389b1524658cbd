//! The intermediate document exchanged with codecs.
//!
//! A [`Document`] is an ordered list of named entries. Each entry holds either
//! a leaf value or a nested document, plus the comment lines the codec writes
//! above it. Codecs turn text into documents and back; the schema turns typed
//! values into documents and back.

use serde_json::{Map, Value};

use crate::error::{ConfigError, ConfigResult};
use crate::version::ConfigVersion;

/// Reserved top-level key holding the persisted version.
pub const VERSION_KEY: &str = "config_version";

/// Comment written above required entries.
pub const REQUIRED_NOTICE: &str = " ### Notice: This element is required! ### ";

/// Comment lines written above the version entry.
pub const VERSION_COMMENTS: [&str; 2] = [
    "It's specified and used by the core.",
    "Please don't change it manually!",
];

/// The content of an entry.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// A leaf value.
    Value(Value),
    /// A nested section.
    Section(Document),
}

impl Node {
    /// Convert to a plain JSON value, dropping comments.
    pub fn to_value(&self) -> Value {
        match self {
            Self::Value(value) => value.clone(),
            Self::Section(doc) => doc.to_value(),
        }
    }
}

/// A named entry of a document.
#[derive(Debug, Clone, PartialEq)]
pub struct Entry {
    /// Member name.
    pub name: String,
    /// Entry content.
    pub node: Node,
    /// Whether the member is marked required.
    pub required: bool,
    /// Free-form comment lines.
    pub hints: Vec<String>,
}

impl Entry {
    /// Create a leaf entry.
    pub fn value(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            node: Node::Value(value),
            required: false,
            hints: Vec::new(),
        }
    }

    /// Create a section entry.
    pub fn section(name: impl Into<String>, doc: Document) -> Self {
        Self {
            name: name.into(),
            node: Node::Section(doc),
            required: false,
            hints: Vec::new(),
        }
    }

    /// Mark the entry as required.
    #[must_use]
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Attach comment lines.
    #[must_use]
    pub fn with_hints<I, S>(mut self, hints: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hints.extend(hints.into_iter().map(Into::into));
        self
    }

    /// All comment lines a codec should write above this entry, in order.
    pub fn comments(&self) -> impl Iterator<Item = &str> {
        self.hints
            .iter()
            .map(String::as_str)
            .chain(self.required.then_some(REQUIRED_NOTICE))
    }
}

/// An ordered structured document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    entries: Vec<Entry>,
}

impl Document {
    /// Create an empty document.
    pub fn new() -> Self {
        Self::default()
    }

    /// Prepend the managed version entry to `body`.
    pub fn with_version(version: ConfigVersion, body: Document) -> Self {
        let mut entries = Vec::with_capacity(body.entries.len() + 1);
        entries.push(
            Entry::value(VERSION_KEY, Value::String(version.to_string()))
                .with_hints(VERSION_COMMENTS),
        );
        entries.extend(body.entries.into_iter().filter(|e| e.name != VERSION_KEY));
        Self { entries }
    }

    /// Append an entry.
    pub fn push(&mut self, entry: Entry) {
        self.entries.push(entry);
    }

    /// Entries in order.
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Whether the document has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Look up an entry by name.
    pub fn get(&self, name: &str) -> Option<&Node> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.node)
    }

    /// The persisted version, if present and well-formed.
    pub fn version(&self) -> Option<ConfigVersion> {
        match self.get(VERSION_KEY)? {
            Node::Value(Value::String(raw)) => match raw.parse() {
                Ok(version) => Some(version),
                Err(e) => {
                    tracing::warn!(error = %e, "ignoring malformed persisted version");
                    None
                }
            },
            _ => None,
        }
    }

    /// Convert to a plain JSON object, dropping comments.
    pub fn to_value(&self) -> Value {
        let map: Map<String, Value> = self
            .entries
            .iter()
            .map(|e| (e.name.clone(), e.node.to_value()))
            .collect();
        Value::Object(map)
    }

    /// Build a document from a JSON object; nested objects become sections.
    pub fn from_value(value: Value) -> ConfigResult<Self> {
        match value {
            Value::Object(map) => Ok(Self::from_map(map)),
            other => Err(ConfigError::decode(format!(
                "expected an object at the document root, found {}",
                kind_of(&other)
            ))),
        }
    }

    fn from_map(map: Map<String, Value>) -> Self {
        let entries = map
            .into_iter()
            .map(|(name, value)| match value {
                Value::Object(inner) => Entry::section(name, Self::from_map(inner)),
                other => Entry::value(name, other),
            })
            .collect();
        Self { entries }
    }

    /// Compare values only, ignoring comments, flags and entry order.
    pub fn same_values(&self, other: &Document) -> bool {
        self.to_value() == other.to_value()
    }
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
