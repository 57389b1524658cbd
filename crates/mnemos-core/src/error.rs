//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Errors that can occur while creating, loading or persisting a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required member is unset, or the configuration type is ill-defined.
    ///
    /// When several members are missing, the first offender is reported here
    /// and the rest are chained through [`std::error::Error::source`].
    #[error("{}", validation_message(type_name, member, reason, path.as_ref()))]
    Validation {
        /// Name of the configuration type.
        type_name: String,
        /// Dotted path of the offending member.
        member: String,
        /// What is wrong with the member.
        reason: String,
        /// File involved, if the check ran during a load.
        path: Option<PathBuf>,
        /// The next offender, if any.
        #[source]
        next: Option<Box<ConfigError>>,
    },

    /// File access failed after exhausting the retry budget.
    #[error("I/O failure on {path} after {attempts} attempt(s): {source}")]
    Io {
        /// File or directory being accessed.
        path: PathBuf,
        /// Number of attempts made.
        attempts: u32,
        /// The last underlying error.
        #[source]
        source: std::io::Error,
    },

    /// A persisted value could not be converted to the member's declared type.
    #[error("{}", cast_message(raw, member, target, type_name.as_deref(), path.as_ref()))]
    Cast {
        /// Name of the configuration type, once known.
        type_name: Option<String>,
        /// Dotted path of the member.
        member: String,
        /// The raw persisted value.
        raw: String,
        /// The declared Rust type.
        target: &'static str,
        /// File the value was read from, if any.
        path: Option<PathBuf>,
        /// Underlying conversion error.
        #[source]
        source: serde_json::Error,
    },

    /// An operation was invoked before the configuration was created.
    #[error("configuration '{type_name}' hasn't been created; call get_or_create before {operation}")]
    Lifecycle {
        /// Name of the configuration type.
        type_name: String,
        /// The rejected operation.
        operation: &'static str,
    },

    /// The document could not be decoded.
    #[error("failed to decode configuration document {}: {reason}", path_or_inline(path.as_ref()))]
    Decode {
        /// File the document was read from, if any.
        path: Option<PathBuf>,
        /// Explanation from the codec.
        reason: String,
    },

    /// The document could not be encoded.
    #[error("failed to encode configuration document: {reason}")]
    Encode {
        /// Explanation from the codec.
        reason: String,
    },

    /// A version string could not be parsed.
    #[error("invalid configuration version '{value}': {reason}")]
    InvalidVersion {
        /// The raw version string.
        value: String,
        /// Why it was rejected.
        reason: String,
    },

    /// Configuration settings are unusable.
    #[error("invalid configuration setting '{field}': {reason}")]
    InvalidSettings {
        /// The offending setting.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// The file watcher could not be started.
    #[error("failed to watch {path}: {reason}")]
    Watch {
        /// Watched path.
        path: PathBuf,
        /// Explanation from the watcher backend.
        reason: String,
    },
}

const REQUIRED_BUT_UNSET: &str = "is required but unset";

fn validation_message(
    type_name: &str,
    member: &str,
    reason: &str,
    path: Option<&PathBuf>,
) -> String {
    match path {
        Some(path) => format!(
            "member '{member}' of configuration '{type_name}' {reason} in {}",
            path.display()
        ),
        None => format!("member '{member}' of configuration '{type_name}' {reason}"),
    }
}

fn cast_message(
    raw: &str,
    member: &str,
    target: &str,
    type_name: Option<&str>,
    path: Option<&PathBuf>,
) -> String {
    let mut message = format!("can't cast value '{raw}' of member '{member}'");
    if let Some(type_name) = type_name {
        message.push_str(&format!(" of configuration '{type_name}'"));
    }
    message.push_str(&format!(" to type '{target}'"));
    if let Some(path) = path {
        message.push_str(&format!(" in {}", path.display()));
    }
    message
}

fn path_or_inline(path: Option<&PathBuf>) -> String {
    path.map_or_else(|| "<inline>".to_string(), |p| p.display().to_string())
}

impl ConfigError {
    /// Create a validation error for a single required member.
    pub fn validation(type_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self::invalid_definition(type_name, member, REQUIRED_BUT_UNSET)
    }

    /// Create a validation error for a mistake in the type's definition.
    pub fn invalid_definition(
        type_name: impl Into<String>,
        member: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::Validation {
            type_name: type_name.into(),
            member: member.into(),
            reason: reason.into(),
            path: None,
            next: None,
        }
    }

    /// Build one chained validation error from a list of offending members.
    ///
    /// Returns `None` when `members` is empty. The first member becomes the
    /// primary error; every following member is chained as its cause.
    pub fn missing_members(
        type_name: &str,
        members: &[String],
        path: Option<PathBuf>,
    ) -> Option<Self> {
        members.iter().rev().fold(None, |next, member| {
            Some(Self::Validation {
                type_name: type_name.to_string(),
                member: member.clone(),
                reason: REQUIRED_BUT_UNSET.to_string(),
                path: path.clone(),
                next: next.map(Box::new),
            })
        })
    }

    /// Create an I/O error.
    pub fn io(path: impl Into<PathBuf>, attempts: u32, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            attempts,
            source,
        }
    }

    /// Create a cast error.
    pub fn cast(
        member: impl Into<String>,
        raw: &serde_json::Value,
        target: &'static str,
        source: serde_json::Error,
    ) -> Self {
        Self::Cast {
            type_name: None,
            member: member.into(),
            raw: raw.to_string(),
            target,
            path: None,
            source,
        }
    }

    /// Create a lifecycle error.
    pub fn lifecycle(type_name: impl Into<String>, operation: &'static str) -> Self {
        Self::Lifecycle {
            type_name: type_name.into(),
            operation,
        }
    }

    /// Create a decode error for inline content.
    pub fn decode(reason: impl Into<String>) -> Self {
        Self::Decode {
            path: None,
            reason: reason.into(),
        }
    }

    /// Create an encode error.
    pub fn encode(reason: impl Into<String>) -> Self {
        Self::Encode {
            reason: reason.into(),
        }
    }

    /// Create an invalid version error.
    pub fn invalid_version(value: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidVersion {
            value: value.into(),
            reason: reason.into(),
        }
    }

    /// Create an invalid settings error.
    pub fn invalid_settings(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidSettings {
            field,
            reason: reason.into(),
        }
    }

    /// Create a watch error.
    pub fn watch(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::Watch {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Attach the configuration type name to a cast error that lacks one.
    #[must_use]
    pub fn with_type_name(self, config: &str) -> Self {
        match self {
            Self::Cast {
                type_name: None,
                member,
                raw,
                target,
                path,
                source,
            } => Self::Cast {
                type_name: Some(config.to_string()),
                member,
                raw,
                target,
                path,
                source,
            },
            other => other,
        }
    }

    /// Attach a file path to decode, cast and validation errors that lack one.
    #[must_use]
    pub fn with_path(self, file: impl Into<PathBuf>) -> Self {
        match self {
            Self::Decode { path: None, reason } => Self::Decode {
                path: Some(file.into()),
                reason,
            },
            Self::Validation {
                type_name,
                member,
                reason,
                path: None,
                next,
            } => {
                let file = file.into();
                Self::Validation {
                    type_name,
                    member,
                    reason,
                    path: Some(file.clone()),
                    next: next.map(|n| Box::new(n.with_path(file))),
                }
            }
            Self::Cast {
                type_name,
                member,
                raw,
                target,
                path: None,
                source,
            } => Self::Cast {
                type_name,
                member,
                raw,
                target,
                path: Some(file.into()),
                source,
            },
            other => other,
        }
    }

    /// Returns `true` for errors raised by the retry-bounded file access layer.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}
