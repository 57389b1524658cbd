//! Configuration versions.
//!
//! A [`ConfigVersion`] is the four-part version (`major.minor.patch_release.patch_update`)
//! a configuration type declares in code. The persisted document records the
//! version it was written with; a mismatch on load triggers migration.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ConfigError;

/// Four-part configuration version.
///
/// The all-zero version is reserved as "unset" and is rejected wherever a
/// real version is required.
///
/// # Example
///
/// ```
/// use mnemos_core::ConfigVersion;
///
/// let version: ConfigVersion = "1.4.0.2".parse().unwrap();
/// assert_eq!(version, ConfigVersion::new(1, 4, 0, 2));
/// assert_eq!(version.to_string(), "1.4.0.2");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConfigVersion {
    major: u16,
    minor: u16,
    patch_release: u16,
    patch_update: u16,
}

impl ConfigVersion {
    /// The reserved "unset" version (`0.0.0.0`).
    pub const UNSET: Self = Self::new(0, 0, 0, 0);

    /// Create a version from its four components.
    ///
    /// This is a `const fn` so types can declare their version as an
    /// associated constant. Use [`is_set`](Self::is_set) to check validity.
    #[must_use]
    pub const fn new(major: u16, minor: u16, patch_release: u16, patch_update: u16) -> Self {
        Self {
            major,
            minor,
            patch_release,
            patch_update,
        }
    }

    /// Returns `false` for the reserved all-zero version.
    #[must_use]
    pub const fn is_set(&self) -> bool {
        self.major != 0 || self.minor != 0 || self.patch_release != 0 || self.patch_update != 0
    }

    /// Major component (`X.0.0.0`).
    #[must_use]
    pub const fn major(&self) -> u16 {
        self.major
    }

    /// Minor component (`0.X.0.0`).
    #[must_use]
    pub const fn minor(&self) -> u16 {
        self.minor
    }

    /// Patch-set release component (`0.0.X.0`).
    #[must_use]
    pub const fn patch_release(&self) -> u16 {
        self.patch_release
    }

    /// Patch-set update component (`0.0.0.X`).
    #[must_use]
    pub const fn patch_update(&self) -> u16 {
        self.patch_update
    }
}

impl fmt::Display for ConfigVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}.{}",
            self.major, self.minor, self.patch_release, self.patch_update
        )
    }
}

impl FromStr for ConfigVersion {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() != 4 {
            return Err(ConfigError::invalid_version(
                s,
                format!("expected 4 dot-separated components, found {}", parts.len()),
            ));
        }

        let mut components = [0u16; 4];
        for (slot, part) in components.iter_mut().zip(&parts) {
            *slot = part.parse().map_err(|_| {
                ConfigError::invalid_version(s, format!("component '{part}' is not a u16"))
            })?;
        }

        let version = Self::new(components[0], components[1], components[2], components[3]);
        if !version.is_set() {
            return Err(ConfigError::invalid_version(
                s,
                "all components of a version can't be zero",
            ));
        }
        Ok(version)
    }
}

impl Serialize for ConfigVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for ConfigVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_display() {
        assert_eq!(ConfigVersion::new(9, 6, 3, 1).to_string(), "9.6.3.1");
    }

    #[test]
    fn test_parse() {
        let version: ConfigVersion = "1.3.6.9".parse().unwrap();
        assert_eq!(version.major(), 1);
        assert_eq!(version.minor(), 3);
        assert_eq!(version.patch_release(), 6);
        assert_eq!(version.patch_update(), 9);
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let version: ConfigVersion = " 2.0.0.0\n".parse().unwrap();
        assert_eq!(version, ConfigVersion::new(2, 0, 0, 0));
    }

    #[test]
    fn test_parse_rejects_wrong_component_count() {
        let err = "1.2.3".parse::<ConfigVersion>().unwrap_err();
        assert!(err.to_string().contains("1.2.3"));
        assert!("1.2.3.4.5".parse::<ConfigVersion>().is_err());
    }

    #[test]
    fn test_parse_rejects_non_numeric() {
        assert!("1.x.3.4".parse::<ConfigVersion>().is_err());
        assert!("1.2.3.70000".parse::<ConfigVersion>().is_err());
    }

    #[test]
    fn test_parse_rejects_all_zero() {
        let err = "0.0.0.0".parse::<ConfigVersion>().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidVersion { .. }));
    }

    #[test]
    fn test_unset() {
        assert!(!ConfigVersion::UNSET.is_set());
        assert!(ConfigVersion::new(0, 0, 0, 1).is_set());
    }

    #[test]
    fn test_equality_is_component_wise() {
        assert_eq!(ConfigVersion::new(1, 0, 0, 0), ConfigVersion::new(1, 0, 0, 0));
        assert_ne!(ConfigVersion::new(1, 0, 0, 0), ConfigVersion::new(1, 0, 0, 1));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_value(ConfigVersion::new(1, 2, 3, 4)).unwrap();
        assert_eq!(json, serde_json::json!("1.2.3.4"));

        let back: ConfigVersion = serde_json::from_value(json).unwrap();
        assert_eq!(back, ConfigVersion::new(1, 2, 3, 4));

        assert!(serde_json::from_value::<ConfigVersion>(serde_json::json!("0.0.0.0")).is_err());
    }

    proptest! {
        #[test]
        fn prop_display_parse_roundtrip(a: u16, b: u16, c: u16, d: u16) {
            let version = ConfigVersion::new(a, b, c, d);
            prop_assume!(version.is_set());
            let parsed: ConfigVersion = version.to_string().parse().unwrap();
            prop_assert_eq!(parsed, version);
        }
    }
}
