//! Analyzer configuration: target PHP version and group typing.
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use crate::error::ConfigError;
use crate::pcre::GroupTyping;

/// PHP version id as in `PHP_VERSION_ID` (`80100` for 8.1.0).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhpVersion(u32);

impl PhpVersion {
    pub const fn new(id: u32) -> Self { Self(id) }

    /// Version ids below PHP 5 are rejected.
    fn from_id(id: u32) -> Option<Self> {
        (id >= 50000).then_some(Self(id))
    }
    pub fn id(self) -> u32 { self.0 }

    /// `preg_match` reports trailing unmatched groups as `null` from 7.4 on.
    pub fn supports_preg_unmatched_as_null(self) -> bool {
        self.0 >= 70400
    }
}

impl Default for PhpVersion {
    fn default() -> Self { Self(80400) }
}

impl fmt::Display for PhpVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.0 / 10000, self.0 / 100 % 100, self.0 % 100)
    }
}

impl FromStr for PhpVersion {
    type Err = ConfigError;

    /// Accepts `8.1`, `7.3.5` or a raw version id such as `80100`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bad = || ConfigError::Version(s.to_string());
        let s = s.trim();
        if !s.contains('.') {
            let id = s.parse::<u32>().map_err(|_| bad())?;
            return Self::from_id(id).ok_or_else(bad);
        }
        let mut parts = s.split('.').map(|p| p.parse::<u32>());
        let major = parts.next().ok_or_else(bad)?.map_err(|_| bad())?;
        let minor = parts.next().ok_or_else(bad)?.map_err(|_| bad())?;
        let patch = parts.next().transpose().map_err(|_| bad())?.unwrap_or(0);
        if parts.next().is_some() || minor > 99 || patch > 99 {
            return Err(bad());
        }
        major
            .checked_mul(10000)
            .and_then(|id| id.checked_add(minor * 100 + patch))
            .and_then(Self::from_id)
            .ok_or_else(bad)
    }
}

impl Serialize for PhpVersion {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u32(self.0)
    }
}

impl<'de> Deserialize<'de> for PhpVersion {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Id(u32),
            Text(String),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Id(id) => Self::from_id(id)
                .ok_or_else(|| serde::de::Error::custom(ConfigError::Version(id.to_string()))),
            Raw::Text(text) => text.parse().map_err(serde::de::Error::custom),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub php_version: PhpVersion,
    pub group_types: GroupTyping,
}

impl Config {
    pub fn from_json_str(src: &str) -> Result<Self, ConfigError> {
        crate::path_de::from_str_with_path(src).map_err(ConfigError::Parse)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let src = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&src)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_spellings() {
        assert_eq!("8.1".parse::<PhpVersion>().unwrap(), PhpVersion::new(80100));
        assert_eq!("7.3.5".parse::<PhpVersion>().unwrap(), PhpVersion::new(70305));
        assert_eq!("70400".parse::<PhpVersion>().unwrap(), PhpVersion::new(70400));
        assert!("8".parse::<PhpVersion>().is_err());
        assert!("8.x".parse::<PhpVersion>().is_err());
        assert!("500000.1".parse::<PhpVersion>().is_err());
        assert!("429496.99.99".parse::<PhpVersion>().is_err());
        assert!("4.4".parse::<PhpVersion>().is_err());
        assert_eq!(PhpVersion::new(70305).to_string(), "7.3.5");
    }

    #[test]
    fn unmatched_as_null_gate() {
        assert!(!PhpVersion::new(70399).supports_preg_unmatched_as_null());
        assert!(PhpVersion::new(70400).supports_preg_unmatched_as_null());
    }

    #[test]
    fn config_from_json() {
        let config = Config::from_json_str(r#"{"php_version": "7.3", "group_types": "plain"}"#).unwrap();
        assert_eq!(config.php_version, PhpVersion::new(70300));
        assert_eq!(config.group_types, GroupTyping::Plain);

        let config = Config::from_json_str("{}").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn config_errors_name_the_field() {
        let err = Config::from_json_str(r#"{"php_version": "seven"}"#).unwrap_err();
        assert!(err.to_string().contains("php_version"), "{err}");
        // ids go through the same check as version strings
        assert!(Config::from_json_str(r#"{"php_version": 80}"#).is_err());
        let config = Config::from_json_str(r#"{"php_version": 80100}"#).unwrap();
        assert_eq!(config.php_version, PhpVersion::new(80100));
    }
}
