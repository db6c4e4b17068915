//! Store configuration.
//!
//! Batch size, row-key prefixes and the containment predicate live here and
//! are passed to constructors explicitly rather than read from constants.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::containment::ContainmentConfig;
use crate::scan::ScanConfig;
use crate::Result;

/// Separator between the parts of a cache row key.
pub const KEY_PART_SEPARATOR: &str = "^";

// ============================================================================
// Key prefixes
// ============================================================================

/// Row-key prefixes of the cached datasets in the backing table, and the
/// column family their payload lives in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KeyPrefixes {
    pub prop_val_in: String,
    pub prop_val_out: String,
    pub pop_obs: String,
    pub place_obs: String,
    pub place_kml: String,
    pub triples: String,
    pub arcs: String,
    pub pop: String,
    pub obs: String,
    pub family: String,
}

impl Default for KeyPrefixes {
    fn default() -> Self {
        Self {
            prop_val_in: "d/0/".into(),
            prop_val_out: "d/1/".into(),
            pop_obs: "d/2/".into(),
            place_obs: "d/3/".into(),
            place_kml: "d/6/".into(),
            triples: "d/7/".into(),
            arcs: "d/9/".into(),
            pop: "d/a/".into(),
            obs: "d/b/".into(),
            family: "csv".into(),
        }
    }
}

impl KeyPrefixes {
    /// `prefix` followed by `parts` joined with `^`.
    pub fn key<I, P>(prefix: &str, parts: I) -> String
    where
        I: IntoIterator<Item = P>,
        P: AsRef<str>,
    {
        let mut key = prefix.to_string();
        for (i, part) in parts.into_iter().enumerate() {
            if i > 0 {
                key.push_str(KEY_PART_SEPARATOR);
            }
            key.push_str(part.as_ref());
        }
        key
    }
}

// ============================================================================
// StoreConfig
// ============================================================================

/// Top-level configuration of a [`crate::Store`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub scan: ScanConfig,
    pub containment: ContainmentConfig,
    pub keys: KeyPrefixes,
}

impl StoreConfig {
    pub fn validate(&self) -> Result<()> {
        self.scan.validate()?;
        if self.containment.predicate.trim().is_empty() {
            return Err(crate::Error::InvalidConfig("containment.predicate must not be empty".into()));
        }
        Ok(())
    }

    /// Parse from JSON. Missing sections take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: StoreConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::from_json_str(&std::fs::read_to_string(path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;

    #[test]
    fn test_defaults() {
        let config = StoreConfig::default();
        assert_eq!(config.scan.batch_size, 1000);
        assert_eq!(config.scan.max_in_flight, None);
        assert_eq!(config.containment.predicate, "containedInPlace");
        assert_eq!(config.keys.place_obs, "d/3/");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = StoreConfig::from_json_str(r#"{"scan": {"max_in_flight": 16}}"#).unwrap();
        assert_eq!(config.scan.batch_size, 1000);
        assert_eq!(config.scan.max_in_flight, Some(16));
        assert_eq!(config.keys.family, "csv");
    }

    #[test]
    fn test_invalid_json_config() {
        assert!(matches!(StoreConfig::from_json_str("{"), Err(Error::Json(_))));
        assert!(matches!(
            StoreConfig::from_json_str(r#"{"scan": {"batch_size": 0}}"#),
            Err(Error::InvalidConfig(_))
        ));
        assert!(matches!(
            StoreConfig::from_json_str(r#"{"containment": {"predicate": ""}}"#),
            Err(Error::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_key_builder() {
        let keys = KeyPrefixes::default();
        assert_eq!(
            KeyPrefixes::key(&keys.place_obs, ["City", "2017", "Person"]),
            "d/3/City^2017^Person"
        );
        assert_eq!(KeyPrefixes::key(&keys.triples, ["geoId/06"]), "d/7/geoId/06");
        assert_eq!(KeyPrefixes::key(&keys.arcs, Vec::<&str>::new()), "d/9/");
    }
}
