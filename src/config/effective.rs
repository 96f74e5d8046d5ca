//! Effective configuration with full provenance
//!
//! The effective configuration captures every property visible to the build
//! after all layers are merged, plus where each value came from. It is built
//! once per invocation and never mutated afterwards.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::Path;

use super::defaults::{keys, BuiltinDefaults};
use super::error::ConfigError;
use super::merge::{resolve_with_defaults, Provenance, Resolved};
use super::source::{LayerKind, PropertySource};

/// Schema version for effective_config
pub const SCHEMA_VERSION: u32 = 1;

/// Schema identifier
pub const SCHEMA_ID: &str = "codestd/effective_config@1";

/// A contributing layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigSource {
    pub kind: LayerKind,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes
    #[serde(skip_serializing_if = "Option::is_none")]
    pub digest: Option<String>,

    pub properties: usize,
}

/// Effective configuration with full provenance
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub schema_version: u32,
    pub schema_id: String,

    /// When this config was computed
    pub created_at: DateTime<Utc>,

    /// Contributing layers in precedence order
    pub sources: Vec<ConfigSource>,

    /// Resolved properties, sorted by name
    properties: Vec<Resolved>,

    #[serde(skip)]
    index: HashMap<String, usize>,
}

impl EffectiveConfig {
    /// Merge `layers` (lowest precedence first) over the built-in defaults
    pub fn resolve(layers: &[PropertySource]) -> Result<Self, ConfigError> {
        Self::resolve_with_defaults(layers, &BuiltinDefaults::default())
    }

    pub fn resolve_with_defaults(
        layers: &[PropertySource],
        defaults: &BuiltinDefaults,
    ) -> Result<Self, ConfigError> {
        let names: BTreeSet<String> = defaults
            .to_properties()
            .into_iter()
            .map(|(name, _)| name.to_ascii_lowercase())
            .chain(
                layers
                    .iter()
                    .flat_map(|layer| layer.properties().map(|p| p.name.to_ascii_lowercase())),
            )
            .collect();

        let properties: Vec<Resolved> = names
            .iter()
            .map(|name| resolve_with_defaults(layers, defaults, name))
            .collect();
        let index = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| (name, i))
            .collect();

        let sources = layers
            .iter()
            .map(|layer| ConfigSource {
                kind: layer.kind,
                path: layer.path.clone(),
                digest: layer.digest.clone(),
                properties: layer.len(),
            })
            .collect();

        let config = Self {
            schema_version: SCHEMA_VERSION,
            schema_id: SCHEMA_ID.to_string(),
            created_at: Utc::now(),
            sources,
            properties,
            index,
        };
        config.validate()?;

        tracing::debug!(
            layers = config.sources.len(),
            properties = config.properties.len(),
            "resolved effective configuration"
        );
        Ok(config)
    }

    /// Boolean properties must parse wherever they are set
    fn validate(&self) -> Result<(), ConfigError> {
        for key in keys::BOOLEAN {
            self.get_bool(key)?;
        }
        Ok(())
    }

    /// Resolved entry for `key`, if any source defines it
    pub fn lookup(&self, key: &str) -> Option<&Resolved> {
        self.index
            .get(&key.to_ascii_lowercase())
            .map(|&i| &self.properties[i])
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.lookup(key).and_then(|r| r.value.as_deref())
    }

    /// Boolean value of `key`; `None` when undefined
    pub fn get_bool(&self, key: &str) -> Result<Option<bool>, ConfigError> {
        match self.lookup(key) {
            Some(resolved) => resolved.as_bool(),
            None => Ok(None),
        }
    }

    /// Where `key` came from (`Undefined` when nothing defines it)
    pub fn provenance(&self, key: &str) -> Provenance {
        self.lookup(key)
            .map(|r| r.provenance.clone())
            .unwrap_or(Provenance::Undefined)
    }

    /// Full resolution record for `key`, including undefined keys
    pub fn explain(&self, key: &str) -> Resolved {
        self.lookup(key).cloned().unwrap_or_else(|| Resolved {
            key: key.to_string(),
            value: None,
            provenance: Provenance::Undefined,
        })
    }

    pub fn iter(&self) -> impl Iterator<Item = &Resolved> {
        self.properties.iter()
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// Serialize to JSON
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write to file
    pub fn write_to_file(&self, path: &Path) -> io::Result<()> {
        let json = self.to_json().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidData,
                format!("JSON serialization failed: {}", e),
            )
        })?;
        fs::write(path, json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn layer(kind: LayerKind, pairs: &[(&str, &str)]) -> PropertySource {
        PropertySource::from_pairs(kind, pairs.iter().copied()).unwrap()
    }

    #[test]
    fn test_defaults_only() {
        let config = EffectiveConfig::resolve(&[]).unwrap();

        assert_eq!(config.schema_version, SCHEMA_VERSION);
        assert_eq!(config.get("AnalysisLevel"), Some("latest"));
        assert_eq!(config.get_bool("TreatWarningsAsErrors").unwrap(), Some(false));
        assert_eq!(config.provenance("AnalysisLevel"), Provenance::Default);
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_layers_override_defaults() {
        let layers = vec![
            layer(LayerKind::PackageDefaults, &[("TreatWarningsAsErrors", "true")]),
            layer(LayerKind::Project, &[("treatwarningsaserrors", "false"), ("LangVersion", "12")]),
        ];
        let config = EffectiveConfig::resolve(&layers).unwrap();

        assert_eq!(config.get_bool("TreatWarningsAsErrors").unwrap(), Some(false));
        assert_eq!(config.explain("TreatWarningsAsErrors").key, "treatwarningsaserrors");
        assert_eq!(config.get("LangVersion"), Some("12"));
        assert_eq!(config.sources.len(), 2);
        assert_eq!(config.sources[1].kind, LayerKind::Project);
        assert_eq!(config.sources[1].properties, 2);
    }

    #[test]
    fn test_invalid_boolean_fails_resolution() {
        let layers = vec![layer(LayerKind::CommandLine, &[("EnforceCodeStyleInBuild", "sometimes")])];
        let err = EffectiveConfig::resolve(&layers).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidBool { ref value, .. } if value == "sometimes"));
    }

    #[test]
    fn test_unknown_non_boolean_values_pass() {
        let layers = vec![layer(LayerKind::Project, &[("AnalysisMode", "sometimes")])];
        assert!(EffectiveConfig::resolve(&layers).is_ok());
    }

    #[test]
    fn test_explain_undefined() {
        let config = EffectiveConfig::resolve(&[]).unwrap();
        let resolved = config.explain("Nullable");
        assert_eq!(resolved.value, None);
        assert_eq!(resolved.provenance, Provenance::Undefined);
        assert_eq!(config.get_bool("ContinuousIntegrationBuild").unwrap(), None);
    }

    #[test]
    fn test_properties_sorted() {
        let layers = vec![layer(LayerKind::Project, &[("Zeta", "1"), ("alpha", "2")])];
        let config = EffectiveConfig::resolve(&layers).unwrap();
        let names: Vec<String> = config.iter().map(|r| r.key.to_ascii_lowercase()).collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }

    #[test]
    fn test_write_to_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("effective_config.json");
        let config = EffectiveConfig::resolve(&[]).unwrap();
        config.write_to_file(&path).unwrap();

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(json["schema_id"], SCHEMA_ID);
        assert!(json["properties"].is_array());
        assert!(json.get("index").is_none());
    }
}
