//! Layer resolution
//!
//! For a property name:
//! - the highest-precedence layer that defines it wins
//! - otherwise the documented default applies
//! - otherwise the property is undefined
//!
//! Resolution is a pure function of its inputs.

use serde::{Deserialize, Serialize};

use super::defaults::BuiltinDefaults;
use super::error::ConfigError;
use super::source::{LayerKind, PropertySource};

/// Where a resolved value came from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum Provenance {
    Layer {
        kind: LayerKind,
        /// Position in the layer list (0 = lowest precedence)
        index: usize,
        #[serde(skip_serializing_if = "Option::is_none")]
        path: Option<String>,
    },
    Default,
    Undefined,
}

impl Provenance {
    /// Human-readable origin for diagnostics
    pub fn label(&self) -> String {
        match self {
            Provenance::Layer {
                kind,
                path: Some(path),
                ..
            } => format!("{} layer ({})", kind, path),
            Provenance::Layer { kind, .. } => format!("{} layer", kind),
            Provenance::Default => "documented default".to_string(),
            Provenance::Undefined => "undefined".to_string(),
        }
    }
}

/// A resolved property value with provenance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Resolved {
    /// Property name as spelled by the winning source
    pub key: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,

    pub provenance: Provenance,
}

impl Resolved {
    pub fn is_defined(&self) -> bool {
        self.value.is_some()
    }

    /// Interpret the value as a boolean; undefined stays `None`
    pub fn as_bool(&self) -> Result<Option<bool>, ConfigError> {
        match &self.value {
            None => Ok(None),
            Some(raw) => parse_bool(raw).map(Some).ok_or_else(|| ConfigError::InvalidBool {
                key: self.key.clone(),
                layer: self.provenance.label(),
                value: raw.clone(),
            }),
        }
    }
}

/// Resolve `key` across `layers` (lowest precedence first) using the built-in defaults
pub fn resolve(layers: &[PropertySource], key: &str) -> Resolved {
    resolve_with_defaults(layers, &BuiltinDefaults::default(), key)
}

/// Resolve `key` across `layers`, falling back to `defaults`
pub fn resolve_with_defaults(
    layers: &[PropertySource],
    defaults: &BuiltinDefaults,
    key: &str,
) -> Resolved {
    let winner = layers
        .iter()
        .enumerate()
        .rev()
        .find_map(|(index, layer)| layer.get(key).map(|prop| (index, layer, prop)));

    if let Some((index, layer, prop)) = winner {
        return Resolved {
            key: prop.name.clone(),
            value: Some(prop.value.clone()),
            provenance: Provenance::Layer {
                kind: layer.kind,
                index,
                path: layer.path.clone(),
            },
        };
    }

    match defaults.lookup(key) {
        Some((name, value)) => Resolved {
            key: name.to_string(),
            value: Some(value),
            provenance: Provenance::Default,
        },
        None => Resolved {
            key: key.to_string(),
            value: None,
            provenance: Provenance::Undefined,
        },
    }
}

/// Resolve `key` as a boolean
///
/// Unparseable values are an error naming the key, the layer and the raw value.
pub fn resolve_bool(layers: &[PropertySource], key: &str) -> Result<Option<bool>, ConfigError> {
    resolve(layers, key).as_bool()
}

/// Case-insensitive boolean parse of `true/false/1/0/yes/no`
pub fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
