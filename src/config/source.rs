//! Property sources (layers)
//!
//! A layer is one set of key→value properties with a fixed precedence rank.
//! File layers are TOML; nested tables flatten to dotted names.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

use super::error::ConfigError;

/// Precedence rank of a layer, lowest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LayerKind {
    PackageDefaults,
    Organization,
    Project,
    CommandLine,
}

impl LayerKind {
    pub fn as_str(self) -> &'static str {
        match self {
            LayerKind::PackageDefaults => "package-defaults",
            LayerKind::Organization => "organization",
            LayerKind::Project => "project",
            LayerKind::CommandLine => "command-line",
        }
    }
}

impl fmt::Display for LayerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A property as written in its layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Property {
    /// Spelling used by the layer that defined it
    pub name: String,
    pub value: String,
}

/// One layer of key→value properties
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PropertySource {
    pub kind: LayerKind,

    /// File path (None for in-memory and command-line layers)
    pub path: Option<String>,

    /// SHA-256 digest of raw file bytes (None unless loaded from a file)
    pub digest: Option<String>,

    /// Keyed by lowercased name
    properties: BTreeMap<String, Property>,
}

impl PropertySource {
    pub fn new(kind: LayerKind) -> Self {
        Self {
            kind,
            path: None,
            digest: None,
            properties: BTreeMap::new(),
        }
    }

    /// Build an in-memory layer from pairs
    pub fn from_pairs<K, V>(
        kind: LayerKind,
        pairs: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, ConfigError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut source = Self::new(kind);
        for (key, value) in pairs {
            source.set(key, value)?;
        }
        Ok(source)
    }

    /// Parse `KEY=VALUE` assignments into a command-line layer
    pub fn from_assignments<S: AsRef<str>>(
        assignments: impl IntoIterator<Item = S>,
    ) -> Result<Self, ConfigError> {
        let mut source = Self::new(LayerKind::CommandLine);
        for raw in assignments {
            let raw = raw.as_ref();
            let (key, value) = raw
                .split_once('=')
                .ok_or_else(|| ConfigError::InvalidAssignment(raw.to_string()))?;
            let key = key.trim();
            if key.is_empty() {
                return Err(ConfigError::InvalidAssignment(raw.to_string()));
            }
            source.set(key, value.trim())?;
        }
        Ok(source)
    }

    /// Load a TOML property file
    pub fn from_file(kind: LayerKind, path: &Path) -> Result<Self, ConfigError> {
        let display = path.display().to_string();
        let bytes = fs::read(path).map_err(|source| ConfigError::Io {
            path: display.clone(),
            source,
        })?;

        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        let digest = hex::encode(hasher.finalize());

        let contents = String::from_utf8(bytes).map_err(|e| ConfigError::Parse {
            path: display.clone(),
            message: format!("invalid UTF-8: {}", e),
        })?;
        let table: toml::Table = toml::from_str(&contents).map_err(|e| ConfigError::Parse {
            path: display.clone(),
            message: describe_toml_error(&e, &contents),
        })?;

        let mut source = Self::new(kind);
        source.path = Some(display.clone());
        source.digest = Some(digest);
        source
            .flatten_table(String::new(), table)
            .map_err(|message| ConfigError::Parse {
                path: display,
                message,
            })?;

        tracing::debug!(
            layer = %kind,
            path = ?source.path,
            properties = source.len(),
            "loaded property layer"
        );
        Ok(source)
    }

    /// Load a TOML property file if it exists
    pub fn load_optional(kind: LayerKind, path: &Path) -> Result<Option<Self>, ConfigError> {
        match Self::from_file(kind, path) {
            Ok(source) => Ok(Some(source)),
            Err(ConfigError::Io { source, .. }) if source.kind() == io::ErrorKind::NotFound => {
                tracing::debug!(layer = %kind, path = %path.display(), "layer file not found, skipping");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn flatten_table(&mut self, prefix: String, table: toml::Table) -> Result<(), String> {
        for (key, value) in table {
            let name = if prefix.is_empty() {
                key
            } else {
                format!("{}.{}", prefix, key)
            };
            let value = match value {
                toml::Value::String(s) => s,
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Float(f) => f.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                toml::Value::Datetime(dt) => dt.to_string(),
                toml::Value::Array(_) => {
                    return Err(format!("property `{}`: arrays are not supported", name))
                }
                toml::Value::Table(nested) => {
                    self.flatten_table(name, nested)?;
                    continue;
                }
            };
            if let Some(existing) = self.get(&name) {
                return Err(format!(
                    "property `{}` collides with `{}` (property names are case-insensitive)",
                    name, existing.name
                ));
            }
            self.set(name, value).map_err(|e| e.to_string())?;
        }
        Ok(())
    }

    /// Define a property, replacing any existing value for the same name
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<(), ConfigError> {
        let name = key.into();
        if name.is_empty() || name.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidKey(name));
        }
        self.properties.insert(
            name.to_ascii_lowercase(),
            Property {
                name,
                value: value.into(),
            },
        );
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&Property> {
        self.properties.get(&key.to_ascii_lowercase())
    }

    pub fn len(&self) -> usize {
        self.properties.len()
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    pub fn properties(&self) -> impl Iterator<Item = &Property> {
        self.properties.values()
    }

    /// Human-readable layer name for diagnostics, e.g. `project layer (codestd.toml)`
    pub fn label(&self) -> String {
        match &self.path {
            Some(path) => format!("{} layer ({})", self.kind, path),
            None => format!("{} layer", self.kind),
        }
    }
}

/// Single-line rendering of a TOML error: `line L, column C: message`
fn describe_toml_error(err: &toml::de::Error, contents: &str) -> String {
    let message = err.message().trim().replace('\n', " ");
    match err.span() {
        Some(span) => {
            let before = contents.get(..span.start).unwrap_or(contents);
            let line = before.matches('\n').count() + 1;
            let line_start = before.rfind('\n').map_or(0, |i| i + 1);
            let column = before[line_start..].chars().count() + 1;
            format!("line {}, column {}: {}", line, column, message)
        }
        None => message,
    }
}
