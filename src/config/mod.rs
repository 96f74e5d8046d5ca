//! Layered property resolution
//!
//! Layers in precedence order (lowest first):
//! 1. Package defaults (.codestd/defaults.toml)
//! 2. Organization overrides (.codestd/org.toml)
//! 3. Project overrides (codestd.toml)
//! 4. Command-line assignments (-p KEY=VALUE)
//!
//! Properties no layer defines fall back to the documented defaults.

mod defaults;
mod effective;
mod error;
mod merge;
mod source;

pub use defaults::{keys, BuiltinDefaults};
pub use effective::{ConfigSource, EffectiveConfig, SCHEMA_ID, SCHEMA_VERSION};
pub use error::ConfigError;
pub use merge::{parse_bool, resolve, resolve_bool, resolve_with_defaults, Provenance, Resolved};
pub use source::{LayerKind, Property, PropertySource};
