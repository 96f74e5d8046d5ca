use std::io;

/// Configuration errors
///
/// Every variant is recoverable only by editing the offending input, so each
/// one names the key, layer and raw value that caused it.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: String, message: String },

    #[error("invalid property name `{0}`")]
    InvalidKey(String),

    #[error("invalid property assignment `{0}` (expected KEY=VALUE)")]
    InvalidAssignment(String),

    #[error("property `{key}` in {layer} has non-boolean value `{value}` (expected true, false, 1, 0, yes or no)")]
    InvalidBool {
        key: String,
        layer: String,
        value: String,
    },

    #[error("property `{key}` in {layer} has invalid version `{value}` (expected major.minor.patch)")]
    InvalidVersion {
        key: String,
        layer: String,
        value: String,
    },
}
