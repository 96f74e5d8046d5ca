//! Guardrails: environment preconditions checked before any rule is applied
//!
//! A failed guardrail is fatal. The caller must stop before loading the rule
//! table so no partial set of severities ever reaches the analyzers.

mod version;

pub use version::{ToolVersion, VersionParseError};

use serde::{Deserialize, Serialize};

use crate::config::{keys, ConfigError, EffectiveConfig};
use crate::probe::{CiDetection, EnvironmentProbe};

/// Fatal guardrail failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuardrailError {
    #[error("toolchain {detected} is older than the required minimum {required} (install a newer SDK or lower MinimumToolchainVersion)")]
    ToolchainTooOld {
        detected: ToolVersion,
        required: ToolVersion,
    },

    #[error("toolchain version could not be detected; {required} or newer is required (set CODESTD_TOOLCHAIN_VERSION or install the SDK)")]
    ToolchainUndetected { required: ToolVersion },
}

/// What the environment must satisfy
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailRequirement {
    /// Lowest acceptable toolchain; None disables the check
    pub minimum_toolchain: Option<ToolVersion>,

    /// Whether analyzer warnings fail the build
    pub treat_warnings_as_errors: bool,
}

impl GuardrailRequirement {
    /// Derive requirements from the effective configuration
    pub fn from_config(config: &EffectiveConfig) -> Result<Self, ConfigError> {
        let enforce = config.get_bool(keys::REQUIRE_TOOLCHAIN)?.unwrap_or(true);

        let minimum_toolchain = if enforce {
            let resolved = config.explain(keys::MINIMUM_TOOLCHAIN_VERSION);
            match resolved.value.as_deref() {
                None => None,
                Some(raw) => Some(raw.parse::<ToolVersion>().map_err(|_| {
                    ConfigError::InvalidVersion {
                        key: resolved.key.clone(),
                        layer: resolved.provenance.label(),
                        value: raw.to_string(),
                    }
                })?),
            }
        } else {
            None
        };

        Ok(Self {
            minimum_toolchain,
            treat_warnings_as_errors: config
                .get_bool(keys::TREAT_WARNINGS_AS_ERRORS)?
                .unwrap_or(false),
        })
    }
}

/// Result of a passing guardrail check
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuardrailReport {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain: Option<ToolVersion>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub required: Option<ToolVersion>,

    pub ci: CiDetection,

    /// Informational findings that do not block the build
    pub notes: Vec<String>,
}

/// Check `probe` against `requirement`
pub fn validate(
    probe: &EnvironmentProbe,
    requirement: &GuardrailRequirement,
) -> Result<GuardrailReport, GuardrailError> {
    if let Some(required) = requirement.minimum_toolchain {
        match probe.toolchain_version {
            None => return Err(GuardrailError::ToolchainUndetected { required }),
            Some(detected) if detected < required => {
                return Err(GuardrailError::ToolchainTooOld { detected, required })
            }
            Some(detected) => {
                tracing::debug!(%detected, %required, "toolchain guardrail passed");
            }
        }
    }

    let mut notes = Vec::new();
    if probe.ci.is_ci && !requirement.treat_warnings_as_errors {
        notes.push(format!(
            "CI build ({}) with {}=false: analyzer warnings will not fail the build",
            probe.ci.vendor.as_deref().unwrap_or("unknown"),
            keys::TREAT_WARNINGS_AS_ERRORS
        ));
    }
    if let Some(winner) = probe.ci.winner.filter(|_| probe.ci.has_conflict()) {
        notes.push(format!(
            "multiple CI signals present; {} took precedence",
            winner.vendor()
        ));
    }
    for note in &notes {
        tracing::info!("{}", note);
    }

    Ok(GuardrailReport {
        toolchain: probe.toolchain_version,
        required: requirement.minimum_toolchain,
        ci: probe.ci.clone(),
        notes,
    })
}
