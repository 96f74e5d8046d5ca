//! Build environment probe
//!
//! Gathers the facts guardrails need exactly once per process:
//! - toolchain version (`CODESTD_TOOLCHAIN_VERSION`, else `dotnet --version`)
//! - whether this is a CI build, and which CI vendor
//!
//! CI signals are presence-only: a variable counts if it is set, whatever its
//! value. When several are present the first in [`CiSignal::PRIORITY`] wins
//! and the rest are kept for diagnostics.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::process::Command;

use crate::guardrail::ToolVersion;

/// Environment variable that pins the detected toolchain version
pub const TOOLCHAIN_VERSION_VAR: &str = "CODESTD_TOOLCHAIN_VERSION";

/// Read-only view of environment variables
pub trait EnvSource {
    fn var(&self, name: &str) -> Option<String>;

    fn is_set(&self, name: &str) -> bool {
        self.var(name).is_some()
    }
}

/// The real process environment
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var_os(name).map(|v| v.to_string_lossy().into_owned())
    }
}

impl EnvSource for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}

/// A source that says whether this is a CI build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CiSignal {
    /// `--ci`/`--no-ci` or the ContinuousIntegrationBuild property
    Explicit,
    GithubActions,
    TfBuild,
    /// Generic `CI` variable set by most CI systems
    Generic,
}

impl CiSignal {
    /// Fixed resolution order, highest priority first
    pub const PRIORITY: [CiSignal; 4] = [
        CiSignal::Explicit,
        CiSignal::GithubActions,
        CiSignal::TfBuild,
        CiSignal::Generic,
    ];

    /// Environment variable carrying this signal (none for explicit overrides)
    pub fn env_var(self) -> Option<&'static str> {
        match self {
            CiSignal::Explicit => None,
            CiSignal::GithubActions => Some("GITHUB_ACTIONS"),
            CiSignal::TfBuild => Some("TF_BUILD"),
            CiSignal::Generic => Some("CI"),
        }
    }

    pub fn vendor(self) -> &'static str {
        match self {
            CiSignal::Explicit => "explicit",
            CiSignal::GithubActions => "github-actions",
            CiSignal::TfBuild => "azure-pipelines",
            CiSignal::Generic => "generic",
        }
    }
}

/// Outcome of CI detection
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CiDetection {
    pub is_ci: bool,

    /// Vendor of the winning signal, when this is a CI build
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor: Option<String>,

    /// Signal that decided `is_ci`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<CiSignal>,

    /// Every signal seen, in priority order
    pub signals: Vec<CiSignal>,
}

impl CiDetection {
    /// Resolve CI status from environment signals and an optional explicit override
    pub fn detect(env: &dyn EnvSource, explicit: Option<bool>) -> Self {
        let signals: Vec<CiSignal> = CiSignal::PRIORITY
            .into_iter()
            .filter(|signal| match signal.env_var() {
                None => explicit.is_some(),
                Some(var) => env.is_set(var),
            })
            .collect();

        let winner = signals.first().copied();
        let is_ci = match winner {
            Some(CiSignal::Explicit) => explicit.unwrap_or(false),
            Some(_) => true,
            None => false,
        };

        if signals.len() > 1 {
            if let Some(winner) = winner {
                tracing::warn!(
                    winner = winner.vendor(),
                    ignored = ?&signals[1..],
                    "conflicting CI signals; using highest priority"
                );
            }
        }

        Self {
            is_ci,
            vendor: winner.filter(|_| is_ci).map(|w| w.vendor().to_string()),
            winner,
            signals,
        }
    }

    /// More than one signal was present
    pub fn has_conflict(&self) -> bool {
        self.signals.len() > 1
    }
}

/// Facts about the build environment, gathered once and read-only thereafter
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentProbe {
    /// Detected toolchain version (None when detection failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub toolchain_version: Option<ToolVersion>,

    /// How the toolchain version was found
    pub toolchain_source: String,

    pub ci: CiDetection,
}

impl EnvironmentProbe {
    /// Probe the environment, falling back to `dotnet --version` for the toolchain
    pub fn detect(env: &dyn EnvSource, explicit_ci: Option<bool>) -> Self {
        let (toolchain_version, toolchain_source) = match detect_from_env(env) {
            Some(found) => found,
            None => detect_from_command("dotnet"),
        };
        Self::assemble(toolchain_version, toolchain_source, env, explicit_ci)
    }

    /// Probe without running any external command
    pub fn detect_env_only(env: &dyn EnvSource, explicit_ci: Option<bool>) -> Self {
        let (toolchain_version, toolchain_source) =
            detect_from_env(env).unwrap_or((None, "undetected".to_string()));
        Self::assemble(toolchain_version, toolchain_source, env, explicit_ci)
    }

    /// Build a probe from known facts
    pub fn from_parts(toolchain_version: Option<ToolVersion>, ci: CiDetection) -> Self {
        Self {
            toolchain_version,
            toolchain_source: "provided".to_string(),
            ci,
        }
    }

    fn assemble(
        toolchain_version: Option<ToolVersion>,
        toolchain_source: String,
        env: &dyn EnvSource,
        explicit_ci: Option<bool>,
    ) -> Self {
        let ci = CiDetection::detect(env, explicit_ci);
        tracing::info!(
            toolchain = ?toolchain_version.map(|v| v.to_string()),
            source = %toolchain_source,
            ci = ci.is_ci,
            vendor = ?ci.vendor,
            "environment probed"
        );
        Self {
            toolchain_version,
            toolchain_source,
            ci,
        }
    }
}

/// `None` when the variable is unset; a set-but-invalid value counts as undetected
fn detect_from_env(env: &dyn EnvSource) -> Option<(Option<ToolVersion>, String)> {
    let raw = env.var(TOOLCHAIN_VERSION_VAR)?;
    let version = match raw.parse::<ToolVersion>() {
        Ok(v) => Some(v),
        Err(e) => {
            tracing::warn!(var = TOOLCHAIN_VERSION_VAR, "{}", e);
            None
        }
    };
    Some((version, TOOLCHAIN_VERSION_VAR.to_string()))
}

fn detect_from_command(program: &str) -> (Option<ToolVersion>, String) {
    let source = format!("{} --version", program);
    let output = Command::new(program).arg("--version").output();

    match output {
        Ok(output) if output.status.success() => {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let version = stdout.lines().next().and_then(|l| l.trim().parse().ok());
            if version.is_none() {
                tracing::debug!(output = %stdout.trim(), "unrecognised toolchain version output");
            }
            (version, source)
        }
        _ => {
            tracing::debug!(program, "toolchain command unavailable");
            (None, "undetected".to_string())
        }
    }
}
