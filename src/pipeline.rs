//! Build-time resolution pipeline
//!
//! Runs the stages in a fixed order:
//! 1. Load layers and resolve the effective configuration
//! 2. Probe the environment
//! 3. Check guardrails (fatal failures stop here)
//! 4. Load the rule table and apply overrides
//!
//! Everything is synchronous and runs once per invocation.

use std::path::{Path, PathBuf};

use codestd_rules::{LoadReport, RuleError, RuleSetLoader, RuleTable, Severity, UnknownRuleWarning};
use serde::Serialize;
use thiserror::Error;

use crate::config::{keys, ConfigError, EffectiveConfig, LayerKind, PropertySource};
use crate::guardrail::{validate, GuardrailError, GuardrailReport, GuardrailRequirement};
use crate::probe::{EnvSource, EnvironmentProbe};

/// Default package defaults layer location
pub const DEFAULT_DEFAULTS_PATH: &str = ".codestd/defaults.toml";

/// Default organization layer location
pub const DEFAULT_ORG_PATH: &str = ".codestd/org.toml";

/// Default project layer location
pub const DEFAULT_PROJECT_PATH: &str = "codestd.toml";

/// Default rule table location
pub const DEFAULT_RULES_PATH: &str = ".codestd/rules.toml";

/// Exit code for configuration and rule table errors
pub const EXIT_CONFIG: i32 = 1;

/// Exit code for guardrail failures
pub const EXIT_GUARDRAIL: i32 = 2;

/// Pipeline errors
///
/// Configuration and guardrail errors pass through with their own message.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Guardrail(#[from] GuardrailError),

    #[error(transparent)]
    Rules(#[from] RuleError),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("failed to write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            PipelineError::Guardrail(_) => EXIT_GUARDRAIL,
            PipelineError::Config(_)
            | PipelineError::Rules(_)
            | PipelineError::Serialization(_)
            | PipelineError::Io { .. } => EXIT_CONFIG,
        }
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Inputs for one invocation
#[derive(Debug, Clone, Default)]
pub struct PipelineConfig {
    /// Package defaults layer (skipped if missing)
    pub defaults_path: Option<PathBuf>,

    /// Organization layer (skipped if missing)
    pub org_path: Option<PathBuf>,

    /// Project layer (skipped if missing)
    pub project_path: Option<PathBuf>,

    /// Command-line `KEY=VALUE` assignments
    pub assignments: Vec<String>,

    /// Rule table; an empty table is used if None or missing
    pub rules_path: Option<PathBuf>,

    /// Override files applied in order
    pub override_paths: Vec<PathBuf>,

    /// `--ci` / `--no-ci`
    pub explicit_ci: Option<bool>,

    /// Skip running external commands while probing
    pub probe_env_only: bool,
}

impl PipelineConfig {
    /// Config using the conventional file locations under `root`
    pub fn with_default_paths(root: &Path) -> Self {
        Self {
            defaults_path: Some(root.join(DEFAULT_DEFAULTS_PATH)),
            org_path: Some(root.join(DEFAULT_ORG_PATH)),
            project_path: Some(root.join(DEFAULT_PROJECT_PATH)),
            rules_path: Some(root.join(DEFAULT_RULES_PATH)),
            ..Self::default()
        }
    }
}

/// Everything the build needs after a successful run
#[derive(Debug, Clone)]
pub struct BuildPlan {
    pub config: EffectiveConfig,
    pub probe: EnvironmentProbe,
    pub guardrail: GuardrailReport,
    pub rules: LoadReport,
}

impl BuildPlan {
    /// `(ruleId, severity)` pairs for the analyzer front end
    pub fn rule_severities(&self) -> Vec<(String, Severity)> {
        self.rules.resolved()
    }

    pub fn warnings(&self) -> &[UnknownRuleWarning] {
        &self.rules.warnings
    }

    pub fn summary(&self) -> PlanSummary<'_> {
        PlanSummary {
            config: &self.config,
            probe: &self.probe,
            guardrail: &self.guardrail,
            rules: self
                .rule_severities()
                .into_iter()
                .map(|(id, severity)| RuleSeverity { id, severity })
                .collect(),
            warnings: &self.rules.warnings,
        }
    }
}

/// Serializable view of a build plan
#[derive(Debug, Serialize)]
pub struct PlanSummary<'a> {
    pub config: &'a EffectiveConfig,
    pub probe: &'a EnvironmentProbe,
    pub guardrail: &'a GuardrailReport,
    pub rules: Vec<RuleSeverity>,
    pub warnings: &'a [UnknownRuleWarning],
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleSeverity {
    pub id: String,
    pub severity: Severity,
}

/// Load every configured layer in precedence order
pub fn load_layers(cfg: &PipelineConfig) -> Result<Vec<PropertySource>, ConfigError> {
    let mut layers = Vec::new();

    let files = [
        (LayerKind::PackageDefaults, &cfg.defaults_path),
        (LayerKind::Organization, &cfg.org_path),
        (LayerKind::Project, &cfg.project_path),
    ];
    for (kind, path) in files {
        if let Some(path) = path {
            if let Some(layer) = PropertySource::load_optional(kind, path)? {
                layers.push(layer);
            }
        }
    }

    if !cfg.assignments.is_empty() {
        layers.push(PropertySource::from_assignments(&cfg.assignments)?);
    }

    Ok(layers)
}

/// Stage 1: resolve the effective configuration
pub fn resolve_config(cfg: &PipelineConfig) -> Result<EffectiveConfig, ConfigError> {
    let layers = load_layers(cfg)?;
    EffectiveConfig::resolve(&layers)
}

/// Stage 2: probe the environment
///
/// `--ci`/`--no-ci` beats the ContinuousIntegrationBuild property.
pub fn probe_environment(
    cfg: &PipelineConfig,
    config: &EffectiveConfig,
    env: &dyn EnvSource,
) -> Result<EnvironmentProbe, ConfigError> {
    let explicit = match cfg.explicit_ci {
        Some(flag) => Some(flag),
        None => config.get_bool(keys::CONTINUOUS_INTEGRATION_BUILD)?,
    };

    Ok(if cfg.probe_env_only {
        EnvironmentProbe::detect_env_only(env, explicit)
    } else {
        EnvironmentProbe::detect(env, explicit)
    })
}

/// Stages 1-3: resolve, probe and check guardrails without touching rules
pub fn check(
    cfg: &PipelineConfig,
    env: &dyn EnvSource,
) -> PipelineResult<(EffectiveConfig, EnvironmentProbe, GuardrailReport)> {
    let config = resolve_config(cfg)?;
    let probe = probe_environment(cfg, &config, env)?;
    let requirement = GuardrailRequirement::from_config(&config)?;
    let report = validate(&probe, &requirement)?;
    Ok((config, probe, report))
}

/// Stage 4: load the rule table and apply overrides
pub fn load_rules(cfg: &PipelineConfig) -> Result<LoadReport, RuleError> {
    let table = match &cfg.rules_path {
        Some(path) if path.exists() => RuleTable::from_file(path)?,
        Some(path) => {
            tracing::debug!(path = %path.display(), "rule table not found, using empty table");
            RuleTable::new()
        }
        None => RuleTable::new(),
    };

    let mut loader = RuleSetLoader::new(table);
    for path in &cfg.override_paths {
        loader.add_override_file(path)?;
    }
    Ok(loader.load())
}

/// Run the full pipeline
pub fn run(cfg: &PipelineConfig, env: &dyn EnvSource) -> PipelineResult<BuildPlan> {
    let (config, probe, guardrail) = check(cfg, env)?;
    let rules = load_rules(cfg)?;

    Ok(BuildPlan {
        config,
        probe,
        guardrail,
        rules,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use tempfile::TempDir;

    fn env(vars: &[(&str, &str)]) -> HashMap<String, String> {
        vars.iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn base_config(dir: &TempDir) -> PipelineConfig {
        PipelineConfig {
            probe_env_only: true,
            ..PipelineConfig::with_default_paths(dir.path())
        }
    }

    #[test]
    fn test_exit_codes() {
        let guard = PipelineError::from(GuardrailError::ToolchainUndetected {
            required: "8.0.0".parse().unwrap(),
        });
        assert_eq!(guard.exit_code(), EXIT_GUARDRAIL);

        let config = PipelineError::from(ConfigError::InvalidKey("x y".to_string()));
        assert_eq!(config.exit_code(), EXIT_CONFIG);

        let io = PipelineError::Io {
            path: "out.globalconfig".to_string(),
            source: std::io::Error::from(std::io::ErrorKind::NotFound),
        };
        assert_eq!(io.exit_code(), EXIT_CONFIG);
        assert!(io.to_string().starts_with("failed to write out.globalconfig"));
    }

    #[test]
    fn test_errors_pass_through_unmodified() {
        let inner = GuardrailError::ToolchainTooOld {
            detected: "7.0.0".parse().unwrap(),
            required: "8.0.0".parse().unwrap(),
        };
        let message = inner.to_string();
        assert_eq!(PipelineError::from(inner).to_string(), message);
    }

    #[test]
    fn test_missing_files_are_skipped() {
        let dir = TempDir::new().unwrap();
        let layers = load_layers(&base_config(&dir)).unwrap();
        assert!(layers.is_empty());
    }

    #[test]
    fn test_assignments_form_top_layer() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("codestd.toml"), "AnalysisMode = \"All\"\n").unwrap();
        let cfg = PipelineConfig {
            assignments: vec!["AnalysisMode=None".to_string()],
            ..base_config(&dir)
        };

        let config = resolve_config(&cfg).unwrap();
        assert_eq!(config.get("AnalysisMode"), Some("None"));
        assert_eq!(config.sources.last().unwrap().kind, LayerKind::CommandLine);
    }

    #[test]
    fn test_cli_flag_beats_property() {
        let dir = TempDir::new().unwrap();
        let cfg = PipelineConfig {
            assignments: vec!["ContinuousIntegrationBuild=true".to_string()],
            explicit_ci: Some(false),
            ..base_config(&dir)
        };
        let config = resolve_config(&cfg).unwrap();
        let probe = probe_environment(&cfg, &config, &env(&[])).unwrap();
        assert!(!probe.ci.is_ci);
    }

    #[test]
    fn test_property_counts_as_explicit_signal() {
        let dir = TempDir::new().unwrap();
        let cfg = PipelineConfig {
            assignments: vec!["ContinuousIntegrationBuild=yes".to_string()],
            ..base_config(&dir)
        };
        let config = resolve_config(&cfg).unwrap();
        let probe = probe_environment(&cfg, &config, &env(&[("TF_BUILD", "True")])).unwrap();
        assert!(probe.ci.is_ci);
        assert_eq!(probe.ci.vendor.as_deref(), Some("explicit"));
        assert!(probe.ci.has_conflict());
    }

    #[test]
    fn test_run_without_rule_table() {
        let dir = TempDir::new().unwrap();
        let plan = run(
            &base_config(&dir),
            &env(&[("CODESTD_TOOLCHAIN_VERSION", "8.0.100")]),
        )
        .unwrap();
        assert!(plan.rule_severities().is_empty());
        assert!(plan.warnings().is_empty());
    }
}
