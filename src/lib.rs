//! codestd - build-time coding standards resolution
//!
//! Merges layered build properties into an effective configuration, probes
//! the build environment, enforces guardrails, and resolves analyzer rule
//! severities for the analyzer front end.

pub mod config;
pub mod emit;
pub mod guardrail;
pub mod pipeline;
pub mod probe;

pub use codestd_rules as rules;
pub use config::{ConfigError, EffectiveConfig, LayerKind, PropertySource};
pub use guardrail::{GuardrailError, GuardrailRequirement, ToolVersion};
pub use pipeline::{BuildPlan, PipelineConfig, PipelineError};
pub use probe::{EnvironmentProbe, ProcessEnv};
