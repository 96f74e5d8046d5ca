//! Documented property defaults
//!
//! Values used when no layer defines a property. Anything not listed here
//! resolves to undefined.

use serde::{Deserialize, Serialize};

/// Well-known property names
pub mod keys {
    pub const TREAT_WARNINGS_AS_ERRORS: &str = "TreatWarningsAsErrors";
    pub const ENFORCE_CODE_STYLE_IN_BUILD: &str = "EnforceCodeStyleInBuild";
    pub const ANALYSIS_LEVEL: &str = "AnalysisLevel";
    pub const ANALYSIS_MODE: &str = "AnalysisMode";
    pub const GENERATE_DOCUMENTATION_FILE: &str = "GenerateDocumentationFile";
    pub const MINIMUM_TOOLCHAIN_VERSION: &str = "MinimumToolchainVersion";
    pub const REQUIRE_TOOLCHAIN: &str = "RequireToolchain";
    pub const CONTINUOUS_INTEGRATION_BUILD: &str = "ContinuousIntegrationBuild";

    /// Properties that must parse as booleans wherever they are set
    pub const BOOLEAN: &[&str] = &[
        TREAT_WARNINGS_AS_ERRORS,
        ENFORCE_CODE_STYLE_IN_BUILD,
        GENERATE_DOCUMENTATION_FILE,
        REQUIRE_TOOLCHAIN,
        CONTINUOUS_INTEGRATION_BUILD,
    ];
}

/// Built-in default property values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltinDefaults {
    /// Fail the build on analyzer warnings (default: false)
    pub treat_warnings_as_errors: bool,

    /// Run code-style analyzers during build (default: true)
    pub enforce_code_style_in_build: bool,

    /// Analyzer rule set generation (default: "latest")
    pub analysis_level: String,

    /// Analyzer breadth (default: "Default")
    pub analysis_mode: String,

    /// Emit XML documentation (default: true)
    pub generate_documentation_file: bool,

    /// Lowest toolchain the package supports (default: "8.0.0")
    pub minimum_toolchain_version: String,

    /// Enforce the toolchain minimum (default: true)
    pub require_toolchain: bool,
}

impl Default for BuiltinDefaults {
    fn default() -> Self {
        Self {
            treat_warnings_as_errors: false,
            enforce_code_style_in_build: true,
            analysis_level: "latest".to_string(),
            analysis_mode: "Default".to_string(),
            generate_documentation_file: true,
            minimum_toolchain_version: "8.0.0".to_string(),
            require_toolchain: true,
        }
    }
}

impl BuiltinDefaults {
    /// All defaults as (property name, value) pairs
    pub fn to_properties(&self) -> Vec<(&'static str, String)> {
        vec![
            (keys::TREAT_WARNINGS_AS_ERRORS, self.treat_warnings_as_errors.to_string()),
            (keys::ENFORCE_CODE_STYLE_IN_BUILD, self.enforce_code_style_in_build.to_string()),
            (keys::ANALYSIS_LEVEL, self.analysis_level.clone()),
            (keys::ANALYSIS_MODE, self.analysis_mode.clone()),
            (keys::GENERATE_DOCUMENTATION_FILE, self.generate_documentation_file.to_string()),
            (keys::MINIMUM_TOOLCHAIN_VERSION, self.minimum_toolchain_version.clone()),
            (keys::REQUIRE_TOOLCHAIN, self.require_toolchain.to_string()),
        ]
    }

    /// Look up a documented default; property names compare case-insensitively
    pub fn lookup(&self, key: &str) -> Option<(&'static str, String)> {
        self.to_properties()
            .into_iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let defaults = BuiltinDefaults::default();
        assert!(!defaults.treat_warnings_as_errors);
        assert!(defaults.enforce_code_style_in_build);
        assert_eq!(defaults.analysis_level, "latest");
        assert_eq!(defaults.minimum_toolchain_version, "8.0.0");
        assert!(defaults.require_toolchain);
    }

    #[test]
    fn test_lookup_case_insensitive() {
        let defaults = BuiltinDefaults::default();
        let (name, value) = defaults.lookup("treatwarningsaserrors").unwrap();
        assert_eq!(name, "TreatWarningsAsErrors");
        assert_eq!(value, "false");
    }

    #[test]
    fn test_undocumented_key() {
        let defaults = BuiltinDefaults::default();
        assert!(defaults.lookup(keys::CONTINUOUS_INTEGRATION_BUILD).is_none());
        assert!(defaults.lookup("LangVersion").is_none());
    }
}
