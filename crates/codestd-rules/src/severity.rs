//! Diagnostic severity levels.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::RuleError;

/// Severity an analyzer reports a rule at.
///
/// Ordered from quietest to loudest so `max` picks the stricter level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Severity {
    /// Rule is not run.
    #[serde(rename = "none")]
    Off,
    /// Rule runs but nothing is shown.
    Silent,
    Suggestion,
    Warning,
    Error,
}

impl Severity {
    /// Spelling used in `.editorconfig` / `.globalconfig` files.
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Off => "none",
            Severity::Silent => "silent",
            Severity::Suggestion => "suggestion",
            Severity::Warning => "warning",
            Severity::Error => "error",
        }
    }

    pub fn is_enabled(self) -> bool {
        self != Severity::Off
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Severity {
    type Err = RuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "off" | "none" => Ok(Severity::Off),
            "silent" | "hidden" => Ok(Severity::Silent),
            "suggestion" | "info" => Ok(Severity::Suggestion),
            "warning" | "warn" => Ok(Severity::Warning),
            "error" => Ok(Severity::Error),
            _ => Err(RuleError::InvalidSeverity(s.to_string())),
        }
    }
}

impl TryFrom<String> for Severity {
    type Error = RuleError;

    fn try_from(value: String) -> Result<Self, RuleError> {
        value.parse()
    }
}
