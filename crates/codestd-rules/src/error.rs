//! Rule table errors and warnings.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Fatal errors while loading a rule table or parsing override directives.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error("failed to read rule file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {origin}: {message}")]
    Parse { origin: String, message: String },

    #[error("invalid severity `{0}` (expected none, silent, suggestion, warning or error)")]
    InvalidSeverity(String),

    #[error("invalid rule id `{0}`")]
    InvalidRuleId(String),

    #[error("duplicate rule id `{0}` in rule table")]
    DuplicateRule(String),

    #[error("{origin}: malformed override directive `{line}`")]
    InvalidDirective { origin: String, line: String },
}

impl RuleError {
    /// One-line parse error: `line L, column C: message`
    pub(crate) fn parse(origin: impl Into<String>, err: &toml::de::Error, contents: &str) -> Self {
        let message = err.message().trim().replace('\n', " ");
        let message = match err.span() {
            Some(span) => {
                let before = contents.get(..span.start).unwrap_or(contents);
                let line = before.matches('\n').count() + 1;
                let line_start = before.rfind('\n').map_or(0, |i| i + 1);
                let column = before[line_start..].chars().count() + 1;
                format!("line {}, column {}: {}", line, column, message)
            }
            None => message,
        };
        RuleError::Parse {
            origin: origin.into(),
            message,
        }
    }
}

/// Non-fatal report for an override naming a rule the table does not define.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownRuleWarning {
    pub rule_id: String,

    /// Where the directive came from (`file:line`), when known.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl fmt::Display for UnknownRuleWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.origin {
            Some(origin) => write!(f, "{}: override for unknown rule `{}` ignored", origin, self.rule_id),
            None => write!(f, "override for unknown rule `{}` ignored", self.rule_id),
        }
    }
}
