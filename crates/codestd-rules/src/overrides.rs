//! Override directives applied on top of a rule table.
//!
//! Two text forms are accepted:
//! - directive lists: `enable:CA1062`, `disable:CA1062`, `CA1062=error`
//! - editorconfig lines: `dotnet_diagnostic.CA1062.severity = error`

use serde::{Deserialize, Serialize};
use std::collections::HashSet;

use crate::error::RuleError;
use crate::severity::Severity;

/// What an override does to its rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "severity", rename_all = "snake_case")]
pub enum OverrideAction {
    /// Restore the rule's default severity (or `warning` if that default is off).
    Enable,
    Disable,
    SetSeverity(Severity),
}

/// A single override directive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Override {
    pub rule_id: String,
    pub action: OverrideAction,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
}

impl Override {
    pub fn enable(rule_id: impl Into<String>) -> Self {
        Self::new(rule_id, OverrideAction::Enable)
    }

    pub fn disable(rule_id: impl Into<String>) -> Self {
        Self::new(rule_id, OverrideAction::Disable)
    }

    pub fn set_severity(rule_id: impl Into<String>, severity: Severity) -> Self {
        Self::new(rule_id, OverrideAction::SetSeverity(severity))
    }

    fn new(rule_id: impl Into<String>, action: OverrideAction) -> Self {
        Self {
            rule_id: rule_id.into(),
            action,
            origin: None,
        }
    }

    /// Attach a `file:line` style origin used in diagnostics.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }
}

/// Parse a directive list, one directive per line.
///
/// Blank lines and lines starting with `#` or `;` are skipped.
pub fn parse_directives(text: &str, origin: &str) -> Result<Vec<Override>, RuleError> {
    let mut overrides = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if is_skippable(line) {
            continue;
        }
        let at = format!("{}:{}", origin, idx + 1);
        let malformed = || RuleError::InvalidDirective {
            origin: at.clone(),
            line: line.to_string(),
        };

        let directive = if let Some((verb, id)) = line.split_once(':') {
            let id = checked_id(id.trim()).ok_or_else(malformed)?;
            match verb.trim().to_ascii_lowercase().as_str() {
                "enable" => Override::enable(id),
                "disable" => Override::disable(id),
                _ => return Err(malformed()),
            }
        } else if let Some((id, severity)) = line.split_once('=') {
            let id = checked_id(id.trim()).ok_or_else(malformed)?;
            Override::set_severity(id, severity.parse()?)
        } else {
            return Err(malformed());
        };

        overrides.push(directive.with_origin(at));
    }

    Ok(overrides)
}

/// Parse `dotnet_diagnostic.<ID>.severity = <sev>` entries from an editorconfig.
///
/// Section headers, comments and unrelated keys are ignored.
pub fn parse_editorconfig(text: &str, origin: &str) -> Result<Vec<Override>, RuleError> {
    let mut overrides = Vec::new();

    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if is_skippable(line) || line.starts_with('[') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let Some(id) = key
            .trim()
            .strip_prefix("dotnet_diagnostic.")
            .and_then(|rest| rest.strip_suffix(".severity"))
        else {
            continue;
        };

        let at = format!("{}:{}", origin, idx + 1);
        let id = checked_id(id).ok_or_else(|| RuleError::InvalidDirective {
            origin: at.clone(),
            line: line.to_string(),
        })?;
        overrides.push(Override::set_severity(id, value.parse()?).with_origin(at));
    }

    Ok(overrides)
}

/// Keep only the last directive for each rule id, preserving relative order.
///
/// Applying the collapsed list yields the same table as applying `overrides`.
pub fn collapse(overrides: &[Override]) -> Vec<Override> {
    let mut seen = HashSet::new();
    let mut kept: Vec<Override> = overrides
        .iter()
        .rev()
        .filter(|o| seen.insert(o.rule_id.as_str()))
        .cloned()
        .collect();
    kept.reverse();
    kept
}

fn is_skippable(line: &str) -> bool {
    line.is_empty() || line.starts_with('#') || line.starts_with(';')
}

fn checked_id(id: &str) -> Option<&str> {
    if id.is_empty() || id.chars().any(char::is_whitespace) {
        None
    } else {
        Some(id)
    }
}
