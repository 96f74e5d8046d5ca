//! Analyzer rule table loading for codestd.
//!
//! A rule table declares every rule a standards package knows about, with a
//! default severity and a rationale. Override directives adjust severities in
//! the order they are supplied; the last directive for a rule wins. Overrides
//! naming rules the table does not know are reported as warnings so newer
//! override files keep working against older tables.

mod error;
mod overrides;
mod severity;
mod table;

pub use error::{RuleError, UnknownRuleWarning};
pub use overrides::{collapse, parse_directives, parse_editorconfig, Override, OverrideAction};
pub use severity::Severity;
pub use table::{RuleEntry, RuleTable};

use std::fs;
use std::path::Path;

/// Result of loading a rule table and applying its overrides.
#[derive(Debug, Clone)]
pub struct LoadReport {
    pub table: RuleTable,

    /// Unknown-rule warnings, in directive order
    pub warnings: Vec<UnknownRuleWarning>,
}

impl LoadReport {
    /// `(ruleId, severity)` pairs for the analyzer front end.
    pub fn resolved(&self) -> Vec<(String, Severity)> {
        self.table.resolved()
    }
}

/// Collects a rule table and override directives, then applies them in one pass.
#[derive(Debug, Default)]
pub struct RuleSetLoader {
    table: RuleTable,
    overrides: Vec<Override>,
}

impl RuleSetLoader {
    pub fn new(table: RuleTable) -> Self {
        Self {
            table,
            overrides: Vec::new(),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, RuleError> {
        Ok(Self::new(RuleTable::from_file(path)?))
    }

    /// Queue directives after any already queued.
    pub fn add_overrides(&mut self, overrides: impl IntoIterator<Item = Override>) -> &mut Self {
        self.overrides.extend(overrides);
        self
    }

    /// Queue directives read from a file.
    ///
    /// Files named `*.editorconfig` or `*.globalconfig` are read as editorconfig;
    /// anything else as a directive list.
    pub fn add_override_file(&mut self, path: &Path) -> Result<&mut Self, RuleError> {
        let text = fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let origin = path.display().to_string();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let parsed = if name.ends_with("editorconfig") || name.ends_with("globalconfig") {
            parse_editorconfig(&text, &origin)?
        } else {
            parse_directives(&text, &origin)?
        };
        tracing::debug!(path = %origin, count = parsed.len(), "read override directives");

        Ok(self.add_overrides(parsed))
    }

    /// Apply every queued override.
    ///
    /// Unknown rules are returned on the report for the caller to print as one
    /// batch; they are only traced at debug level here.
    pub fn load(self) -> LoadReport {
        let Self { mut table, overrides } = self;
        let warnings = table.apply(&overrides);

        for warning in &warnings {
            tracing::debug!("{}", warning);
        }
        tracing::info!(
            rules = table.len(),
            overrides = overrides.len(),
            unknown = warnings.len(),
            "rule table loaded"
        );

        LoadReport { table, warnings }
    }
}
