//! Rule table: the set of analyzer rules a package ships.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use crate::error::{RuleError, UnknownRuleWarning};
use crate::overrides::{Override, OverrideAction};
use crate::severity::Severity;

/// One analyzer rule with its default and (optionally) overridden severity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleEntry {
    pub id: String,

    #[serde(rename = "severity")]
    pub default_severity: Severity,

    /// Why the rule is configured the way it is
    #[serde(default)]
    pub rationale: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub override_severity: Option<Severity>,
}

impl RuleEntry {
    pub fn new(id: impl Into<String>, default_severity: Severity, rationale: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            default_severity,
            rationale: rationale.into(),
            override_severity: None,
        }
    }

    /// Severity after overrides
    pub fn severity(&self) -> Severity {
        self.override_severity.unwrap_or(self.default_severity)
    }

    pub fn is_enabled(&self) -> bool {
        self.severity().is_enabled()
    }

    fn target_severity(&self, action: OverrideAction) -> Severity {
        match action {
            OverrideAction::Enable if self.default_severity.is_enabled() => self.default_severity,
            OverrideAction::Enable => Severity::Warning,
            OverrideAction::Disable => Severity::Off,
            OverrideAction::SetSeverity(severity) => severity,
        }
    }
}

/// On-disk layout of a rule table file.
#[derive(Debug, Deserialize)]
struct RuleTableFile {
    #[serde(default, rename = "rule")]
    rules: Vec<RuleEntry>,
}

/// Rules keyed by identifier, in declaration order.
///
/// Lookup is case-sensitive: `CA1062` and `ca1062` are different rules.
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    entries: Vec<RuleEntry>,
    index: HashMap<String, usize>,
}

impl RuleTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a TOML rule table with `[[rule]]` entries.
    pub fn from_toml_str(contents: &str) -> Result<Self, RuleError> {
        Self::parse(contents, "rule table")
    }

    pub fn from_file(path: &Path) -> Result<Self, RuleError> {
        let origin = path.display().to_string();
        let contents = fs::read_to_string(path).map_err(|source| RuleError::Io {
            path: origin.clone(),
            source,
        })?;
        Self::parse(&contents, &origin)
    }

    fn parse(contents: &str, origin: &str) -> Result<Self, RuleError> {
        let file: RuleTableFile =
            toml::from_str(contents).map_err(|e| RuleError::parse(origin, &e, contents))?;
        let mut table = Self::new();
        for entry in file.rules {
            table.insert(entry)?;
        }
        Ok(table)
    }

    /// Add a rule. Identifiers must be unique.
    pub fn insert(&mut self, entry: RuleEntry) -> Result<(), RuleError> {
        if entry.id.is_empty() || entry.id.chars().any(char::is_whitespace) {
            return Err(RuleError::InvalidRuleId(entry.id));
        }
        if self.index.contains_key(&entry.id) {
            return Err(RuleError::DuplicateRule(entry.id));
        }
        self.index.insert(entry.id.clone(), self.entries.len());
        self.entries.push(entry);
        Ok(())
    }

    pub fn get(&self, id: &str) -> Option<&RuleEntry> {
        self.index.get(id).map(|&i| &self.entries[i])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RuleEntry> {
        self.entries.iter()
    }

    /// Apply overrides in order; the last one for a rule wins.
    ///
    /// Overrides naming rules not in the table are skipped and returned as
    /// warnings, one per offending directive.
    pub fn apply(&mut self, overrides: &[Override]) -> Vec<UnknownRuleWarning> {
        let mut warnings = Vec::new();

        for directive in overrides {
            match self.index.get(&directive.rule_id) {
                Some(&i) => {
                    let entry = &mut self.entries[i];
                    entry.override_severity = Some(entry.target_severity(directive.action));
                }
                None => warnings.push(UnknownRuleWarning {
                    rule_id: directive.rule_id.clone(),
                    origin: directive.origin.clone(),
                }),
            }
        }

        warnings
    }

    /// `(ruleId, severity)` pairs for the analyzer front end, in declaration order.
    pub fn resolved(&self) -> Vec<(String, Severity)> {
        self.entries
            .iter()
            .map(|e| (e.id.clone(), e.severity()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[[rule]]
id = "CA1062"
severity = "warning"
rationale = "Validate arguments of public methods"

[[rule]]
id = "SA1101"
severity = "none"
rationale = "Prefix local calls with this is noise"

[[rule]]
id = "CA2007"
severity = "suggestion"
"#;

    #[test]
    fn test_from_toml_str() {
        let table = RuleTable::from_toml_str(SAMPLE).unwrap();
        assert_eq!(table.len(), 3);
        let rule = table.get("CA1062").unwrap();
        assert_eq!(rule.default_severity, Severity::Warning);
        assert_eq!(rule.rationale, "Validate arguments of public methods");
        assert_eq!(table.get("CA2007").unwrap().rationale, "");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let table = RuleTable::from_toml_str(SAMPLE).unwrap();
        assert!(table.get("CA1062").is_some());
        assert!(table.get("ca1062").is_none());
    }

    #[test]
    fn test_duplicate_rule_rejected() {
        let text = r#"
[[rule]]
id = "CA1062"
severity = "warning"

[[rule]]
id = "CA1062"
severity = "error"
"#;
        let err = RuleTable::from_toml_str(text).unwrap_err();
        assert!(matches!(err, RuleError::DuplicateRule(ref id) if id == "CA1062"));
    }

    #[test]
    fn test_empty_id_rejected() {
        let mut table = RuleTable::new();
        let err = table
            .insert(RuleEntry::new("", Severity::Warning, ""))
            .unwrap_err();
        assert!(matches!(err, RuleError::InvalidRuleId(_)));
    }

    #[test]
    fn test_invalid_severity_is_parse_error() {
        let text = r#"
[[rule]]
id = "CA1062"
severity = "loud"
"#;
        let err = RuleTable::from_toml_str(text).unwrap_err();
        assert!(matches!(err, RuleError::Parse { .. }));
        let message = err.to_string();
        assert!(message.contains("loud"), "{}", message);
        assert!(message.contains("line 4"), "{}", message);
        assert!(!message.contains('\n'));
    }

    #[test]
    fn test_parse_error_names_file() {
        use std::io::Write;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[[rule]]").unwrap();
        writeln!(file, "id = ").unwrap();

        let err = RuleTable::from_file(file.path()).unwrap_err();
        let message = err.to_string();
        assert!(message.contains(&file.path().display().to_string()));
        assert!(message.contains("line 2"), "{}", message);
        assert_eq!(message.lines().count(), 1);
    }

    #[test]
    fn test_table_accepts_directive_spellings() {
        let text = r#"
[[rule]]
id = "CA1062"
severity = "hidden"

[[rule]]
id = "CA2007"
severity = "Warning"

[[rule]]
id = "SA1101"
severity = "off"
"#;
        let table = RuleTable::from_toml_str(text).unwrap();
        assert_eq!(table.get("CA1062").unwrap().severity(), Severity::Silent);
        assert_eq!(table.get("CA2007").unwrap().severity(), Severity::Warning);
        assert_eq!(table.get("SA1101").unwrap().severity(), Severity::Off);
    }

    #[test]
    fn test_disable_then_enable_ends_enabled() {
        let mut table = RuleTable::from_toml_str(SAMPLE).unwrap();
        let warnings = table.apply(&[Override::disable("CA1062"), Override::enable("CA1062")]);
        assert!(warnings.is_empty());
        let rule = table.get("CA1062").unwrap();
        assert!(rule.is_enabled());
        assert_eq!(rule.severity(), Severity::Warning);
    }

    #[test]
    fn test_enable_rule_that_defaults_off() {
        let mut table = RuleTable::from_toml_str(SAMPLE).unwrap();
        table.apply(&[Override::enable("SA1101")]);
        assert_eq!(table.get("SA1101").unwrap().severity(), Severity::Warning);
    }

    #[test]
    fn test_unknown_rule_warns_and_continues() {
        let mut table = RuleTable::from_toml_str(SAMPLE).unwrap();
        let warnings = table.apply(&[
            Override::set_severity("CA9999", Severity::Error).with_origin("o.txt:1"),
            Override::set_severity("CA2007", Severity::Error),
        ]);
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].rule_id, "CA9999");
        assert_eq!(warnings[0].origin.as_deref(), Some("o.txt:1"));
        assert_eq!(table.get("CA2007").unwrap().severity(), Severity::Error);
    }

    #[test]
    fn test_resolved_keeps_declaration_order() {
        let mut table = RuleTable::from_toml_str(SAMPLE).unwrap();
        table.apply(&[Override::disable("CA1062")]);
        let resolved = table.resolved();
        assert_eq!(
            resolved,
            vec![
                ("CA1062".to_string(), Severity::Off),
                ("SA1101".to_string(), Severity::Off),
                ("CA2007".to_string(), Severity::Suggestion),
            ]
        );
    }
}
