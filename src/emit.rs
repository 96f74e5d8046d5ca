//! Output rendering for the build pipeline and analyzer front end

use std::fmt::Write as _;

use codestd_rules::Severity;
use serde::Serialize;

use crate::config::{EffectiveConfig, Resolved};
use crate::pipeline::RuleSeverity;

/// Render rule severities as an analyzer `.globalconfig`
pub fn render_globalconfig(rules: &[(String, Severity)]) -> String {
    let mut out = String::from("# Generated by codestd. Do not edit.\nis_global = true\n");
    if !rules.is_empty() {
        out.push('\n');
    }
    for (id, severity) in rules {
        let _ = writeln!(out, "dotnet_diagnostic.{}.severity = {}", id, severity);
    }
    out
}

/// Render rule severities as a JSON array of `{id, severity}`
pub fn render_rules_json(rules: &[(String, Severity)]) -> Result<String, serde_json::Error> {
    let entries: Vec<RuleSeverity> = rules
        .iter()
        .map(|(id, severity)| RuleSeverity {
            id: id.clone(),
            severity: *severity,
        })
        .collect();
    serde_json::to_string_pretty(&entries)
}

/// One line per property: `Name = value  [origin]`
pub fn render_config_human(config: &EffectiveConfig) -> String {
    let width = config.iter().map(|r| r.key.len()).max().unwrap_or(0);
    let mut out = String::new();
    for resolved in config.iter() {
        let _ = writeln!(
            out,
            "{:width$} = {}  [{}]",
            resolved.key,
            resolved.value.as_deref().unwrap_or(""),
            resolved.provenance.label(),
            width = width
        );
    }
    out
}

/// Single-property explanation for `codestd explain`
pub fn render_explain_human(resolved: &Resolved) -> String {
    match &resolved.value {
        Some(value) => format!(
            "{} = {}\n  from: {}",
            resolved.key,
            value,
            resolved.provenance.label()
        ),
        None => format!("{} is undefined", resolved.key),
    }
}

/// Pretty JSON for any serializable output
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(value)
}
