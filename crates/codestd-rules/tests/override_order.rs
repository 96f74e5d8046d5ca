//! Ordering properties of override application.

use std::collections::HashSet;

use codestd_rules::{collapse, Override, RuleEntry, RuleTable, Severity};
use proptest::prelude::*;

const IDS: &[&str] = &["CA1062", "CA2007", "SA1101", "SA1633", "IDE0055", "CA9999"];

fn base_table() -> RuleTable {
    let mut table = RuleTable::new();
    table.insert(RuleEntry::new("CA1062", Severity::Warning, "")).unwrap();
    table.insert(RuleEntry::new("CA2007", Severity::Suggestion, "")).unwrap();
    table.insert(RuleEntry::new("SA1101", Severity::Off, "")).unwrap();
    table.insert(RuleEntry::new("SA1633", Severity::Error, "")).unwrap();
    table.insert(RuleEntry::new("IDE0055", Severity::Silent, "")).unwrap();
    table
}

fn severity() -> impl Strategy<Value = Severity> {
    prop_oneof![
        Just(Severity::Off),
        Just(Severity::Silent),
        Just(Severity::Suggestion),
        Just(Severity::Warning),
        Just(Severity::Error),
    ]
}

fn directive() -> impl Strategy<Value = Override> {
    (0..IDS.len(), 0u8..3, severity()).prop_map(|(i, op, sev)| match op {
        0 => Override::enable(IDS[i]),
        1 => Override::disable(IDS[i]),
        _ => Override::set_severity(IDS[i], sev),
    })
}

proptest! {
    #[test]
    fn last_override_per_rule_decides(overrides in prop::collection::vec(directive(), 0..40)) {
        let mut forward = base_table();
        forward.apply(&overrides);

        // Walk backwards keeping the first directive seen per rule, then apply.
        let mut seen = HashSet::new();
        let reversed_last_wins: Vec<Override> = overrides
            .iter()
            .rev()
            .filter(|o| seen.insert(o.rule_id.clone()))
            .cloned()
            .collect();
        let mut backward = base_table();
        backward.apply(&reversed_last_wins);

        prop_assert_eq!(forward.resolved(), backward.resolved());
    }

    #[test]
    fn collapse_is_equivalent(overrides in prop::collection::vec(directive(), 0..40)) {
        let mut full = base_table();
        full.apply(&overrides);

        let mut collapsed = base_table();
        collapsed.apply(&collapse(&overrides));

        prop_assert_eq!(full.resolved(), collapsed.resolved());
    }

    #[test]
    fn one_warning_per_unknown_directive(overrides in prop::collection::vec(directive(), 0..40)) {
        let mut table = base_table();
        let warnings = table.apply(&overrides);
        let expected = overrides.iter().filter(|o| o.rule_id == "CA9999").count();
        prop_assert_eq!(warnings.len(), expected);
    }
}

#[test]
fn disable_then_enable_leaves_rule_enabled() {
    let mut table = base_table();
    table.apply(&[Override::disable("CA1062"), Override::enable("CA1062")]);
    assert!(table.get("CA1062").unwrap().is_enabled());
}

#[test]
fn unknown_rule_yields_single_warning() {
    let mut table = base_table();
    let warnings = table.apply(&[
        Override::disable("CA2007"),
        Override::set_severity("CA9999", Severity::Error),
        Override::set_severity("SA1101", Severity::Warning),
    ]);

    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].rule_id, "CA9999");
    assert_eq!(table.get("CA2007").unwrap().severity(), Severity::Off);
    assert_eq!(table.get("SA1101").unwrap().severity(), Severity::Warning);
}
