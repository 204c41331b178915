//! Per-field validators.
//!
//! [`validate`] is the single entry point; it routes a value to the routine for
//! its [`FieldKind`]. Every rule is evaluated independently, so one value may
//! produce several records.

pub mod cause;
pub mod common;
pub mod controls;
pub mod effect;
pub mod mechanism;
pub mod mode;

use fmea_kernel::{FieldKind, Row, ViolationRecord};
use fmea_ontology::RuleSet;

/// Validate one field value.
///
/// A required text field that is empty yields a single missing-field record
/// and no further checks.
pub fn validate(kind: FieldKind, value: &str, rules: &RuleSet) -> Vec<ViolationRecord> {
    if kind.is_score() {
        return common::score_text(rules, kind, value);
    }
    if value.trim().is_empty() {
        return if kind.is_required_text() {
            vec![common::missing(rules, kind)]
        } else {
            Vec::new()
        };
    }
    match kind {
        FieldKind::Mode => mode::validate(value, rules),
        FieldKind::Effect => effect::validate(value, rules),
        FieldKind::Cause => cause::validate(value, rules),
        FieldKind::Mechanism => mechanism::validate(value, rules),
        FieldKind::Prevention | FieldKind::Detection => controls::validate(kind, value, rules),
        FieldKind::Function => common::numbering_prefix(rules, kind, value)
            .into_iter()
            .collect(),
        FieldKind::Component
        | FieldKind::FunctionOrder
        | FieldKind::Severity
        | FieldKind::Occurrence
        | FieldKind::DetectionRating => Vec::new(),
    }
}

/// Validate every field of a row; records carry the row's id.
pub fn validate_row(row: &Row, rules: &RuleSet) -> Vec<ViolationRecord> {
    let mut out = Vec::new();
    for kind in fmea_kernel::ALL_FIELDS.iter().copied() {
        let records = match row.text(kind) {
            Some(text) => validate(kind, text, rules),
            None if kind == FieldKind::FunctionOrder => Vec::new(),
            None => common::score(rules, kind, row.score(kind)),
        };
        out.extend(records.into_iter().map(|record| record.at_row(row.id)));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmea_kernel::{Severity, rule_id};

    #[test]
    fn empty_required_field_is_one_blocking_record() {
        let rules = RuleSet::builtin();
        let out = validate(FieldKind::Mode, "   ", &rules);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rule_id, rule_id::FIELD_MISSING);
        assert_eq!(out[0].severity, Severity::Blocking);
        assert!(validate(FieldKind::Component, "", &rules).is_empty());
    }

    #[test]
    fn validation_is_deterministic() {
        let rules = RuleSet::builtin();
        let value = "부족: 피로 균열 후 소음 증가\n권선";
        assert_eq!(
            validate(FieldKind::Mode, value, &rules),
            validate(FieldKind::Mode, value, &rules)
        );
    }

    #[test]
    fn row_records_carry_the_row_id() {
        let rules = RuleSet::builtin();
        let row = Row {
            id: 7,
            ..Row::default()
        };
        let out = validate_row(&row, &rules);
        assert!(!out.is_empty());
        assert!(out.iter().all(|record| record.row_index == Some(7)));
        // S, O and D are all missing
        let missing_scores = out
            .iter()
            .filter(|record| {
                record.rule_id == rule_id::FIELD_MISSING
                    && ["severity", "occurrence", "detection_rating"].contains(&record.field.as_str())
            })
            .count();
        assert_eq!(missing_scores, 3);
    }
}
