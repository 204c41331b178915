//! Failure-mechanism field: a chain of at least three stages,
//! `initial state -> process -> final state`.

use super::common::violation;
use fmea_kernel::text::{arrow_count, mechanism_stages};
use fmea_kernel::{FieldKind, Severity, ViolationRecord, rule_id};
use fmea_ontology::RuleSet;

const FIELD: FieldKind = FieldKind::Mechanism;

/// Fewest arrows a valid chain carries.
pub const MIN_ARROWS: usize = 2;

pub fn validate(value: &str, rules: &RuleSet) -> Vec<ViolationRecord> {
    let mut out = Vec::new();
    let trimmed = value.trim();

    if let Some(keyword) = rules
        .mechanism_forbidden_exact
        .iter()
        .find(|keyword| keyword.as_str() == trimmed)
    {
        out.push(
            violation(
                rules,
                FIELD,
                rule_id::MECHANISM_CAUSE_KEYWORD,
                Severity::Blocking,
                format!("'{keyword}' names a cause, not a mechanism"),
            )
            .with_suggestion("describe how the cause develops into the mode, stage by stage"),
        );
    }

    let arrows = arrow_count(trimmed);
    if arrows < MIN_ARROWS {
        out.push(
            violation(
                rules,
                FIELD,
                rule_id::MECHANISM_CHAIN_TOO_SHORT,
                Severity::Blocking,
                format!(
                    "mechanism has {} stage(s), expected at least {}",
                    arrows + 1,
                    MIN_ARROWS + 1
                ),
            )
            .with_suggestion("initial state -> process -> final state"),
        );
    } else if mechanism_stages(trimmed).iter().any(|stage| stage.is_empty()) {
        out.push(violation(
            rules,
            FIELD,
            rule_id::MECHANISM_EMPTY_STAGE,
            Severity::Blocking,
            "mechanism chain has an empty stage",
        ));
    }
    out
}
