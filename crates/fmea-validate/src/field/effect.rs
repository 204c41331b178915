//! Failure-effect field: a consequence at system level, never a physical state
//! of the part (that is the mode) nor an inspection outcome.

use super::common::{numbering_prefix, quoted, violation};
use fmea_kernel::text::{detail_lines, primary_line};
use fmea_kernel::{FieldKind, Severity, ViolationRecord, rule_id};
use fmea_ontology::RuleSet;

const FIELD: FieldKind = FieldKind::Effect;

pub fn validate(value: &str, rules: &RuleSet) -> Vec<ViolationRecord> {
    let mut out = Vec::new();
    out.extend(numbering_prefix(rules, FIELD, value));

    let primary = primary_line(value);
    let exemptions = rules.exemptions(primary);
    for (category, keywords) in &rules.effect_forbidden {
        let hits = exemptions.find_unexempted(primary, keywords);
        if hits.is_empty() {
            continue;
        }
        let rule = format!("{}.{category}", rule_id::EFFECT_FORBIDDEN);
        let suggestion = if category == "inspection_result" {
            "state the consequence for the equipment, not the test verdict"
        } else {
            "physical states of the part belong in the failure mode"
        };
        out.push(
            violation(
                rules,
                FIELD,
                &rule,
                Severity::Blocking,
                format!("{category} keyword {} in failure effect", quoted(&hits)),
            )
            .with_suggestion(suggestion),
        );
    }

    if detail_lines(value).is_empty() {
        out.push(
            violation(
                rules,
                FIELD,
                rule_id::EFFECT_DETAIL_MISSING,
                Severity::Warning,
                "effect has no parenthesized detail line",
            )
            .with_suggestion("add the affected function or range on a second line"),
        );
    }
    out
}
