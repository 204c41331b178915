//! Failure-cause field: `<stage>: <cause>` with one lifecycle stage.

use super::common::{numbering_prefix, violation};
use fmea_kernel::text::{detail_lines, primary_line};
use fmea_kernel::{FieldKind, LifecycleStage, Severity, ViolationRecord, rule_id};
use fmea_ontology::RuleSet;

const FIELD: FieldKind = FieldKind::Cause;

/// Lifecycle stage a cause value is tagged with, if exactly one.
pub fn stage_of(value: &str) -> Option<LifecycleStage> {
    let primary = primary_line(value);
    match LifecycleStage::tagged_in(primary).as_slice() {
        [stage] => Some(*stage),
        _ => None,
    }
}

/// Cause text without its stage tag.
pub fn content_of(value: &str) -> &str {
    let primary = primary_line(value);
    let Some(stage) = LifecycleStage::leading(primary) else {
        return primary.trim();
    };
    let rest = primary.trim_start();
    let rest = rest.strip_prefix('[').unwrap_or(rest);
    let rest = rest.strip_prefix(stage.label()).unwrap_or(rest);
    rest.trim_start_matches([':', '：', ']']).trim()
}

pub fn validate(value: &str, rules: &RuleSet) -> Vec<ViolationRecord> {
    let mut out = Vec::new();
    out.extend(numbering_prefix(rules, FIELD, value));

    let primary = primary_line(value);
    let stages = LifecycleStage::tagged_in(primary);
    match stages.len() {
        0 => out.push(
            violation(
                rules,
                FIELD,
                rule_id::CAUSE_TAG_MISSING,
                Severity::Blocking,
                "cause carries no lifecycle stage tag",
            )
            .with_suggestion("start with 설계:, 재료:, 제작: or 시험:"),
        ),
        1 => {}
        _ => {
            let labels: Vec<&str> = stages.iter().map(|stage| stage.label()).collect();
            out.push(violation(
                rules,
                FIELD,
                rule_id::CAUSE_TAG_MULTIPLE,
                Severity::Blocking,
                format!("cause carries several stage tags ({})", labels.join(", ")),
            ));
        }
    }

    if !stages.is_empty() && content_of(value).is_empty() {
        out.push(violation(
            rules,
            FIELD,
            rule_id::CAUSE_CONTENT_MISSING,
            Severity::Blocking,
            "stage tag is not followed by a cause",
        ));
    }

    if detail_lines(value).is_empty() {
        out.push(violation(
            rules,
            FIELD,
            rule_id::CAUSE_DETAIL_MISSING,
            Severity::Warning,
            "cause has no detail line",
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tagged_cause_with_detail_passes() {
        let rules = RuleSet::builtin();
        assert!(validate("제작: 브레이징 온도 부족\n(작업자 관리 미흡)", &rules).is_empty());
        assert_eq!(stage_of("제작: 브레이징 온도 부족"), Some(LifecycleStage::Fabrication));
        assert_eq!(content_of("제작: 브레이징 온도 부족"), "브레이징 온도 부족");
    }

    #[test]
    fn tag_problems_block() {
        let rules = RuleSet::builtin();
        let ids = |value: &str| -> Vec<String> {
            validate(value, &rules)
                .into_iter()
                .map(|record| record.rule_id)
                .collect()
        };
        assert!(ids("턴수 계산 오류\n(검증 누락)").contains(&rule_id::CAUSE_TAG_MISSING.to_string()));
        assert!(ids("설계: 재료: 혼용\n(x)").contains(&rule_id::CAUSE_TAG_MULTIPLE.to_string()));
        assert!(ids("설계:\n(x)").contains(&rule_id::CAUSE_CONTENT_MISSING.to_string()));
        assert_eq!(stage_of("설계: 재료: 혼용"), None);
    }
}
