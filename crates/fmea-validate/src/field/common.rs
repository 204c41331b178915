//! Checks shared by several field kinds.

use fmea_kernel::{FieldKind, Severity, ViolationRecord, rule_id};
use fmea_ontology::RuleSet;
use regex::Regex;
use std::sync::OnceLock;

/// Valid range for S, O and D scores.
pub const SCORE_RANGE: std::ops::RangeInclusive<i64> = 1..=10;

/// A violation whose severity honors the rule set's overrides.
pub fn violation(
    rules: &RuleSet,
    field: FieldKind,
    rule: &str,
    default: Severity,
    message: impl Into<String>,
) -> ViolationRecord {
    ViolationRecord::new(field.as_str(), rules.severity_for(rule, default), rule, message)
}

pub fn missing(rules: &RuleSet, field: FieldKind) -> ViolationRecord {
    violation(
        rules,
        field,
        rule_id::FIELD_MISSING,
        Severity::Blocking,
        format!("required field `{field}` is empty"),
    )
}

fn numbering_patterns() -> &'static [Regex] {
    static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
    PATTERNS.get_or_init(|| {
        [
            r"^(기능|고장영향|고장형태|고장원인|영향|형태|원인)\s*\d+\s*:",
            r"^\d+\s*[:.)]",
            r"^[①-⑩]",
        ]
        .iter()
        .filter_map(|pattern| Regex::new(pattern).ok())
        .collect()
    })
}

/// Enumeration prefixes (`기능1:`, `1.`, `①`) are layout, not content.
pub fn numbering_prefix(rules: &RuleSet, field: FieldKind, value: &str) -> Option<ViolationRecord> {
    let first = value.trim_start();
    let found = numbering_patterns()
        .iter()
        .find_map(|re| re.find(first))?;
    Some(
        violation(
            rules,
            field,
            rule_id::NUMBERING_PREFIX,
            Severity::Blocking,
            format!("value starts with a numbering prefix `{}`", found.as_str()),
        )
        .with_suggestion("remove the numbering; row order carries the sequence"),
    )
}

/// Range check for a parsed S/O/D score.
pub fn score(rules: &RuleSet, field: FieldKind, value: Option<i64>) -> Vec<ViolationRecord> {
    match value {
        None => vec![violation(
            rules,
            field,
            rule_id::FIELD_MISSING,
            Severity::Blocking,
            format!("score `{field}` is missing"),
        )],
        Some(score) if !SCORE_RANGE.contains(&score) => vec![violation(
            rules,
            field,
            rule_id::SCORE_OUT_OF_RANGE,
            Severity::Blocking,
            format!("score `{field}` is {score}, expected 1 to 10"),
        )],
        Some(_) => Vec::new(),
    }
}

/// Range check for a score given as text.
pub fn score_text(rules: &RuleSet, field: FieldKind, value: &str) -> Vec<ViolationRecord> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return score(rules, field, None);
    }
    match trimmed.parse::<i64>() {
        Ok(parsed) => score(rules, field, Some(parsed)),
        Err(_) => vec![violation(
            rules,
            field,
            rule_id::SCORE_NOT_NUMERIC,
            Severity::Blocking,
            format!("score `{field}` is `{trimmed}`, expected a whole number"),
        )],
    }
}

/// Quote a keyword list for messages: `'a', 'b'`.
pub fn quoted(keywords: &[&str]) -> String {
    keywords
        .iter()
        .map(|keyword| format!("'{keyword}'"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbering_prefixes_are_detected() {
        let rules = RuleSet::builtin();
        for value in ["기능1: 지지", "1. 전류 통전", "2) 지지", "① 절연"] {
            assert!(
                numbering_prefix(&rules, FieldKind::Function, value).is_some(),
                "{value}"
            );
        }
        assert!(numbering_prefix(&rules, FieldKind::Function, "전류를 흘린다").is_none());
        assert!(numbering_prefix(&rules, FieldKind::Effect, "10kV 절연 유지").is_none());
    }

    #[test]
    fn scores_outside_one_to_ten_block() {
        let rules = RuleSet::builtin();
        assert!(score(&rules, FieldKind::Severity, Some(7)).is_empty());
        let out = score(&rules, FieldKind::Severity, Some(11));
        assert_eq!(out[0].rule_id, rule_id::SCORE_OUT_OF_RANGE);
        let missing = score(&rules, FieldKind::Occurrence, None);
        assert_eq!(missing[0].rule_id, rule_id::FIELD_MISSING);
        let text = score_text(&rules, FieldKind::DetectionRating, "높음");
        assert_eq!(text[0].rule_id, rule_id::SCORE_NOT_NUMERIC);
    }
}
