//! Prevention and detection controls.
//!
//! Both are multi-line, one measure per lifecycle stage plus detail lines:
//!
//! ```text
//! 설계: 클램프 강도 설계 검토 (CHECK SHEET)
//! - 허용응력 계산: 안전율 2.0 이상 (IEQT-T-C018)
//! 재료: 클램프 자재 수입검사 (IEQT-T-R018)
//! - 재질증명서 확인: SS400 이상
//! ```
//!
//! Prevention needs a quantitative value; detection needs acceptance criteria.

use super::common::{quoted, violation};
use fmea_kernel::text::lines;
use fmea_kernel::{FieldKind, LifecycleStage, Severity, ViolationRecord, rule_id};
use fmea_ontology::matcher::{contains_keyword, find_keywords};
use fmea_ontology::{RuleSet, ValuePatterns};
use regex::Regex;
use std::sync::OnceLock;

fn parenthesized() -> Option<&'static Regex> {
    static SOURCE: OnceLock<Option<Regex>> = OnceLock::new();
    SOURCE
        .get_or_init(|| Regex::new(r"\(([^)]+)\)").ok())
        .as_ref()
}

fn has_digit(line: &str) -> bool {
    line.chars().any(|c| c.is_ascii_digit())
}

pub fn validate(field: FieldKind, value: &str, rules: &RuleSet) -> Vec<ViolationRecord> {
    let mut out = Vec::new();
    let lines = lines(value);
    let required = &rules.controls;

    if lines.len() < required.min_lines {
        out.push(
            violation(
                rules,
                field,
                rule_id::CONTROLS_LINE_COUNT,
                Severity::Blocking,
                format!("{} line(s), expected at least {}", lines.len(), required.min_lines),
            )
            .with_suggestion("one line per lifecycle stage followed by its detail lines"),
        );
    }

    let stages = LifecycleStage::tagged_in(value);
    if stages.len() < required.min_lifecycle_tags {
        let found = if stages.is_empty() {
            "none".to_string()
        } else {
            stages
                .iter()
                .map(|stage| stage.label())
                .collect::<Vec<_>>()
                .join(", ")
        };
        out.push(
            violation(
                rules,
                field,
                rule_id::CONTROLS_LIFECYCLE_COVERAGE,
                Severity::Blocking,
                format!(
                    "lifecycle tags found: {found}; expected at least {} of 설계, 재료, 제작, 시험",
                    required.min_lifecycle_tags
                ),
            ),
        );
    }

    let patterns = &rules.value_patterns;
    if field == FieldKind::Prevention
        && !ValuePatterns::any_match(&patterns.quantitative, value)
    {
        out.push(
            violation(
                rules,
                field,
                rule_id::CONTROLS_QUANTITATIVE_MISSING,
                Severity::Warning,
                "no quantitative value (number with unit)",
            )
            .with_suggestion("state the limit, e.g. 45±5 N.m, 안전율 2.0 이상, 110%"),
        );
    }
    if field == FieldKind::Detection && !ValuePatterns::any_match(&patterns.criteria, value) {
        out.push(
            violation(
                rules,
                field,
                rule_id::DETECTION_CRITERIA_MISSING,
                Severity::Warning,
                "no acceptance criterion",
            )
            .with_suggestion("state what passes, e.g. 크랙 없음, 2mm 이하"),
        );
    }
    if !ValuePatterns::any_match(&patterns.source_reference, value) {
        out.push(
            violation(
                rules,
                field,
                rule_id::CONTROLS_SOURCE_MISSING,
                Severity::Warning,
                "no source reference",
            )
            .with_suggestion("cite the document, e.g. (IEQT-T-W030 §3.2) or (CHECK SHEET)"),
        );
    }

    out.extend(forbidden_sources(field, value, rules));

    let vague: Vec<&str> = rules
        .vague_expressions
        .iter()
        .filter(|word| {
            lines
                .iter()
                .any(|line| line.contains(word.as_str()) && !has_digit(line))
        })
        .map(String::as_str)
        .collect();
    if !vague.is_empty() {
        out.push(
            violation(
                rules,
                field,
                rule_id::CONTROLS_VAGUE_EXPRESSION,
                Severity::Warning,
                format!("vague expression {} without a value", quoted(&vague)),
            )
            .with_suggestion("replace with a measurable limit"),
        );
    }

    for (abbreviation, expansion) in &rules.abbreviations {
        if contains_keyword(value, abbreviation) && !value.contains(expansion.as_str()) {
            out.push(
                violation(
                    rules,
                    field,
                    rule_id::CONTROLS_ABBREVIATION,
                    Severity::Info,
                    format!("abbreviation '{abbreviation}'"),
                )
                .with_suggestion(format!("write '{expansion}'")),
            );
        }
    }
    out
}

/// Generic source names are not references; a citation that also names an
/// approved document is fine.
fn forbidden_sources(field: FieldKind, value: &str, rules: &RuleSet) -> Vec<ViolationRecord> {
    let Some(re) = parenthesized() else {
        return Vec::new();
    };
    let mut seen: Vec<&str> = Vec::new();
    for source in re.captures_iter(value).filter_map(|caps| caps.get(1)) {
        let source = source.as_str();
        if rules
            .approved_sources
            .iter()
            .any(|approved| source.contains(approved.as_str()))
        {
            continue;
        }
        for keyword in find_keywords(source, &rules.forbidden_sources) {
            if !seen.contains(&keyword) {
                seen.push(keyword);
            }
        }
    }
    if seen.is_empty() {
        return Vec::new();
    }
    vec![
        violation(
            rules,
            field,
            rule_id::CONTROLS_FORBIDDEN_SOURCE,
            Severity::Warning,
            format!("generic source {} without a document number", quoted(&seen)),
        )
        .with_suggestion("cite the exact document number"),
    ]
}
