//! Failure-mode field.
//!
//! Layout: `<tag> <visible phenomenon>` on the primary line, then up to two
//! parenthesized lines (detail, and a judgment line repeating the tag). Only
//! the primary line is scanned for forbidden keywords.

use super::common::{numbering_prefix, quoted, violation};
use fmea_kernel::text::{after_marker, is_parenthesized, lines, primary_line};
use fmea_kernel::{FieldKind, Severity, ViolationRecord, rule_id};
use fmea_ontology::RuleSet;
use fmea_ontology::matcher::find_keywords;

const FIELD: FieldKind = FieldKind::Mode;

/// Category the mechanism keyword table reports under.
pub const MECHANISM_CATEGORY: &str = "mechanism";

/// Where a forbidden keyword of each category belongs instead.
const CATEGORY_HINTS: &[(&str, &str)] = &[
    (MECHANISM_CATEGORY, "move the process description to the mechanism field"),
    ("measurement", "measured changes belong in the effect or mechanism field"),
    ("future_result", "downstream results belong in the effect field"),
    ("abstract", "name the concrete, visible phenomenon"),
    ("function", "describe what is observed, not the lost function"),
];

fn category_hint(category: &str) -> Option<&'static str> {
    CATEGORY_HINTS
        .iter()
        .find_map(|(name, hint)| (*name == category).then_some(*hint))
}

/// The tag markers found on the primary line, earliest first.
pub fn tags_in<'r>(rules: &'r RuleSet, primary: &str) -> Vec<&'r str> {
    let mut found: Vec<(usize, &str)> = rules
        .required_tags
        .iter()
        .filter_map(|tag| primary.find(tag.as_str()).map(|at| (at, tag.as_str())))
        .collect();
    found.sort();
    found.into_iter().map(|(_, tag)| tag).collect()
}

pub fn validate(value: &str, rules: &RuleSet) -> Vec<ViolationRecord> {
    let mut out = Vec::new();
    out.extend(numbering_prefix(rules, FIELD, value));

    let primary = primary_line(value);
    let tags = tags_in(rules, primary);
    match tags.len() {
        0 => out.push(
            violation(
                rules,
                FIELD,
                rule_id::MODE_TAG_MISSING,
                Severity::Blocking,
                "primary line carries no mode tag",
            )
            .with_suggestion(format!(
                "start with one of {}",
                rules.required_tags.join(" / ")
            )),
        ),
        1 => {}
        _ => out.push(violation(
            rules,
            FIELD,
            rule_id::MODE_TAG_MULTIPLE,
            Severity::Blocking,
            format!("primary line carries {} tags ({}), expected one", tags.len(), tags.join(" ")),
        )),
    }
    let tag = tags.first().copied();
    let content = match tag {
        Some(tag) => after_marker(primary, tag),
        None => primary.trim(),
    };

    if content.is_empty() {
        out.push(violation(
            rules,
            FIELD,
            rule_id::MODE_CONTENT_MISSING,
            Severity::Blocking,
            "tag is not followed by a phenomenon",
        ));
    } else {
        check_content(rules, tag, content, &mut out);
    }

    check_layout(rules, tag, value, &mut out);
    out
}

fn check_content(
    rules: &RuleSet,
    tag: Option<&str>,
    content: &str,
    out: &mut Vec<ViolationRecord>,
) {
    let exemptions = rules.exemptions(content);

    let categories = std::iter::once((MECHANISM_CATEGORY, rules.mechanism_keywords.as_slice()))
        .chain(
            rules
                .mode_forbidden
                .iter()
                .map(|(category, keywords)| (category.as_str(), keywords.as_slice())),
        );
    for (category, keywords) in categories {
        let hits = exemptions.find_unexempted(content, keywords);
        if hits.is_empty() {
            continue;
        }
        let rule = format!("{}.{category}", rule_id::MODE_FORBIDDEN);
        let mut record = violation(
            rules,
            FIELD,
            &rule,
            Severity::Blocking,
            format!("{category} keyword {} in failure mode", quoted(&hits)),
        );
        if let Some(hint) = category_hint(category) {
            record = record.with_suggestion(hint);
        }
        out.push(record);
    }

    if let Some(exact) = rules.mode_forbidden_exact.iter().find(|kw| kw.as_str() == content) {
        out.push(
            violation(
                rules,
                FIELD,
                rule_id::MODE_FORBIDDEN_EXACT,
                Severity::Blocking,
                format!("'{exact}' alone is too generic for a failure mode"),
            )
            .with_suggestion("name the concrete, visible phenomenon"),
        );
    }

    if let Some(rule) = tag.and_then(|tag| rules.tag_keywords.get(tag)) {
        let hits = exemptions.find_unexempted(content, &rule.forbidden);
        if !hits.is_empty() {
            out.push(violation(
                rules,
                FIELD,
                rule_id::MODE_TAG_CONTENT_MISMATCH,
                Severity::Blocking,
                format!(
                    "{} contradicts the tag '{}'",
                    quoted(&hits),
                    tag.unwrap_or_default()
                ),
            ));
        }
    }

    for (concept, visibles) in &rules.abstract_to_visible {
        let concept_list = std::slice::from_ref(concept);
        if exemptions.find_unexempted(content, concept_list).is_empty() {
            continue;
        }
        let examples: Vec<&str> = visibles.iter().take(3).map(String::as_str).collect();
        out.push(
            violation(
                rules,
                FIELD,
                rule_id::MODE_ABSTRACT_CONCEPT,
                Severity::Blocking,
                format!("'{concept}' needs an instrument to observe"),
            )
            .with_suggestion(format!("use a visible phenomenon such as {}", examples.join(", "))),
        );
    }

    let clean = !out.iter().any(ViolationRecord::is_blocking);
    if clean
        && !rules.visible_phenomena.is_empty()
        && find_keywords(content, &rules.visible_phenomena).is_empty()
    {
        out.push(violation(
            rules,
            FIELD,
            rule_id::MODE_VISIBILITY_UNCONFIRMED,
            Severity::Info,
            format!("'{content}' is not a listed visible phenomenon"),
        ));
    }
}

fn check_layout(rules: &RuleSet, tag: Option<&str>, value: &str, out: &mut Vec<ViolationRecord>) {
    let lines = lines(value);
    if let Some(detail) = lines.get(1)
        && !is_parenthesized(detail)
    {
        out.push(
            violation(
                rules,
                FIELD,
                rule_id::MODE_DETAIL_FORMAT,
                Severity::Warning,
                "second line should be a parenthesized detail",
            )
            .with_suggestion(format!("({detail})")),
        );
    }
    if let Some(judgment) = lines.get(2) {
        let tagged = tag.is_some_and(|tag| judgment.contains(tag.trim_end_matches(':')));
        if !is_parenthesized(judgment) || !tagged {
            out.push(violation(
                rules,
                FIELD,
                rule_id::MODE_JUDGMENT_TAG,
                Severity::Warning,
                "third line should be a parenthesized judgment naming the same tag",
            ));
        }
    }
    if lines.len() > 3 {
        out.push(violation(
            rules,
            FIELD,
            rule_id::MODE_TOO_MANY_LINES,
            Severity::Warning,
            format!("{} lines, expected at most 3", lines.len()),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule_ids(value: &str) -> Vec<String> {
        validate(value, &RuleSet::builtin())
            .into_iter()
            .map(|record| record.rule_id)
            .collect()
    }

    #[test]
    fn clean_mode_has_no_findings() {
        assert!(rule_ids("부족: 단선").is_empty());
        assert!(rule_ids("과도: 변형\n(권선 말단부)\n(과도 판정: 치수 초과)").is_empty());
    }

    #[test]
    fn missing_and_multiple_tags_block() {
        assert!(rule_ids("단선").contains(&rule_id::MODE_TAG_MISSING.to_string()));
        assert!(rule_ids("부족: 과도: 단선").contains(&rule_id::MODE_TAG_MULTIPLE.to_string()));
        assert!(rule_ids("부족:").contains(&rule_id::MODE_CONTENT_MISSING.to_string()));
    }

    #[test]
    fn every_violated_category_is_reported() {
        let ids = rule_ids("부족: 피로 균열 후 소음 증가");
        assert!(ids.contains(&"mode.forbidden.mechanism".to_string()));
        assert!(ids.contains(&"mode.forbidden.future_result".to_string()));
        assert!(ids.contains(&"mode.forbidden.measurement".to_string()));
    }

    #[test]
    fn explanation_lines_are_not_scanned() {
        let ids = rule_ids("부족: 이완\n(진동으로 체결력 저하)");
        assert!(ids.is_empty(), "{ids:?}");
    }

    #[test]
    fn compound_words_are_exempt() {
        assert!(rule_ids("부족: 접촉불량").is_empty());
        let ids = rule_ids("부족: 도금불량");
        assert!(ids.contains(&"mode.forbidden.abstract".to_string()));
    }

    #[test]
    fn abstract_concepts_suggest_visible_phenomena() {
        let records = validate("부족: 체결력", &RuleSet::builtin());
        let abstract_concept = records
            .iter()
            .find(|record| record.rule_id == rule_id::MODE_ABSTRACT_CONCEPT)
            .expect("abstract concept finding");
        assert_eq!(
            abstract_concept.suggestion.as_deref(),
            Some("use a visible phenomenon such as 풀림, 이완, 헐거움")
        );
    }

    #[test]
    fn tag_content_contradiction_blocks() {
        let ids = rule_ids("부족: 과다 돌출");
        assert!(ids.contains(&rule_id::MODE_TAG_CONTENT_MISMATCH.to_string()));
    }

    #[test]
    fn layout_rules_warn() {
        let ids = rule_ids("부족: 단선\n권선 말단\n(판정)");
        assert!(ids.contains(&rule_id::MODE_DETAIL_FORMAT.to_string()));
        assert!(ids.contains(&rule_id::MODE_JUDGMENT_TAG.to_string()));
    }
}
