//! Cross-field consistency between two fields of one row.
//!
//! Each relation runs a fixed sequence of evidence steps. A step either has no
//! evidence (both sides must say something it understands), passes, or fails;
//! the first failing step produces the relation's only violation and ends the
//! evaluation. Steps without evidence never count against the row.
//!
//! | step | rule | default severity |
//! |------|------|------------------|
//! | forbidden pair | `cross.forbidden_pair` | BLOCKING |
//! | domain categories | `cross.domain_mismatch` | WARNING |
//! | keyword compatibility | `cross.keyword_incompatible` | WARNING |
//! | lifecycle hints | `cross.lifecycle_mismatch` | WARNING |
//! | chain endpoint (mechanism->mode) | `cross.chain_endpoint` | WARNING |

use crate::field::{cause, common::quoted, mode};
use fmea_kernel::text::{arrow_count, mechanism_stages, primary_line};
use fmea_kernel::{
    ALL_RELATIONS, ALL_STAGES, FieldKind, Relation, Row, Severity,
    ViolationRecord, rule_id,
};
use fmea_ontology::RuleSet;
use fmea_ontology::matcher::{contains_keyword, find_keywords};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckStatus {
    Passed,
    Failed,
    Skipped,
}

/// Result of one relation on one pair of values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PairCheck {
    pub relation: Relation,
    pub status: CheckStatus,
    /// Steps that found evidence, in evaluation order.
    pub evidence: Vec<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub violation: Option<ViolationRecord>,
}

/// Per-row summary of every relation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowConsistency {
    pub row_index: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    /// passed / (passed + failed); 1.0 when no relation had evidence.
    pub score: f64,
    pub relations: BTreeMap<Relation, CheckStatus>,
}

enum Step {
    NoEvidence,
    Pass,
    Fail(ViolationRecord),
}

struct Side<'a> {
    kind: FieldKind,
    value: &'a str,
    /// Text keyword rules look at.
    subject: &'a str,
}

impl<'a> Side<'a> {
    fn new(kind: FieldKind, value: &'a str) -> Self {
        let subject = match kind {
            FieldKind::Mechanism | FieldKind::Prevention | FieldKind::Detection => value.trim(),
            _ => primary_line(value),
        };
        Self {
            kind,
            value,
            subject,
        }
    }
}

/// Violations of `relation` between `a` (source) and `b` (target).
pub fn validate_pair(a: &str, b: &str, relation: Relation, rules: &RuleSet) -> Vec<ViolationRecord> {
    check_pair(a, b, relation, rules).violation.into_iter().collect()
}

/// Evaluate `relation` between `a` and `b`, keeping the evidence trail.
pub fn check_pair(a: &str, b: &str, relation: Relation, rules: &RuleSet) -> PairCheck {
    let (left_kind, right_kind) = relation.endpoints();
    let left = Side::new(left_kind, a);
    let right = Side::new(right_kind, b);

    let mut check = PairCheck {
        relation,
        status: CheckStatus::Skipped,
        evidence: Vec::new(),
        violation: None,
    };
    if left.subject.is_empty() || right.subject.is_empty() {
        return check;
    }

    type StepFn = fn(&Side<'_>, &Side<'_>, Relation, &RuleSet) -> Step;
    let steps: [(&'static str, StepFn); 5] = [
        ("forbidden_pair", forbidden_pair),
        ("domain", domain),
        ("compatibility", compatibility),
        ("lifecycle", lifecycle),
        ("chain_endpoint", chain_endpoint),
    ];
    for (name, step) in steps {
        match step(&left, &right, relation, rules) {
            Step::NoEvidence => {}
            Step::Pass => {
                check.evidence.push(name);
                check.status = CheckStatus::Passed;
            }
            Step::Fail(record) => {
                check.evidence.push(name);
                check.status = CheckStatus::Failed;
                check.violation = Some(record);
                break;
            }
        }
    }
    check
}

/// Every relation of one row, with its consistency score.
pub fn check_row_pairs(row: &Row, rules: &RuleSet) -> (RowConsistency, Vec<ViolationRecord>) {
    let mut consistency = RowConsistency {
        row_index: row.id,
        passed: 0,
        failed: 0,
        skipped: 0,
        score: 1.0,
        relations: BTreeMap::new(),
    };
    let mut violations = Vec::new();

    for relation in ALL_RELATIONS.iter().copied() {
        let (left, right) = relation.endpoints();
        let a = row.text(left).unwrap_or_default();
        let b = row.text(right).unwrap_or_default();
        let check = check_pair(a, b, relation, rules);
        match check.status {
            CheckStatus::Passed => consistency.passed += 1,
            CheckStatus::Failed => consistency.failed += 1,
            CheckStatus::Skipped => consistency.skipped += 1,
        }
        consistency.relations.insert(relation, check.status);
        violations.extend(check.violation.map(|record| record.at_row(row.id)));
    }

    let evaluated = consistency.passed + consistency.failed;
    if evaluated > 0 {
        consistency.score = consistency.passed as f64 / evaluated as f64;
    }
    tracing::debug!(
        row = row.id,
        passed = consistency.passed,
        failed = consistency.failed,
        skipped = consistency.skipped,
        "cross-field checks"
    );
    (consistency, violations)
}

fn record(
    rules: &RuleSet,
    relation: Relation,
    rule: &str,
    default: Severity,
    message: String,
) -> ViolationRecord {
    ViolationRecord::new(relation.as_str(), rules.severity_for(rule, default), rule, message)
}

fn forbidden_pair(left: &Side<'_>, right: &Side<'_>, relation: Relation, rules: &RuleSet) -> Step {
    let Some(pairs) = rules.forbidden_pairs.get(&relation) else {
        return Step::NoEvidence;
    };
    let left_exempt = rules.exemptions(left.subject);
    let right_exempt = rules.exemptions(right.subject);
    for pair in pairs {
        if left_exempt
            .find_unexempted(left.subject, std::slice::from_ref(&pair.left))
            .is_empty()
        {
            continue;
        }
        let hits = right_exempt.find_unexempted(right.subject, &pair.right);
        if !hits.is_empty() {
            return Step::Fail(
                record(
                    rules,
                    relation,
                    rule_id::CROSS_FORBIDDEN_PAIR,
                    Severity::Blocking,
                    format!(
                        "{} '{}' cannot go with {} {}",
                        left.kind,
                        pair.left,
                        right.kind,
                        quoted(&hits)
                    ),
                )
                .with_suggestion(format!("revisit the {} for this {}", right.kind, left.kind)),
            );
        }
    }
    // an explicit table without a hit says nothing about consistency
    Step::NoEvidence
}

fn domain(left: &Side<'_>, right: &Side<'_>, relation: Relation, rules: &RuleSet) -> Step {
    let left_domains = rules.classify_domains(left.subject);
    let right_domains = rules.classify_domains(right.subject);
    if left_domains.is_empty() || right_domains.is_empty() {
        return Step::NoEvidence;
    }
    if left_domains.is_disjoint(&right_domains) {
        return Step::Fail(record(
            rules,
            relation,
            rule_id::CROSS_DOMAIN_MISMATCH,
            Severity::Warning,
            format!(
                "{} is {} but {} is {}",
                left.kind,
                join_domains(&left_domains),
                right.kind,
                join_domains(&right_domains)
            ),
        ));
    }
    Step::Pass
}

fn join_domains(domains: &BTreeSet<&str>) -> String {
    domains.iter().copied().collect::<Vec<_>>().join(", ")
}

fn compatibility(left: &Side<'_>, right: &Side<'_>, relation: Relation, rules: &RuleSet) -> Step {
    let Some(table) = rules.compatibility.get(&relation) else {
        return Step::NoEvidence;
    };
    let mut triggered = false;
    for rule in table {
        let triggers = find_keywords(left.subject, &rule.triggers);
        if triggers.is_empty() {
            continue;
        }
        triggered = true;
        let satisfied = rule.allowed.iter().any(|allowed| {
            rules
                .expand_synonyms(allowed)
                .into_iter()
                .any(|word| contains_keyword(right.subject, word))
        });
        if !satisfied {
            return Step::Fail(
                record(
                    rules,
                    relation,
                    rule_id::CROSS_KEYWORD_INCOMPATIBLE,
                    Severity::Warning,
                    format!(
                        "{} mentions {} but {} names none of the expected terms",
                        left.kind,
                        quoted(&triggers),
                        right.kind
                    ),
                )
                .with_suggestion(format!("expected one of: {}", rule.allowed.join(", "))),
            );
        }
    }
    if triggered { Step::Pass } else { Step::NoEvidence }
}

/// Remove `설계:` / `[설계]` stage tags so they do not count as hints.
fn strip_stage_tags(text: &str) -> String {
    let mut stripped = text.to_string();
    for stage in ALL_STAGES {
        let label = stage.label();
        for tag in [format!("{label}:"), format!("{label}："), format!("[{label}]")] {
            stripped = stripped.replace(&tag, " ");
        }
    }
    stripped
}

fn lifecycle(left: &Side<'_>, right: &Side<'_>, relation: Relation, rules: &RuleSet) -> Step {
    let (tagged, other, stage) = if left.kind == FieldKind::Cause {
        match cause::stage_of(left.value) {
            Some(stage) => (left, right, stage),
            None => return Step::NoEvidence,
        }
    } else if right.kind == FieldKind::Cause {
        match cause::stage_of(right.value) {
            Some(stage) => (right, left, stage),
            None => return Step::NoEvidence,
        }
    } else {
        return Step::NoEvidence;
    };

    let hinted = rules.hinted_stages(&strip_stage_tags(other.subject));
    // none, or ambiguous
    let (Some(hint), 1) = (hinted.first().copied(), hinted.len()) else {
        return Step::NoEvidence;
    };
    if hint == stage {
        return Step::Pass;
    }
    Step::Fail(record(
        rules,
        relation,
        rule_id::CROSS_LIFECYCLE_MISMATCH,
        Severity::Warning,
        format!(
            "{} is tagged {} but {} points to {}",
            tagged.kind,
            stage.label(),
            other.kind,
            hint.label()
        ),
    ))
}

fn chain_endpoint(left: &Side<'_>, right: &Side<'_>, relation: Relation, rules: &RuleSet) -> Step {
    if relation != Relation::MechanismMode || arrow_count(left.subject) < 2 {
        return Step::NoEvidence;
    }
    let stages = mechanism_stages(left.subject);
    let Some(last) = stages.last().copied().filter(|stage| !stage.is_empty()) else {
        return Step::NoEvidence;
    };
    let tags = mode::tags_in(rules, right.subject);
    let content = match tags.first() {
        Some(tag) => fmea_kernel::text::after_marker(right.subject, tag),
        None => right.subject,
    };
    if content.is_empty() {
        return Step::NoEvidence;
    }
    let reached = content.split_whitespace().any(|word| {
        rules
            .expand_synonyms(word)
            .into_iter()
            .any(|candidate| last.contains(candidate))
    });
    if reached {
        return Step::Pass;
    }
    Step::Fail(
        record(
            rules,
            relation,
            rule_id::CROSS_CHAIN_ENDPOINT,
            Severity::Warning,
            format!("mechanism ends in '{last}', which does not reach mode '{content}'"),
        )
        .with_suggestion("end the chain with the failure mode phenomenon"),
    )
}
