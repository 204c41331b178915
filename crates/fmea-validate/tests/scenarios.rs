//! Integration tests: end-to-end rule behavior on realistic field values.

use fmea_kernel::{FieldKind, Relation, Row, Severity, rule_id};
use fmea_ontology::{RuleSet, parse};
use fmea_validate::{CheckStatus, check_pair, check_rows, validate, validate_pair};

fn rule_ids(kind: FieldKind, value: &str, rules: &RuleSet) -> Vec<String> {
    validate(kind, value, rules)
        .into_iter()
        .map(|record| record.rule_id)
        .collect()
}

#[test]
fn explicit_forbidden_pair_is_blocking() {
    let rules = RuleSet::builtin();
    let out = validate_pair("부족: 층간단락", "설계: 턴수설계오류", Relation::ModeCause, &rules);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].severity, Severity::Blocking);
    assert_eq!(out[0].rule_id, rule_id::CROSS_FORBIDDEN_PAIR);
}

#[test]
fn mechanism_needs_two_arrows() {
    let rules = RuleSet::builtin();
    let short = validate(FieldKind::Mechanism, "A -> B", &rules);
    assert_eq!(short.len(), 1);
    assert!(short[0].is_blocking());
    insta::assert_snapshot!(
        short[0].to_string(),
        @"[BLOCKING] mechanism (mechanism.chain_too_short): mechanism has 2 stage(s), expected at least 3 -> initial state -> process -> final state"
    );
    assert!(validate(FieldKind::Mechanism, "A -> B -> C", &rules).is_empty());
}

#[test]
fn allow_listed_compound_is_not_flagged() {
    let rules = RuleSet::builtin();
    assert!(rule_ids(FieldKind::Mode, "부족: 접촉불량", &rules).is_empty());
    assert!(rule_ids(FieldKind::Mode, "부족: 체결불량\n(볼트 체결부)", &rules).is_empty());
    // the bare word is still caught
    assert!(
        rule_ids(FieldKind::Mode, "부족: 불량", &rules)
            .contains(&rule_id::MODE_FORBIDDEN_EXACT.to_string())
    );
}

#[test]
fn project_ontology_changes_the_allowlist() {
    let rules = parse("## SECTION:ALLOWED_EXCEPTIONS\n도금불량\n---\n");
    let abstract_rule = "mode.forbidden.abstract".to_string();
    assert!(!rule_ids(FieldKind::Mode, "부족: 도금불량", &rules).contains(&abstract_rule));
    // the replaced table no longer exempts the built-in compounds
    assert!(rule_ids(FieldKind::Mode, "부족: 접촉불량", &rules).contains(&abstract_rule));
}

#[test]
fn severity_overrides_apply_by_rule_prefix() {
    let rules = parse("## SECTION:SEVERITY_LEVELS\nmode.forbidden: WARNING\ncross.domain_mismatch: BLOCKING\n---\n");
    let out = validate(FieldKind::Mode, "부족: 소음", &rules);
    assert_eq!(out[0].rule_id, "mode.forbidden.future_result");
    assert_eq!(out[0].severity, Severity::Warning);

    let cross = validate_pair("부족: 이완", "설계: 절연 거리 부족", Relation::ModeCause, &rules);
    assert_eq!(cross[0].severity, Severity::Blocking);
}

#[test]
fn validation_is_deterministic() {
    let rules = RuleSet::builtin();
    for (kind, value) in [
        (FieldKind::Mode, "부족: 피로 균열 후 소음 증가\n권선 말단\n판정\n추가"),
        (FieldKind::Effect, "권선 변형으로 시험 불합격"),
        (FieldKind::Prevention, "작업 적정 관리 (CS)"),
    ] {
        assert_eq!(validate(kind, value, &rules), validate(kind, value, &rules));
    }
    let first = check_pair("통전 불가", "과도: 돌출", Relation::EffectMode, &rules);
    let second = check_pair("통전 불가", "과도: 돌출", Relation::EffectMode, &rules);
    assert_eq!(first, second);
}

#[test]
fn every_row_is_checked_in_full() {
    let rules = RuleSet::builtin();
    let broken = Row {
        id: 0,
        mode: "단선".into(),
        mechanism: "A -> B".into(),
        ..Row::default()
    };
    let clean = Row {
        id: 1,
        component: "권선".into(),
        function: "전류를 흘린다".into(),
        effect: "통전 불가\n(변압기 출력 정지)".into(),
        severity: Some(8),
        mode: "부족: 단선\n(권선 인출부)".into(),
        cause: "제작: 브레이징 온도 부족\n(가열 시간 미준수)".into(),
        mechanism: "브레이징 온도 부족 -> 접합부 취약 -> 소선 단선".into(),
        prevention: "설계: 접합부 설계 검토 (CHECK SHEET)\n\
            - 접합 면적 2배 이상 확보\n\
            제작: 브레이징 온도 관리 (IEQT-T-W030)\n\
            - 650 °C 이상 유지"
            .into(),
        occurrence: Some(3),
        detection: "제작: 접합부 외관 검사 (IEQT-T-W030)\n\
            - 기공 없음\n\
            시험: 권선 저항 측정 (IEQT-T-T010)\n\
            - 저항 편차 2% 이내"
            .into(),
        detection_rating: Some(4),
        ..Row::default()
    };

    let findings = check_rows(&[broken, clean], &rules);
    let for_row = |index: usize| {
        findings
            .field_violations
            .iter()
            .filter(|record| record.row_index == Some(index))
            .count()
    };
    // tag, chain, and every other empty field on row 0 are all reported
    assert!(for_row(0) > 5);
    assert_eq!(for_row(1), 0, "{:?}", findings.field_violations);

    assert_eq!(findings.consistency.len(), 2);
    let clean_consistency = &findings.consistency[1];
    assert_eq!(clean_consistency.failed, 0, "{:?}", findings.cross_violations);
    assert_eq!(clean_consistency.score, 1.0);
    assert_eq!(
        clean_consistency.relations[&Relation::EffectMode],
        CheckStatus::Passed
    );
    assert_eq!(findings.risk[1].rpn, Some(96));

    let json = serde_json::to_value(clean_consistency)
        .unwrap_or_else(|e| panic!("serialize failed: {e}"));
    assert_eq!(json["relations"]["effect->mode"], "passed");
}
