//! Integration tests: sort, merge planning and the structural thresholds on
//! whole row sets.

use fmea_kernel::{DiamondConfig, FieldKind, OrderingConfig, Row, rule_id};
use fmea_structure::{
    HierarchyLevel, OrderingSpec, check_diamond, default_level_specs, plan_rows, sort_rows,
    verify_contiguity,
};
use serde_json::json;

fn row(id: usize, chain: [&str; 5], severity: i64, cause: &str) -> Row {
    let [component, function, effect, mode, _] = chain;
    Row {
        id,
        component: component.into(),
        function: function.into(),
        effect: effect.into(),
        severity: Some(severity),
        mode: mode.into(),
        cause: cause.into(),
        ..Row::default()
    }
}

#[test]
fn shared_mode_under_different_ancestors_stays_unmerged() {
    let rows = vec![
        row(0, ["X", "F2", "E2", "M1", ""], 7, "설계: a"),
        row(1, ["X", "F1", "E1", "M2", ""], 7, "설계: b"),
        row(2, ["X", "F1", "E1", "M1", ""], 7, "설계: c"),
    ];
    let planned = plan_rows(&rows, &OrderingSpec::default());
    assert!(planned.contiguity.is_empty());

    let plan = serde_json::to_value(&planned.plan)
        .unwrap_or_else(|e| panic!("serialize failed: {e}"));
    assert_eq!(
        plan,
        json!({
            "sortedRowOrder": [2, 1, 0],
            "ranges": [
                {"column": "component", "rowStart": 0, "rowEnd": 2},
                {"column": "function", "rowStart": 0, "rowEnd": 1},
                {"column": "effect", "rowStart": 0, "rowEnd": 1},
                {"column": "severity", "rowStart": 0, "rowEnd": 1},
            ]
        })
    );
    assert!(
        !planned
            .plan
            .ranges
            .iter()
            .any(|range| range.column == FieldKind::Mode)
    );
}

fn scrambled() -> Vec<Row> {
    let effects = ["E1", "E2", "E3"];
    let modes = ["부족: M1", "과도: M2"];
    let stages = ["시험", "설계", "제작", "재료"];
    let mut rows = Vec::new();
    // interleave on purpose: consecutive rows never share an effect
    for (stage_index, stage) in stages.iter().enumerate() {
        for mode in modes {
            for (effect_index, effect) in effects.iter().enumerate() {
                let function = if effect_index == 2 { "F2" } else { "F1" };
                let severity = 9 - effect_index as i64;
                rows.push(row(
                    rows.len(),
                    ["권선", function, effect, mode, ""],
                    severity,
                    &format!("{stage}: 원인 {stage_index}"),
                ));
            }
        }
    }
    rows
}

#[test]
fn sorted_rows_are_always_contiguous() {
    let rows = scrambled();
    let specs = default_level_specs();
    assert!(!verify_contiguity(&rows, &specs).is_empty());

    let sorted = sort_rows(&rows, &OrderingSpec::default());
    assert!(verify_contiguity(&sorted, &specs).is_empty());

    let config = OrderingConfig {
        function_order: vec!["F2".into(), "F1".into()],
    };
    let sorted = sort_rows(&rows, &OrderingSpec::from(&config));
    assert!(verify_contiguity(&sorted, &specs).is_empty());
    assert_eq!(sorted[0].function, "F2");
}

#[test]
fn sorting_twice_changes_nothing() {
    let spec = OrderingSpec::default();
    let once = sort_rows(&scrambled(), &spec);
    let twice = sort_rows(&once, &spec);
    assert_eq!(once, twice);
}

#[test]
fn well_branched_dataset_passes_the_diamond_check() {
    let (stats, out) = check_diamond(&scrambled(), &DiamondConfig::default());
    // each mode text is shared across effects, so its causes pool to 4
    assert_eq!(stats.branching(HierarchyLevel::ModeCause), 4.0);
    assert_eq!(stats.linear_ratio, 0.0);
    assert!(!out.iter().any(|record| record.is_blocking()), "{out:?}");
}

#[test]
fn single_cause_modes_are_listed_when_branching_is_too_low() {
    let rows = vec![
        row(0, ["X", "F1", "E1", "부족: M1", ""], 7, "설계: a"),
        row(1, ["X", "F1", "E1", "부족: M2", ""], 7, "설계: b"),
        row(2, ["X", "F1", "E1", "부족: M2", ""], 7, "제작: c"),
    ];
    let (stats, out) = check_diamond(&rows, &DiamondConfig::default());
    assert_eq!(stats.branching(HierarchyLevel::ModeCause), 1.5);
    assert_eq!(stats.single_cause_modes.len(), 1);
    assert_eq!(stats.single_cause_modes[0].mode, "부족: M1");

    let failure = out
        .iter()
        .find(|record| record.rule_id == rule_id::STRUCTURE_MODE_CAUSE_BRANCHING)
        .unwrap_or_else(|| panic!("expected a branching failure in {out:?}"));
    assert!(failure.is_blocking());
    assert!(
        failure
            .suggestion
            .as_deref()
            .is_some_and(|text| text.contains("부족: M1"))
    );
}

#[test]
fn missing_severity_and_zero_do_not_interleave() {
    let mut rows = vec![
        row(0, ["X", "F1", "E1", "부족: 단선", ""], 0, "설계: a"),
        row(1, ["X", "F1", "E1", "부족: 단선", ""], 0, "b"),
        row(2, ["X", "F1", "E1", "부족: 단선", ""], 0, "c"),
    ];
    rows[0].severity = None;
    rows[2].severity = None;

    let planned = plan_rows(&rows, &OrderingSpec::default());
    assert!(planned.contiguity.is_empty(), "{:?}", planned.contiguity);
    assert_eq!(planned.plan.sorted_row_order, vec![1, 0, 2]);
    let mode_spans: Vec<_> = planned
        .plan
        .ranges
        .iter()
        .filter(|range| range.column == FieldKind::Mode)
        .map(|range| (range.row_start, range.row_end))
        .collect();
    assert_eq!(mode_spans, vec![(1, 2)]);
}
