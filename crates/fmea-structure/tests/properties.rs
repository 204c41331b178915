//! Property tests: ordering and merge planning over arbitrary row sets.
//!
//! Values come from small pools so that groups collide often, including
//! texts that differ only in whitespace or detail lines, missing and
//! out-of-range severities, and blank cells.

use fmea_kernel::{OrderingConfig, Row};
use fmea_structure::{
    OrderingSpec, compute_merge_ranges, default_level_specs, plan_rows, sort_rows,
    verify_contiguity,
};
use proptest::prelude::*;

const COMPONENTS: &[&str] = &["권선", "철심", "", " 권선 "];
const FUNCTIONS: &[&str] = &["전류를 흘린다", "전류를  흘린다", "절연을 유지한다", ""];
const EFFECTS: &[&str] = &[
    "통전 불가",
    "통전 불가\n(출력 정지)",
    "통전  불가\n(출력 정지)",
    "절연 파괴",
    "",
];
const MODES: &[&str] = &[
    "부족: 단선",
    "부족:  단선",
    "부족: 단선\n(권선 인출부)",
    "과도: 변형",
    "",
];
const CAUSES: &[&str] = &["설계: a", "시험: b", "[재료] c", "제작: d\n(취급)", "미분류", ""];

fn arb_row() -> impl Strategy<Value = Row> {
    (
        prop::sample::select(COMPONENTS),
        prop::sample::select(FUNCTIONS),
        prop::option::of(0u32..3),
        prop::sample::select(EFFECTS),
        prop::option::of(-1i64..12),
        prop::sample::select(MODES),
        prop::sample::select(CAUSES),
    )
        .prop_map(
            |(component, function, function_order, effect, severity, mode, cause)| Row {
                component: component.into(),
                function: function.into(),
                function_order,
                effect: effect.into(),
                severity,
                mode: mode.into(),
                cause: cause.into(),
                ..Row::default()
            },
        )
}

fn arb_rows(max_count: usize) -> impl Strategy<Value = Vec<Row>> {
    prop::collection::vec(arb_row(), 0..=max_count).prop_map(|mut rows| {
        for (id, row) in rows.iter_mut().enumerate() {
            row.id = id;
        }
        rows
    })
}

fn arb_ordering() -> impl Strategy<Value = OrderingSpec> {
    prop::collection::vec(prop::sample::select(FUNCTIONS), 0..3).prop_map(|names| {
        OrderingSpec::from(&OrderingConfig {
            function_order: names.into_iter().map(String::from).collect(),
        })
    })
}

fn ids(rows: &[Row]) -> Vec<usize> {
    rows.iter().map(|row| row.id).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Sorted output never splits a merge group.
    #[test]
    fn prop_sorted_rows_are_contiguous(rows in arb_rows(24), ordering in arb_ordering()) {
        let sorted = sort_rows(&rows, &ordering);
        let violations = verify_contiguity(&sorted, &default_level_specs());
        prop_assert!(violations.is_empty(), "{:?}", violations);

        let planned = plan_rows(&rows, &ordering);
        prop_assert!(planned.contiguity.is_empty());
    }

    /// Sorting a sorted set changes nothing.
    #[test]
    fn prop_sort_is_idempotent(rows in arb_rows(24), ordering in arb_ordering()) {
        let once = sort_rows(&rows, &ordering);
        let twice = sort_rows(&once, &ordering);
        prop_assert_eq!(ids(&once), ids(&twice));
    }

    /// Same input, same order and ranges; the order is a permutation of
    /// the input.
    #[test]
    fn prop_planning_is_deterministic(rows in arb_rows(24), ordering in arb_ordering()) {
        let first = plan_rows(&rows, &ordering);
        let second = plan_rows(&rows, &ordering);
        prop_assert_eq!(&first.plan, &second.plan);

        let mut order = first.plan.sorted_row_order.clone();
        order.sort_unstable();
        prop_assert_eq!(order, ids(&rows));
    }

    /// Ranges span at least two rows, stay in bounds and never overlap
    /// within a column.
    #[test]
    fn prop_ranges_are_well_formed(rows in arb_rows(24)) {
        let sorted = sort_rows(&rows, &OrderingSpec::default());
        let ranges = compute_merge_ranges(&sorted, &default_level_specs());
        for range in &ranges {
            prop_assert!(range.row_start < range.row_end);
            prop_assert!(range.row_end < sorted.len());
        }
        for pair in ranges.windows(2) {
            if pair[0].column == pair[1].column {
                prop_assert!(pair[0].row_end < pair[1].row_start);
            }
        }
    }
}
