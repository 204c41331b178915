//! Vertical merge ranges over sorted rows.
//!
//! Each merge column names its ancestor columns. Adjacent rows merge in that
//! column when their own values match and every ancestor value matches too,
//! so a mode shared by two different effects is never merged across the
//! effect boundary. Empty values never merge.

use fmea_kernel::text::normalized_key;
use fmea_kernel::{FieldKind, Row};
use serde::Serialize;

/// A merge column together with the columns whose equality it requires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelSpec {
    pub column: FieldKind,
    pub ancestors: Vec<FieldKind>,
}

impl LevelSpec {
    pub fn new(column: FieldKind, ancestors: &[FieldKind]) -> Self {
        Self {
            column,
            ancestors: ancestors.to_vec(),
        }
    }

    /// Ancestor values followed by the column's own value.
    pub fn chain(&self, row: &Row) -> Vec<String> {
        self.ancestors
            .iter()
            .chain(std::iter::once(&self.column))
            .map(|kind| merge_value(row, *kind))
            .collect()
    }
}

/// Component, function, effect, severity, mode: each nested in the ones
/// before it. Severity sits between effect and mode because rows sort on it
/// before mode.
pub fn default_level_specs() -> Vec<LevelSpec> {
    use FieldKind::{Component, Effect, Function, Mode, Severity};
    vec![
        LevelSpec::new(Component, &[]),
        LevelSpec::new(Function, &[Component]),
        LevelSpec::new(Effect, &[Component, Function]),
        LevelSpec::new(Severity, &[Component, Function, Effect]),
        LevelSpec::new(Mode, &[Component, Function, Effect, Severity]),
    ]
}

/// Value compared for merging: normalized text, or the score as a decimal.
pub fn merge_value(row: &Row, kind: FieldKind) -> String {
    match row.text(kind) {
        Some(text) => normalized_key(text),
        None => row.score(kind).map(|score| score.to_string()).unwrap_or_default(),
    }
}

/// Inclusive span of sorted-row positions to merge in one column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergeRange {
    pub column: FieldKind,
    pub row_start: usize,
    pub row_end: usize,
}

/// Output of planning: the row order to render and the ranges to merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MergePlan {
    /// Input ids of the rows, in render order.
    pub sorted_row_order: Vec<usize>,
    pub ranges: Vec<MergeRange>,
}

impl MergePlan {
    /// Plan for rows already in render order.
    pub fn for_sorted(sorted: &[Row], specs: &[LevelSpec]) -> Self {
        Self {
            sorted_row_order: sorted.iter().map(|row| row.id).collect(),
            ranges: compute_merge_ranges(sorted, specs),
        }
    }
}

/// Maximal runs of at least two adjacent rows sharing a non-empty chain,
/// per column, in column order then position order.
pub fn compute_merge_ranges(sorted: &[Row], specs: &[LevelSpec]) -> Vec<MergeRange> {
    let mut ranges = Vec::new();
    for spec in specs {
        let chains: Vec<Vec<String>> = sorted.iter().map(|row| spec.chain(row)).collect();
        let mut start = 0;
        while start < chains.len() {
            let mut end = start;
            while end + 1 < chains.len() && chains[end + 1] == chains[start] {
                end += 1;
            }
            let own_value_present = chains[start].last().is_some_and(|value| !value.is_empty());
            if end > start && own_value_present {
                ranges.push(MergeRange {
                    column: spec.column,
                    row_start: start,
                    row_end: end,
                });
            }
            start = end + 1;
        }
    }
    ranges
}
