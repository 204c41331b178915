//! Post-sort guarantee: every group that should merge is one contiguous run.

use crate::merge::LevelSpec;
use fmea_kernel::{FieldKind, Row, Severity, ViolationRecord, rule_id};
use serde::Serialize;
use std::collections::BTreeMap;

/// Rows sharing a merge chain that are split by unrelated rows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContiguityViolation {
    pub column: FieldKind,
    /// The column's own value.
    pub value: String,
    /// Positions in the checked order.
    pub positions: Vec<usize>,
}

impl ContiguityViolation {
    pub fn to_record(&self) -> ViolationRecord {
        let positions: Vec<String> = self.positions.iter().map(usize::to_string).collect();
        ViolationRecord::new(
            self.column.as_str(),
            Severity::Blocking,
            rule_id::MERGE_NON_CONTIGUOUS,
            format!(
                "'{}' is split across positions {}",
                self.value.replace('\n', " / "),
                positions.join(", ")
            ),
        )
        .with_suggestion("sort rows hierarchically before merging")
    }
}

/// Check each column's groups, keyed by the full ancestor chain plus the
/// column's own value. Empty own values are skipped.
pub fn verify_contiguity(rows: &[Row], specs: &[LevelSpec]) -> Vec<ContiguityViolation> {
    let mut out = Vec::new();
    for spec in specs {
        let mut groups: BTreeMap<Vec<String>, Vec<usize>> = BTreeMap::new();
        for (position, row) in rows.iter().enumerate() {
            let chain = spec.chain(row);
            if chain.last().is_some_and(|value| value.is_empty()) {
                continue;
            }
            groups.entry(chain).or_default().push(position);
        }
        for (mut chain, positions) in groups {
            let contiguous = positions.windows(2).all(|pair| pair[1] == pair[0] + 1);
            if !contiguous {
                out.push(ContiguityViolation {
                    column: spec.column,
                    value: chain.pop().unwrap_or_default(),
                    positions,
                });
            }
        }
    }
    if !out.is_empty() {
        tracing::warn!(groups = out.len(), "merge groups are not contiguous");
    }
    out
}
