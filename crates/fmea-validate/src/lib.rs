//! # FMEA Validate
//!
//! Rule checks that look at one row (or one pair of fields of a row) at a
//! time, plus the dataset-level tag and function checks that need no fan-out
//! statistics.
//!
//! ```text
//! RuleSet ─┬─ field::validate(kind, value)    → [ViolationRecord]
//!          ├─ cross::validate_pair(a, b, rel) → [ViolationRecord]
//!          └─ dataset::check_dataset(rows)    → DatasetFindings
//! ```
//!
//! Every check runs to completion: a row with an early failure is still
//! checked in full, so one pass yields the complete violation set.

pub mod cross;
pub mod dataset;
pub mod field;
pub mod risk;

pub use cross::{CheckStatus, PairCheck, RowConsistency, check_pair, check_row_pairs, validate_pair};
pub use dataset::{DatasetFindings, FunctionCoverage, FunctionRows, TagDistribution, check_dataset};
pub use field::{validate, validate_row};
pub use risk::{ActionPriority, RowRisk};

use fmea_kernel::{Row, ViolationRecord};
use fmea_ontology::RuleSet;

/// Everything the per-row checks produce for one row set.
#[derive(Debug, Clone, Default)]
pub struct RowFindings {
    pub field_violations: Vec<ViolationRecord>,
    pub cross_violations: Vec<ViolationRecord>,
    pub consistency: Vec<RowConsistency>,
    pub risk: Vec<RowRisk>,
}

/// Run field, cross-field and risk checks on every row, in row order.
pub fn check_rows(rows: &[Row], rules: &RuleSet) -> RowFindings {
    let mut findings = RowFindings::default();
    for row in rows {
        findings.field_violations.extend(validate_row(row, rules));
        let (consistency, violations) = check_row_pairs(row, rules);
        findings.cross_violations.extend(violations);
        findings.consistency.push(consistency);
        findings.risk.push(risk::assess(row));
    }
    tracing::debug!(
        rows = rows.len(),
        field = findings.field_violations.len(),
        cross = findings.cross_violations.len(),
        "row checks complete"
    );
    findings
}
