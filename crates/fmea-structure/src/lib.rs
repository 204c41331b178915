//! # FMEA Structure
//!
//! Whole-dataset passes that can only run once every row is available:
//!
//! - [`diamond`]: fan-out statistics per hierarchy level and the
//!   mode->cause / linear-chain thresholds.
//! - [`sort`]: the hierarchical row order the renderer expects.
//! - [`merge`]: vertical merge ranges over sorted rows.
//! - [`contiguity`]: an independent check that every merge group is a
//!   single run, catching a defective sort or hand-ordered input.

pub mod contiguity;
pub mod diamond;
pub mod merge;
pub mod sort;

pub use contiguity::{ContiguityViolation, verify_contiguity};
pub use diamond::{ALL_LEVELS, DatasetStats, HierarchyLevel, SingleCauseMode, check_diamond};
pub use merge::{LevelSpec, MergePlan, MergeRange, compute_merge_ranges, default_level_specs};
pub use sort::{OrderingSpec, UNRANKED_FUNCTION, sort_rows};

use fmea_kernel::Row;

/// Sorted rows with their merge plan and the contiguity check of that order.
#[derive(Debug, Clone, Default)]
pub struct PlannedRows {
    pub sorted: Vec<Row>,
    pub plan: MergePlan,
    pub contiguity: Vec<ContiguityViolation>,
}

/// Sort, plan merges, and verify the result in one pass.
pub fn plan_rows(rows: &[Row], ordering: &OrderingSpec) -> PlannedRows {
    let specs = default_level_specs();
    let sorted = sort_rows(rows, ordering);
    let plan = MergePlan::for_sorted(&sorted, &specs);
    let contiguity = verify_contiguity(&sorted, &specs);
    tracing::debug!(
        rows = sorted.len(),
        ranges = plan.ranges.len(),
        contiguity = contiguity.len(),
        "merge plan computed"
    );
    PlannedRows {
        sorted,
        plan,
        contiguity,
    }
}
