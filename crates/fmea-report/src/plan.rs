use fmea_kernel::{DocumentRead, Row, Session, SeverityCounts, ViolationRecord};
use fmea_structure::{ContiguityViolation, MergePlan, OrderingSpec, plan_rows};
use serde::Serialize;

use crate::{OverallStatus, SCHEMA};

pub const PLAN_REPORT_KIND: &str = "fmea.merge_plan.v1";

/// The merge plan handed to the renderer, with its contiguity check.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanReport {
    pub schema: u32,
    pub report_kind: String,
    pub total_rows: usize,
    #[serde(flatten)]
    pub plan: MergePlan,
    pub contiguity: Vec<ContiguityViolation>,
    pub violations: Vec<ViolationRecord>,
    pub documents: Vec<DocumentRead>,
    pub counts: SeverityCounts,
    /// `fail` when the plan must not be rendered.
    pub overall_status: OverallStatus,
}

/// Sort `rows` with the session's ordering policy and plan their merges.
pub fn run_plan(rows: &[Row], session: &Session) -> PlanReport {
    let ordering = OrderingSpec::from(&session.config().ordering);
    let planned = plan_rows(rows, &ordering);
    let violations: Vec<ViolationRecord> = planned
        .contiguity
        .iter()
        .map(ContiguityViolation::to_record)
        .collect();
    let counts = SeverityCounts::tally(&violations);
    let overall_status = OverallStatus::from_counts(&counts);
    tracing::info!(
        rows = rows.len(),
        ranges = planned.plan.ranges.len(),
        status = %overall_status,
        "merge plan complete"
    );
    PlanReport {
        schema: SCHEMA,
        report_kind: PLAN_REPORT_KIND.to_string(),
        total_rows: rows.len(),
        plan: planned.plan,
        contiguity: planned.contiguity,
        violations,
        documents: session.documents().to_vec(),
        counts,
        overall_status,
    }
}
