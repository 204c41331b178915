use fmea_kernel::{DocumentRead, Row, SeverityCounts, ViolationRecord};
use fmea_ontology::{LoadedRuleSet, ParseDiagnostic, RuleOrigin};
use fmea_structure::{DatasetStats, check_diamond};
use fmea_validate::{
    FunctionCoverage, RowConsistency, RowRisk, TagDistribution, check_dataset, check_rows,
};
use serde::Serialize;

use crate::{OverallStatus, SCHEMA};

pub const VALIDATION_REPORT_KIND: &str = "fmea.validation.v1";

/// One aggregated, row-indexed report for a full validation run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationReport {
    pub schema: u32,
    pub report_kind: String,
    pub total_rows: usize,
    pub per_field_violations: Vec<ViolationRecord>,
    pub cross_field_violations: Vec<ViolationRecord>,
    /// Tag coverage, lifecycle balance and function spread over the whole
    /// row set.
    pub dataset_violations: Vec<ViolationRecord>,
    pub structural_violations: Vec<ViolationRecord>,
    pub structural_stats: DatasetStats,
    pub row_consistency: Vec<RowConsistency>,
    pub row_risk: Vec<RowRisk>,
    pub tag_distribution: TagDistribution,
    pub function_coverage: FunctionCoverage,
    pub ruleset_digest: String,
    pub rule_origin: RuleOrigin,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ontology_diagnostics: Vec<ParseDiagnostic>,
    pub documents: Vec<DocumentRead>,
    pub counts: SeverityCounts,
    pub overall_status: OverallStatus,
}

impl ValidationReport {
    /// Every violation, per-row findings first and dataset-wide ones last.
    pub fn violations(&self) -> impl Iterator<Item = &ViolationRecord> {
        self.per_field_violations
            .iter()
            .chain(&self.cross_field_violations)
            .chain(&self.dataset_violations)
            .chain(&self.structural_violations)
    }

    pub fn passed(&self) -> bool {
        self.overall_status == OverallStatus::Pass
    }
}

/// Run every check on `rows`.
///
/// Per-row checks run to completion first; dataset-wide statistics run only
/// once all rows have been seen. The status is `fail` exactly when some
/// violation is BLOCKING.
pub fn run_validation(
    rows: &[Row],
    loaded: &LoadedRuleSet,
    session: &fmea_kernel::Session,
) -> ValidationReport {
    let rules = loaded.rules.as_ref();
    let config = session.config();

    let findings = check_rows(rows, rules);
    let dataset = check_dataset(rows, rules, config);
    let (structural_stats, structural_violations) = check_diamond(rows, &config.diamond);

    let mut report = ValidationReport {
        schema: SCHEMA,
        report_kind: VALIDATION_REPORT_KIND.to_string(),
        total_rows: rows.len(),
        per_field_violations: findings.field_violations,
        cross_field_violations: findings.cross_violations,
        dataset_violations: dataset.violations,
        structural_violations,
        structural_stats,
        row_consistency: findings.consistency,
        row_risk: findings.risk,
        tag_distribution: dataset.tag_distribution,
        function_coverage: dataset.function_coverage,
        ruleset_digest: rules.digest().to_string(),
        rule_origin: loaded.origin.clone(),
        ontology_diagnostics: loaded.diagnostics.clone(),
        documents: session.documents().to_vec(),
        counts: SeverityCounts::default(),
        overall_status: OverallStatus::Pass,
    };
    report.counts = SeverityCounts::tally(report.violations());
    report.overall_status = OverallStatus::from_counts(&report.counts);

    tracing::info!(
        rows = report.total_rows,
        blocking = report.counts.blocking,
        warning = report.counts.warning,
        status = %report.overall_status,
        "validation complete"
    );
    report
}
