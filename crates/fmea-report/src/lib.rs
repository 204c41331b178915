//! # FMEA Report
//!
//! Pipeline assembly. Documents are read at this boundary through the
//! [`Session`], the rule set is loaded once, and the pure checks from the
//! validate and structure crates are combined into the two outputs:
//!
//! - [`ValidationReport`]: every violation, structural statistics and the
//!   overall pass/fail status.
//! - [`PlanReport`]: the sorted row order and merge ranges for the renderer.
//!
//! Only unreadable or malformed input documents are errors. Everything the
//! checks find is data in the report.

pub mod plan;
pub mod validation;

pub use plan::{PLAN_REPORT_KIND, PlanReport, run_plan};
pub use validation::{VALIDATION_REPORT_KIND, ValidationReport, run_validation};

use fmea_kernel::{KernelError, RowSet, Session, SeverityCounts};
use fmea_ontology::load_ruleset;
use serde::Serialize;
use std::path::Path;

/// Version of the report documents.
pub const SCHEMA: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OverallStatus {
    Pass,
    Fail,
}

impl OverallStatus {
    pub fn from_counts(counts: &SeverityCounts) -> Self {
        if counts.blocking > 0 {
            Self::Fail
        } else {
            Self::Pass
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pass => "pass",
            Self::Fail => "fail",
        }
    }
}

impl std::fmt::Display for OverallStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Read and normalize a row document.
pub fn load_rows(path: &Path, session: &mut Session) -> Result<RowSet, KernelError> {
    let text = session.read_document(path)?;
    let rows = RowSet::from_json_str(&text, &path.display().to_string())?;
    tracing::info!(path = %path.display(), rows = rows.len(), "rows loaded");
    Ok(rows)
}

/// Load rows and the ontology, then validate.
pub fn validate_document(
    rows_path: &Path,
    ontology: Option<&Path>,
    session: &mut Session,
) -> Result<ValidationReport, KernelError> {
    let loaded = load_ruleset(ontology, session);
    let rows = load_rows(rows_path, session)?;
    Ok(run_validation(&rows.rows, &loaded, session))
}

/// Load rows, then sort and plan merges.
pub fn plan_document(rows_path: &Path, session: &mut Session) -> Result<PlanReport, KernelError> {
    let rows = load_rows(rows_path, session)?;
    Ok(run_plan(&rows.rows, session))
}
