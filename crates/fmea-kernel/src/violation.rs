//! Violation records: the single output channel of every validator.

use serde::{Deserialize, Serialize};

/// Severity class declared by a rule.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Severity {
    Info,
    Warning,
    Blocking,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Info => "INFO",
            Self::Warning => "WARNING",
            Self::Blocking => "BLOCKING",
        }
    }
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Severity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "INFO" => Ok(Self::Info),
            "WARNING" | "WARN" => Ok(Self::Warning),
            "BLOCKING" | "ERROR" => Ok(Self::Blocking),
            _ => Err(format!("unknown severity: {s}")),
        }
    }
}

/// One rule violated by one field, relation, or the dataset as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationRecord {
    /// Input-order index of the row; `None` for dataset-wide findings.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_index: Option<usize>,
    /// Field name (`mode`) or relation name (`mode->cause`), or `dataset`.
    pub field: String,
    pub severity: Severity,
    pub rule_id: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub suggestion: Option<String>,
}

impl ViolationRecord {
    pub fn new(
        field: impl Into<String>,
        severity: Severity,
        rule_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            row_index: None,
            field: field.into(),
            severity,
            rule_id: rule_id.into(),
            message: message.into(),
            suggestion: None,
        }
    }

    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    pub fn at_row(mut self, row_index: usize) -> Self {
        self.row_index = Some(row_index);
        self
    }

    pub fn is_blocking(&self) -> bool {
        self.severity == Severity::Blocking
    }
}

impl std::fmt::Display for ViolationRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] ", self.severity)?;
        if let Some(row) = self.row_index {
            write!(f, "row {row} ")?;
        }
        write!(f, "{} ({}): {}", self.field, self.rule_id, self.message)?;
        if let Some(suggestion) = &self.suggestion {
            write!(f, " -> {suggestion}")?;
        }
        Ok(())
    }
}

/// Counts per severity class, used in report summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeverityCounts {
    pub blocking: usize,
    pub warning: usize,
    pub info: usize,
}

impl SeverityCounts {
    pub fn tally<'a>(records: impl IntoIterator<Item = &'a ViolationRecord>) -> Self {
        let mut counts = Self::default();
        for record in records {
            match record.severity {
                Severity::Blocking => counts.blocking += 1,
                Severity::Warning => counts.warning += 1,
                Severity::Info => counts.info += 1,
            }
        }
        counts
    }
}

/// Stable rule identifiers.
///
/// The ontology's `SEVERITY_LEVELS` section addresses rules by these ids.
pub mod rule_id {
    pub const FIELD_MISSING: &str = "field.missing";
    pub const NUMBERING_PREFIX: &str = "field.numbering_prefix";

    pub const MODE_TAG_MISSING: &str = "mode.tag_missing";
    pub const MODE_TAG_MULTIPLE: &str = "mode.tag_multiple";
    pub const MODE_CONTENT_MISSING: &str = "mode.content_missing";
    /// Prefix; the category name is appended (`mode.forbidden.mechanism`).
    pub const MODE_FORBIDDEN: &str = "mode.forbidden";
    pub const MODE_FORBIDDEN_EXACT: &str = "mode.forbidden_exact";
    pub const MODE_TAG_CONTENT_MISMATCH: &str = "mode.tag_content_mismatch";
    pub const MODE_ABSTRACT_CONCEPT: &str = "mode.abstract_concept";
    pub const MODE_VISIBILITY_UNCONFIRMED: &str = "mode.visibility_unconfirmed";
    pub const MODE_DETAIL_FORMAT: &str = "mode.detail_format";
    pub const MODE_JUDGMENT_TAG: &str = "mode.judgment_tag";
    pub const MODE_TOO_MANY_LINES: &str = "mode.too_many_lines";

    /// Prefix; the category name is appended (`effect.forbidden.physical_state`).
    pub const EFFECT_FORBIDDEN: &str = "effect.forbidden";
    pub const EFFECT_DETAIL_MISSING: &str = "effect.detail_missing";

    pub const CAUSE_TAG_MISSING: &str = "cause.tag_missing";
    pub const CAUSE_TAG_MULTIPLE: &str = "cause.tag_multiple";
    pub const CAUSE_CONTENT_MISSING: &str = "cause.content_missing";
    pub const CAUSE_DETAIL_MISSING: &str = "cause.detail_missing";

    pub const MECHANISM_CHAIN_TOO_SHORT: &str = "mechanism.chain_too_short";
    pub const MECHANISM_EMPTY_STAGE: &str = "mechanism.empty_stage";
    pub const MECHANISM_CAUSE_KEYWORD: &str = "mechanism.cause_keyword";

    pub const CONTROLS_LINE_COUNT: &str = "controls.line_count";
    pub const CONTROLS_LIFECYCLE_COVERAGE: &str = "controls.lifecycle_coverage";
    pub const CONTROLS_QUANTITATIVE_MISSING: &str = "controls.quantitative_missing";
    pub const CONTROLS_SOURCE_MISSING: &str = "controls.source_missing";
    pub const CONTROLS_FORBIDDEN_SOURCE: &str = "controls.forbidden_source";
    pub const CONTROLS_VAGUE_EXPRESSION: &str = "controls.vague_expression";
    pub const CONTROLS_ABBREVIATION: &str = "controls.abbreviation";
    pub const DETECTION_CRITERIA_MISSING: &str = "detection.criteria_missing";

    pub const SCORE_NOT_NUMERIC: &str = "score.not_numeric";
    pub const SCORE_OUT_OF_RANGE: &str = "score.out_of_range";

    pub const CROSS_FORBIDDEN_PAIR: &str = "cross.forbidden_pair";
    pub const CROSS_DOMAIN_MISMATCH: &str = "cross.domain_mismatch";
    pub const CROSS_KEYWORD_INCOMPATIBLE: &str = "cross.keyword_incompatible";
    pub const CROSS_LIFECYCLE_MISMATCH: &str = "cross.lifecycle_mismatch";
    pub const CROSS_CHAIN_ENDPOINT: &str = "cross.chain_endpoint";

    pub const DATASET_TAG_COVERAGE: &str = "dataset.tag_coverage";
    pub const DATASET_LIFECYCLE_ABSENT: &str = "dataset.lifecycle_absent";
    pub const DATASET_LIFECYCLE_IMBALANCE: &str = "dataset.lifecycle_imbalance";
    pub const DATASET_FUNCTION_SPARSE: &str = "dataset.function_sparse";
    pub const DATASET_PRIMARY_FUNCTION_SHARE: &str = "dataset.primary_function_share";

    pub const STRUCTURE_MODE_CAUSE_BRANCHING: &str = "structure.mode_cause_branching";
    pub const STRUCTURE_LINEAR_RATIO: &str = "structure.linear_ratio";
    pub const STRUCTURE_FUNCTION_EFFECT_BRANCHING: &str = "structure.function_effect_branching";
    pub const STRUCTURE_EFFECT_MODE_BRANCHING: &str = "structure.effect_mode_branching";

    pub const MERGE_NON_CONTIGUOUS: &str = "merge.non_contiguous";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn severity_orders_by_weight() {
        assert!(Severity::Blocking > Severity::Warning);
        assert!(Severity::Warning > Severity::Info);
    }

    #[test]
    fn severity_parse_accepts_legacy_names() {
        assert_eq!("warn".parse::<Severity>().unwrap(), Severity::Warning);
        assert_eq!("ERROR".parse::<Severity>().unwrap(), Severity::Blocking);
        assert!("fatal".parse::<Severity>().is_err());
    }

    #[test]
    fn display_renders_row_and_suggestion() {
        let record = ViolationRecord::new(
            "mechanism",
            Severity::Blocking,
            rule_id::MECHANISM_CHAIN_TOO_SHORT,
            "chain has 2 stages, need at least 3",
        )
        .with_suggestion("write cause -> process -> result")
        .at_row(4);
        insta::assert_snapshot!(
            record.to_string(),
            @"[BLOCKING] row 4 mechanism (mechanism.chain_too_short): chain has 2 stages, need at least 3 -> write cause -> process -> result"
        );
    }

    #[test]
    fn serialized_record_omits_empty_optionals() {
        let record = ViolationRecord::new("dataset", Severity::Info, "dataset.tag_coverage", "x");
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "field": "dataset",
                "severity": "INFO",
                "ruleId": "dataset.tag_coverage",
                "message": "x",
            })
        );
    }
}
