//! Checks over the whole row set that are not about fan-out shape:
//! mode-tag coverage, the lifecycle balance of causes and how rows spread
//! over functions.

use crate::field::{cause, mode};
use fmea_kernel::text::{normalized_key, primary_line};
use fmea_kernel::{
    ALL_STAGES, EngineConfig, FunctionCoverageConfig, LifecycleBalanceConfig, LifecycleStage, Row,
    Severity, ViolationRecord, rule_id,
};
use fmea_ontology::RuleSet;
use serde::Serialize;
use std::collections::BTreeMap;

const FIELD: &str = "dataset";

/// How often each mode tag and cause stage occurs.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TagDistribution {
    /// Keyed by the required tag as the ontology spells it.
    pub mode_tags: BTreeMap<String, usize>,
    pub cause_stages: BTreeMap<LifecycleStage, usize>,
    /// Causes carrying exactly one stage tag.
    pub tagged_causes: usize,
}

impl TagDistribution {
    pub fn collect(rows: &[Row], rules: &RuleSet) -> Self {
        let mut distribution = Self::default();
        for row in rows {
            let tags = mode::tags_in(rules, primary_line(&row.mode));
            if let Some(tag) = tags.first() {
                *distribution.mode_tags.entry((*tag).to_string()).or_default() += 1;
            }
            if let Some(stage) = cause::stage_of(&row.cause) {
                *distribution.cause_stages.entry(stage).or_default() += 1;
                distribution.tagged_causes += 1;
            }
        }
        distribution
    }

    /// Share of `stage` among tagged causes.
    pub fn stage_share(&self, stage: LifecycleStage) -> f64 {
        if self.tagged_causes == 0 {
            return 0.0;
        }
        let count = self.cause_stages.get(&stage).copied().unwrap_or(0);
        count as f64 / self.tagged_causes as f64
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionRows {
    pub component: String,
    pub function: String,
    pub rows: usize,
    /// First function seen for its component.
    pub primary: bool,
}

/// Row counts per (component, function), in first-appearance order.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FunctionCoverage {
    pub functions: Vec<FunctionRows>,
    /// Rows with a function; rows without one are not grouped.
    pub grouped_rows: usize,
    pub primary_rows: usize,
    pub primary_share: f64,
}

impl FunctionCoverage {
    pub fn collect(rows: &[Row]) -> Self {
        let mut coverage = Self::default();
        let mut slots: BTreeMap<(String, String), usize> = BTreeMap::new();
        let mut primary: BTreeMap<String, String> = BTreeMap::new();
        for row in rows {
            let function = normalized_key(&row.function);
            if function.is_empty() {
                continue;
            }
            let component = normalized_key(&row.component);
            let is_primary = *primary
                .entry(component.clone())
                .or_insert_with(|| function.clone())
                == function;
            let slot = *slots
                .entry((component.clone(), function.clone()))
                .or_insert_with(|| {
                    coverage.functions.push(FunctionRows {
                        component,
                        function,
                        rows: 0,
                        primary: is_primary,
                    });
                    coverage.functions.len() - 1
                });
            coverage.functions[slot].rows += 1;
            coverage.grouped_rows += 1;
            if is_primary {
                coverage.primary_rows += 1;
            }
        }
        if coverage.grouped_rows > 0 {
            coverage.primary_share = coverage.primary_rows as f64 / coverage.grouped_rows as f64;
        }
        coverage
    }
}

/// Output of [`check_dataset`].
#[derive(Debug, Clone, Default)]
pub struct DatasetFindings {
    pub tag_distribution: TagDistribution,
    pub function_coverage: FunctionCoverage,
    pub violations: Vec<ViolationRecord>,
}

/// Dataset-level findings. Empty input yields nothing.
pub fn check_dataset(rows: &[Row], rules: &RuleSet, config: &EngineConfig) -> DatasetFindings {
    let mut findings = DatasetFindings {
        tag_distribution: TagDistribution::collect(rows, rules),
        function_coverage: FunctionCoverage::collect(rows),
        violations: Vec::new(),
    };
    if rows.is_empty() {
        return findings;
    }
    findings.violations.extend(tag_coverage(&findings.tag_distribution, rules));
    findings.violations.extend(lifecycle_balance(
        &findings.tag_distribution,
        rules,
        &config.lifecycle_balance,
    ));
    findings.violations.extend(function_spread(
        &findings.function_coverage,
        rules,
        &config.function_coverage,
    ));
    findings
}

fn tag_coverage(distribution: &TagDistribution, rules: &RuleSet) -> Vec<ViolationRecord> {
    let mut out = Vec::new();
    for (index, tag) in rules.required_tags.iter().enumerate() {
        if distribution.mode_tags.contains_key(tag) {
            continue;
        }
        // the first listed tag is the primary classification
        let default = if index == 0 {
            Severity::Warning
        } else {
            Severity::Info
        };
        out.push(ViolationRecord::new(
            FIELD,
            rules.severity_for(rule_id::DATASET_TAG_COVERAGE, default),
            rule_id::DATASET_TAG_COVERAGE,
            format!("no failure mode is tagged '{tag}'"),
        ));
    }
    out
}

fn lifecycle_balance(
    distribution: &TagDistribution,
    rules: &RuleSet,
    balance: &LifecycleBalanceConfig,
) -> Vec<ViolationRecord> {
    let mut out = Vec::new();
    if distribution.tagged_causes == 0 {
        return out;
    }
    for stage in ALL_STAGES.iter().copied() {
        let share = distribution.stage_share(stage);
        let percent = share * 100.0;
        if share == 0.0 {
            out.push(
                ViolationRecord::new(
                    FIELD,
                    rules.severity_for(rule_id::DATASET_LIFECYCLE_ABSENT, Severity::Blocking),
                    rule_id::DATASET_LIFECYCLE_ABSENT,
                    format!("no cause is attributed to the {} stage", stage.label()),
                )
                .with_suggestion(format!("add causes tagged '{}:'", stage.label())),
            );
        } else if share < balance.min_share || share > balance.max_share {
            out.push(ViolationRecord::new(
                FIELD,
                rules.severity_for(rule_id::DATASET_LIFECYCLE_IMBALANCE, Severity::Warning),
                rule_id::DATASET_LIFECYCLE_IMBALANCE,
                format!(
                    "{} stage holds {percent:.1}% of causes, expected {:.0}% to {:.0}%",
                    stage.label(),
                    balance.min_share * 100.0,
                    balance.max_share * 100.0
                ),
            ));
        }
    }
    out
}

fn function_spread(
    coverage: &FunctionCoverage,
    rules: &RuleSet,
    config: &FunctionCoverageConfig,
) -> Vec<ViolationRecord> {
    let mut out = Vec::new();
    if coverage.grouped_rows == 0 {
        return out;
    }
    if coverage.primary_share < config.min_primary_share {
        out.push(
            ViolationRecord::new(
                FIELD,
                rules.severity_for(rule_id::DATASET_PRIMARY_FUNCTION_SHARE, Severity::Warning),
                rule_id::DATASET_PRIMARY_FUNCTION_SHARE,
                format!(
                    "primary functions hold {:.1}% of rows ({} of {}), expected at least {:.0}%",
                    coverage.primary_share * 100.0,
                    coverage.primary_rows,
                    coverage.grouped_rows,
                    config.min_primary_share * 100.0
                ),
            )
            .with_suggestion("analyze the primary function of each component in more depth"),
        );
    }
    for entry in &coverage.functions {
        if entry.rows >= config.min_rows_per_function {
            continue;
        }
        out.push(ViolationRecord::new(
            FIELD,
            rules.severity_for(rule_id::DATASET_FUNCTION_SPARSE, Severity::Warning),
            rule_id::DATASET_FUNCTION_SPARSE,
            format!(
                "function '{}' of '{}' has {} row(s), expected at least {}",
                entry.function.replace('\n', " / "),
                entry.component.replace('\n', " / "),
                entry.rows,
                config.min_rows_per_function
            ),
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use fmea_ontology::parse;

    fn row(mode: &str, cause: &str) -> Row {
        Row {
            mode: mode.into(),
            cause: cause.into(),
            ..Row::default()
        }
    }

    fn ids(out: &[ViolationRecord]) -> Vec<&str> {
        out.iter().map(|record| record.rule_id.as_str()).collect()
    }

    #[test]
    fn balanced_causes_with_all_tags_are_clean() {
        let rows = vec![
            row("부족: 단선", "설계: 전류 밀도 과대"),
            row("과도: 변형", "재료: 동선 경도 편차"),
            row("유해: 오염", "제작: 취급 부주의"),
            row("부족: 이완", "시험: 토크 검사 누락"),
        ];
        let findings = check_dataset(&rows, &RuleSet::builtin(), &EngineConfig::default());
        assert!(findings.violations.is_empty(), "{:?}", findings.violations);
        assert_eq!(findings.tag_distribution.tagged_causes, 4);
        assert_eq!(findings.tag_distribution.mode_tags["부족:"], 2);
        assert_eq!(findings.function_coverage.grouped_rows, 0);
    }

    #[test]
    fn missing_stage_blocks_and_skew_warns() {
        let rows = vec![
            row("부족: 단선", "설계: 전류 밀도 과대"),
            row("부족: 단선", "설계: 권선 사양 오류"),
            row("부족: 단선", "설계: 도면 누락"),
            row("부족: 이완", "재료: 볼트 재질 편차"),
            row("부족: 이완", "제작: 토크 관리 누락"),
        ];
        let findings = check_dataset(&rows, &RuleSet::builtin(), &EngineConfig::default());
        let out = &findings.violations;
        assert_eq!(
            ids(out),
            vec![
                rule_id::DATASET_TAG_COVERAGE,
                rule_id::DATASET_TAG_COVERAGE,
                rule_id::DATASET_LIFECYCLE_IMBALANCE,
                rule_id::DATASET_LIFECYCLE_ABSENT,
            ]
        );
        assert!(out.iter().take(2).all(|record| record.severity == Severity::Info));
        assert!(out[3].is_blocking());
    }

    #[test]
    fn coverage_follows_the_ontology_tag_list() {
        let rules = parse("## SECTION:REQUIRED_TAGS\n누설:, 부족:\n---\n");
        let rows = vec![
            row("누설: 냉매", "설계: a"),
            row("누설: 오일", "재료: b"),
            row("과도: 변형", "제작: c"),
            row("과도: 토크", "시험: d"),
        ];
        let findings = check_dataset(&rows, &rules, &EngineConfig::default());
        assert_eq!(findings.tag_distribution.mode_tags["누설:"], 2);
        assert!(!findings.tag_distribution.mode_tags.contains_key("과도:"));

        let coverage: Vec<_> = findings
            .violations
            .iter()
            .filter(|record| record.rule_id == rule_id::DATASET_TAG_COVERAGE)
            .collect();
        assert_eq!(coverage.len(), 1);
        assert_eq!(coverage[0].severity, Severity::Info);
        assert!(coverage[0].message.contains("부족:"));
    }

    #[test]
    fn sparse_functions_and_thin_primary_share_warn() {
        let mut rows = Vec::new();
        for (function, count) in [("지지한다", 1), ("전류를 흘린다", 3), ("냉각한다", 1)] {
            for _ in 0..count {
                rows.push(Row {
                    component: "권선".into(),
                    function: function.into(),
                    ..row("부족: 단선", "설계: a")
                });
            }
        }
        let findings = check_dataset(&rows, &RuleSet::builtin(), &EngineConfig::default());
        let coverage = &findings.function_coverage;
        assert_eq!(coverage.grouped_rows, 5);
        assert_eq!(coverage.primary_rows, 1);
        assert_eq!(coverage.primary_share, 0.2);
        assert!(coverage.functions[0].primary);
        assert_eq!(coverage.functions[1].rows, 3);

        let spread: Vec<_> = findings
            .violations
            .iter()
            .filter(|record| {
                record.rule_id == rule_id::DATASET_PRIMARY_FUNCTION_SHARE
                    || record.rule_id == rule_id::DATASET_FUNCTION_SPARSE
            })
            .collect();
        assert_eq!(
            spread.iter().map(|record| record.rule_id.as_str()).collect::<Vec<_>>(),
            vec![
                rule_id::DATASET_PRIMARY_FUNCTION_SHARE,
                rule_id::DATASET_FUNCTION_SPARSE,
                rule_id::DATASET_FUNCTION_SPARSE,
            ]
        );
        assert!(spread.iter().all(|record| record.severity == Severity::Warning));
        assert!(spread[2].message.contains("냉각한다"));
    }

    #[test]
    fn primary_function_is_tracked_per_component() {
        let rows: Vec<Row> = [("권선", "절연"), ("철심", "자속"), ("권선", "통전"), ("철심", "자속")]
            .into_iter()
            .map(|(component, function)| Row {
                component: component.into(),
                function: function.into(),
                ..Row::default()
            })
            .collect();
        let coverage = FunctionCoverage::collect(&rows);
        assert_eq!(coverage.primary_rows, 3);
        assert_eq!(coverage.functions.len(), 3);
        assert!(!coverage.functions[2].primary);
    }

    #[test]
    fn empty_dataset_has_no_findings() {
        let findings = check_dataset(&[], &RuleSet::builtin(), &EngineConfig::default());
        assert!(findings.violations.is_empty());
    }
}
