//! Dataset-wide fan-out shape ("diamond structure").
//!
//! For each adjacent level pair (function->effect, effect->mode, mode->cause)
//! every distinct parent value maps to the set of distinct child values seen
//! anywhere in the row set. The mean set size is the level's branching
//! factor. A row is *linear* when its function, effect and mode each have
//! exactly one distinct child.

use fmea_kernel::text::normalized_key;
use fmea_kernel::{DiamondConfig, FieldKind, Row, Severity, ViolationRecord, rule_id};
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

const FIELD: &str = "dataset";

/// A parent->child level of the hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HierarchyLevel {
    #[serde(rename = "function->effect")]
    FunctionEffect,
    #[serde(rename = "effect->mode")]
    EffectMode,
    #[serde(rename = "mode->cause")]
    ModeCause,
}

pub const ALL_LEVELS: &[HierarchyLevel] = &[
    HierarchyLevel::FunctionEffect,
    HierarchyLevel::EffectMode,
    HierarchyLevel::ModeCause,
];

impl HierarchyLevel {
    pub fn fields(self) -> (FieldKind, FieldKind) {
        match self {
            Self::FunctionEffect => (FieldKind::Function, FieldKind::Effect),
            Self::EffectMode => (FieldKind::Effect, FieldKind::Mode),
            Self::ModeCause => (FieldKind::Mode, FieldKind::Cause),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FunctionEffect => "function->effect",
            Self::EffectMode => "effect->mode",
            Self::ModeCause => "mode->cause",
        }
    }
}

/// A failure mode attributed to a single distinct cause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SingleCauseMode {
    pub mode: String,
    pub cause_count: usize,
}

type FanOut = BTreeMap<String, BTreeSet<String>>;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DatasetStats {
    /// Mean distinct children per parent; 0.0 for a level with no parents.
    pub branching_per_level: BTreeMap<HierarchyLevel, f64>,
    /// Fraction of complete rows that are linear.
    pub linear_ratio: f64,
    pub linear_rows: usize,
    /// Rows with function, effect, mode and cause all filled in.
    pub complete_rows: usize,
    pub single_cause_modes: Vec<SingleCauseMode>,
    #[serde(skip)]
    pub fan_out: BTreeMap<HierarchyLevel, FanOut>,
}

impl DatasetStats {
    pub fn compute(rows: &[Row]) -> Self {
        let mut fan_out: BTreeMap<HierarchyLevel, FanOut> = BTreeMap::new();
        for level in ALL_LEVELS.iter().copied() {
            let (parent, child) = level.fields();
            let map = fan_out.entry(level).or_default();
            for row in rows {
                let parent = key(row, parent);
                let child = key(row, child);
                if parent.is_empty() || child.is_empty() {
                    continue;
                }
                map.entry(parent).or_default().insert(child);
            }
        }

        let branching_per_level = fan_out
            .iter()
            .map(|(level, map)| (*level, mean_branching(map)))
            .collect();

        let children = |level: HierarchyLevel, parent: &str| -> usize {
            fan_out
                .get(&level)
                .and_then(|map| map.get(parent))
                .map_or(0, BTreeSet::len)
        };
        let mut complete_rows = 0;
        let mut linear_rows = 0;
        for row in rows {
            let [function, effect, mode, cause] = [
                FieldKind::Function,
                FieldKind::Effect,
                FieldKind::Mode,
                FieldKind::Cause,
            ]
            .map(|kind| key(row, kind));
            if [&function, &effect, &mode, &cause].iter().any(|v| v.is_empty()) {
                continue;
            }
            complete_rows += 1;
            if children(HierarchyLevel::FunctionEffect, &function) == 1
                && children(HierarchyLevel::EffectMode, &effect) == 1
                && children(HierarchyLevel::ModeCause, &mode) == 1
            {
                linear_rows += 1;
            }
        }
        let linear_ratio = if complete_rows == 0 {
            0.0
        } else {
            linear_rows as f64 / complete_rows as f64
        };

        let single_cause_modes = fan_out
            .get(&HierarchyLevel::ModeCause)
            .into_iter()
            .flatten()
            .filter(|(_, causes)| causes.len() == 1)
            .map(|(mode, causes)| SingleCauseMode {
                mode: mode.clone(),
                cause_count: causes.len(),
            })
            .collect();

        Self {
            branching_per_level,
            linear_ratio,
            linear_rows,
            complete_rows,
            single_cause_modes,
            fan_out,
        }
    }

    pub fn branching(&self, level: HierarchyLevel) -> f64 {
        self.branching_per_level.get(&level).copied().unwrap_or(0.0)
    }
}

fn key(row: &Row, kind: FieldKind) -> String {
    row.text(kind).map(normalized_key).unwrap_or_default()
}

fn mean_branching(map: &FanOut) -> f64 {
    if map.is_empty() {
        return 0.0;
    }
    let total: usize = map.values().map(BTreeSet::len).sum();
    total as f64 / map.len() as f64
}

/// Compute the statistics and judge them against `config`.
///
/// The check fails (BLOCKING) when mean causes per mode is below the
/// configured minimum or the linear fraction reaches its maximum. The two
/// upper levels only warn.
pub fn check_diamond(rows: &[Row], config: &DiamondConfig) -> (DatasetStats, Vec<ViolationRecord>) {
    let stats = DatasetStats::compute(rows);
    let mut out = Vec::new();

    let mode_cause = stats.branching(HierarchyLevel::ModeCause);
    if mode_cause < config.min_mode_cause_branching {
        let listed: Vec<String> = stats
            .single_cause_modes
            .iter()
            .map(|entry| entry.mode.replace('\n', " / "))
            .collect();
        let mut record = ViolationRecord::new(
            FIELD,
            Severity::Blocking,
            rule_id::STRUCTURE_MODE_CAUSE_BRANCHING,
            format!(
                "mode->cause branching is {mode_cause:.2}, expected at least {:.2}",
                config.min_mode_cause_branching
            ),
        );
        if !listed.is_empty() {
            record = record.with_suggestion(format!(
                "add causes for single-cause modes: {}",
                listed.join(" | ")
            ));
        }
        out.push(record);
    }

    if stats.linear_ratio >= config.max_linear_ratio {
        out.push(
            ViolationRecord::new(
                FIELD,
                Severity::Blocking,
                rule_id::STRUCTURE_LINEAR_RATIO,
                format!(
                    "{} of {} rows ({:.1}%) form one-to-one chains, limit is {:.1}%",
                    stats.linear_rows,
                    stats.complete_rows,
                    stats.linear_ratio * 100.0,
                    config.max_linear_ratio * 100.0
                ),
            )
            .with_suggestion("give effects several modes and modes several causes"),
        );
    }

    for (level, minimum, rule) in [
        (
            HierarchyLevel::FunctionEffect,
            config.min_function_effect_branching,
            rule_id::STRUCTURE_FUNCTION_EFFECT_BRANCHING,
        ),
        (
            HierarchyLevel::EffectMode,
            config.min_effect_mode_branching,
            rule_id::STRUCTURE_EFFECT_MODE_BRANCHING,
        ),
    ] {
        let value = stats.branching(level);
        if value < minimum {
            out.push(ViolationRecord::new(
                FIELD,
                Severity::Warning,
                rule,
                format!("{level} branching is {value:.2}, expected at least {minimum:.2}"),
            ));
        }
    }

    tracing::debug!(
        mode_cause,
        linear_ratio = stats.linear_ratio,
        single_cause_modes = stats.single_cause_modes.len(),
        "diamond statistics"
    );
    (stats, out)
}

impl std::fmt::Display for HierarchyLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
