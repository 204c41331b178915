//! Action priority and RPN per row. Informational; they never change the
//! overall status.

use crate::field::common::SCORE_RANGE;
use fmea_kernel::Row;
use serde::Serialize;

/// Action priority class (AIAG-VDA).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum ActionPriority {
    #[serde(rename = "H")]
    High,
    #[serde(rename = "M")]
    Medium,
    #[serde(rename = "L")]
    Low,
}

impl ActionPriority {
    pub fn classify(severity: i64, occurrence: i64, detection: i64) -> Self {
        if severity >= 9 || (severity >= 7 && occurrence >= 4) || (severity >= 4 && occurrence >= 7) {
            Self::High
        } else if severity <= 3 && occurrence <= 3 && detection <= 3 {
            Self::Low
        } else {
            Self::Medium
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RowRisk {
    pub row_index: usize,
    /// S x O x D; absent when any score is missing or out of range.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rpn: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action_priority: Option<ActionPriority>,
}

pub fn assess(row: &Row) -> RowRisk {
    let scores = [row.severity, row.occurrence, row.detection_rating];
    let valid = |score: Option<i64>| score.filter(|value| SCORE_RANGE.contains(value));
    let (rpn, action_priority) = match scores.map(valid) {
        [Some(s), Some(o), Some(d)] => (Some(s * o * d), Some(ActionPriority::classify(s, o, d))),
        _ => (None, None),
    };
    RowRisk {
        row_index: row.id,
        rpn,
        action_priority,
    }
}
