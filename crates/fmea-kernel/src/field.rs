//! Canonical field kinds and the alias table applied at the input boundary.
//!
//! Source documents address the same column by a spreadsheet letter, a
//! Korean header, or an English name. Resolution happens exactly once, in
//! [`FieldKind::resolve_alias`]; everything past ingestion uses the enum.

use serde::{Deserialize, Serialize};

/// One column of an FMEA row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    Component,
    Function,
    /// Explicit ordering index for the function column.
    FunctionOrder,
    Effect,
    Severity,
    Mode,
    Cause,
    Mechanism,
    Prevention,
    Occurrence,
    Detection,
    /// The D score, as opposed to the detection-control text.
    DetectionRating,
}

/// Every field in sheet order.
pub const ALL_FIELDS: &[FieldKind] = &[
    FieldKind::Component,
    FieldKind::Function,
    FieldKind::FunctionOrder,
    FieldKind::Effect,
    FieldKind::Severity,
    FieldKind::Mode,
    FieldKind::Cause,
    FieldKind::Mechanism,
    FieldKind::Prevention,
    FieldKind::Occurrence,
    FieldKind::Detection,
    FieldKind::DetectionRating,
];

/// Alias -> canonical field. Matching is exact after trimming.
pub const FIELD_ALIASES: &[(&str, FieldKind)] = &[
    ("component", FieldKind::Component),
    ("part", FieldKind::Component),
    ("A", FieldKind::Component),
    ("부품명", FieldKind::Component),
    ("부품", FieldKind::Component),
    ("function", FieldKind::Function),
    ("B", FieldKind::Function),
    ("기능", FieldKind::Function),
    ("function_order", FieldKind::FunctionOrder),
    ("functionOrder", FieldKind::FunctionOrder),
    ("기능_순서", FieldKind::FunctionOrder),
    ("effect", FieldKind::Effect),
    ("C", FieldKind::Effect),
    ("고장영향", FieldKind::Effect),
    ("영향", FieldKind::Effect),
    ("severity", FieldKind::Severity),
    ("S", FieldKind::Severity),
    ("심각도", FieldKind::Severity),
    ("mode", FieldKind::Mode),
    ("E", FieldKind::Mode),
    ("고장형태", FieldKind::Mode),
    ("형태", FieldKind::Mode),
    ("cause", FieldKind::Cause),
    ("F", FieldKind::Cause),
    ("고장원인", FieldKind::Cause),
    ("원인", FieldKind::Cause),
    ("mechanism", FieldKind::Mechanism),
    ("G", FieldKind::Mechanism),
    ("고장메커니즘", FieldKind::Mechanism),
    ("메커니즘", FieldKind::Mechanism),
    ("prevention", FieldKind::Prevention),
    ("H", FieldKind::Prevention),
    ("현재예방대책", FieldKind::Prevention),
    ("예방조치", FieldKind::Prevention),
    ("예방대책", FieldKind::Prevention),
    ("occurrence", FieldKind::Occurrence),
    ("O", FieldKind::Occurrence),
    ("발생도", FieldKind::Occurrence),
    ("detection", FieldKind::Detection),
    ("J", FieldKind::Detection),
    ("현재검출대책", FieldKind::Detection),
    ("검출방법", FieldKind::Detection),
    ("검출대책", FieldKind::Detection),
    ("detection_rating", FieldKind::DetectionRating),
    ("detectionRating", FieldKind::DetectionRating),
    ("D", FieldKind::DetectionRating),
    ("검출도", FieldKind::DetectionRating),
];

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Component => "component",
            Self::Function => "function",
            Self::FunctionOrder => "function_order",
            Self::Effect => "effect",
            Self::Severity => "severity",
            Self::Mode => "mode",
            Self::Cause => "cause",
            Self::Mechanism => "mechanism",
            Self::Prevention => "prevention",
            Self::Occurrence => "occurrence",
            Self::Detection => "detection",
            Self::DetectionRating => "detection_rating",
        }
    }

    /// Resolve an input key to its canonical field, if it names one.
    pub fn resolve_alias(key: &str) -> Option<Self> {
        let key = key.trim();
        FIELD_ALIASES
            .iter()
            .find_map(|(alias, kind)| (*alias == key).then_some(*kind))
    }

    /// S, O and D carry numbers instead of text.
    pub fn is_score(self) -> bool {
        matches!(
            self,
            Self::Severity | Self::Occurrence | Self::DetectionRating
        )
    }

    /// Free-text fields that every row must fill in.
    pub fn is_required_text(self) -> bool {
        !self.is_score() && self != Self::FunctionOrder
    }
}

impl std::fmt::Display for FieldKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        ALL_FIELDS
            .iter()
            .copied()
            .find(|kind| kind.as_str() == trimmed.to_lowercase())
            .or_else(|| Self::resolve_alias(trimmed))
            .ok_or_else(|| format!("unknown field kind: {s}"))
    }
}

/// A directed relation checked between two fields of one row.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Relation {
    #[serde(rename = "function->effect")]
    FunctionEffect,
    #[serde(rename = "cause->mechanism")]
    CauseMechanism,
    #[serde(rename = "mode->cause")]
    ModeCause,
    #[serde(rename = "effect->mode")]
    EffectMode,
    #[serde(rename = "mechanism->mode")]
    MechanismMode,
    #[serde(rename = "cause->prevention")]
    CausePrevention,
    #[serde(rename = "mode->detection")]
    ModeDetection,
}

/// Every relation, in the order the cross-field checker evaluates them.
pub const ALL_RELATIONS: &[Relation] = &[
    Relation::FunctionEffect,
    Relation::CauseMechanism,
    Relation::ModeCause,
    Relation::EffectMode,
    Relation::MechanismMode,
    Relation::CausePrevention,
    Relation::ModeDetection,
];

impl Relation {
    /// (source, target) fields of the relation.
    pub fn endpoints(self) -> (FieldKind, FieldKind) {
        match self {
            Self::FunctionEffect => (FieldKind::Function, FieldKind::Effect),
            Self::CauseMechanism => (FieldKind::Cause, FieldKind::Mechanism),
            Self::ModeCause => (FieldKind::Mode, FieldKind::Cause),
            Self::EffectMode => (FieldKind::Effect, FieldKind::Mode),
            Self::MechanismMode => (FieldKind::Mechanism, FieldKind::Mode),
            Self::CausePrevention => (FieldKind::Cause, FieldKind::Prevention),
            Self::ModeDetection => (FieldKind::Mode, FieldKind::Detection),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FunctionEffect => "function->effect",
            Self::CauseMechanism => "cause->mechanism",
            Self::ModeCause => "mode->cause",
            Self::EffectMode => "effect->mode",
            Self::MechanismMode => "mechanism->mode",
            Self::CausePrevention => "cause->prevention",
            Self::ModeDetection => "mode->detection",
        }
    }
}

impl std::fmt::Display for Relation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Relation {
    type Err = String;

    /// Accepts `mode->cause`, `mode→cause`, `mode_cause` and field aliases on
    /// either side (`E->F`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().replace('→', "->");
        let (left, right) = normalized
            .split_once("->")
            .or_else(|| normalized.split_once('_'))
            .ok_or_else(|| format!("unknown relation: {s}"))?;
        let left: FieldKind = left.parse()?;
        let right: FieldKind = right.parse()?;
        ALL_RELATIONS
            .iter()
            .copied()
            .find(|relation| relation.endpoints() == (left, right))
            .ok_or_else(|| format!("unknown relation: {s}"))
    }
}
