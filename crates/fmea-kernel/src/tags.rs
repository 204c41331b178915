//! Lifecycle stage tags carried by cause and control text.
//!
//! A cause, and each line of a prevention or detection control, begins with
//! one lifecycle stage `설계:` / `재료:` / `제작:` / `시험:`. The bracket
//! spelling `[설계]` is accepted and normalized to `설계:`. Mode tags are
//! ontology data (`REQUIRED_TAGS`), not a fixed set.

use serde::{Deserialize, Serialize};

/// Where in the product lifecycle a cause originates.
///
/// Declaration order is the sort order: design < material < fabrication < test.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleStage {
    Design,
    Material,
    Fabrication,
    Test,
}

pub const ALL_STAGES: &[LifecycleStage] = &[
    LifecycleStage::Design,
    LifecycleStage::Material,
    LifecycleStage::Fabrication,
    LifecycleStage::Test,
];

/// Sort rank used for causes whose stage cannot be determined.
pub const UNKNOWN_STAGE_RANK: u8 = 99;

impl LifecycleStage {
    /// Stage name as written in source text (no colon).
    pub fn label(self) -> &'static str {
        match self {
            Self::Design => "설계",
            Self::Material => "재료",
            Self::Fabrication => "제작",
            Self::Test => "시험",
        }
    }

    pub fn rank(self) -> u8 {
        match self {
            Self::Design => 1,
            Self::Material => 2,
            Self::Fabrication => 3,
            Self::Test => 4,
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim().trim_end_matches(':');
        ALL_STAGES
            .iter()
            .copied()
            .find(|stage| stage.label() == label)
            .or_else(|| match label.to_lowercase().as_str() {
                "design" => Some(Self::Design),
                "material" => Some(Self::Material),
                "fabrication" => Some(Self::Fabrication),
                "test" => Some(Self::Test),
                _ => None,
            })
    }

    /// Stage of a line that starts with `설계:` or `[설계]`.
    pub fn leading(line: &str) -> Option<Self> {
        let line = line.trim_start();
        ALL_STAGES.iter().copied().find(|stage| {
            let label = stage.label();
            line.strip_prefix(label)
                .is_some_and(|rest| rest.starts_with(':') || rest.starts_with('：'))
                || line
                    .strip_prefix('[')
                    .and_then(|rest| rest.strip_prefix(label))
                    .is_some_and(|rest| rest.starts_with(']'))
        })
    }

    /// All distinct stages tagged anywhere in `text` (`설계:` or `[설계]`).
    pub fn tagged_in(text: &str) -> Vec<Self> {
        ALL_STAGES
            .iter()
            .copied()
            .filter(|stage| {
                let label = stage.label();
                text.contains(&format!("{label}:"))
                    || text.contains(&format!("{label}："))
                    || text.contains(&format!("[{label}]"))
            })
            .collect()
    }
}

impl std::fmt::Display for LifecycleStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for LifecycleStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_label(s).ok_or_else(|| format!("unknown lifecycle stage: {s}"))
    }
}

/// Rewrite `[설계] text` line prefixes as `설계: text`.
pub fn normalize_bracket_stages(text: &str) -> String {
    text.lines()
        .map(|line| {
            let trimmed = line.trim_start();
            for stage in ALL_STAGES {
                let bracket = format!("[{}]", stage.label());
                if let Some(rest) = trimmed.strip_prefix(&bracket) {
                    return format!("{}: {}", stage.label(), rest.trim_start());
                }
            }
            line.to_string()
        })
        .collect::<Vec<_>>()
        .join("\n")
}
