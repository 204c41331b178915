//! Hierarchical row ordering.
//!
//! Rows sort by component, function rank, effect, severity (descending),
//! mode, cause lifecycle stage, then cause. Text keys compare on the primary
//! line first and the full normalized value second, so rows that share a
//! merge value always end up adjacent. The sort is stable.

use fmea_kernel::tags::UNKNOWN_STAGE_RANK;
use fmea_kernel::text::{normalized_key, primary_line};
use fmea_kernel::{LifecycleStage, OrderingConfig, Row};
use std::cmp::Reverse;
use std::collections::BTreeMap;

/// Rank of a function with neither an explicit order nor a configured slot.
pub const UNRANKED_FUNCTION: u32 = 999;

/// Function ranking policy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderingSpec {
    /// Functions ranked by list position when rows carry no explicit order.
    pub function_order: Vec<String>,
}

impl From<&OrderingConfig> for OrderingSpec {
    fn from(config: &OrderingConfig) -> Self {
        Self {
            function_order: config
                .function_order
                .iter()
                .map(|name| normalized_key(name))
                .collect(),
        }
    }
}

impl OrderingSpec {
    fn configured_rank(&self, function: &str) -> Option<u32> {
        self.function_order
            .iter()
            .position(|name| name == function)
            .and_then(|index| u32::try_from(index).ok())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct TextKey {
    primary: String,
    full: String,
}

impl TextKey {
    fn of(value: &str) -> Self {
        let full = normalized_key(value);
        Self {
            primary: primary_line(&full).to_string(),
            full,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct SortKey {
    component: String,
    function_rank: u32,
    function: String,
    effect: TextKey,
    severity: Reverse<Option<i64>>,
    mode: TextKey,
    stage_rank: u8,
    cause: TextKey,
}

/// Rank of each (component, function) group: the smallest explicit
/// `function_order` among its rows, else the configured position, else
/// [`UNRANKED_FUNCTION`].
fn function_ranks(rows: &[Row], spec: &OrderingSpec) -> BTreeMap<(String, String), u32> {
    let mut explicit: BTreeMap<(String, String), u32> = BTreeMap::new();
    let mut ranks = BTreeMap::new();
    for row in rows {
        let group = (normalized_key(&row.component), normalized_key(&row.function));
        if let Some(order) = row.function_order {
            explicit
                .entry(group.clone())
                .and_modify(|current| *current = (*current).min(order))
                .or_insert(order);
        }
        ranks.entry(group).or_insert(UNRANKED_FUNCTION);
    }
    for (group, rank) in &mut ranks {
        *rank = explicit
            .get(group)
            .copied()
            .or_else(|| spec.configured_rank(&group.1))
            .unwrap_or(UNRANKED_FUNCTION);
    }
    ranks
}

fn sort_key(row: &Row, ranks: &BTreeMap<(String, String), u32>) -> SortKey {
    let component = normalized_key(&row.component);
    let function = normalized_key(&row.function);
    let function_rank = ranks
        .get(&(component.clone(), function.clone()))
        .copied()
        .unwrap_or(UNRANKED_FUNCTION);
    SortKey {
        component,
        function_rank,
        function,
        effect: TextKey::of(&row.effect),
        // None sorts after every score, 0 included; the merge chain keeps
        // them apart too
        severity: Reverse(row.severity),
        mode: TextKey::of(&row.mode),
        stage_rank: LifecycleStage::leading(primary_line(&row.cause))
            .map_or(UNKNOWN_STAGE_RANK, LifecycleStage::rank),
        cause: TextKey::of(&row.cause),
    }
}

/// Sort rows into hierarchical order. Equal keys keep their input order, so
/// sorting an already sorted set is a no-op.
pub fn sort_rows(rows: &[Row], spec: &OrderingSpec) -> Vec<Row> {
    let ranks = function_ranks(rows, spec);
    let mut keyed: Vec<(SortKey, &Row)> = rows.iter().map(|row| (sort_key(row, &ranks), row)).collect();
    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    keyed.into_iter().map(|(_, row)| row.clone()).collect()
}
