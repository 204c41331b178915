//! Engine configuration: policy thresholds that are business choices rather
//! than derived invariants.
//!
//! Loaded from TOML. Every table and field has a default, so an empty file
//! (or no file) yields [`EngineConfig::default`].

use crate::error::KernelError;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EngineConfig {
    pub diamond: DiamondConfig,
    pub ordering: OrderingConfig,
    pub lifecycle_balance: LifecycleBalanceConfig,
    pub function_coverage: FunctionCoverageConfig,
}

/// Thresholds for the dataset-wide fan-out check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DiamondConfig {
    /// The check fails when mean causes per mode is below this.
    pub min_mode_cause_branching: f64,
    /// The check fails when the linear-chain fraction reaches this.
    pub max_linear_ratio: f64,
    /// Warning threshold for mean effects per function.
    pub min_function_effect_branching: f64,
    /// Warning threshold for mean modes per effect.
    pub min_effect_mode_branching: f64,
}

impl Default for DiamondConfig {
    fn default() -> Self {
        Self {
            min_mode_cause_branching: 2.0,
            max_linear_ratio: 0.30,
            min_function_effect_branching: 1.5,
            min_effect_mode_branching: 1.5,
        }
    }
}

/// Explicit function ordering for the sort planner.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OrderingConfig {
    /// Functions listed here sort in list order; unlisted ones sort after,
    /// lexicographically.
    pub function_order: Vec<String>,
}

/// Bounds on each lifecycle stage's share of all causes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LifecycleBalanceConfig {
    pub min_share: f64,
    pub max_share: f64,
}

impl Default for LifecycleBalanceConfig {
    fn default() -> Self {
        Self {
            min_share: 0.10,
            max_share: 0.50,
        }
    }
}

/// Row counts expected per function.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FunctionCoverageConfig {
    /// A (component, function) pair with fewer rows warns.
    pub min_rows_per_function: usize,
    /// Each component's first function should hold at least this share of
    /// all rows.
    pub min_primary_share: f64,
}

impl Default for FunctionCoverageConfig {
    fn default() -> Self {
        Self {
            min_rows_per_function: 2,
            min_primary_share: 0.30,
        }
    }
}

impl EngineConfig {
    pub fn from_toml_str(text: &str, origin: &str) -> Result<Self, KernelError> {
        let config: Self = toml::from_str(text).map_err(|source| KernelError::ParseToml {
            path: origin.to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, KernelError> {
        let text = std::fs::read_to_string(path).map_err(|source| KernelError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text, &path.display().to_string())
    }

    /// Reject values outside their domain.
    pub fn validate(&self) -> Result<(), KernelError> {
        let diamond = &self.diamond;
        for (name, value) in [
            ("diamond.min_mode_cause_branching", diamond.min_mode_cause_branching),
            (
                "diamond.min_function_effect_branching",
                diamond.min_function_effect_branching,
            ),
            (
                "diamond.min_effect_mode_branching",
                diamond.min_effect_mode_branching,
            ),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(KernelError::InvalidConfig(format!(
                    "{name} must be a non-negative number, got {value}"
                )));
            }
        }
        for (name, value) in [
            ("diamond.max_linear_ratio", diamond.max_linear_ratio),
            ("lifecycle_balance.min_share", self.lifecycle_balance.min_share),
            ("lifecycle_balance.max_share", self.lifecycle_balance.max_share),
            (
                "function_coverage.min_primary_share",
                self.function_coverage.min_primary_share,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(KernelError::InvalidConfig(format!(
                    "{name} must be within 0..=1, got {value}"
                )));
            }
        }
        if self.lifecycle_balance.min_share > self.lifecycle_balance.max_share {
            return Err(KernelError::InvalidConfig(
                "lifecycle_balance.min_share exceeds max_share".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let config = EngineConfig::from_toml_str("", "inline").unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.diamond.min_mode_cause_branching, 2.0);
        assert_eq!(config.diamond.max_linear_ratio, 0.30);
    }

    #[test]
    fn partial_tables_override_only_named_fields() {
        let config = EngineConfig::from_toml_str(
            "[diamond]\nmin_mode_cause_branching = 3.0\n\n[ordering]\nfunction_order = [\"지지\", \"통전\"]\n",
            "inline",
        )
        .unwrap();
        assert_eq!(config.diamond.min_mode_cause_branching, 3.0);
        assert_eq!(config.diamond.max_linear_ratio, 0.30);
        assert_eq!(config.ordering.function_order, vec!["지지", "통전"]);
        assert_eq!(config.function_coverage, FunctionCoverageConfig::default());
    }

    #[test]
    fn function_coverage_table_is_read_and_checked() {
        let config = EngineConfig::from_toml_str(
            "[function_coverage]\nmin_rows_per_function = 3\n",
            "inline",
        )
        .unwrap();
        assert_eq!(config.function_coverage.min_rows_per_function, 3);
        assert_eq!(config.function_coverage.min_primary_share, 0.30);

        let err = EngineConfig::from_toml_str(
            "[function_coverage]\nmin_primary_share = 2.0\n",
            "inline",
        )
        .unwrap_err();
        assert!(matches!(err, KernelError::InvalidConfig(_)));
    }

    #[test]
    fn out_of_domain_values_are_rejected() {
        let err = EngineConfig::from_toml_str("[diamond]\nmax_linear_ratio = 1.5\n", "inline")
            .unwrap_err();
        assert!(matches!(err, KernelError::InvalidConfig(_)));

        let err = EngineConfig::from_toml_str(
            "[lifecycle_balance]\nmin_share = 0.6\nmax_share = 0.4\n",
            "inline",
        )
        .unwrap_err();
        assert!(matches!(err, KernelError::InvalidConfig(_)));
    }

    #[test]
    fn unknown_keys_are_parse_errors() {
        let err = EngineConfig::from_toml_str("[diamond]\nmin_branching = 2.0\n", "inline")
            .unwrap_err();
        assert!(matches!(err, KernelError::ParseToml { .. }));
    }
}
