//! # FMEA Ontology
//!
//! Turns the externally maintained rule text into a typed [`RuleSet`].
//!
//! ```text
//! rule text ──parse_sections──▶ [Section::Known | Section::Ignored]
//!                                   │
//!           built-in RuleSet ──overlay──▶ RuleSet (+ ParseDiagnostics)
//! ```
//!
//! [`parse`] is a pure function of its input. Text with no recognized
//! section (including the empty string) yields the built-in default rule set,
//! and [`load_ruleset`] falls back to the same defaults when the ontology
//! file is missing or unreadable.

pub mod loader;
pub mod matcher;
pub mod parser;
pub mod ruleset;

pub use loader::{LoadedRuleSet, RuleOrigin, load_ruleset};
pub use parser::{ParseDiagnostic, Section, SectionKind};
pub use ruleset::{
    CompatibilityRule, ControlRequirements, PairRule, Parsed, RuleSet, RuleSetSummary, TagRule,
    ValuePatterns,
};

use std::sync::OnceLock;

/// The default ontology shipped with the engine.
pub const BUILTIN_ONTOLOGY: &str = include_str!("../ontology/builtin.md");

impl RuleSet {
    /// The built-in default rule set.
    pub fn builtin() -> Self {
        static BUILTIN: OnceLock<RuleSet> = OnceLock::new();
        BUILTIN
            .get_or_init(|| RuleSet::empty().overlay(BUILTIN_ONTOLOGY).rules)
            .clone()
    }
}

/// Parse ontology text into a rule set on top of the built-in defaults.
pub fn parse(text: &str) -> RuleSet {
    parse_with_diagnostics(text).rules
}

/// Like [`parse`], also returning skipped lines and ignored sections.
pub fn parse_with_diagnostics(text: &str) -> Parsed {
    RuleSet::builtin().overlay(text)
}
