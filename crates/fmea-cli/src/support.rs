use fmea_kernel::{EngineConfig, FieldKind, Relation, Session, ViolationRecord};
use fmea_ontology::{LoadedRuleSet, RuleOrigin, load_ruleset};
use serde::Serialize;
use std::path::Path;

/// Exit status for a run that completed with a `fail` verdict.
pub const EXIT_FAIL: i32 = 1;
/// Exit status for fatal conditions (unreadable input, bad arguments).
pub const EXIT_FATAL: i32 = 2;

pub fn fatal(message: impl std::fmt::Display) -> ! {
    eprintln!("error: {message}");
    std::process::exit(EXIT_FATAL);
}

pub fn session_or_exit(config: Option<&str>) -> Session {
    let config = match config {
        Some(path) => EngineConfig::load(Path::new(path)).unwrap_or_else(|e| fatal(e)),
        None => EngineConfig::default(),
    };
    Session::new(config)
}

pub fn rules_or_builtin(ontology: Option<&str>, session: &mut Session) -> LoadedRuleSet {
    let loaded = load_ruleset(ontology.map(Path::new), session);
    if let RuleOrigin::Fallback { path, reason } = &loaded.origin {
        eprintln!("warning: ontology {path} not used ({reason}); using built-in rules");
    }
    loaded
}

pub fn parse_field_kind_or_exit(kind: &str) -> FieldKind {
    kind.parse().unwrap_or_else(|e: String| fatal(e))
}

pub fn parse_relation_or_exit(relation: &str) -> Relation {
    relation.parse().unwrap_or_else(|e: String| fatal(e))
}

pub fn print_json<T: Serialize>(payload: &T) {
    match serde_json::to_string_pretty(payload) {
        Ok(text) => println!("{text}"),
        Err(e) => fatal(format!("json serialization failed: {e}")),
    }
}

pub fn print_violation_block(title: &str, records: &[ViolationRecord]) {
    if records.is_empty() {
        return;
    }
    println!("  {title} ({}):", records.len());
    for record in records {
        println!("    - {record}");
    }
}
