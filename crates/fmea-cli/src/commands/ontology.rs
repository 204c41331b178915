use crate::support::{print_json, rules_or_builtin, session_or_exit};
use serde_json::json;

pub fn run(ontology: Option<String>, json_output: bool) {
    let mut session = session_or_exit(None);
    let loaded = rules_or_builtin(ontology.as_deref(), &mut session);
    let summary = loaded.rules.summary();

    if json_output {
        print_json(&json!({
            "origin": loaded.origin,
            "summary": summary,
            "diagnostics": loaded.diagnostics,
            "ignoredSections": loaded.ignored_sections,
        }));
        return;
    }

    println!("fmea ontology");
    println!("  Digest: {}", summary.digest);
    println!("  Required tags: {}", summary.required_tags.join(" "));
    println!(
        "  Mode forbidden: {} keywords in {}",
        summary.mode_forbidden_keywords,
        summary.mode_forbidden_categories.join(", ")
    );
    println!("  Allowed exceptions: {}", summary.allowed_exceptions);
    println!("  Abstract concepts: {}", summary.abstract_concepts);
    println!("  Domains: {}", summary.domain_categories.join(", "));
    for (relation, count) in &summary.forbidden_pairs {
        println!("  Forbidden pairs {relation}: {count}");
    }
    for (relation, count) in &summary.compatibility_rules {
        println!("  Compatibility {relation}: {count}");
    }
    println!(
        "  Controls: at least {} lines, {} lifecycle tags",
        summary.controls.min_lines, summary.controls.min_lifecycle_tags
    );
    for (rule, severity) in &summary.severity_overrides {
        println!("  Override {rule}: {severity}");
    }
    for diagnostic in &loaded.diagnostics {
        println!("  Skipped line {}: {}", diagnostic.line, diagnostic.reason);
    }
    for section in &loaded.ignored_sections {
        println!("  Ignored section: {section}");
    }
}
