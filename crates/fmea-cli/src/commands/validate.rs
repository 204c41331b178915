use crate::support::{
    EXIT_FAIL, fatal, print_json, print_violation_block, rules_or_builtin, session_or_exit,
};
use fmea_report::{load_rows, run_validation};
use fmea_structure::ALL_LEVELS;
use std::path::Path;

pub fn run(rows: String, ontology: Option<String>, config: Option<String>, json_output: bool) {
    let mut session = session_or_exit(config.as_deref());
    let loaded = rules_or_builtin(ontology.as_deref(), &mut session);
    let row_set = load_rows(Path::new(&rows), &mut session).unwrap_or_else(|e| fatal(e));
    let report = run_validation(&row_set.rows, &loaded, &session);

    if json_output {
        print_json(&report);
    } else {
        println!("fmea validate {rows}");
        println!("  Rows: {}", report.total_rows);
        println!("  Ruleset: {}", report.ruleset_digest);
        for level in ALL_LEVELS.iter().copied() {
            println!(
                "  Branching {level}: {:.2}",
                report.structural_stats.branching(level)
            );
        }
        println!(
            "  Linear ratio: {:.1}% ({} of {} rows)",
            report.structural_stats.linear_ratio * 100.0,
            report.structural_stats.linear_rows,
            report.structural_stats.complete_rows
        );
        println!(
            "  Primary functions: {:.1}% ({} of {} rows)",
            report.function_coverage.primary_share * 100.0,
            report.function_coverage.primary_rows,
            report.function_coverage.grouped_rows
        );
        print_violation_block("Field violations", &report.per_field_violations);
        print_violation_block("Cross-field violations", &report.cross_field_violations);
        print_violation_block("Dataset violations", &report.dataset_violations);
        print_violation_block("Structural violations", &report.structural_violations);
        println!(
            "  Counts: {} blocking, {} warning, {} info",
            report.counts.blocking, report.counts.warning, report.counts.info
        );
        println!("  Status: {}", report.overall_status);
    }

    if !report.passed() {
        std::process::exit(EXIT_FAIL);
    }
}
