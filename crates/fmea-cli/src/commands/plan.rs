use crate::support::{EXIT_FAIL, fatal, print_json, print_violation_block, session_or_exit};
use fmea_report::{OverallStatus, plan_document};
use std::path::Path;

pub fn run(rows: String, config: Option<String>, json_output: bool) {
    let mut session = session_or_exit(config.as_deref());
    let report = plan_document(Path::new(&rows), &mut session).unwrap_or_else(|e| fatal(e));

    if json_output {
        print_json(&report);
    } else {
        println!("fmea plan {rows}");
        println!("  Rows: {}", report.total_rows);
        let order: Vec<String> = report
            .plan
            .sorted_row_order
            .iter()
            .map(usize::to_string)
            .collect();
        println!("  Order: {}", order.join(" "));
        println!("  Merge ranges ({}):", report.plan.ranges.len());
        for range in &report.plan.ranges {
            println!(
                "    - {} rows {}..={}",
                range.column, range.row_start, range.row_end
            );
        }
        print_violation_block("Contiguity violations", &report.violations);
        println!("  Status: {}", report.overall_status);
    }

    if report.overall_status == OverallStatus::Fail {
        std::process::exit(EXIT_FAIL);
    }
}
