use crate::support::{
    EXIT_FAIL, parse_relation_or_exit, print_json, rules_or_builtin, session_or_exit,
};
use fmea_validate::CheckStatus;

pub fn run(relation: String, a: String, b: String, ontology: Option<String>, json_output: bool) {
    let relation = parse_relation_or_exit(&relation);
    let mut session = session_or_exit(None);
    let loaded = rules_or_builtin(ontology.as_deref(), &mut session);
    let check = fmea_validate::check_pair(&a, &b, relation, &loaded.rules);

    if json_output {
        print_json(&check);
    } else {
        let status = match check.status {
            CheckStatus::Passed => "passed",
            CheckStatus::Failed => "failed",
            CheckStatus::Skipped => "skipped (no evidence)",
        };
        println!("fmea check-pair {relation}: {status}");
        if !check.evidence.is_empty() {
            println!("  Evidence: {}", check.evidence.join(", "));
        }
        if let Some(record) = &check.violation {
            println!("  - {record}");
        }
    }

    if check.violation.as_ref().is_some_and(|record| record.is_blocking()) {
        std::process::exit(EXIT_FAIL);
    }
}
