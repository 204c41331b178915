use crate::support::{
    EXIT_FAIL, parse_field_kind_or_exit, print_json, rules_or_builtin, session_or_exit,
};
use fmea_kernel::SeverityCounts;
use serde_json::json;

pub fn run(kind: String, value: String, ontology: Option<String>, json_output: bool) {
    let kind = parse_field_kind_or_exit(&kind);
    let mut session = session_or_exit(None);
    let loaded = rules_or_builtin(ontology.as_deref(), &mut session);
    let violations = fmea_validate::validate(kind, &value, &loaded.rules);
    let counts = SeverityCounts::tally(&violations);

    if json_output {
        print_json(&json!({
            "field": kind,
            "value": value,
            "violations": violations,
            "counts": counts,
        }));
    } else if violations.is_empty() {
        println!("fmea check-field {kind}: ok");
    } else {
        println!("fmea check-field {kind}:");
        for record in &violations {
            println!("  - {record}");
        }
    }

    if counts.blocking > 0 {
        std::process::exit(EXIT_FAIL);
    }
}
