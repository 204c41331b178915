use crate::support::{fatal, print_json};
use fmea_kernel::Session;
use fmea_report::load_rows;
use std::path::Path;

pub fn run(rows: String) {
    let mut session = Session::default();
    let row_set = load_rows(Path::new(&rows), &mut session).unwrap_or_else(|e| fatal(e));
    print_json(&row_set.to_canonical_json());
}
