use serde_json::Value;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use std::time::{SystemTime, UNIX_EPOCH};

struct TempDirGuard {
    path: PathBuf,
}

impl TempDirGuard {
    fn new(prefix: &str) -> Self {
        let unique = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_else(|e| panic!("clock before unix epoch: {e}"))
            .as_nanos();
        let path = std::env::temp_dir().join(format!(
            "fmea-cli-{prefix}-{}-{unique}",
            std::process::id()
        ));
        fs::create_dir_all(&path).unwrap_or_else(|e| panic!("temp dir not created: {e}"));
        Self { path }
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.path.join(name);
        fs::write(&path, contents).unwrap_or_else(|e| panic!("write {}: {e}", path.display()));
        path
    }
}

impl Drop for TempDirGuard {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.path);
    }
}

fn run_fmea<I, S>(args: I) -> Output
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let bin = env!("CARGO_BIN_EXE_fmea");
    Command::new(bin)
        .args(args)
        .output()
        .unwrap_or_else(|e| panic!("fmea command should execute: {e}"))
}

fn assert_success(output: &Output) {
    if !output.status.success() {
        panic!(
            "command failed with status {:?}\nstdout:\n{}\nstderr:\n{}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        );
    }
}

fn stdout_text(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

fn parse_json_stdout(output: &Output) -> Value {
    serde_json::from_slice::<Value>(&output.stdout).unwrap_or_else(|e| {
        panic!(
            "stdout is not json: {e}\nstdout:\n{}\nstderr:\n{}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr),
        )
    })
}

/// Two functions, one mode per effect and one cause per mode: structurally
/// linear, so validation fails, but sorting still yields a clean plan.
const LINEAR_ROWS: &str = r#"{"rows": [
  {"A": "권선", "B": "절연을 유지한다", "C": "절연 파괴\n(운전 정지)", "S": 9,
   "E": "부족: 절연지 파손\n(권선 말단)", "F": "제작: 취급 부주의\n(운반 중 충격)",
   "G": "취급 충격 -> 절연지 손상 -> 절연 파괴", "O": 3, "D": 4},
  {"A": "권선", "B": "전류를 흘린다", "C": "통전 불가\n(출력 정지)", "S": 8,
   "E": "부족: 단선\n(권선 인출부)", "F": "설계: 접합 면적 마진 부족\n(도면 검토 누락)",
   "G": "접합 면적 부족 -> 접합부 취약 -> 소선 단선", "O": 3, "D": 4},
  {"A": "권선", "B": "절연을 유지한다", "C": "절연 파괴\n(운전 정지)", "S": 9,
   "E": "과도: 도체 돌출\n(권선 모서리)", "F": "시험: 내전압 시험 누락\n(절차 미준수)",
   "G": "시험 누락 -> 돌출 미검출 -> 절연 파괴", "O": 2, "D": 5}
]}"#;

#[test]
fn validate_reports_failure_with_exit_code_one() {
    let dir = TempDirGuard::new("validate");
    let rows = dir.write("rows.json", LINEAR_ROWS);

    let output = run_fmea([OsStr::new("validate"), rows.as_os_str(), OsStr::new("--json")]);
    assert_eq!(output.status.code(), Some(1));

    let report = parse_json_stdout(&output);
    assert_eq!(report["schema"], 1);
    assert_eq!(report["totalRows"], 3);
    assert_eq!(report["overallStatus"], "fail");
    assert_eq!(report["structuralStats"]["branchingPerLevel"]["mode->cause"], 1.0);
    assert_eq!(report["ruleOrigin"]["kind"], "builtin");
    assert_eq!(report["documents"].as_array().map(Vec::len), Some(1));
}

#[test]
fn plan_emits_sorted_order_and_ranges() {
    let dir = TempDirGuard::new("plan");
    let rows = dir.write("rows.json", LINEAR_ROWS);
    let config = dir.write(
        "engine.toml",
        "[ordering]\nfunction_order = [\"전류를 흘린다\"]\n",
    );

    let output = run_fmea([
        OsStr::new("plan"),
        rows.as_os_str(),
        OsStr::new("--config"),
        config.as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_success(&output);

    let plan = parse_json_stdout(&output);
    assert_eq!(plan["reportKind"], "fmea.merge_plan.v1");
    assert_eq!(plan["sortedRowOrder"], serde_json::json!([1, 2, 0]));
    assert_eq!(plan["overallStatus"], "pass");
    let ranges = plan["ranges"]
        .as_array()
        .unwrap_or_else(|| panic!("ranges should be an array: {plan}"));
    assert!(ranges.iter().any(|range| {
        range["column"] == "effect" && range["rowStart"] == 1 && range["rowEnd"] == 2
    }));
    assert!(!ranges.iter().any(|range| range["column"] == "mode"));
}

#[test]
fn check_field_accepts_aliases_and_flags_short_chains() {
    let output = run_fmea(["check-field", "G", "A -> B"]);
    assert_eq!(output.status.code(), Some(1));
    assert!(stdout_text(&output).contains("mechanism.chain_too_short"));

    let output = run_fmea(["check-field", "메커니즘", "A -> B -> C"]);
    assert_success(&output);
    assert!(stdout_text(&output).contains("ok"));
}

#[test]
fn check_pair_reports_forbidden_pair() {
    let output = run_fmea([
        "check-pair",
        "mode->cause",
        "부족: 층간단락",
        "설계: 턴수설계오류",
        "--json",
    ]);
    assert_eq!(output.status.code(), Some(1));
    let check = parse_json_stdout(&output);
    assert_eq!(check["status"], "failed");
    assert_eq!(check["violation"]["severity"], "BLOCKING");
}

#[test]
fn ontology_falls_back_when_file_is_missing() {
    let dir = TempDirGuard::new("ontology");
    let missing = dir.path().join("absent.md");

    let output = run_fmea([
        OsStr::new("ontology"),
        OsStr::new("--ontology"),
        missing.as_os_str(),
        OsStr::new("--json"),
    ]);
    assert_success(&output);
    let summary = parse_json_stdout(&output);
    assert_eq!(summary["origin"]["kind"], "fallback");
    assert_eq!(
        summary["summary"]["requiredTags"],
        serde_json::json!(["부족:", "과도:", "유해:"])
    );
}

#[test]
fn normalize_rewrites_aliases_to_canonical_keys() {
    let dir = TempDirGuard::new("normalize");
    let rows = dir.write("rows.json", r#"[{"고장형태": "부족: 단선", "SOD": "S7xO3xD4"}]"#);

    let output = run_fmea([OsStr::new("normalize"), rows.as_os_str()]);
    assert_success(&output);
    let document = parse_json_stdout(&output);
    assert_eq!(document["rows"][0]["mode"], "부족: 단선");
    assert_eq!(document["rows"][0]["severity"], 7);
    assert_eq!(document["rows"][0]["detectionRating"], 4);
}

#[test]
fn unreadable_input_exits_with_two() {
    let dir = TempDirGuard::new("fatal");
    let missing = dir.path().join("absent.json");
    let output = run_fmea([OsStr::new("validate"), missing.as_os_str()]);
    assert_eq!(output.status.code(), Some(2));
    assert!(String::from_utf8_lossy(&output.stderr).contains("error:"));
}
