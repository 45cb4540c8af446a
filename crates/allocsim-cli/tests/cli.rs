use std::io::Write;

use assert_cmd::Command;
use predicates::prelude::*;

fn jsonl_trace() -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, r#"{{"id":1,"size_bytes":31457280,"born":0,"die":10}}"#).unwrap();
    writeln!(file, r#"{{"id":2,"size_bytes":20971520,"born":11,"die":20}}"#).unwrap();
    file
}

#[test]
fn run_prints_a_text_report_by_default() {
    let trace = jsonl_trace();
    Command::cargo_bin("allocsim")
        .unwrap()
        .args(["run", "--input"])
        .arg(trace.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("[Allocator report]"))
        .stdout(predicate::str::contains("Number of large segments"));
}

#[test]
fn run_with_json_report_emits_parseable_json() {
    let trace = jsonl_trace();
    let output = Command::cargo_bin("allocsim")
        .unwrap()
        .args(["run", "--input"])
        .arg(trace.path())
        .args(["--report", "json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let parsed: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert!(parsed.get("segment_count").is_some());
}

#[test]
fn run_without_input_fails_with_usage_error() {
    Command::cargo_bin("allocsim").unwrap().arg("run").assert().failure();
}

#[test]
fn liveness_format_without_size_list_is_a_clear_error() {
    let trace = jsonl_trace();
    Command::cargo_bin("allocsim")
        .unwrap()
        .args(["run", "--format", "liveness", "--input"])
        .arg(trace.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("size-list"));
}

#[test]
fn decision_log_records_split_and_coalesce_entries() {
    // id 1 reserves a fresh 100 MiB segment (global-max, so the first
    // request fixes the segment size and does not split), then dies.
    // id 2's 1 MiB request reuses that cached 100 MiB block, leaving a
    // 99 MiB remainder far past kLargeBuffer, so the malloc must split —
    // and when id 2 dies, its block is adjacent to that free remainder,
    // so the free must coalesce.
    let mut trace = tempfile::NamedTempFile::new().unwrap();
    writeln!(trace, r#"{{"id":1,"size_bytes":104857600,"born":0,"die":5}}"#).unwrap();
    writeln!(trace, r#"{{"id":2,"size_bytes":1048576,"born":6,"die":10}}"#).unwrap();

    let log = tempfile::NamedTempFile::new().unwrap();
    Command::cargo_bin("allocsim")
        .unwrap()
        .args(["run", "--policy", "global-max", "--input"])
        .arg(trace.path())
        .args(["--log"])
        .arg(log.path())
        .assert()
        .success();

    let log_content = std::fs::read_to_string(log.path()).unwrap();
    assert!(log_content.contains(r#""decision":"split""#), "log was:\n{log_content}");
    assert!(log_content.contains(r#""decision":"coalesce""#), "log was:\n{log_content}");
    assert!(log_content.contains("merged with a free successor"));
}

#[test]
fn input_errors_exit_with_the_dedicated_input_error_code() {
    // A missing --size-list alongside --format liveness is an input
    // error, not a simulator invariant violation, and must exit with the
    // input-error code (65), not the invariant-violation code (70).
    let trace = jsonl_trace();
    Command::cargo_bin("allocsim")
        .unwrap()
        .args(["run", "--format", "liveness", "--input"])
        .arg(trace.path())
        .assert()
        .failure()
        .code(allocsim_cli::error::exit_code::INPUT_ERROR);
}
