//! E2E tests for `--output` routing: rendered text lands in the file and a
//! confirmation line goes to stdout.

use std::fs;
use std::process::Command;

use serde_json::{json, Value};
use tempfile::tempdir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_jexrun")
}

#[test]
fn output_flag_writes_file_and_prints_confirmation() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("t.jex");
    fs::write(&script, "%set n = 1;").unwrap();
    let out = dir.path().join("result.json");

    let output = Command::new(bin())
        .arg(&script)
        .args(["--output", out.to_str().unwrap()])
        .output()
        .unwrap();

    assert!(output.status.success());

    let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written, json!({"n": 1}));

    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Result written to"), "got stdout: {stdout}");
    assert!(
        !stdout.contains("\"n\""),
        "document must not also be printed: {stdout}"
    );
}

#[test]
fn output_file_is_overwritten_on_each_run() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("t.jex");
    let out = dir.path().join("result.json");

    fs::write(&script, "%set n = 1;").unwrap();
    Command::new(bin())
        .arg(&script)
        .args(["-o", out.to_str().unwrap()])
        .output()
        .unwrap();

    fs::write(&script, "%set n = 2;").unwrap();
    Command::new(bin())
        .arg(&script)
        .args(["-o", out.to_str().unwrap()])
        .output()
        .unwrap();

    let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written, json!({"n": 2}));
}

#[test]
fn failing_json_run_writes_no_output_file() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("t.jex");
    fs::write(&script, "%let broken").unwrap();
    let out = dir.path().join("result.json");

    let output = Command::new(bin())
        .arg(&script)
        .args(["-o", out.to_str().unwrap()])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(!out.exists(), "failure in Json format must not produce a file");
}

#[test]
fn detailed_failure_is_written_to_output_file() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("t.jex");
    fs::write(&script, "%let broken").unwrap();
    let out = dir.path().join("result.json");

    let output = Command::new(bin())
        .arg(&script)
        .args(["-f", "Detailed", "-o", out.to_str().unwrap()])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let written: Value = serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
    assert_eq!(written["success"], json!(false));
}
