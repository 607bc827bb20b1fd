//! E2E tests for the `Detailed` format: the full result record goes to the
//! primary stream on success and failure alike.

use std::fs;
use std::process::Command;

use serde_json::{json, Value};
use tempfile::tempdir;

fn bin() -> &'static str {
    env!("CARGO_BIN_EXE_jexrun")
}

#[test]
fn detailed_failure_goes_to_stdout_as_structured_json() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("t.jex");
    fs::write(&script, "%let x = 1").unwrap();

    let output = Command::new(bin())
        .arg(&script)
        .args(["--format", "Detailed"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    assert!(output.stderr.is_empty(), "detailed failures do not use stderr");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["success"], json!(false));
    assert_eq!(parsed["output"], Value::Null);

    let errors = parsed["errors"].as_array().unwrap();
    assert_eq!(errors.len(), 1);
    assert_eq!(errors[0]["type"], json!("CompileError"));
    assert!(errors[0]["line"].as_u64().unwrap() > 0);
}

#[test]
fn detailed_success_includes_timing_and_paths() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("t.jex");
    fs::write(&script, "%set ok = true;").unwrap();
    let input = dir.path().join("t.input.json");
    fs::write(&input, r#"{"unused": 1}"#).unwrap();

    let output = Command::new(bin())
        .arg(&script)
        .args(["--format", "Detailed"])
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: Value = serde_json::from_str(&stdout).unwrap();

    assert_eq!(parsed["success"], json!(true));
    assert_eq!(parsed["output"], json!({"ok": true}));
    assert_eq!(parsed["errors"], Value::Null);
    assert!(parsed["executionTimeMs"].as_u64().is_some());
    assert!(parsed["scriptPath"].as_str().unwrap().ends_with("t.jex"));
    assert!(parsed["inputPath"]
        .as_str()
        .unwrap()
        .ends_with("t.input.json"));
}

#[test]
fn detailed_missing_script_is_still_structured() {
    let dir = tempdir().unwrap();
    let script = dir.path().join("absent.jex");

    let output = Command::new(bin())
        .arg(&script)
        .args(["--format", "Detailed"])
        .output()
        .unwrap();

    assert_eq!(output.status.code(), Some(1));
    let stdout = String::from_utf8_lossy(&output.stdout);
    let parsed: Value = serde_json::from_str(&stdout).unwrap();
    assert_eq!(parsed["success"], json!(false));
    assert_eq!(parsed["errors"][0]["type"], json!("Error"));
    assert_eq!(parsed["executionTimeMs"], json!(0));
}
