//! Execution pipeline: one compile+execute cycle per call.
//!
//! Every call returns a well-formed [`ExecutionResult`]; no failure escapes
//! to the caller. The timer spans from the script read through the end of
//! execution (or the point of failure) and excludes rendering.

use std::fs;
use std::path::Path;
use std::time::Instant;

use serde_json::{json, Value};

use crate::engine;
use crate::result::{ErrorInfo, ExecutionResult};

/// Run the script at `script` against the input/metadata documents.
///
/// An input path that is given but does not exist falls back to an empty
/// object; a metadata path that is given but does not exist means "no
/// metadata", which the engine treats differently from `{}`.
pub fn run(script: &Path, input: Option<&Path>, meta: Option<&Path>) -> ExecutionResult {
    let started = Instant::now();
    let outcome = execute_cycle(script, input, meta);
    let elapsed = started.elapsed().as_millis() as u64;

    match outcome {
        Ok(output) => ExecutionResult::success(output, elapsed, script, input),
        Err(error) => ExecutionResult::failure(error, elapsed, script, input),
    }
}

/// Result for a script path that does not exist, reported without invoking
/// the pipeline proper.
pub fn missing_script(script: &Path) -> ExecutionResult {
    ExecutionResult::failure(
        ErrorInfo::other(format!("script file not found: {}", script.display())),
        0,
        script,
        None,
    )
}

fn execute_cycle(
    script: &Path,
    input: Option<&Path>,
    meta: Option<&Path>,
) -> Result<Value, ErrorInfo> {
    let source = fs::read_to_string(script).map_err(|err| {
        ErrorInfo::other(format!("failed to read script {}: {err}", script.display()))
    })?;

    let input_doc = match input {
        Some(path) if path.is_file() => read_json(path)?,
        _ => json!({}),
    };

    let meta_doc = match meta {
        Some(path) if path.is_file() => Some(read_json(path)?),
        _ => None,
    };

    let program = engine::compile(&source).map_err(ErrorInfo::compile)?;
    program
        .execute(&input_doc, meta_doc.as_ref())
        .map_err(ErrorInfo::runtime)
}

fn read_json(path: &Path) -> Result<Value, ErrorInfo> {
    let text = fs::read_to_string(path).map_err(|err| {
        ErrorInfo::other(format!("failed to read {}: {err}", path.display()))
    })?;
    serde_json::from_str(&text)
        .map_err(|err| ErrorInfo::other(format!("invalid JSON in {}: {err}", path.display())))
}
