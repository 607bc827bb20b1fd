//! The normalized result of one compile+execute run.
//!
//! One `ExecutionResult` is created per run, handed to the output formatter,
//! and discarded; it carries no cross-run state. Exactly one of `output` /
//! `errors` is populated, governed by `success`.

use std::path::Path;

use serde::Serialize;
use serde_json::{json, Value};

use crate::engine::EngineError;

/// Classifies where a failure originated.
///
/// `Error` is the catch-all for anything not raised by the engine's own
/// compile/execute contract (missing files, malformed JSON, and so on).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    CompileError,
    RuntimeError,
    Error,
}

/// One diagnostic. `line`/`column` are `0,0` when the failure carries no
/// source position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorInfo {
    pub message: String,
    pub line: u32,
    pub column: u32,
    #[serde(rename = "type")]
    pub kind: ErrorKind,
}

impl ErrorInfo {
    /// A generic failure with no source position.
    pub fn other(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            line: 0,
            column: 0,
            kind: ErrorKind::Error,
        }
    }

    pub fn compile(err: EngineError) -> Self {
        Self {
            message: err.message,
            line: err.line,
            column: err.column,
            kind: ErrorKind::CompileError,
        }
    }

    pub fn runtime(err: EngineError) -> Self {
        Self {
            message: err.message,
            line: err.line,
            column: err.column,
            kind: ErrorKind::RuntimeError,
        }
    }
}

/// The single artifact produced per run.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionResult {
    pub success: bool,
    pub output: Option<Value>,
    pub errors: Option<Vec<ErrorInfo>>,
    pub execution_time_ms: u64,
    pub script_path: String,
    pub input_path: Option<String>,
}

impl ExecutionResult {
    /// A successful run. A non-object engine value is wrapped as
    /// `{"result": <value>}` so `output` is always object-shaped.
    pub fn success(
        output: Value,
        execution_time_ms: u64,
        script_path: &Path,
        input_path: Option<&Path>,
    ) -> Self {
        let output = if output.is_object() {
            output
        } else {
            json!({ "result": output })
        };
        Self {
            success: true,
            output: Some(output),
            errors: None,
            execution_time_ms,
            script_path: audit_path(script_path),
            input_path: input_path.map(audit_path),
        }
    }

    /// A failed run with a single diagnostic.
    pub fn failure(
        error: ErrorInfo,
        execution_time_ms: u64,
        script_path: &Path,
        input_path: Option<&Path>,
    ) -> Self {
        Self {
            success: false,
            output: None,
            errors: Some(vec![error]),
            execution_time_ms,
            script_path: audit_path(script_path),
            input_path: input_path.map(audit_path),
        }
    }

    /// Message of the first diagnostic, for the one-line failure report.
    pub fn first_error_message(&self) -> &str {
        self.errors
            .as_deref()
            .and_then(|errors| errors.first())
            .map(|error| error.message.as_str())
            .unwrap_or("unknown error")
    }
}

/// Absolute path for audit/debug fields, falling back to the path as given
/// when it cannot be resolved.
fn audit_path(path: &Path) -> String {
    std::fs::canonicalize(path)
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_success_populates_output_only() {
        let result = ExecutionResult::success(
            json!({"a": 1}),
            5,
            &PathBuf::from("t.jex"),
            None,
        );
        assert!(result.success);
        assert_eq!(result.output, Some(json!({"a": 1})));
        assert!(result.errors.is_none());
    }

    #[test]
    fn test_failure_populates_errors_only() {
        let result = ExecutionResult::failure(
            ErrorInfo::other("boom"),
            5,
            &PathBuf::from("t.jex"),
            None,
        );
        assert!(!result.success);
        assert!(result.output.is_none());
        assert_eq!(result.errors.as_ref().map(|e| e.len()), Some(1));
        assert_eq!(result.first_error_message(), "boom");
    }

    #[test]
    fn test_non_object_output_is_wrapped() {
        let result =
            ExecutionResult::success(json!(42), 0, &PathBuf::from("t.jex"), None);
        assert_eq!(result.output, Some(json!({"result": 42})));

        let result =
            ExecutionResult::success(json!([1, 2]), 0, &PathBuf::from("t.jex"), None);
        assert_eq!(result.output, Some(json!({"result": [1, 2]})));
    }

    #[test]
    fn test_detailed_wire_shape() {
        let result = ExecutionResult::failure(
            ErrorInfo::compile(EngineError {
                message: "unexpected token".to_string(),
                line: 2,
                column: 7,
            }),
            12,
            &PathBuf::from("t.jex"),
            Some(&PathBuf::from("t.input.json")),
        );

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["success"], json!(false));
        assert_eq!(value["output"], Value::Null);
        assert_eq!(value["executionTimeMs"], json!(12));
        assert!(value["scriptPath"].as_str().unwrap().ends_with("t.jex"));
        assert!(value["inputPath"].as_str().is_some());

        let error = &value["errors"][0];
        assert_eq!(error["message"], json!("unexpected token"));
        assert_eq!(error["line"], json!(2));
        assert_eq!(error["column"], json!(7));
        assert_eq!(error["type"], json!("CompileError"));
    }

    #[test]
    fn test_error_kind_wire_names() {
        assert_eq!(
            serde_json::to_value(ErrorKind::RuntimeError).unwrap(),
            json!("RuntimeError")
        );
        assert_eq!(serde_json::to_value(ErrorKind::Error).unwrap(), json!("Error"));
    }

    #[test]
    fn test_generic_error_has_no_position() {
        let info = ErrorInfo::other("file missing");
        assert_eq!((info.line, info.column), (0, 0));
        assert_eq!(info.kind, ErrorKind::Error);
    }
}
