//! Output formatting and routing.
//!
//! `Json` and `Pretty` serialize the produced document alone and report
//! failures as a single line on stderr. `Detailed` serializes the entire
//! result record, success or failure, to the primary destination.

use std::fs;
use std::io::Write;
use std::path::Path;

use clap::ValueEnum;

use crate::error::{JexRunError, JexRunResult};
use crate::result::ExecutionResult;

/// Output encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
#[value(rename_all = "PascalCase")]
pub enum Format {
    /// Compact document serialization (success only)
    Json,
    /// Indented document serialization (success only)
    Pretty,
    /// Full result record with diagnostics and timing, success or failure
    Detailed,
}

/// What the formatter produced for a run.
#[derive(Debug, Clone, PartialEq)]
pub enum Rendered {
    /// Text for the primary destination (stdout or the output file)
    Document(String),
    /// One-line failure report for stderr
    ErrorLine(String),
}

/// Render a result in the requested format.
///
/// Never fails on a well-formed result; the `Result` covers serialization
/// only.
pub fn render(result: &ExecutionResult, format: Format) -> JexRunResult<Rendered> {
    match format {
        Format::Detailed => Ok(Rendered::Document(serde_json::to_string_pretty(result)?)),
        Format::Json | Format::Pretty => match &result.output {
            Some(output) if result.success => {
                let text = if format == Format::Json {
                    serde_json::to_string(output)?
                } else {
                    serde_json::to_string_pretty(output)?
                };
                Ok(Rendered::Document(text))
            }
            _ => Ok(Rendered::ErrorLine(result.first_error_message().to_string())),
        },
    }
}

/// Process exit code for a result: `0` iff the run succeeded.
pub fn exit_code(result: &ExecutionResult) -> i32 {
    if result.success {
        0
    } else {
        1
    }
}

/// Render a result and route it: error lines to stderr, documents to the
/// output file (with a confirmation line on stdout) or to stdout.
pub fn emit(
    result: &ExecutionResult,
    format: Format,
    output_path: Option<&Path>,
) -> JexRunResult<()> {
    match render(result, format)? {
        Rendered::ErrorLine(message) => eprintln!("✗ {message}"),
        Rendered::Document(text) => match output_path {
            Some(path) => {
                write_atomic(path, &text)?;
                println!("✓ Result written to {}", path.display());
            }
            None => println!("{text}"),
        },
    }
    Ok(())
}

/// Write via a temp file in the destination directory plus rename, so an
/// interrupted run never leaves a half-written result file behind.
fn write_atomic(path: &Path, content: &str) -> JexRunResult<()> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir)?;

    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.persist(path).map_err(|err| JexRunError::Io(err.error))?;
    Ok(())
}
