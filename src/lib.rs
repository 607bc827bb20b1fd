//! Jexrun - command-line runner for Jex JSON transformation scripts.
//!
//! A script is compiled once and executed against a JSON input document
//! (plus optional metadata); the outcome is reported in one of three output
//! encodings, optionally re-running whenever the watched files change.

pub mod cli;
pub mod companion;
pub mod engine;
pub mod error;
pub mod output;
pub mod pipeline;
pub mod result;
pub mod watcher;

// Re-exports for convenience
pub use companion::{resolve_companion, INPUT_SUFFIX};
pub use error::{JexRunError, JexRunResult};
pub use output::{emit, exit_code, render, Format, Rendered};
pub use result::{ErrorInfo, ErrorKind, ExecutionResult};
pub use watcher::{watch, WatchEvent, WatchOptions};
