//! Error types for jexrun.
//!
//! Uses `thiserror` for library errors. Only tool-level failures live here
//! (unwritable output file, watcher setup); anything that goes wrong while
//! compiling or executing a script is folded into an
//! [`ExecutionResult`](crate::result::ExecutionResult) by the pipeline
//! instead of surfacing as an error.

use thiserror::Error;

/// Result type alias for jexrun operations
pub type JexRunResult<T> = Result<T, JexRunError>;

/// Main error type for jexrun operations
#[derive(Error, Debug)]
pub enum JexRunError {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Result serialization error
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem watcher error
    #[error("watch error: {0}")]
    Watch(#[from] notify::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_io() {
        let err = JexRunError::Io(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "no such file",
        ));
        assert_eq!(err.to_string(), "IO error: no such file");
    }

    #[test]
    fn test_error_from_serde_json() {
        let parse_err = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = JexRunError::from(parse_err);
        assert!(err.to_string().starts_with("JSON serialization error:"));
    }
}
