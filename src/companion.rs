//! Companion file resolution.
//!
//! A companion is a sibling file named after the script's base name plus a
//! fixed suffix, e.g. `transform.jex` → `transform.input.json`. Only the
//! input file has an implicit convention; metadata is never defaulted.

use std::path::{Path, PathBuf};

/// Suffix used to default the input document next to the script.
pub const INPUT_SUFFIX: &str = ".input.json";

/// Map a script path to a conventionally-named sibling file, returning it
/// only if a file actually exists there.
pub fn resolve_companion(script: &Path, suffix: &str) -> Option<PathBuf> {
    let stem = script.file_stem()?;
    let mut name = stem.to_os_string();
    name.push(suffix);
    let candidate = script.parent().unwrap_or_else(|| Path::new("")).join(name);
    candidate.is_file().then_some(candidate)
}
