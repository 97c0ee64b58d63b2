//! Module providing JSON IO for problem specifications
//!
//! The UI layer collects its inputs interactively; anything else (saved
//! sessions, test fixtures, other callers) can hand over a complete
//! [`ProblemSpec`] as JSON text instead.
use std::fs;
use std::path::Path;

use crate::io::IoError;
use crate::program::ProblemSpec;

/// Read a problem specification from a JSON string
pub fn problem_spec_from_str(json: &str) -> Result<ProblemSpec, IoError> {
    Ok(serde_json::from_str(json)?)
}

/// Read a problem specification from a JSON file
pub fn problem_spec_from_file<P: AsRef<Path>>(path: P) -> Result<ProblemSpec, IoError> {
    let json = fs::read_to_string(path).map_err(|_| IoError::FileNotFound)?;
    problem_spec_from_str(&json)
}
