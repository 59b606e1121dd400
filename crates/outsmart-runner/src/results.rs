//! Persisting finished games.
//!
//! Each finished game is appended to the results file as one JSON object
//! per line, so several runs can share a file and a partial write never
//! corrupts earlier games.

use std::fs::OpenOptions;
use std::io::Write as _;
use std::path::Path;

use outsmart_types::GameRecord;

use crate::error::RunnerError;

/// Append `record` to the JSON-lines file at `path`, creating it if needed.
///
/// # Errors
///
/// Returns [`RunnerError::Serde`] if the record cannot be serialized or
/// [`RunnerError::Io`] if the file cannot be written.
pub fn append_record(path: &Path, record: &GameRecord) -> Result<(), RunnerError> {
    let mut line = serde_json::to_string(record)?;
    line.push('\n');
    let mut file = OpenOptions::new().create(true).append(true).open(path)?;
    file.write_all(line.as_bytes())?;
    Ok(())
}
