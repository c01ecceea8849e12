//! Fatal error taxonomy.
//!
//! Every variant aborts the whole run. Per-record problems are never errors;
//! they are recorded in [`crate::diag::Diagnostics`] instead.

use std::path::PathBuf;
use thiserror::Error;

/// Conditions that abort a curation run.
#[derive(Error, Debug)]
pub enum CurateError {
    #[error("Unknown source '{name}'. Known sources: {known}")]
    UnknownSource { name: String, known: String },

    #[error("Output directory does not exist: {0}")]
    MissingOutputDir(PathBuf),

    #[error("Staged input not found: {0}")]
    MissingInput(PathBuf),

    #[error("{path}:{line}: header/row column count mismatch (expected {expected}, found {found})")]
    ColumnMismatch {
        path: PathBuf,
        line: u64,
        expected: usize,
        found: usize,
    },

    #[error("{path}: key column {column} out of range for {width}-column header")]
    MissingKeyColumn {
        path: PathBuf,
        column: usize,
        width: usize,
    },

    #[error("{path}:{line}: sequence entry has an empty identifier")]
    EmptyIdentifier { path: PathBuf, line: u64 },

    #[error("{source_name}: model {model} has an empty mandatory field '{field}'")]
    MissingField {
        source_name: String,
        model: String,
        field: &'static str,
    },

    #[error("{0}: no sequence entries")]
    EmptyInput(PathBuf),
}
