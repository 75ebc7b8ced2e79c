use std::io;

use thiserror::Error;

/// Failures while reading or parsing a JSON Lines dataset.
///
/// `Parse` and `NotAnObject` are per-line and recovered by skipping the line;
/// `Io` aborts the whole load.
#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("line {line}: invalid JSON: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },
    #[error("line {line}: expected a JSON object, found {found}")]
    NotAnObject { line: usize, found: &'static str },
    #[error(transparent)]
    Io(#[from] io::Error),
}

/// Recoverable problems with a single record field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldIssue {
    #[error("field is missing or null")]
    MissingData,
    #[error("expected a string, found {found}")]
    TypeMismatch { found: &'static str },
}
