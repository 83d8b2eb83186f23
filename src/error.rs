//! Error types for schema reading

use std::path::PathBuf;

use thiserror::Error;

use crate::response::ResponseError;

/// Result type for foundational (aborting) failures
pub type Result<T> = std::result::Result<T, SchemaError>;

/// Errors that abort a read entirely.
///
/// Structural problems inside a well-formed document never use this type;
/// they accumulate in a [`crate::Response`] instead.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Schema directory not found or not a directory: {}", .0.display())]
    NotADirectory(PathBuf),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to walk schema directory: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("Failed to parse JSON in {}: {}", path.display(), source)]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid schema: {}", format_errors(.0))]
    InvalidSchema(Vec<ResponseError>),

    #[error("Expected exactly one type in document, found {0}")]
    NotASingleType(usize),
}

fn format_errors(errors: &[ResponseError]) -> String {
    errors
        .iter()
        .map(|e| e.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}
