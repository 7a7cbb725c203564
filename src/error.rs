use std::path::PathBuf;

use thiserror::Error;

use crate::processing::ProcessorKind;

/// Convenience result type used across the crate.
pub type CsvioResult<T> = Result<T, CsvioError>;

/// Error produced by a user-supplied transformation function.
///
/// Field and row functions may fail with any error type; it is boxed and carried unchanged as the
/// [`std::error::Error::source`] of [`CsvioError::Transform`].
pub type TransformError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Error type returned by reading, writing and processing functions.
#[derive(Debug, Error)]
pub enum CsvioError {
    /// Underlying I/O error (e.g. file not found, permission denied).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV parse or encode error.
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON export error.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// A processor handle was looked up or extended before it was registered.
    #[error("{kind} processor handle '{handle}' not found")]
    HandleNotFound { kind: ProcessorKind, handle: String },

    /// A transformation function failed. The function's own error is the source.
    #[error("{kind} processor '{handle}' failed{}: {source}", field_suffix(.field))]
    Transform {
        kind: ProcessorKind,
        handle: String,
        field: Option<String>,
        #[source]
        source: TransformError,
    },

    /// A record passed to a writer holds a field that is not one of the writer's field names.
    #[error("record contains field '{field}' which is not in the field names")]
    UnknownField { field: String },

    /// Column names are unknown: a writer without field names, or headerless input read
    /// without configured field names.
    #[error("no field names configured for {}", .path.display())]
    NoFieldNames { path: PathBuf },

    /// A grouping column is missing from a record.
    #[error("record has no column '{column}'")]
    MissingColumn { column: String },

    /// A remote download attempt failed.
    #[error("{remote_type}: {message}")]
    Remote { remote_type: String, message: String },

    /// Every download attempt failed. The error of the final attempt is the source.
    #[error("{remote_type}: max retries to access remote resource exhausted after {attempts} attempts")]
    RetriesExhausted {
        remote_type: String,
        attempts: usize,
        #[source]
        last: Box<CsvioError>,
    },
}

fn field_suffix(field: &Option<String>) -> String {
    match field {
        Some(f) => format!(" on field '{f}'"),
        None => String::new(),
    }
}
