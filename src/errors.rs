use std::io;

use thiserror::Error;

use crate::types::{ColumnName, CourseNo, SourceId, StudentId};

/// Error type for table IO, row decoding, configuration, and pass failures.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A table could not be opened at all.
    #[error("table source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable {
        /// Table that failed.
        source_id: SourceId,
        /// What went wrong.
        reason: String,
    },
    /// A row lacks a required column, or holds `null` there.
    #[error("row {line} of '{table}' is missing required column '{field}'")]
    MissingField {
        /// Table the row came from.
        table: SourceId,
        /// 1-based row position.
        line: usize,
        /// Missing column.
        field: ColumnName,
    },
    /// A row is not a JSON object, or does not fit the schema.
    #[error("row {line} of '{table}' is malformed: {details}")]
    MalformedRow {
        /// Table the row came from.
        table: SourceId,
        /// 1-based row position.
        line: usize,
        /// Decoder or schema message.
        details: String,
    },
    /// A schema string or `schema.json` could not be parsed.
    #[error("schema error: {0}")]
    Schema(String),
    /// A write was refused by the sink's dispositions or stored schema.
    #[error("cannot write table '{table}': {reason}")]
    Sink {
        /// Target table.
        table: SourceId,
        /// Why the write was refused.
        reason: String,
    },
    /// Missing or invalid job settings.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// Raised under the fail policy for the first record that cannot be repaired.
    #[error("course number '{course_no}' for student '{student_id}' cannot be corrected")]
    Uncorrectable {
        /// Student on the offending record.
        student_id: StudentId,
        /// Course number that could not be repaired.
        course_no: CourseNo,
    },
    /// Filesystem failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// JSON encoding or decoding failure outside a specific row.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
