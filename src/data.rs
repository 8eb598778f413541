use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::constants::tables::{COLUMN_CNO, COLUMN_GRADE, COLUMN_SID};
use crate::errors::PipelineError;

pub use crate::types::{CourseNo, Grade, StudentId};

/// Raw warehouse row: column name to JSON value.
pub type TableRow = Map<String, Value>;

/// One enrollment row from the Takes table.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TakesRecord {
    /// Student identifier.
    #[serde(rename = "sid")]
    pub student_id: StudentId,
    /// Course number; the only field normalization may rewrite.
    #[serde(rename = "cno")]
    pub course_no: CourseNo,
    /// Grade as stored, never interpreted.
    pub grade: Grade,
}

impl TakesRecord {
    /// Build a record from its three columns.
    pub fn new(
        student_id: impl Into<StudentId>,
        course_no: impl Into<CourseNo>,
        grade: impl Into<Grade>,
    ) -> Self {
        Self {
            student_id: student_id.into(),
            course_no: course_no.into(),
            grade: grade.into(),
        }
    }
}

/// One row from the Class table. Only the course number is read.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ClassRecord {
    /// A valid course number.
    #[serde(rename = "cno")]
    pub course_no: CourseNo,
}

impl ClassRecord {
    /// Build a Class row.
    pub fn new(course_no: impl Into<CourseNo>) -> Self {
        Self {
            course_no: course_no.into(),
        }
    }
}

/// Typed view over a warehouse row.
///
/// Decoding is strict about presence: a required column that is absent or
/// `null` is reported as `PipelineError::MissingField`. Extra columns are
/// ignored.
pub trait TableRecord: Sized + Serialize + Send + Sync {
    /// Columns read by `from_row`, in schema order.
    const COLUMNS: &'static [&'static str];

    /// Decode a row. `table` and `line` (1-based) are used for error reporting.
    fn from_row(row: &TableRow, table: &str, line: usize) -> Result<Self, PipelineError>;

    /// Encode this record as a row using its wire column names.
    fn to_row(&self) -> Result<TableRow, PipelineError> {
        match serde_json::to_value(self)? {
            Value::Object(row) => Ok(row),
            other => Err(PipelineError::Schema(format!(
                "record did not serialize to an object: {other}"
            ))),
        }
    }
}

impl TableRecord for TakesRecord {
    const COLUMNS: &'static [&'static str] = &[COLUMN_SID, COLUMN_CNO, COLUMN_GRADE];

    fn from_row(row: &TableRow, table: &str, line: usize) -> Result<Self, PipelineError> {
        Ok(Self {
            student_id: required_string(row, table, line, COLUMN_SID)?,
            course_no: required_string(row, table, line, COLUMN_CNO)?,
            grade: required_string(row, table, line, COLUMN_GRADE)?,
        })
    }
}

impl TableRecord for ClassRecord {
    const COLUMNS: &'static [&'static str] = &[COLUMN_CNO];

    fn from_row(row: &TableRow, table: &str, line: usize) -> Result<Self, PipelineError> {
        Ok(Self {
            course_no: required_string(row, table, line, COLUMN_CNO)?,
        })
    }
}

/// Read a STRING column, rendering scalar numbers and booleans to text.
fn required_string(
    row: &TableRow,
    table: &str,
    line: usize,
    field: &str,
) -> Result<String, PipelineError> {
    match row.get(field) {
        None | Some(Value::Null) => Err(PipelineError::MissingField {
            table: table.to_string(),
            line,
            field: field.to_string(),
        }),
        Some(Value::String(value)) => Ok(value.clone()),
        Some(Value::Number(value)) => Ok(value.to_string()),
        Some(Value::Bool(value)) => Ok(value.to_string()),
        Some(other) => Err(PipelineError::MalformedRow {
            table: table.to_string(),
            line,
            details: format!("column '{field}' holds a nested value: {other}"),
        }),
    }
}
