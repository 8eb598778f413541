/// Student identifier as stored in the `sid` column.
/// Example: `S1`
pub type StudentId = String;
/// Course number as stored in the `cno` column.
/// Examples: `CS101`, `CS101-A`, `MATH200`
pub type CourseNo = String;
/// Letter grade as stored in the `grade` column.
/// Examples: `A`, `B+`, `C`
pub type Grade = String;
/// Project identifier that qualifies warehouse tables.
/// Example: `college-data-123`
pub type ProjectId = String;
/// Dataset name inside a project.
/// Examples: `college_split`, `college_normalized`
pub type DatasetId = String;
/// Table name inside a dataset.
/// Examples: `Takes`, `Class`
pub type TableId = String;
/// Column name in a table schema.
/// Examples: `sid`, `cno`, `grade`
pub type ColumnName = String;
/// Identifier for a table source (usually the rendered table reference).
/// Example: `college_split.Takes`
pub type SourceId = String;
