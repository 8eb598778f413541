//! Table references and column schemas.

use std::fmt;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::{TableRecord, TableRow};
use crate::errors::PipelineError;
use crate::types::{ColumnName, DatasetId, ProjectId, TableId};

/// Reference to a warehouse table: `[project:]dataset.table`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TableRef {
    /// Owning project; `None` resolves against the warehouse default.
    pub project: Option<ProjectId>,
    /// Dataset name.
    pub dataset: DatasetId,
    /// Table name.
    pub table: TableId,
}

impl TableRef {
    /// Unqualified reference (`dataset.table`).
    pub fn new(dataset: impl Into<DatasetId>, table: impl Into<TableId>) -> Self {
        Self {
            project: None,
            dataset: dataset.into(),
            table: table.into(),
        }
    }

    /// Attach an explicit project.
    pub fn with_project(mut self, project: impl Into<ProjectId>) -> Self {
        self.project = Some(project.into());
        self
    }

    /// Fill in `default_project` when the reference carries none.
    pub fn qualified(&self, default_project: &str) -> TableRef {
        let mut qualified = self.clone();
        if qualified.project.is_none() {
            qualified.project = Some(default_project.to_string());
        }
        qualified
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.project {
            Some(project) => write!(f, "{}:{}.{}", project, self.dataset, self.table),
            None => write!(f, "{}.{}", self.dataset, self.table),
        }
    }
}

impl FromStr for TableRef {
    type Err = PipelineError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let raw = raw.trim();
        let (project, rest) = match raw.split_once(':') {
            Some((project, rest)) => (Some(project), rest),
            None => (None, raw),
        };
        let Some((dataset, table)) = rest.split_once('.') else {
            return Err(PipelineError::Configuration(format!(
                "table reference '{raw}' must look like [project:]dataset.table"
            )));
        };
        let invalid = |part: &str| part.is_empty() || part.contains(&['.', ':', '/'][..]);
        if project.is_some_and(invalid) || invalid(dataset) || invalid(table) {
            return Err(PipelineError::Configuration(format!(
                "table reference '{raw}' has an empty or invalid segment"
            )));
        }
        Ok(Self {
            project: project.map(str::to_string),
            dataset: dataset.to_string(),
            table: table.to_string(),
        })
    }
}

/// Column type in a table schema.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum FieldType {
    /// Text (`STRING`).
    String,
    /// Whole number (`INTEGER` or `INT64`).
    Integer,
    /// Any JSON number (`FLOAT` or `FLOAT64`).
    Float,
    /// `true`/`false` (`BOOLEAN` or `BOOL`).
    Boolean,
}

impl FieldType {
    fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "STRING" => Some(Self::String),
            "INTEGER" | "INT64" => Some(Self::Integer),
            "FLOAT" | "FLOAT64" => Some(Self::Float),
            "BOOLEAN" | "BOOL" => Some(Self::Boolean),
            _ => None,
        }
    }

    fn as_str(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOLEAN",
        }
    }

    fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (_, Value::Null) => true,
            (Self::String, Value::String(_)) => true,
            (Self::Integer, Value::Number(n)) => n.is_i64() || n.is_u64(),
            (Self::Float, Value::Number(_)) => true,
            (Self::Boolean, Value::Bool(_)) => true,
            _ => false,
        }
    }
}

/// Ordered column schema, written as `name:TYPE,name:TYPE`.
///
/// Columns are nullable: a row may omit a column or hold `null`, but it may
/// not carry columns outside the schema or values of the wrong type.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSchema {
    fields: IndexMap<ColumnName, FieldType>,
}

impl TableSchema {
    /// Parse the compact `name:TYPE,...` form.
    pub fn parse(raw: &str) -> Result<Self, PipelineError> {
        let mut fields = IndexMap::new();
        for entry in raw.split(',').map(str::trim).filter(|entry| !entry.is_empty()) {
            let Some((name, kind)) = entry.split_once(':') else {
                return Err(PipelineError::Schema(format!(
                    "field '{entry}' must look like name:TYPE"
                )));
            };
            let name = name.trim();
            if name.is_empty() {
                return Err(PipelineError::Schema(format!("field '{entry}' has no name")));
            }
            let kind = FieldType::parse(kind).ok_or_else(|| {
                PipelineError::Schema(format!("field '{name}' has unknown type '{}'", kind.trim()))
            })?;
            if fields.insert(name.to_string(), kind).is_some() {
                return Err(PipelineError::Schema(format!("field '{name}' is declared twice")));
            }
        }
        if fields.is_empty() {
            return Err(PipelineError::Schema("schema declares no fields".into()));
        }
        Ok(Self { fields })
    }

    /// All-STRING schema over the columns a record type reads.
    pub fn for_record<R: TableRecord>() -> Self {
        Self {
            fields: R::COLUMNS
                .iter()
                .map(|column| (column.to_string(), FieldType::String))
                .collect(),
        }
    }

    /// Number of columns.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True if the schema has no columns.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Column names in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &str> + '_ {
        self.fields.keys().map(String::as_str)
    }

    /// Declared type of `column`, if the schema has it.
    pub fn field_type(&self, column: &str) -> Option<FieldType> {
        self.fields.get(column).copied()
    }

    /// Check one row against the schema. `line` is 1-based.
    pub fn check_row(&self, row: &TableRow, table: &str, line: usize) -> Result<(), PipelineError> {
        for (column, value) in row {
            let Some(kind) = self.field_type(column) else {
                return Err(PipelineError::MalformedRow {
                    table: table.to_string(),
                    line,
                    details: format!("column '{column}' is not in the schema ({self})"),
                });
            };
            if !kind.accepts(value) {
                return Err(PipelineError::MalformedRow {
                    table: table.to_string(),
                    line,
                    details: format!(
                        "column '{column}' expects {} but holds {value}",
                        kind.as_str()
                    ),
                });
            }
        }
        Ok(())
    }
}

impl fmt::Display for TableSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rendered: Vec<String> = self
            .fields
            .iter()
            .map(|(name, kind)| format!("{}:{}", name, kind.as_str()))
            .collect();
        f.write_str(&rendered.join(","))
    }
}
