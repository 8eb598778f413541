//! Table sink interfaces and write dispositions.

use std::sync::Mutex;

use crate::data::TableRecord;
use crate::errors::PipelineError;
use crate::types::SourceId;

/// Sink implementation modules.
pub mod warehouse_sink;
pub use warehouse_sink::WarehouseTableSink;

/// What to do when the destination table does not exist yet.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum CreateDisposition {
    /// Create the table on first write.
    #[default]
    CreateIfNeeded,
    /// Fail when the table is missing.
    CreateNever,
}

/// What to do with rows already in the destination table.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum WriteDisposition {
    /// Replace the table contents.
    #[default]
    WriteTruncate,
    /// Keep existing rows and add the new ones.
    WriteAppend,
    /// Fail unless the table is empty.
    WriteEmpty,
}

/// How a write will treat the existing table, once dispositions are checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum WritePlan {
    Replace,
    Append,
}

/// Check dispositions against the current table state.
pub(crate) fn plan_write(
    table: &str,
    exists: bool,
    has_rows: bool,
    create: CreateDisposition,
    write: WriteDisposition,
) -> Result<WritePlan, PipelineError> {
    if !exists && create == CreateDisposition::CreateNever {
        return Err(PipelineError::Sink {
            table: table.to_string(),
            reason: "table does not exist and create disposition is CreateNever".into(),
        });
    }
    match write {
        WriteDisposition::WriteTruncate => Ok(WritePlan::Replace),
        WriteDisposition::WriteAppend => Ok(WritePlan::Append),
        WriteDisposition::WriteEmpty if has_rows => Err(PipelineError::Sink {
            table: table.to_string(),
            reason: "table already holds rows and write disposition is WriteEmpty".into(),
        }),
        WriteDisposition::WriteEmpty => Ok(WritePlan::Append),
    }
}

/// Pass-facing table sink.
pub trait TableSink: Send + Sync {
    /// Record type accepted by this sink.
    type Record: TableRecord;

    /// Stable sink identifier used in logs and error messages.
    fn id(&self) -> &str;

    /// Write `records` under the sink's dispositions. Returns rows written.
    fn write(&self, records: &[Self::Record]) -> Result<usize, PipelineError>;
}

/// In-memory table sink for tests.
///
/// `None` contents model a table that does not exist yet.
pub struct InMemorySink<R> {
    id: SourceId,
    rows: Mutex<Option<Vec<R>>>,
    create: CreateDisposition,
    write: WriteDisposition,
}

impl<R: Clone> InMemorySink<R> {
    /// Sink over a table that does not exist yet.
    pub fn new(id: impl Into<SourceId>) -> Self {
        Self {
            id: id.into(),
            rows: Mutex::new(None),
            create: CreateDisposition::default(),
            write: WriteDisposition::default(),
        }
    }

    /// Sink over an existing table holding `rows`.
    pub fn with_existing_rows(mut self, rows: Vec<R>) -> Self {
        self.rows = Mutex::new(Some(rows));
        self
    }

    /// Set the create disposition.
    pub fn with_create_disposition(mut self, create: CreateDisposition) -> Self {
        self.create = create;
        self
    }

    /// Set the write disposition.
    pub fn with_write_disposition(mut self, write: WriteDisposition) -> Self {
        self.write = write;
        self
    }

    /// Current table contents, `None` if the table was never created.
    pub fn contents(&self) -> Option<Vec<R>> {
        self.rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl<R: TableRecord + Clone> TableSink for InMemorySink<R> {
    type Record = R;

    fn id(&self) -> &str {
        &self.id
    }

    fn write(&self, records: &[R]) -> Result<usize, PipelineError> {
        let mut rows = self
            .rows
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let exists = rows.is_some();
        let has_rows = rows.as_ref().is_some_and(|rows| !rows.is_empty());
        let plan = plan_write(&self.id, exists, has_rows, self.create, self.write)?;
        let table = rows.get_or_insert_with(Vec::new);
        if plan == WritePlan::Replace {
            table.clear();
        }
        table.extend_from_slice(records);
        Ok(records.len())
    }
}
