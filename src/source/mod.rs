//! Table source interfaces.
//!
//! Ownership model:
//! - `TableSource` is the pass-facing interface that yields typed records.
//! - `InMemorySource` holds prebuilt records (tests, small fixtures).
//! - `WarehouseTableSource` decodes rows from a local warehouse table.

use std::sync::Arc;

use crate::data::TableRecord;
use crate::errors::PipelineError;
use crate::types::SourceId;

/// Source implementation modules.
pub mod sources;
pub use sources::warehouse_source::WarehouseTableSource;

/// Pass-facing table source.
///
/// A single `read` returns the full query result. For a fixed table state the
/// output should be deterministic, in the table's stored row order.
pub trait TableSource: Send + Sync {
    /// Record type produced by this source.
    type Record: TableRecord;

    /// Stable source identifier used in logs and error messages.
    fn id(&self) -> &str;

    /// Read every record.
    fn read(&self) -> Result<Vec<Self::Record>, PipelineError>;
}

/// In-memory table source for tests and small datasets.
pub struct InMemorySource<R> {
    id: SourceId,
    records: Arc<Vec<R>>,
}

impl<R> InMemorySource<R> {
    /// Create an in-memory source from prebuilt records.
    pub fn new(id: impl Into<SourceId>, records: Vec<R>) -> Self {
        Self {
            id: id.into(),
            records: Arc::new(records),
        }
    }
}

impl<R: TableRecord + Clone> TableSource for InMemorySource<R> {
    type Record = R;

    fn id(&self) -> &str {
        &self.id
    }

    fn read(&self) -> Result<Vec<R>, PipelineError> {
        Ok(self.records.as_ref().clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::TakesRecord;

    #[test]
    fn in_memory_source_returns_records_in_order() {
        let source = InMemorySource::new(
            "college_split.Takes",
            vec![
                TakesRecord::new("S1", "CS101-A", "B"),
                TakesRecord::new("S2", "PHYS300", "A"),
            ],
        );
        assert_eq!(source.id(), "college_split.Takes");
        let first = source.read().unwrap();
        let second = source.read().unwrap();
        assert_eq!(first, second);
        assert_eq!(first[0].student_id, "S1");
        assert_eq!(first[1].student_id, "S2");
    }
}
