use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;

use tracing::{debug, info};

use crate::data::TableRecord;
use crate::errors::PipelineError;
use crate::source::TableSource;
use crate::table::{TableRef, TableSchema};
use crate::transport::fs::ShardStream;
use crate::types::SourceId;
use crate::warehouse::Warehouse;

/// Typed reader over one warehouse table directory.
///
/// When the table carries a `schema.json`, every row is checked against it
/// before decoding.
pub struct WarehouseTableSource<R> {
    source_id: SourceId,
    table_dir: PathBuf,
    schema_path: PathBuf,
    _record: PhantomData<fn() -> R>,
}

impl<R: TableRecord> WarehouseTableSource<R> {
    /// Reader over `table`, resolved against the warehouse's default project.
    pub fn new(warehouse: &Warehouse, table: &TableRef) -> Self {
        Self {
            source_id: table.to_string(),
            table_dir: warehouse.table_dir(table),
            schema_path: warehouse.schema_path(table),
            _record: PhantomData,
        }
    }

    fn stored_schema(&self) -> Result<Option<TableSchema>, PipelineError> {
        if !self.schema_path.is_file() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.schema_path)?;
        let schema = serde_json::from_str(&raw).map_err(|err| {
            PipelineError::Schema(format!(
                "unreadable schema for '{}' at {}: {}",
                self.source_id,
                self.schema_path.display(),
                err
            ))
        })?;
        Ok(Some(schema))
    }
}

impl<R: TableRecord> TableSource for WarehouseTableSource<R> {
    type Record = R;

    fn id(&self) -> &str {
        &self.source_id
    }

    fn read(&self) -> Result<Vec<R>, PipelineError> {
        if !self.table_dir.is_dir() {
            return Err(PipelineError::SourceUnavailable {
                source_id: self.source_id.clone(),
                reason: format!("no table directory at {}", self.table_dir.display()),
            });
        }
        let stream = ShardStream::new(&self.table_dir);
        let rows = stream.read_rows(&self.source_id)?;
        let schema = self.stored_schema()?;
        debug!(
            "[takes:source] table '{}' shards={} schema={}",
            self.source_id,
            stream.shard_paths().len(),
            schema
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "none".to_string())
        );

        let mut records = Vec::with_capacity(rows.len());
        for (idx, row) in rows.iter().enumerate() {
            let line = idx + 1;
            if let Some(schema) = &schema {
                schema.check_row(row, &self.source_id, line)?;
            }
            records.push(R::from_row(row, &self.source_id, line)?);
        }
        info!(
            "[takes:source] read {} rows from '{}'",
            records.len(),
            self.source_id
        );
        Ok(records)
    }
}
