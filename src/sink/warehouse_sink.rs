use std::fs;
use std::marker::PhantomData;
use std::path::PathBuf;

use tracing::info;

use crate::constants::warehouse::{SCHEMA_FILE, SINK_SHARD_FILE};
use crate::data::{TableRecord, TableRow};
use crate::errors::PipelineError;
use crate::sink::{CreateDisposition, TableSink, WriteDisposition, WritePlan, plan_write};
use crate::table::{TableRef, TableSchema};
use crate::transport::fs::{ShardStream, TextLogWriter, next_shard_name};
use crate::types::SourceId;
use crate::warehouse::Warehouse;

/// Writer for one warehouse table directory.
///
/// Rows are validated against the schema before the table is touched. The
/// new shard is staged under a hidden name and renamed into place, and
/// `schema.json` is rewritten on every successful write.
pub struct WarehouseTableSink<R> {
    sink_id: SourceId,
    table_dir: PathBuf,
    schema: TableSchema,
    create: CreateDisposition,
    write: WriteDisposition,
    _record: PhantomData<fn(R)>,
}

impl<R: TableRecord> WarehouseTableSink<R> {
    /// Sink over `table` with `CreateIfNeeded` and `WriteTruncate`.
    pub fn new(warehouse: &Warehouse, table: &TableRef, schema: TableSchema) -> Self {
        Self {
            sink_id: warehouse.resolve(table).to_string(),
            table_dir: warehouse.table_dir(table),
            schema,
            create: CreateDisposition::default(),
            write: WriteDisposition::default(),
            _record: PhantomData,
        }
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

    fn encode(&self, records: &[R]) -> Result<Vec<TableRow>, PipelineError> {
        records
            .iter()
            .enumerate()
            .map(|(idx, record)| {
                let row = record.to_row()?;
                self.schema.check_row(&row, &self.sink_id, idx + 1)?;
                Ok(row)
            })
            .collect()
    }

    fn check_existing_schema(&self) -> Result<(), PipelineError> {
        let path = self.table_dir.join(SCHEMA_FILE);
        if !path.is_file() {
            return Ok(());
        }
        let stored: TableSchema = serde_json::from_str(&fs::read_to_string(&path)?)?;
        if stored != self.schema {
            return Err(PipelineError::Sink {
                table: self.sink_id.clone(),
                reason: format!("cannot append rows of schema {} to {}", self.schema, stored),
            });
        }
        Ok(())
    }
}

impl<R: TableRecord> TableSink for WarehouseTableSink<R> {
    type Record = R;

    fn id(&self) -> &str {
        &self.sink_id
    }

    fn write(&self, records: &[R]) -> Result<usize, PipelineError> {
        let rows = self.encode(records)?;

        let stream = ShardStream::new(&self.table_dir);
        let existing = stream.shard_paths();
        let exists = self.table_dir.is_dir();
        let has_rows = self.write == WriteDisposition::WriteEmpty && stream.has_rows()?;
        let plan = plan_write(&self.sink_id, exists, has_rows, self.create, self.write)?;

        fs::create_dir_all(&self.table_dir)?;
        let shard_name = match plan {
            WritePlan::Replace => SINK_SHARD_FILE.to_string(),
            WritePlan::Append => {
                self.check_existing_schema()?;
                next_shard_name(&existing)
            }
        };
        let staged = self.table_dir.join(format!(".{shard_name}.tmp"));
        let written = TextLogWriter::write_all(&staged, &rows)?;

        if plan == WritePlan::Replace {
            for shard in &existing {
                fs::remove_file(shard)?;
            }
        }
        fs::rename(&staged, self.table_dir.join(&shard_name))?;
        fs::write(
            self.table_dir.join(SCHEMA_FILE),
            serde_json::to_string(&self.schema)?,
        )?;

        info!(
            "[takes:sink] wrote {} rows to '{}' ({:?}, {:?})",
            written, self.sink_id, self.create, self.write
        );
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::tables::TAKES_SCHEMA;
    use crate::data::TakesRecord;
    use crate::source::TableSource;
    use tempfile::tempdir;

    fn target() -> TableRef {
        TableRef::new("college_normalized", "Takes")
    }

    fn schema() -> TableSchema {
        TableSchema::parse(TAKES_SCHEMA).unwrap()
    }

    #[test]
    fn truncate_replaces_previous_run() {
        let temp = tempdir().unwrap();
        let warehouse = Warehouse::new(temp.path(), "proj");
        let sink = warehouse.sink::<TakesRecord>(&target(), schema());
        assert_eq!(sink.id(), "proj:college_normalized.Takes");

        sink.write(&[
            TakesRecord::new("S1", "CS101", "B"),
            TakesRecord::new("S2", "PHYS300", "A"),
        ])
        .unwrap();
        sink.write(&[TakesRecord::new("S3", "ZZZ", "C")]).unwrap();

        let records = warehouse.source::<TakesRecord>(&target()).read().unwrap();
        assert_eq!(records, vec![TakesRecord::new("S3", "ZZZ", "C")]);
        let stored = fs::read_to_string(warehouse.schema_path(&target())).unwrap();
        assert_eq!(serde_json::from_str::<TableSchema>(&stored).unwrap(), schema());
    }

    #[test]
    fn append_adds_a_shard() {
        let temp = tempdir().unwrap();
        let warehouse = Warehouse::new(temp.path(), "proj");
        warehouse
            .sink::<TakesRecord>(&target(), schema())
            .write(&[TakesRecord::new("S1", "CS101", "B")])
            .unwrap();
        warehouse
            .sink::<TakesRecord>(&target(), schema())
            .with_write_disposition(WriteDisposition::WriteAppend)
            .write(&[TakesRecord::new("S2", "PHYS300", "A")])
            .unwrap();

        let records = warehouse.source::<TakesRecord>(&target()).read().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].student_id, "S2");
    }

    #[test]
    fn truncate_recovers_a_table_with_corrupt_shards() {
        let temp = tempdir().unwrap();
        let warehouse = Warehouse::new(temp.path(), "proj");
        let dir = warehouse.table_dir(&target());
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("part-00000.jsonl"), "not json\n").unwrap();
        fs::write(dir.join("part-00003.jsonl"), "{\"sid\":\n").unwrap();

        let written = warehouse
            .sink::<TakesRecord>(&target(), schema())
            .write(&[TakesRecord::new("S1", "CS101", "B")])
            .unwrap();
        assert_eq!(written, 1);

        let records = warehouse.source::<TakesRecord>(&target()).read().unwrap();
        assert_eq!(records, vec![TakesRecord::new("S1", "CS101", "B")]);
        assert!(!dir.join("part-00003.jsonl").exists());
    }

    #[test]
    fn append_never_reuses_an_existing_shard_name() {
        let temp = tempdir().unwrap();
        let warehouse = Warehouse::new(temp.path(), "proj");
        let dir = warehouse.table_dir(&target());
        fs::create_dir_all(&dir).unwrap();
        fs::write(
            dir.join("part-00001.jsonl"),
            "{\"sid\":\"OLD\",\"cno\":\"CS101\",\"grade\":\"A\"}\n",
        )
        .unwrap();

        warehouse
            .sink::<TakesRecord>(&target(), schema())
            .with_write_disposition(WriteDisposition::WriteAppend)
            .write(&[TakesRecord::new("NEW", "PHYS300", "B")])
            .unwrap();

        assert!(dir.join("part-00002.jsonl").is_file());
        let records = warehouse.source::<TakesRecord>(&target()).read().unwrap();
        let students: Vec<&str> = records.iter().map(|r| r.student_id.as_str()).collect();
        assert_eq!(students, vec!["OLD", "NEW"]);
    }

    #[test]
    fn write_empty_refuses_a_populated_table() {
        let temp = tempdir().unwrap();
        let warehouse = Warehouse::new(temp.path(), "proj");
        let sink = warehouse
            .sink::<TakesRecord>(&target(), schema())
            .with_write_disposition(WriteDisposition::WriteEmpty);
        sink.write(&[TakesRecord::new("S1", "CS101", "B")]).unwrap();

        let err = sink.write(&[TakesRecord::new("S2", "CS101", "B")]).unwrap_err();
        assert!(matches!(err, PipelineError::Sink { .. }));
        let records = warehouse.source::<TakesRecord>(&target()).read().unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn create_never_leaves_missing_table_alone() {
        let temp = tempdir().unwrap();
        let warehouse = Warehouse::new(temp.path(), "proj");
        let err = warehouse
            .sink::<TakesRecord>(&target(), schema())
            .with_create_disposition(CreateDisposition::CreateNever)
            .write(&[TakesRecord::new("S1", "CS101", "B")])
            .unwrap_err();
        assert!(matches!(err, PipelineError::Sink { .. }));
        assert!(!warehouse.table_dir(&target()).exists());
    }

    #[test]
    fn rows_outside_the_schema_are_rejected_before_writing() {
        let temp = tempdir().unwrap();
        let warehouse = Warehouse::new(temp.path(), "proj");
        let narrow = TableSchema::parse("sid:STRING,cno:STRING").unwrap();
        let err = warehouse
            .sink::<TakesRecord>(&target(), narrow)
            .write(&[TakesRecord::new("S1", "CS101", "B")])
            .unwrap_err();
        assert!(matches!(err, PipelineError::MalformedRow { line: 1, .. }));
        assert!(!warehouse.table_dir(&target()).exists());
    }
}
