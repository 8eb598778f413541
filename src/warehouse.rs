//! Local warehouse layout.
//!
//! Tables live at `<root>/<project>/<dataset>/<table>/` as JSON-lines shards
//! next to an optional `schema.json`. Unqualified table references resolve
//! against the warehouse's default project.

use std::path::{Path, PathBuf};

use crate::constants::warehouse::SCHEMA_FILE;
use crate::data::TableRecord;
use crate::sink::WarehouseTableSink;
use crate::source::WarehouseTableSource;
use crate::table::{TableRef, TableSchema};
use crate::types::ProjectId;

/// Handle on a warehouse directory.
#[derive(Clone, Debug)]
pub struct Warehouse {
    root: PathBuf,
    default_project: ProjectId,
}

impl Warehouse {
    /// Warehouse rooted at `root`; unqualified tables belong to `default_project`.
    pub fn new(root: impl Into<PathBuf>, default_project: impl Into<ProjectId>) -> Self {
        Self {
            root: root.into(),
            default_project: default_project.into(),
        }
    }

    /// Warehouse root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Project used for unqualified table references.
    pub fn default_project(&self) -> &str {
        &self.default_project
    }

    /// Reference with the default project filled in.
    pub fn resolve(&self, table: &TableRef) -> TableRef {
        table.qualified(&self.default_project)
    }

    /// Directory holding the shards of `table`.
    pub fn table_dir(&self, table: &TableRef) -> PathBuf {
        let table = self.resolve(table);
        let project = table.project.unwrap_or_default();
        self.root.join(project).join(table.dataset).join(table.table)
    }

    /// Location of the table's `schema.json`.
    pub fn schema_path(&self, table: &TableRef) -> PathBuf {
        self.table_dir(table).join(SCHEMA_FILE)
    }

    /// Read-side view of `table`.
    pub fn source<R: TableRecord>(&self, table: &TableRef) -> WarehouseTableSource<R> {
        WarehouseTableSource::new(self, table)
    }

    /// Write-side view of `table`, enforcing `schema`.
    pub fn sink<R: TableRecord>(
        &self,
        table: &TableRef,
        schema: TableSchema,
    ) -> WarehouseTableSink<R> {
        WarehouseTableSink::new(self, table, schema)
    }
}
