use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::Value;
use walkdir::WalkDir;

use crate::constants::warehouse::{SHARD_EXTENSION, SHARD_PREFIX};
use crate::data::TableRow;
use crate::errors::PipelineError;

/// Filesystem transport that reads JSON-lines shards under a table directory.
pub struct ShardStream {
    root: PathBuf,
}

impl ShardStream {
    /// Create a stream rooted at a table directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Shard files under the root, in sorted path order.
    pub fn shard_paths(&self) -> Vec<PathBuf> {
        let mut shards: Vec<PathBuf> = WalkDir::new(&self.root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| entry.file_type().is_file() && is_shard_file(entry.path()))
            .map(|entry| entry.into_path())
            .collect();
        shards.sort();
        shards
    }

    /// Read every row of every shard.
    ///
    /// Blank lines are skipped. Errors name the 1-based row position across
    /// all shards, with the shard path in the details.
    pub fn read_rows(&self, table: &str) -> Result<Vec<TableRow>, PipelineError> {
        let mut rows = Vec::new();
        for shard in self.shard_paths() {
            let reader = BufReader::new(File::open(&shard)?);
            for line in reader.lines() {
                let line = line?;
                if line.trim().is_empty() {
                    continue;
                }
                let position = rows.len() + 1;
                match serde_json::from_str::<Value>(&line) {
                    Ok(Value::Object(row)) => rows.push(row),
                    Ok(other) => {
                        return Err(PipelineError::MalformedRow {
                            table: table.to_string(),
                            line: position,
                            details: format!(
                                "expected a JSON object in {}, found {other}",
                                shard.display()
                            ),
                        });
                    }
                    Err(err) => {
                        return Err(PipelineError::MalformedRow {
                            table: table.to_string(),
                            line: position,
                            details: format!("{} ({})", err, shard.display()),
                        });
                    }
                }
            }
        }
        Ok(rows)
    }

    /// True if any shard holds a non-blank line. Lines are not decoded.
    pub fn has_rows(&self) -> Result<bool, PipelineError> {
        for shard in self.shard_paths() {
            let reader = BufReader::new(File::open(&shard)?);
            for line in reader.lines() {
                if !line?.trim().is_empty() {
                    return Ok(true);
                }
            }
        }
        Ok(false)
    }
}

/// True if the path has the shard extension (case-insensitive).
pub fn is_shard_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| ext.eq_ignore_ascii_case(SHARD_EXTENSION))
        .unwrap_or(false)
}

/// Shard name one past the highest `part-NNNNN` index among `shards`.
///
/// Shards that do not follow the naming scheme are ignored.
pub fn next_shard_name(shards: &[PathBuf]) -> String {
    let next = shards
        .iter()
        .filter_map(|path| {
            path.file_stem()?
                .to_str()?
                .strip_prefix(SHARD_PREFIX)?
                .parse::<usize>()
                .ok()
        })
        .max()
        .map_or(0, |highest| highest + 1);
    format!("{SHARD_PREFIX}{next:05}.{SHARD_EXTENSION}")
}

/// Line-oriented text log: one JSON value per line.
///
/// The file is created (with parent directories) or truncated on `create`.
pub struct TextLogWriter {
    writer: BufWriter<File>,
    lines: usize,
}

impl TextLogWriter {
    /// Create or truncate the log at `path`.
    pub fn create(path: impl AsRef<Path>) -> Result<Self, PipelineError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let writer = BufWriter::new(File::create(path)?);
        Ok(Self { writer, lines: 0 })
    }

    /// Create a log, write every item, and flush it.
    pub fn write_all<'a, T, I>(path: impl AsRef<Path>, items: I) -> Result<usize, PipelineError>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut log = Self::create(path)?;
        for item in items {
            log.append(item)?;
        }
        log.finish()
    }

    /// Write one item as a JSON line.
    pub fn append<T: Serialize>(&mut self, item: &T) -> Result<(), PipelineError> {
        serde_json::to_writer(&mut self.writer, item)?;
        self.writer.write_all(b"\n")?;
        self.lines += 1;
        Ok(())
    }

    /// Flush and return the number of lines written.
    pub fn finish(mut self) -> Result<usize, PipelineError> {
        self.writer.flush()?;
        Ok(self.lines)
    }
}
