//! One normalization pass: read, log, normalize, log, write.
//!
//! The Class table is loaded once into a `ValidCourseSet` snapshot that every
//! rayon worker reads without synchronization. Each Takes record maps to
//! exactly one output record, in input order.

use std::path::PathBuf;

use rayon::prelude::*;
use tracing::{info, warn};

use crate::config::{JobConfig, UncorrectablePolicy};
use crate::constants::logs::{
    CLASS_QUERY_LOG, NORMALIZED_TAKES_LOG, TAKES_QUERY_LOG, UNCORRECTABLE_TAKES_LOG,
};
use crate::data::{ClassRecord, TakesRecord};
use crate::errors::PipelineError;
use crate::metrics::CorrectionSummary;
use crate::normalize::{Correction, Normalizer, ValidCourseSet};
use crate::sink::TableSink;
use crate::source::TableSource;
use crate::table::TableSchema;
use crate::transport::fs::TextLogWriter;
use crate::warehouse::Warehouse;

/// Number of bad course numbers listed in the end-of-pass notice.
const REPORTED_BAD_COURSES: usize = 5;

/// Outcome of a completed pass.
#[derive(Clone, Debug)]
pub struct PassReport {
    /// Rows read from the Takes source.
    pub takes_read: usize,
    /// Distinct valid course numbers in the snapshot.
    pub valid_courses: usize,
    /// Rows accepted by the sink.
    pub rows_written: usize,
    /// Rows copied to the quarantine log.
    pub quarantined: usize,
    /// Per-record correction counts.
    pub summary: CorrectionSummary,
    /// Directory holding this pass's text logs, if logging was enabled.
    pub run_dir: Option<PathBuf>,
}

/// Configured normalization pass.
#[derive(Clone, Debug, Default)]
pub struct NormalizePass {
    normalizer: Normalizer,
    policy: UncorrectablePolicy,
    sequential: bool,
    log_dir: Option<PathBuf>,
}

impl NormalizePass {
    /// Pass with the default normalizer, pass-through policy, no logs.
    pub fn new() -> Self {
        Self::default()
    }

    /// Pass settings taken from a job config, logging into its run directory.
    pub fn from_config(config: &JobConfig) -> Self {
        Self::new()
            .with_normalizer(Normalizer::default().with_delimiter(config.delimiter))
            .with_policy(config.uncorrectable)
            .with_parallel(config.parallel)
            .with_log_dir(&config.run_dir)
    }

    /// Replace the normalizer (e.g. to change the delimiter).
    pub fn with_normalizer(mut self, normalizer: Normalizer) -> Self {
        self.normalizer = normalizer;
        self
    }

    /// Set how uncorrectable records are handled.
    pub fn with_policy(mut self, policy: UncorrectablePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Normalize on the rayon pool (default) or on the calling thread.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.sequential = !parallel;
        self
    }

    /// Write text logs into `log_dir`. Without one, no logs are written.
    pub fn with_log_dir(mut self, log_dir: impl Into<PathBuf>) -> Self {
        self.log_dir = Some(log_dir.into());
        self
    }

    /// Normalize every record against the snapshot, preserving order.
    pub fn normalize_all(
        &self,
        records: Vec<TakesRecord>,
        valid_courses: &ValidCourseSet,
    ) -> Vec<(TakesRecord, Correction)> {
        let normalizer = self.normalizer;
        if self.sequential {
            records
                .into_iter()
                .map(|record| normalizer.normalize_with_outcome(record, valid_courses))
                .collect()
        } else {
            records
                .into_par_iter()
                .map(|record| normalizer.normalize_with_outcome(record, valid_courses))
                .collect()
        }
    }

    /// Run the pass end to end.
    pub fn run<T, C, S>(
        &self,
        takes: &T,
        classes: &C,
        sink: &S,
    ) -> Result<PassReport, PipelineError>
    where
        T: TableSource<Record = TakesRecord>,
        C: TableSource<Record = ClassRecord>,
        S: TableSink<Record = TakesRecord>,
    {
        let takes_records = takes.read()?;
        let class_records = classes.read()?;
        self.write_log(TAKES_QUERY_LOG, &takes_records)?;
        self.write_log(CLASS_QUERY_LOG, &class_records)?;

        let valid_courses = ValidCourseSet::from_classes(class_records);
        let takes_read = takes_records.len();
        info!(
            "[takes:pass] normalizing {} rows from '{}' against {} course numbers from '{}'",
            takes_read,
            takes.id(),
            valid_courses.len(),
            classes.id()
        );
        if valid_courses.is_empty() {
            warn!(
                "[takes:pass] '{}' returned no course numbers; every row will be treated as bad",
                classes.id()
            );
        }

        let outcomes = self.normalize_all(takes_records, &valid_courses);
        if self.policy == UncorrectablePolicy::Fail {
            if let Some((record, _)) = outcomes
                .iter()
                .find(|(_, correction)| correction.is_uncorrectable())
            {
                return Err(PipelineError::Uncorrectable {
                    student_id: record.student_id.clone(),
                    course_no: record.course_no.clone(),
                });
            }
        }

        let summary =
            CorrectionSummary::from_outcomes(outcomes.iter().map(|(record, c)| (record, c)));
        let uncorrectable: Vec<TakesRecord> = outcomes
            .iter()
            .filter(|(_, correction)| correction.is_uncorrectable())
            .map(|(record, _)| record.clone())
            .collect();
        let normalized: Vec<TakesRecord> =
            outcomes.into_iter().map(|(record, _)| record).collect();

        self.write_log(NORMALIZED_TAKES_LOG, &normalized)?;
        let quarantined = if self.policy == UncorrectablePolicy::Quarantine {
            self.write_log(UNCORRECTABLE_TAKES_LOG, &uncorrectable)?;
            uncorrectable.len()
        } else {
            0
        };

        let rows_written = sink.write(&normalized)?;
        info!(
            "[takes:pass] done: read={} valid={} corrected={} uncorrectable={} written={} to '{}'",
            takes_read,
            summary.valid,
            summary.corrected,
            summary.uncorrectable,
            rows_written,
            sink.id()
        );
        for entry in summary.most_frequent_bad(REPORTED_BAD_COURSES) {
            info!(
                "[takes:pass] bad cno '{}' seen {} times ({:.1}% of bad rows)",
                entry.course_no,
                entry.count,
                entry.share * 100.0
            );
        }

        Ok(PassReport {
            takes_read,
            valid_courses: valid_courses.len(),
            rows_written,
            quarantined,
            summary,
            run_dir: self.log_dir.clone(),
        })
    }

    fn write_log<T: serde::Serialize>(
        &self,
        file_name: &str,
        items: &[T],
    ) -> Result<(), PipelineError> {
        let Some(dir) = &self.log_dir else {
            return Ok(());
        };
        let path = dir.join(file_name);
        let lines = TextLogWriter::write_all(&path, items)?;
        info!("[takes:pass] wrote {} lines to {}", lines, path.display());
        Ok(())
    }
}

/// Run the job described by `config` against its local warehouse.
pub fn run_job(config: &JobConfig) -> Result<PassReport, PipelineError> {
    let warehouse = Warehouse::new(&config.warehouse_root, &config.project_id);
    info!(
        "[takes:job] starting '{}' project='{}' run_dir={} warehouse={}",
        config.job_name,
        warehouse.default_project(),
        config.run_dir.display(),
        warehouse.root().display()
    );
    let schema = TableSchema::parse(&config.target_schema)?;
    let takes = warehouse.source::<TakesRecord>(&config.takes_table);
    let classes = warehouse.source::<ClassRecord>(&config.class_table);
    let sink = warehouse.sink::<TakesRecord>(&config.target_table, schema);
    NormalizePass::from_config(config).run(&takes, &classes, &sink)
}
