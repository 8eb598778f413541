use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::constants::env::{BUCKET_VAR, PROJECT_ID_VAR};
use crate::constants::job::{JOB_NAME, OUTPUT_DIR, RUN_DIR_TIMESTAMP_FORMAT, WAREHOUSE_DIR};
use crate::constants::normalize::COURSE_NO_DELIMITER;
use crate::constants::tables::{
    CLASS_TABLE, SOURCE_DATASET, TAKES_SCHEMA, TAKES_TABLE, TARGET_DATASET,
};
use crate::errors::PipelineError;
use crate::table::TableRef;
use crate::types::ProjectId;

/// Handling of records the course-number heuristic cannot repair.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum UncorrectablePolicy {
    /// Emit the record unchanged; only the diagnostic notice flags it.
    #[default]
    PassThrough,
    /// Emit the record unchanged and also copy it to the quarantine log.
    Quarantine,
    /// Abort the pass on the first uncorrectable record.
    Fail,
}

/// Process-wide job settings.
///
/// Built once at startup from the environment and handed to the pass; nothing
/// else reads environment variables.
#[derive(Clone, Debug)]
pub struct JobConfig {
    /// Project that owns the output table.
    pub project_id: ProjectId,
    /// Storage location prefix (a local directory).
    pub bucket: PathBuf,
    /// Per-run log directory: `<bucket>/output/<timestamp>/`.
    pub run_dir: PathBuf,
    /// Warehouse root; defaults to `<bucket>/warehouse`.
    pub warehouse_root: PathBuf,
    /// Name reported in the run start notice.
    pub job_name: String,
    /// Table holding raw Takes rows.
    pub takes_table: TableRef,
    /// Table holding valid course numbers.
    pub class_table: TableRef,
    /// Destination of the normalized Takes rows.
    pub target_table: TableRef,
    /// Destination schema in `name:TYPE,...` form.
    pub target_schema: String,
    /// Uncorrectable-record handling.
    pub uncorrectable: UncorrectablePolicy,
    /// Normalize on the rayon pool instead of the calling thread.
    pub parallel: bool,
    /// Course-number split delimiter.
    pub delimiter: char,
}

impl JobConfig {
    /// Build a config with default tables for `project_id` and `bucket`.
    pub fn new(
        project_id: impl Into<ProjectId>,
        bucket: impl Into<PathBuf>,
        started_at: DateTime<Utc>,
    ) -> Result<Self, PipelineError> {
        let project_id = project_id.into();
        let bucket = bucket.into();
        if project_id.trim().is_empty() {
            return Err(PipelineError::Configuration(format!(
                "{PROJECT_ID_VAR} must not be empty"
            )));
        }
        let bucket_str = bucket.to_string_lossy().into_owned();
        if bucket_str.trim().is_empty() {
            return Err(PipelineError::Configuration(format!(
                "{BUCKET_VAR} must not be empty"
            )));
        }
        if bucket_str.contains("://") {
            return Err(PipelineError::Configuration(format!(
                "{BUCKET_VAR} must be a local directory, got '{bucket_str}'"
            )));
        }
        Ok(Self {
            target_table: TableRef::new(TARGET_DATASET, TAKES_TABLE).with_project(&project_id),
            project_id,
            run_dir: run_dir_for(&bucket, started_at),
            warehouse_root: bucket.join(WAREHOUSE_DIR),
            bucket,
            job_name: JOB_NAME.to_string(),
            takes_table: TableRef::new(SOURCE_DATASET, TAKES_TABLE),
            class_table: TableRef::new(SOURCE_DATASET, CLASS_TABLE),
            target_schema: TAKES_SCHEMA.to_string(),
            uncorrectable: UncorrectablePolicy::default(),
            parallel: true,
            delimiter: COURSE_NO_DELIMITER,
        })
    }

    /// Read `PROJECT_ID` and `BUCKET` from the process environment.
    pub fn from_env(started_at: DateTime<Utc>) -> Result<Self, PipelineError> {
        Self::from_lookup(|key| std::env::var(key).ok(), started_at)
    }

    /// Read `PROJECT_ID` and `BUCKET` through `lookup`.
    pub fn from_lookup<F>(lookup: F, started_at: DateTime<Utc>) -> Result<Self, PipelineError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let project_id = lookup(PROJECT_ID_VAR).ok_or_else(|| {
            PipelineError::Configuration(format!("{PROJECT_ID_VAR} is not set"))
        })?;
        let bucket = lookup(BUCKET_VAR)
            .ok_or_else(|| PipelineError::Configuration(format!("{BUCKET_VAR} is not set")))?;
        Self::new(project_id, bucket, started_at)
    }

    /// Override the warehouse root.
    pub fn with_warehouse_root(mut self, warehouse_root: impl Into<PathBuf>) -> Self {
        self.warehouse_root = warehouse_root.into();
        self
    }

    /// Set how uncorrectable records are handled.
    pub fn with_uncorrectable_policy(mut self, policy: UncorrectablePolicy) -> Self {
        self.uncorrectable = policy;
        self
    }

    /// Normalize on the rayon pool (`true`) or on one thread.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Override the course-number delimiter.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Path of a log file inside the run directory.
    pub fn log_path(&self, file_name: &str) -> PathBuf {
        self.run_dir.join(file_name)
    }
}

/// `<bucket>/output/<YYYY_MM_DD_HH_MM_SS>/`
///
/// The timestamp is taken in UTC, not host local time.
pub fn run_dir_for(bucket: &Path, started_at: DateTime<Utc>) -> PathBuf {
    bucket
        .join(OUTPUT_DIR)
        .join(started_at.format(RUN_DIR_TIMESTAMP_FORMAT).to_string())
}
