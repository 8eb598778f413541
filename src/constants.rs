/// Constants used by the course-number correction heuristic.
pub mod normalize {
    /// Delimiter separating a course number from a section or variant suffix.
    pub const COURSE_NO_DELIMITER: char = '-';
}

/// Environment variables read at startup.
pub mod env {
    /// Project identifier that qualifies the output table.
    pub const PROJECT_ID_VAR: &str = "PROJECT_ID";
    /// Storage location prefix receiving run logs.
    pub const BUCKET_VAR: &str = "BUCKET";
}

/// Constants describing a single job run.
pub mod job {
    /// Name reported when a run starts.
    pub const JOB_NAME: &str = "transform-takes-table";
    /// Directory under the bucket that holds per-run output folders.
    pub const OUTPUT_DIR: &str = "output";
    /// Directory under the bucket used as the default warehouse root.
    pub const WAREHOUSE_DIR: &str = "warehouse";
    /// `chrono` format of the per-run folder name (for example `2025_01_31_08_15_00`).
    pub const RUN_DIR_TIMESTAMP_FORMAT: &str = "%Y_%m_%d_%H_%M_%S";
}

/// Source and target tables touched by the job.
pub mod tables {
    /// Dataset holding the raw Takes and Class tables.
    pub const SOURCE_DATASET: &str = "college_split";
    /// Dataset receiving the normalized Takes table.
    pub const TARGET_DATASET: &str = "college_normalized";
    /// Takes table name.
    pub const TAKES_TABLE: &str = "Takes";
    /// Class table name.
    pub const CLASS_TABLE: &str = "Class";
    /// Schema of the normalized Takes table.
    pub const TAKES_SCHEMA: &str = "sid:STRING,cno:STRING,grade:STRING";
    /// Student id column.
    pub const COLUMN_SID: &str = "sid";
    /// Course number column.
    pub const COLUMN_CNO: &str = "cno";
    /// Grade column.
    pub const COLUMN_GRADE: &str = "grade";
}

/// Text log files written into each run directory.
pub mod logs {
    /// Raw rows read from the Takes table.
    pub const TAKES_QUERY_LOG: &str = "takes_query_results.txt";
    /// Raw rows read from the Class table.
    pub const CLASS_QUERY_LOG: &str = "class_query_results.txt";
    /// Rows after normalization.
    pub const NORMALIZED_TAKES_LOG: &str = "norm_takes_pcoll.txt";
    /// Rows the heuristic could not repair (quarantine policy only).
    pub const UNCORRECTABLE_TAKES_LOG: &str = "uncorrectable_takes.txt";
}

/// Local warehouse layout.
pub mod warehouse {
    /// Extension of row shard files (one JSON object per line).
    pub const SHARD_EXTENSION: &str = "jsonl";
    /// Name prefix of numbered shards (`part-00000.jsonl`, `part-00001.jsonl`, ...).
    pub const SHARD_PREFIX: &str = "part-";
    /// File name of the single shard written by the table sink.
    pub const SINK_SHARD_FILE: &str = "part-00000.jsonl";
    /// File name of the persisted table schema.
    pub const SCHEMA_FILE: &str = "schema.json";
}
