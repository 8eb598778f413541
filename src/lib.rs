#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Command-line front end for the batch job.
pub mod cli;
/// Job configuration built from the environment.
pub mod config;
/// Centralized constants: delimiter, tables, log files, environment names.
pub mod constants;
/// Takes and Class record types and row decoding.
pub mod data;
/// Per-pass correction counts.
pub mod metrics;
/// Course-number normalization.
pub mod normalize;
/// Read, normalize, log, and write orchestration.
pub mod pipeline;
/// Table sinks and write dispositions.
pub mod sink;
/// Table sources.
pub mod source;
/// Table references and schemas.
pub mod table;
/// Filesystem transport used by sources, sinks, and logs.
pub mod transport;
/// Shared type aliases.
pub mod types;
/// Local warehouse layout.
pub mod warehouse;

mod errors;

pub use config::{JobConfig, UncorrectablePolicy};
pub use data::{ClassRecord, TableRecord, TableRow, TakesRecord};
pub use errors::PipelineError;
pub use metrics::CorrectionSummary;
pub use normalize::{Correction, Normalizer, ValidCourseSet, normalize};
pub use pipeline::{NormalizePass, PassReport, run_job};
pub use sink::{CreateDisposition, InMemorySink, TableSink, WriteDisposition};
pub use source::{InMemorySource, TableSource};
pub use table::{TableRef, TableSchema};
pub use types::{CourseNo, Grade, StudentId};
pub use warehouse::Warehouse;
