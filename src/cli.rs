use std::error::Error;
use std::path::PathBuf;

use chrono::Utc;
use clap::{Parser, ValueEnum, error::ErrorKind};
use tracing_subscriber::EnvFilter;

use crate::config::{JobConfig, UncorrectablePolicy};
use crate::constants::env::{BUCKET_VAR, PROJECT_ID_VAR};
use crate::constants::normalize::COURSE_NO_DELIMITER;
use crate::pipeline::{PassReport, run_job};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum PolicyArg {
    PassThrough,
    Quarantine,
    Fail,
}

impl From<PolicyArg> for UncorrectablePolicy {
    fn from(value: PolicyArg) -> Self {
        match value {
            PolicyArg::PassThrough => UncorrectablePolicy::PassThrough,
            PolicyArg::Quarantine => UncorrectablePolicy::Quarantine,
            PolicyArg::Fail => UncorrectablePolicy::Fail,
        }
    }
}

#[derive(Debug, Parser)]
#[command(
    name = "normalize_takes",
    disable_help_subcommand = true,
    about = "Repair Takes rows whose course number is missing from the Class table",
    long_about = "Read college_split.Takes and college_split.Class from the local warehouse, truncate unknown course numbers at their first delimiter, log every stage into a timestamped run directory, and replace <PROJECT_ID>:college_normalized.Takes with the result.",
    after_help = "PROJECT_ID and BUCKET are read from the environment when the flags are omitted. Set RUST_LOG to change log verbosity (default: info)."
)]
/// CLI for `normalize_takes`.
///
/// Common usage:
/// - `PROJECT_ID=college BUCKET=/srv/bucket normalize_takes`
/// - Quarantine rows the heuristic cannot repair: `--on-uncorrectable quarantine`
/// - Read tables from elsewhere: `--warehouse-root /srv/warehouse`
struct NormalizeTakesCli {
    #[arg(
        long = "project-id",
        env = PROJECT_ID_VAR,
        value_name = "PROJECT_ID",
        help = "Project that owns the output table"
    )]
    project_id: String,
    #[arg(
        long,
        env = BUCKET_VAR,
        value_name = "DIR",
        help = "Storage location prefix; run logs go to <DIR>/output/<timestamp>/"
    )]
    bucket: PathBuf,
    #[arg(
        long = "warehouse-root",
        value_name = "DIR",
        help = "Optional warehouse root override (default: <BUCKET>/warehouse)"
    )]
    warehouse_root: Option<PathBuf>,
    #[arg(
        long = "on-uncorrectable",
        value_enum,
        default_value_t = PolicyArg::PassThrough,
        help = "What to do with rows whose course number cannot be repaired"
    )]
    on_uncorrectable: PolicyArg,
    #[arg(long, help = "Normalize on the calling thread instead of the rayon pool")]
    sequential: bool,
    #[arg(
        long,
        default_value_t = COURSE_NO_DELIMITER,
        value_parser = parse_delimiter,
        help = "Delimiter that separates a course number from its suffix"
    )]
    delimiter: char,
}

/// Run the `normalize_takes` job with the given arguments (without argv[0]).
pub fn run_normalize_takes<I>(args_iter: I) -> Result<(), Box<dyn Error>>
where
    I: Iterator<Item = String>,
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .try_init();

    let Some(cli) = parse_cli::<NormalizeTakesCli, _>(
        std::iter::once("normalize_takes".to_string()).chain(args_iter),
    )?
    else {
        return Ok(());
    };

    let config = job_config(cli)?;
    let report = run_job(&config)?;
    print_report(&config, &report);
    Ok(())
}

fn job_config(cli: NormalizeTakesCli) -> Result<JobConfig, Box<dyn Error>> {
    let mut config = JobConfig::new(cli.project_id, cli.bucket, Utc::now())?
        .with_uncorrectable_policy(cli.on_uncorrectable.into())
        .with_parallel(!cli.sequential)
        .with_delimiter(cli.delimiter);
    if let Some(root) = cli.warehouse_root {
        config = config.with_warehouse_root(root);
    }
    Ok(config)
}

fn print_report(config: &JobConfig, report: &PassReport) {
    println!("=== {} ===", config.job_name);
    println!("target: {}", config.target_table);
    println!("run dir: {}", config.run_dir.display());
    println!(
        "rows: read={} written={} quarantined={}",
        report.takes_read, report.rows_written, report.quarantined
    );
    println!(
        "course numbers: valid={} corrected={} ({:.2}%) uncorrectable={} ({:.2}%)",
        report.summary.valid,
        report.summary.corrected,
        report.summary.corrected_share() * 100.0,
        report.summary.uncorrectable,
        report.summary.uncorrectable_share() * 100.0
    );
}

fn parse_cli<T, I>(args: I) -> Result<Option<T>, Box<dyn Error>>
where
    T: Parser,
    I: IntoIterator,
    I::Item: Into<std::ffi::OsString> + Clone,
{
    match T::try_parse_from(args) {
        Ok(cli) => Ok(Some(cli)),
        Err(err) => match err.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => {
                err.print()?;
                Ok(None)
            }
            _ => Err(err.into()),
        },
    }
}

fn parse_delimiter(raw: &str) -> Result<char, String> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(ch), None) if !ch.is_whitespace() => Ok(ch),
        _ => Err(format!(
            "--delimiter expects a single non-whitespace character, got '{raw}'"
        )),
    }
}
