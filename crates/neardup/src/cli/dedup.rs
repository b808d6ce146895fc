//! The `neardup dedup` command: exact duplicate detection over a path list.

use clap::Args;
use neardup_core::output::{read_path_list, write_error_log, write_path_list, PathList};
use neardup_core::pipeline::FileDiscovery;
use neardup_core::{Config, DedupPass, DedupReport, OutputWriter};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::progress::{create_progress_bar, print_summary, tick, Row};
use super::OutputFormat;

/// Arguments for the `dedup` command.
#[derive(Args, Debug)]
pub struct DedupArgs {
    /// File listing one image path per line (`-` for stdin)
    #[arg(short, long, required_unless_present = "root", conflicts_with = "root")]
    pub input: Option<PathBuf>,

    /// Walk these directories instead of reading a path list
    #[arg(long, num_args = 1..)]
    pub root: Vec<PathBuf>,

    /// Unique path list output (defaults to stdout)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Error log, appended to
    #[arg(long, default_value = "dedup_errors.log")]
    pub error_log: PathBuf,

    /// Write the duplicate report here
    #[arg(long)]
    pub duplicates: Option<PathBuf>,

    /// Duplicate report format
    #[arg(short, long, value_enum, default_value = "jsonl")]
    pub format: OutputFormat,

    /// Bounded queue capacity between the enumerator and the hasher
    #[arg(long)]
    pub buffer_size: Option<usize>,
}

/// Execute the dedup command.
pub async fn execute(args: DedupArgs, mut config: Config) -> anyhow::Result<()> {
    if let Some(buffer_size) = args.buffer_size {
        config.pipeline.buffer_size = buffer_size;
    }
    let config = config.validated()?;

    let (paths, unreadable) = match &args.input {
        Some(input) => {
            let list = load_input(input)?;
            (list.paths, list.errors)
        }
        None => (
            FileDiscovery::new(config.dedup.clone()).discover_all(&args.root),
            Vec::new(),
        ),
    };
    if !unreadable.is_empty() {
        tracing::warn!("Skipping {} undecodable line(s) in the path list", unreadable.len());
    }
    if paths.is_empty() {
        anyhow::bail!("No input paths");
    }
    tracing::info!("Deduplicating {} path(s)", paths.len());

    let progress = create_progress_bar(paths.len() as u64);
    let start = Instant::now();
    let mut done = 0u64;
    let mut report = DedupPass::new(&config)
        .run_with_progress(paths, |_| {
            done += 1;
            tick(&progress, done, start.elapsed());
        })
        .await;
    progress.finish_and_clear();
    report.errors.extend(unreadable);

    write_outputs(&args, &report)?;

    let error_row = if report.errors.is_empty() {
        Row::nonzero("Errors", 0)
    } else {
        Row::new(
            "Errors",
            format!("{} ({})", report.error_count(), args.error_log.display()),
        )
    };
    print_summary(
        "Dedup Summary",
        &[
            Row::new("Files seen", report.files_seen()),
            Row::new("Unique", report.unique_count()),
            Row::new("Duplicates", report.duplicate_count()),
            error_row,
        ],
        start.elapsed(),
    );

    Ok(())
}

fn load_input(input: &Path) -> anyhow::Result<PathList> {
    if input == Path::new("-") {
        return Ok(read_path_list(io::stdin().lock())?);
    }
    let file = File::open(input)
        .map_err(|e| anyhow::anyhow!("Failed to open path list {}: {e}", input.display()))?;
    Ok(read_path_list(BufReader::new(file))?)
}

fn write_outputs(args: &DedupArgs, report: &DedupReport) -> anyhow::Result<()> {
    match &args.output {
        Some(path) => {
            write_path_list(BufWriter::new(File::create(path)?), &report.unique)?;
            tracing::info!("Unique list written to {:?}", path);
        }
        None => write_path_list(io::stdout().lock(), &report.unique)?,
    }

    if !report.errors.is_empty() {
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&args.error_log)?;
        write_error_log(BufWriter::new(log), &report.errors)?;
    }

    if let Some(path) = &args.duplicates {
        let mut writer =
            OutputWriter::new(BufWriter::new(File::create(path)?), args.format.into(), true);
        writer.write_all(&report.duplicates)?;
        writer.flush()?;
        tracing::info!(
            "{} duplicate(s) written to {:?}",
            writer.items_written(),
            path
        );
    }

    Ok(())
}
