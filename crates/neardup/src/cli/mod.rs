//! Command handlers.

pub mod cluster;
pub mod clusters;
pub mod config;
pub mod dedup;
pub mod ingest;
pub mod reset;

mod progress;

use clap::ValueEnum;
use neardup_core::OutputFormat as CoreOutputFormat;

/// Report formats selectable on the command line.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormat {
    /// Single JSON array
    Json,
    /// One JSON object per line (newline-delimited)
    Jsonl,
}

impl From<OutputFormat> for CoreOutputFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Json => CoreOutputFormat::Json,
            OutputFormat::Jsonl => CoreOutputFormat::JsonLines,
        }
    }
}
