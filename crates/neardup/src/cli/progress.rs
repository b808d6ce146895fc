//! Progress bars and end-of-run summaries shared by the command handlers.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Create a progress bar for a pass over `total` files.
pub fn create_progress_bar(total: u64) -> ProgressBar {
    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Update the rate message after one more file.
pub fn tick(pb: &ProgressBar, done: u64, elapsed: Duration) {
    pb.inc(1);
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        pb.set_message(format!("{:.1} files/sec", done as f64 / secs));
    }
}

/// A labelled line in a summary table.
pub struct Row {
    label: &'static str,
    value: String,
    show_if_zero: bool,
}

impl Row {
    pub fn new(label: &'static str, value: impl ToString) -> Self {
        Self {
            label,
            value: value.to_string(),
            show_if_zero: true,
        }
    }

    /// Hide the row when its value is `0`.
    pub fn nonzero(label: &'static str, value: impl ToString) -> Self {
        Self {
            show_if_zero: false,
            ..Self::new(label, value)
        }
    }

    fn visible(&self) -> bool {
        self.show_if_zero || self.value != "0"
    }
}

/// Print a formatted summary table to stderr.
pub fn print_summary(title: &str, rows: &[Row], elapsed: Duration) {
    eprintln!();
    eprintln!("  ====================================");
    eprintln!("  {:^34}", title);
    eprintln!("  ====================================");
    for row in rows.iter().filter(|r| r.visible()) {
        eprintln!("    {:<14}{:>8}", format!("{}:", row.label), row.value);
    }
    eprintln!("  ------------------------------------");
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");
}
