//! Output formatting: JSON/JSONL reports and plain-text path lists.
//!
//! Provides a flexible writer that can output single items or batches
//! in either JSON or JSON Lines format, plus the line-oriented path list
//! and error log files the dedup pass reads and writes.

use serde::Serialize;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;

use crate::types::FileError;

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Single JSON object or array
    Json,
    /// One JSON object per line (newline-delimited JSON)
    JsonLines,
}

impl OutputFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// A writer that serializes items to JSON or JSONL format.
pub struct OutputWriter<W: Write> {
    writer: W,
    format: OutputFormat,
    pretty: bool,
    items_written: usize,
}

impl<W: Write> OutputWriter<W> {
    /// Create a new output writer.
    ///
    /// # Arguments
    ///
    /// * `writer` - The underlying writer (file, stdout, etc.)
    /// * `format` - Output format (JSON or JSONL)
    /// * `pretty` - Whether to pretty-print JSON (only affects JSON format)
    pub fn new(writer: W, format: OutputFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
            items_written: 0,
        }
    }

    /// Write a single item.
    ///
    /// For JSON format, writes a single object.
    /// For JSONL format, writes one object per line.
    pub fn write<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, item)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
            }
            OutputFormat::JsonLines => {
                // JSONL is never pretty-printed (one object per line)
                serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
                writeln!(self.writer)?;
            }
        }
        self.items_written += 1;
        Ok(())
    }

    /// Write multiple items.
    ///
    /// For JSON format, writes as a JSON array.
    /// For JSONL format, writes one object per line.
    pub fn write_all<T: Serialize>(&mut self, items: &[T]) -> io::Result<()> {
        match self.format {
            OutputFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, items)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, items).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
                self.items_written += items.len();
            }
            OutputFormat::JsonLines => {
                for item in items {
                    self.write(item)?;
                }
            }
        }
        Ok(())
    }

    /// Get the number of items written.
    pub fn items_written(&self) -> usize {
        self.items_written
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Paths read from a path list, plus the lines that could not be decoded.
#[derive(Debug, Default)]
pub struct PathList {
    pub paths: Vec<PathBuf>,
    pub errors: Vec<FileError>,
}

/// Read a newline-delimited path list.
///
/// Blank lines are skipped; `\r\n` line endings read the same as `\n`.
/// Order is preserved. A line that is not valid UTF-8 is recorded in
/// `errors` under its lossy rendering and reading carries on; only I/O
/// failures abort.
pub fn read_path_list<R: BufRead>(reader: R) -> io::Result<PathList> {
    let mut list = PathList::default();
    for (i, line) in reader.split(b'\n').enumerate() {
        let line = line?;
        let line = line.strip_suffix(b"\r").unwrap_or(&line[..]);
        match std::str::from_utf8(line) {
            Ok(text) if text.trim().is_empty() => {}
            Ok(text) => list.paths.push(PathBuf::from(text)),
            Err(e) => list.errors.push(FileError {
                path: PathBuf::from(String::from_utf8_lossy(line).into_owned()),
                reason: format!("line {} of the path list is not valid UTF-8: {e}", i + 1),
            }),
        }
    }
    Ok(list)
}

/// Write one path per line.
pub fn write_path_list<W: Write>(mut writer: W, paths: &[PathBuf]) -> io::Result<()> {
    for path in paths {
        writeln!(writer, "{}", path.display())?;
    }
    writer.flush()
}

/// Write one `<path>: <reason>` line per failed file.
pub fn write_error_log<W: Write>(mut writer: W, errors: &[FileError]) -> io::Result<()> {
    for error in errors {
        writeln!(writer, "{error}")?;
    }
    writer.flush()
}
