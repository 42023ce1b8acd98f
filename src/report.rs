// 🧾 Report Writer - `code,name,total` per known code
//
// Rows come out in definition-file order. By default the report is appended
// to whatever a previous run left behind, so re-running after a partial
// success duplicates rows. `ReportMode::Truncate` starts the file fresh.

use crate::definitions::CodeBook;
use crate::error::SalesError;
use csv::{QuoteStyle, Terminator, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io;
use std::path::Path;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportMode {
    /// Add rows after any existing content
    #[default]
    Append,

    /// Replace any existing content
    Truncate,
}

/// Write one row per code in `book` to `dir/file_name`.
///
/// Returns the number of rows written. Any failure to open, write or flush
/// the file is a `ReportWriteFailed` naming `file_name`.
pub fn write_report(
    dir: &Path,
    file_name: &str,
    book: &CodeBook,
    mode: ReportMode,
) -> Result<usize, SalesError> {
    let path = dir.join(file_name);

    write_rows(&path, book, mode).map_err(|source| {
        warn!(path = %path.display(), error = %source, "report write failed");
        SalesError::ReportWriteFailed {
            file: file_name.to_string(),
            source,
        }
    })
}

fn write_rows(path: &Path, book: &CodeBook, mode: ReportMode) -> io::Result<usize> {
    let file = open(path, mode)?;

    // Names can't contain commas (the loader rejects them), so nothing needs
    // quoting
    let mut writer = WriterBuilder::new()
        .has_headers(false)
        .quote_style(QuoteStyle::Never)
        .terminator(line_terminator())
        .from_writer(file);

    let mut rows = 0;
    for (code, name, total) in book.rows() {
        writer.write_record([code, name, total.to_string().as_str()])?;
        rows += 1;
    }

    writer.flush()?;
    debug!(path = %path.display(), rows, ?mode, "report written");

    Ok(rows)
}

fn open(path: &Path, mode: ReportMode) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true);

    match mode {
        ReportMode::Append => options.append(true),
        ReportMode::Truncate => options.write(true).truncate(true),
    };

    options.open(path)
}

/// The platform's line separator
fn line_terminator() -> Terminator {
    if cfg!(windows) {
        Terminator::CRLF
    } else {
        Terminator::Any(b'\n')
    }
}

// ============================================================================
// TESTS
// ============================================================================
