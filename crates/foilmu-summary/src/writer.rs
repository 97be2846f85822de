//! Summary CSV writer.
//!
//! [`SummaryWriter`] streams rows to any `Write` sink. [`append_rows`]
//! wraps it for the common case of a cumulative file on disk.

use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::error::SummaryError;
use crate::row::{write_header, SummaryRow};

/// Writes summary rows to a byte stream.
///
/// Generic over `W: Write` so tests can use `Vec<u8>` and production
/// code can use `BufWriter<File>`.
///
/// # Examples
///
/// ```
/// use foilmu_summary::{read_rows, SummaryRow, SummaryWriter};
///
/// let mut buf = Vec::new();
/// let mut writer = SummaryWriter::new(&mut buf, true).unwrap();
/// writer.write_row(&SummaryRow { thickness_nm: 250.0, ..Default::default() }).unwrap();
/// assert_eq!(writer.rows_written(), 1);
/// drop(writer);
///
/// let rows = read_rows(buf.as_slice()).unwrap();
/// assert_eq!(rows[0].thickness_nm, 250.0);
/// ```
pub struct SummaryWriter<W: Write> {
    writer: W,
    rows_written: u64,
}

impl<W: Write> SummaryWriter<W> {
    /// Create a writer, writing the header line first when `with_header`.
    pub fn new(mut writer: W, with_header: bool) -> Result<Self, SummaryError> {
        if with_header {
            write_header(&mut writer)?;
        }
        Ok(Self {
            writer,
            rows_written: 0,
        })
    }

    /// Write one row.
    pub fn write_row(&mut self, row: &SummaryRow) -> Result<(), SummaryError> {
        row.write_csv(&mut self.writer)?;
        self.rows_written += 1;
        Ok(())
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> Result<(), SummaryError> {
        self.writer.flush()?;
        Ok(())
    }

    /// Number of rows written so far.
    pub fn rows_written(&self) -> u64 {
        self.rows_written
    }

    /// Consume the writer and return the underlying `Write` sink.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

/// Append `rows` to the CSV file at `path`.
///
/// The header is written only if the file did not exist before the call.
/// Does nothing, and does not create the file, when `rows` is empty.
/// Returns the number of rows written.
pub fn append_rows(path: &Path, rows: &[SummaryRow]) -> Result<usize, SummaryError> {
    if rows.is_empty() {
        return Ok(0);
    }
    let existed = path.exists();
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let mut writer = SummaryWriter::new(BufWriter::new(file), !existed)?;
    for row in rows {
        writer.write_row(row)?;
    }
    writer.flush()?;
    tracing::debug!(
        path = %path.display(),
        rows = rows.len(),
        header = !existed,
        "appended summary rows"
    );
    Ok(rows.len())
}
