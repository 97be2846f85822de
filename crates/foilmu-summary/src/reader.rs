//! Summary CSV reader.

use std::io::{BufRead, Lines};

use crate::error::SummaryError;
use crate::row::{SummaryRow, COLUMNS};

/// Reads summary rows from a text stream.
///
/// The header is validated on [`open`](Self::open). Blank lines are
/// skipped.
pub struct SummaryReader<R: BufRead> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> SummaryReader<R> {
    /// Open a summary stream, reading and validating the header.
    ///
    /// An empty stream is accepted and yields no rows.
    pub fn open(reader: R) -> Result<Self, SummaryError> {
        let mut lines = reader.lines();
        if let Some(header) = lines.next() {
            let header = header?;
            let expected = COLUMNS.join(",");
            if header.trim_end() != expected {
                return Err(SummaryError::HeaderMismatch { found: header });
            }
        }
        Ok(Self { lines, line_no: 1 })
    }

    /// Read the next row, or `None` if the stream is exhausted.
    pub fn next_row(&mut self) -> Result<Option<SummaryRow>, SummaryError> {
        for line in self.lines.by_ref() {
            self.line_no += 1;
            let line = line?;
            let line = line.trim_end();
            if line.is_empty() {
                continue;
            }
            return SummaryRow::parse_csv(line)
                .map(Some)
                .map_err(|detail| SummaryError::MalformedRow {
                    line: self.line_no,
                    detail,
                });
        }
        Ok(None)
    }
}

impl<R: BufRead> Iterator for SummaryReader<R> {
    type Item = Result<SummaryRow, SummaryError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_row().transpose()
    }
}

/// Read every row from `reader`.
pub fn read_rows<R: BufRead>(reader: R) -> Result<Vec<SummaryRow>, SummaryError> {
    SummaryReader::open(reader)?.collect()
}
