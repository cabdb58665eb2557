//! Streaming CSV ingestion.
//!
//! [`RecordReader`] turns a readable byte stream into a lazy, finite,
//! non-restartable sequence of [`Record`]s, one per input row, in input
//! order. The underlying `csv` reader buffers a single row at a time, so
//! inputs larger than available memory stream through in constant space.
//!
//! # Malformed-row policy
//!
//! Abort, never skip. A header that lacks the required `id` / `phone_number`
//! columns, or a row whose field count disagrees with the header, yields a
//! [`MalformedInputError`]: the iterator stops there and the run must end
//! `Failed`. Skipping would silently undercount.
//!
//! A completely empty byte stream is not an error: it parses as zero rows,
//! the same as a header-only file.

use crate::error::MalformedInputError;
use crate::record::{Record, ID_COLUMN, PHONE_COLUMN};
use anyhow::{Context, Result};
use csv::StringRecord;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Streaming reader over one CSV input.
///
/// Yields `Result<Record>` in input order; end-of-stream is normal iterator
/// exhaustion, not an error. After the first `Err` the iterator fuses.
pub struct RecordReader<R: Read> {
    rows: csv::StringRecordsIntoIter<R>,
    headers: StringRecord,
    id_idx: usize,
    phone_idx: usize,
    /// 1-based number of the next data row, for error reporting.
    next_row: u64,
    done: bool,
}

impl RecordReader<File> {
    /// Open a CSV file for streaming.
    ///
    /// # Errors
    /// Returns an error if the file cannot be opened, or
    /// [`MalformedInputError`] if a non-empty header lacks the required
    /// columns.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
        Self::from_reader(f).with_context(|| format!("read header of {}", path.display()))
    }
}

impl<R: Read> RecordReader<R> {
    /// Wrap an arbitrary byte stream.
    ///
    /// The first row is the header and must name both [`ID_COLUMN`] and
    /// [`PHONE_COLUMN`]; any other columns are carried through into
    /// [`Record::extra`]. An empty stream parses as zero rows.
    ///
    /// # Errors
    /// Returns [`MalformedInputError`] if the header is present but missing a
    /// required column.
    pub fn from_reader(rdr: R) -> Result<Self> {
        let mut csv_rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(rdr);
        let headers = csv_rdr.headers().context("read CSV header")?.clone();

        // Empty stream: no header, no rows. Yields nothing.
        if headers.is_empty() {
            return Ok(Self {
                rows: csv_rdr.into_records(),
                headers,
                id_idx: 0,
                phone_idx: 0,
                next_row: 1,
                done: true,
            });
        }

        let id_idx = find_column(&headers, ID_COLUMN)?;
        let phone_idx = find_column(&headers, PHONE_COLUMN)?;
        Ok(Self {
            rows: csv_rdr.into_records(),
            headers,
            id_idx,
            phone_idx,
            next_row: 1,
            done: false,
        })
    }

    /// Header names, in input order. Empty for an empty stream.
    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }

    fn parse_row(&self, row: StringRecord) -> Record {
        let mut extra = std::collections::HashMap::new();
        for (i, (name, value)) in self.headers.iter().zip(row.iter()).enumerate() {
            if i != self.id_idx && i != self.phone_idx {
                extra.insert(name.to_string(), value.to_string());
            }
        }
        Record {
            id: row[self.id_idx].to_string(),
            phone_number: row[self.phone_idx].to_string(),
            extra,
        }
    }
}

impl<R: Read> Iterator for RecordReader<R> {
    type Item = Result<Record>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let row = self.next_row;
        match self.rows.next()? {
            Ok(rec) => {
                self.next_row += 1;
                Some(Ok(self.parse_row(rec)))
            }
            Err(e) => {
                self.done = true;
                Some(Err(row_error(e, row)))
            }
        }
    }
}

fn find_column(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| {
            MalformedInputError::header(format!("required column '{}' not in header", name)).into()
        })
}

/// Field-count disagreements become `MalformedInputError`; anything else
/// (e.g. an I/O failure mid-stream) stays a plain read error.
fn row_error(e: csv::Error, row: u64) -> anyhow::Error {
    if matches!(e.kind(), csv::ErrorKind::UnequalLengths { .. }) {
        MalformedInputError::row(row, e.to_string()).into()
    } else {
        anyhow::Error::new(e).context(format!("read CSV record #{}", row))
    }
}
