//! Append-only partition sinks.
//!
//! A [`PartitionSink`] persists one classification outcome as a delimited
//! text file, one `identifier,phone_number` line per entry, no header row.
//! The file is truncated on open, so reruns overwrite rather than append
//! across runs.
//!
//! The sink keeps its own running count and [`PartitionSink::finalize`]
//! returns it. That count is the authoritative input to the summary:
//! re-reading the written file to count lines is fragile against trailing
//! newlines and encoding artifacts, and is never done.

use crate::error::SinkError;
use anyhow::Result;
use csv::WriterBuilder;
use std::fs::{create_dir_all, File};
use std::path::{Path, PathBuf};

/// One append-only output sink.
///
/// Entries are written strictly in the order `append` is called, which the
/// coordinator guarantees matches input row order for this sink's outcome.
/// An entry accepted by `append` is never lost: it is either in the file
/// after a successful `finalize`, or the run fails.
pub struct PartitionSink {
    writer: csv::Writer<File>,
    path: PathBuf,
    count: u64,
}

impl PartitionSink {
    /// Create (or truncate) the sink file, creating parent directories as
    /// needed.
    ///
    /// # Errors
    /// Returns [`SinkError`] if the file or its directories cannot be created.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            create_dir_all(parent)
                .map_err(|e| SinkError::new(path.display().to_string(), "open", e))?;
        }
        let f = File::create(&path)
            .map_err(|e| SinkError::new(path.display().to_string(), "open", e))?;
        let writer = WriterBuilder::new().has_headers(false).from_writer(f);
        Ok(Self {
            writer,
            path,
            count: 0,
        })
    }

    /// Append one entry.
    ///
    /// # Errors
    /// Returns [`SinkError`] if the write fails; an entry that errored is not
    /// counted.
    pub fn append(&mut self, id: &str, phone: &str) -> Result<()> {
        self.writer
            .write_record([id, phone])
            .map_err(|e| SinkError::new(self.path.display().to_string(), "append", e))?;
        self.count += 1;
        Ok(())
    }

    /// Entries accepted so far.
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Sink file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Flush everything to disk and return the exact number of entries
    /// written. Consumes the sink; nothing can be appended afterwards.
    ///
    /// # Errors
    /// Returns [`SinkError`] if the flush fails.
    pub fn finalize(mut self) -> Result<u64> {
        self.writer
            .flush()
            .map_err(|e| SinkError::new(self.path.display().to_string(), "finalize", e))?;
        Ok(self.count)
    }
}
