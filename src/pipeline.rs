//! The run coordinator.
//!
//! [`PhonePipeline`] drives one processing run end to end: pull a bounded
//! batch of records from the [`RecordReader`], classify the batch, append
//! each result to the matching [`PartitionSink`] in input order, and repeat
//! until the reader is exhausted. Finalizing reads the authoritative entry
//! counts from the sinks and produces the [`Summary`].
//!
//! # Lifecycle
//!
//! `Idle → Streaming → Finalizing → Done`, with `Failed` reachable from
//! `Idle` and `Streaming`. `Done` and `Failed` are terminal; a `Failed` run
//! never yields a summary, but both sinks are still flushed and closed so no
//! handles leak.
//!
//! # Concurrency
//!
//! Classification may run on a bounded worker pool
//! ([`PipelineOptions::workers`], feature `parallel`). Batches are classified
//! with an order-preserving parallel map and appended sequentially, so each
//! sink's internal ordering matches input row order at any width. Width 1 is
//! the default: classification is CPU-trivial and sink I/O dominates.

use crate::classify::{classify, Classification, Classified};
use crate::record::Record;
use crate::sink::PartitionSink;
use crate::source::RecordReader;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::io::Read;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Aggregate result of one completed run.
///
/// Invariant: `count == valid_count + invalid_count`, with each side equal to
/// the entry count its sink reported at finalize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    /// Rows successfully parsed and classified.
    pub count: u64,
    /// Entries in the valid partition.
    pub valid_count: u64,
    /// Entries in the invalid partition.
    pub invalid_count: u64,
}

impl Summary {
    /// Export as the JSON response payload
    /// (`{"count":N,"validCount":V,"invalidCount":I}`).
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

/// Tuning knobs for one run.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Records pulled from the reader per batch. Bounds memory: at most one
    /// batch of rows is resident at a time.
    pub batch_rows: usize,
    /// Classification worker width. `1` is strictly sequential; larger
    /// widths use a bounded local pool (feature `parallel`).
    pub workers: usize,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            batch_rows: 1024,
            workers: 1,
        }
    }
}

impl PipelineOptions {
    /// Options with a CPU-derived worker width.
    #[cfg(feature = "parallel")]
    #[must_use]
    pub fn parallel() -> Self {
        Self {
            workers: num_cpus::get().max(2),
            ..Self::default()
        }
    }
}

/// Where a run currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
    /// Sinks not yet driven; nothing read.
    Idle,
    /// Records are being read, classified, and routed.
    Streaming,
    /// Input exhausted; sinks are being flushed.
    Finalizing,
    /// Terminal: summary available.
    Done,
    /// Terminal: the run did not complete; no summary.
    Failed,
}

/// Coordinator for one processing run.
///
/// A pipeline value is single-use: `run` consumes the reader and both sinks
/// and leaves the pipeline in a terminal state. Each run owns its own sinks
/// and counters; nothing is shared across runs.
pub struct PhonePipeline {
    options: PipelineOptions,
    state: RunState,
    #[cfg(feature = "parallel")]
    pool: Option<rayon::ThreadPool>,
}

impl PhonePipeline {
    #[must_use]
    pub fn new(options: PipelineOptions) -> Self {
        Self {
            options,
            state: RunState::Idle,
            #[cfg(feature = "parallel")]
            pool: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RunState {
        self.state
    }

    /// Drive the full run: stream, classify, route, finalize.
    ///
    /// On success the pipeline is `Done` and the summary's counts come from
    /// each sink's `finalize()` return value. On any unrecoverable error
    /// (malformed input, sink failure) the pipeline is `Failed`, both sinks
    /// are still flushed and closed (best effort), and no summary is
    /// returned.
    ///
    /// # Errors
    /// Returns [`MalformedInputError`](crate::MalformedInputError) for
    /// structural input problems and [`SinkError`](crate::SinkError) for
    /// output failures, through the `anyhow` chain.
    pub fn run<R: Read>(
        &mut self,
        mut reader: RecordReader<R>,
        mut valid: PartitionSink,
        mut invalid: PartitionSink,
    ) -> Result<Summary> {
        if let Err(e) = self.prepare_workers() {
            self.state = RunState::Failed;
            return Err(e);
        }
        self.state = RunState::Streaming;

        if let Err(e) = self.stream(&mut reader, &mut valid, &mut invalid) {
            // Release sink handles; counts are meaningless on failure.
            let _ = valid.finalize();
            let _ = invalid.finalize();
            self.state = RunState::Failed;
            return Err(e);
        }

        self.state = RunState::Finalizing;
        let result = (|| -> Result<Summary> {
            let valid_count = valid.finalize()?;
            let invalid_count = invalid.finalize()?;
            Ok(Summary {
                count: valid_count + invalid_count,
                valid_count,
                invalid_count,
            })
        })();

        match result {
            Ok(summary) => {
                self.state = RunState::Done;
                Ok(summary)
            }
            Err(e) => {
                self.state = RunState::Failed;
                Err(e)
            }
        }
    }

    /// The streaming loop: batches in, classified entries out, in order.
    fn stream<R: Read>(
        &self,
        reader: &mut RecordReader<R>,
        valid: &mut PartitionSink,
        invalid: &mut PartitionSink,
    ) -> Result<()> {
        let batch_rows = self.options.batch_rows.max(1);
        loop {
            let mut batch: Vec<Record> = Vec::with_capacity(batch_rows);
            for rec in reader.by_ref().take(batch_rows) {
                batch.push(rec?);
            }
            if batch.is_empty() {
                return Ok(());
            }
            for entry in self.classify_batch(batch) {
                let sink = match entry.outcome {
                    Classification::Valid => &mut *valid,
                    Classification::Invalid => &mut *invalid,
                };
                sink.append(&entry.id, &entry.phone)?;
            }
        }
    }

    #[cfg(feature = "parallel")]
    fn prepare_workers(&mut self) -> Result<()> {
        use anyhow::Context;
        if self.options.workers > 1 && self.pool.is_none() {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(self.options.workers)
                .build()
                .context("build classification worker pool")?;
            self.pool = Some(pool);
        }
        Ok(())
    }

    #[cfg(not(feature = "parallel"))]
    fn prepare_workers(&mut self) -> Result<()> {
        Ok(())
    }

    /// Classify one batch, preserving input order.
    #[cfg(feature = "parallel")]
    fn classify_batch(&self, batch: Vec<Record>) -> Vec<Classified> {
        match &self.pool {
            // par_iter + collect keeps element order, so per-sink ordering
            // still matches input order downstream.
            Some(pool) => pool.install(|| batch.par_iter().map(classify).collect()),
            None => batch.iter().map(classify).collect(),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn classify_batch(&self, batch: Vec<Record>) -> Vec<Classified> {
        batch.iter().map(classify).collect()
    }
}
