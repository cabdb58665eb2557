//! # Phonesift
//!
//! A **streaming phone-book validator** for Rust. Phonesift reads a CSV file of
//! records one row at a time, classifies each phone number against the national
//! numbering-plan pattern, partitions records into two persisted CSV outputs
//! (valid and invalid), and reports an aggregate summary, all without loading
//! the whole input into memory and without losing or double-counting a record.
//!
//! ## Key Features
//!
//! - **Streaming ingestion** - constant memory per row, inputs larger than RAM
//! - **Pure total classifier** - one regex, compiled once, never errors
//! - **Append-only partition sinks** - authoritative counts from `finalize()`,
//!   never re-derived by re-reading output files
//! - **Explicit run lifecycle** - `Idle → Streaming → Finalizing → Done`, with
//!   `Failed` on unrecoverable error and no partial summary
//! - **Bounded concurrency** - tunable worker width for classification
//!   (feature `parallel`), width 1 for strictly sequential runs
//! - **Request-boundary preconditions** - structured violation payloads for
//!   the HTTP layer to return as a client error
//!
//! ## Quick Start
//!
//! ```ignore
//! use phonesift::*;
//! # use anyhow::Result;
//!
//! # fn main() -> Result<()> {
//! let reader = RecordReader::from_path("phone_book.csv")?;
//! let valid = PartitionSink::create("valid_numbers.csv")?;
//! let invalid = PartitionSink::create("invalid_numbers.csv")?;
//!
//! let summary = PhonePipeline::new(PipelineOptions::default())
//!     .run(reader, valid, invalid)?;
//!
//! assert_eq!(summary.count, summary.valid_count + summary.invalid_count);
//! println!("{}", summary.to_json()?);
//! # Ok(())
//! # }
//! ```
//!
//! ## Core Concepts
//!
//! ### Record
//!
//! A [`Record`] is one parsed input row: a unique identifier, a phone number,
//! and any extra columns (carried along unexamined). Records are immutable
//! once parsed and consumed exactly once by the classifier.
//!
//! ### Classification
//!
//! [`classify()`] is the single source of truth for validity. The phone value is
//! whitespace-trimmed and must match `^(27|0)[1-8][0-9]{8}$`: all digits, a
//! `27` country prefix or a single `0` trunk prefix, a second digit in `1..8`,
//! then exactly eight more digits. A non-matching or empty value is
//! [`Classification::Invalid`], never an error.
//!
//! ### Partition sinks
//!
//! A [`PartitionSink`] is an append-only CSV output (`identifier,phone` per
//! line, no header) for one classification outcome. Entries within a sink keep
//! the relative input order of their source rows. `finalize()` flushes the
//! sink and returns the exact number of entries written; the summary is built
//! from these counts.
//!
//! ### Pipeline
//!
//! [`PhonePipeline`] drives the run: pull a batch of records from the reader,
//! classify the batch, append each result to the matching sink, repeat until
//! end of stream, then finalize both sinks and produce a [`Summary`]. A
//! malformed row (field count disagreeing with the header) aborts the run;
//! rows are never silently skipped.
//!
//! ## Request boundary
//!
//! The HTTP layer is not part of this crate, but the checks it must perform
//! are: [`upload::check_preconditions`] rejects a missing file or a
//! non-`.csv` filename with a [`PreconditionError`] listing every violation,
//! and [`upload::process_upload`] runs the full sequence the handler needs:
//! consume the input, finalize the sinks, release the temporary upload file,
//! and only then hand back the summary.
//!
//! ## Module Overview
//!
//! - [`record`] - the `Record` row model and required column names
//! - [`source`] - streaming CSV ingestion ([`RecordReader`])
//! - [`mod@classify`] - the numbering-plan predicate
//! - [`sink`] - append-only partition sinks with authoritative counts
//! - [`pipeline`] - the run coordinator, options, and summary
//! - [`upload`] - request-boundary preconditions and orchestration
//! - [`error`] - the error taxonomy (`MalformedInputError`, `SinkError`,
//!   `PreconditionError`)
//! - [`testing`] - fixtures for writing your own tests

pub mod classify;
pub mod error;
pub mod pipeline;
pub mod record;
pub mod sink;
pub mod source;
pub mod testing;
pub mod upload;

// General re-exports
pub use classify::{classify, Classification, Classified};
pub use error::{MalformedInputError, PreconditionError, PreconditionViolation, SinkError};
pub use pipeline::{PhonePipeline, PipelineOptions, RunState, Summary};
pub use record::Record;
pub use sink::PartitionSink;
pub use source::RecordReader;
pub use upload::{check_preconditions, process_upload, UploadRequest};
