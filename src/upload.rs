//! Request-boundary preconditions and run orchestration.
//!
//! The HTTP layer (server, routing, multipart parsing) lives outside this
//! crate, but everything it must get right is here:
//!
//! - [`check_preconditions`] decides accept/reject for an upload exactly the
//!   way the handler must: a file has to be attached and its original
//!   filename has to carry the `.csv` extension. Rejection carries the full
//!   violation list as a [`PreconditionError`], ready to serialize into the
//!   client-error payload.
//! - [`process_upload`] runs the whole sequence in the only safe order:
//!   consume the input fully, finalize the sinks, release the temporary
//!   upload file, and only then hand back the result. The temp file is never
//!   deleted concurrently with reading it.

use crate::error::{PreconditionError, PreconditionViolation};
use crate::pipeline::{PhonePipeline, PipelineOptions, Summary};
use crate::sink::PartitionSink;
use crate::source::RecordReader;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Default artifact for the valid partition, overwritten each run.
pub const VALID_OUTPUT: &str = "valid_numbers.csv";

/// Default artifact for the invalid partition, overwritten each run.
pub const INVALID_OUTPUT: &str = "invalid_numbers.csv";

/// The request field the upload arrives under.
const UPLOAD_FIELD: &str = "csv";

/// What the HTTP layer hands over: the stored temp file (if any) and the
/// client's original filename (the temp path itself carries no extension).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadRequest {
    /// Path of the stored upload, `None` if no file was attached.
    pub file: Option<PathBuf>,
    /// Filename as sent by the client, used for the extension check.
    pub original_name: Option<String>,
}

impl UploadRequest {
    pub fn new(file: impl Into<PathBuf>, original_name: impl Into<String>) -> Self {
        Self {
            file: Some(file.into()),
            original_name: Some(original_name.into()),
        }
    }

    /// A request with no file attached.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            file: None,
            original_name: None,
        }
    }
}

/// Accept or reject an upload before any processing starts.
///
/// Checks, in order: a file must be attached, and the original filename must
/// end in `.csv`. All violated preconditions are reported together.
///
/// # Errors
/// Returns [`PreconditionError`] listing every violation.
pub fn check_preconditions(request: &UploadRequest) -> Result<(), PreconditionError> {
    let mut violations = Vec::new();

    if request.file.is_none() {
        violations.push(PreconditionViolation::new(
            UPLOAD_FIELD,
            "CSV file is required",
        ));
    } else {
        let name = request
            .original_name
            .clone()
            .or_else(|| file_name_of(request.file.as_deref()));
        let is_csv = name.is_some_and(|n| n.ends_with(".csv"));
        if !is_csv {
            violations.push(PreconditionViolation::new(UPLOAD_FIELD, "Invalid file format"));
        }
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(PreconditionError::new(violations))
    }
}

/// Run one upload end to end.
///
/// Sequencing is strict: preconditions, then stream-classify-partition, then
/// finalize both sinks, then remove the temporary input file, then return.
/// The input is removed after both completed and failed runs (either way it
/// has been consumed as far as it ever will be); on a precondition rejection
/// the run never starts and the file is left for the HTTP layer to reap.
///
/// # Errors
/// Returns [`PreconditionError`] for rejected requests,
/// [`MalformedInputError`](crate::MalformedInputError) /
/// [`SinkError`](crate::SinkError) for failed runs. No summary accompanies a
/// failure.
pub fn process_upload(
    request: &UploadRequest,
    valid_path: impl AsRef<Path>,
    invalid_path: impl AsRef<Path>,
    options: PipelineOptions,
) -> Result<Summary> {
    check_preconditions(request)?;
    let input = request.file.as_deref().context("upload file path missing")?;

    let result = run_pipeline(input, valid_path.as_ref(), invalid_path.as_ref(), options);

    // The run is terminal either way; the input has been consumed or the run
    // is Failed. Removal failure must not mask a run failure.
    let removed = std::fs::remove_file(input)
        .with_context(|| format!("remove temporary upload {}", input.display()));
    match (result, removed) {
        (Ok(summary), Ok(())) => Ok(summary),
        (Ok(_), Err(e)) => Err(e),
        (Err(e), _) => Err(e),
    }
}

fn run_pipeline(
    input: &Path,
    valid_path: &Path,
    invalid_path: &Path,
    options: PipelineOptions,
) -> Result<Summary> {
    let reader = RecordReader::from_path(input)?;
    let valid = PartitionSink::create(valid_path)?;
    let invalid = PartitionSink::create(invalid_path)?;
    PhonePipeline::new(options).run(reader, valid, invalid)
}

fn file_name_of(path: Option<&Path>) -> Option<String> {
    path.and_then(|p| p.file_name())
        .and_then(|n| n.to_str())
        .map(|n| n.to_string())
}
