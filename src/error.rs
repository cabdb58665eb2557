//! Typed errors for the pipeline.
//!
//! Three failure families exist, and they are deliberately distinct types so
//! callers can `downcast_ref` through an [`anyhow::Error`] chain and map each
//! to the right response:
//!
//! - [`PreconditionError`] - the request never qualified (no file, wrong
//!   extension); the run never starts. Client-error territory.
//! - [`MalformedInputError`] - the input's shape is wrong (missing required
//!   header columns, or a row whose field count disagrees with the header);
//!   the run aborts rather than undercount.
//! - [`SinkError`] - an output sink could not be opened, written, or
//!   finalized; fatal to the run, no partial summary.
//!
//! Classification itself never errors: a bad phone value is `Invalid`, not a
//! failure. If classification ever did fail it would be an internal-invariant
//! violation, not something modeled here.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single violated request precondition.
///
/// Mirrors the shape of a field-validation failure payload: which input field
/// was at fault and a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreconditionViolation {
    /// The request field that failed (e.g. `csv`).
    pub field: String,
    /// Human-readable error message.
    pub message: String,
}

impl PreconditionViolation {
    pub fn new<F: Into<String>, M: Into<String>>(field: F, message: M) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for PreconditionViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.field, self.message)
    }
}

/// Request-boundary failure: the upload never qualified for processing.
///
/// Carries every violated precondition, not just the first, so the caller can
/// surface them all in one structured payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreconditionError {
    /// All violated preconditions, in check order.
    pub violations: Vec<PreconditionViolation>,
}

impl PreconditionError {
    pub fn new(violations: Vec<PreconditionViolation>) -> Self {
        Self { violations }
    }

    /// Export the violation list as the JSON error payload (`{"errors":[...]}`).
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(&serde_json::json!({ "errors": self.violations }))
    }
}

impl fmt::Display for PreconditionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let list = self
            .violations
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "precondition failed: {}", list)
    }
}

impl std::error::Error for PreconditionError {}

/// Structural input failure: the header or a row does not have the shape the
/// format promises.
///
/// Policy is abort, not skip: a run that hits one of these ends `Failed` with
/// no summary, so counts can never silently drift from the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MalformedInputError {
    /// 1-based data-row number, or `None` for header-level problems.
    pub row: Option<u64>,
    /// What was wrong with the shape.
    pub message: String,
}

impl MalformedInputError {
    /// Header-level problem (missing header or missing required columns).
    pub fn header<M: Into<String>>(message: M) -> Self {
        Self {
            row: None,
            message: message.into(),
        }
    }

    /// Row-level problem at the given 1-based data-row number.
    pub fn row<M: Into<String>>(row: u64, message: M) -> Self {
        Self {
            row: Some(row),
            message: message.into(),
        }
    }
}

impl fmt::Display for MalformedInputError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.row {
            Some(row) => write!(f, "malformed input at row {}: {}", row, self.message),
            None => write!(f, "malformed input: {}", self.message),
        }
    }
}

impl std::error::Error for MalformedInputError {}

/// Output-sink failure: open, append, or finalize did not complete.
#[derive(Debug)]
pub struct SinkError {
    /// Path of the sink that failed.
    pub path: String,
    /// The failing operation (`open`, `append`, `finalize`).
    pub operation: &'static str,
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl SinkError {
    pub fn new<E>(path: impl Into<String>, operation: &'static str, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            path: path.into(),
            operation,
            source: Some(Box::new(source)),
        }
    }
}

impl fmt::Display for SinkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sink {} failed for {}", self.operation, self.path)
    }
}

impl std::error::Error for SinkError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
