//! Pre-built datasets and fixtures for testing phone-book pipelines.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// One input row as tests author it: exactly the two required columns.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SamplePhoneRow {
    pub id: String,
    pub phone_number: String,
}

impl SamplePhoneRow {
    pub fn new(id: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phone_number: phone_number.into(),
        }
    }
}

/// A small phone book with a known split: rows 1, 3, and 5 are valid
/// (two trunk-prefix numbers and one country-prefix number), rows 2 and 4
/// are invalid (too short; bad second digit).
///
/// # Example
///
/// ```
/// use phonesift::testing::sample_phone_book;
///
/// let rows = sample_phone_book();
/// assert_eq!(rows.len(), 5);
/// ```
#[must_use]
pub fn sample_phone_book() -> Vec<SamplePhoneRow> {
    vec![
        SamplePhoneRow::new("1", "0821234567"),
        SamplePhoneRow::new("2", "123"),
        SamplePhoneRow::new("3", "27831234567"),
        SamplePhoneRow::new("4", "0921234567"),
        SamplePhoneRow::new("5", "0711234567"),
    ]
}

/// Write rows as a headered CSV file, the shape the pipeline ingests.
///
/// # Errors
/// Returns an error if the file cannot be created or a row fails to
/// serialize.
pub fn write_phone_book(path: impl AsRef<Path>, rows: &[SamplePhoneRow]) -> Result<()> {
    let path = path.as_ref();
    let mut wtr =
        csv::Writer::from_path(path).with_context(|| format!("create {}", path.display()))?;
    for row in rows {
        wtr.serialize(row)
            .with_context(|| format!("serialize row {}", row.id))?;
    }
    wtr.flush()?;
    Ok(())
}

/// Write a phone book into a fresh temp dir; returns the dir guard and the
/// file path. Keep the guard alive for as long as the file is needed.
///
/// # Errors
/// Returns an error if the temp dir or file cannot be created.
pub fn temp_phone_book(rows: &[SamplePhoneRow]) -> Result<(tempfile::TempDir, std::path::PathBuf)> {
    let dir = tempfile::tempdir().context("create temp dir")?;
    let path = dir.path().join("phone_book.csv");
    write_phone_book(&path, rows)?;
    Ok((dir, path))
}
