//! The `Record` row model and the column names the input must carry.

use std::collections::HashMap;

/// Column that uniquely identifies a row. Opaque: never parsed as a number.
pub const ID_COLUMN: &str = "id";

/// Column holding the phone number to classify.
pub const PHONE_COLUMN: &str = "phone_number";

/// One parsed input row.
///
/// A record always carries the identifier and phone-number columns; any other
/// columns from the input land in `extra` and are passed through unexamined.
/// Records are immutable once parsed: the reader yields them, the classifier
/// consumes them, and only the id and normalized phone survive into a
/// partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Unique identifier, kept as the opaque string from the input.
    pub id: String,
    /// Raw phone-number value, untrimmed.
    pub phone_number: String,
    /// Unrecognized columns, keyed by header name.
    pub extra: HashMap<String, String>,
}

impl Record {
    /// Build a record with no extra columns. Handy in tests.
    pub fn new(id: impl Into<String>, phone_number: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phone_number: phone_number.into(),
            extra: HashMap::new(),
        }
    }
}
