//! The numbering-plan predicate.
//!
//! [`classify`] is the single source of truth for phone validity. It is pure
//! and total: the same record always yields the same outcome, and no input
//! string (empty, non-digit, wrong length) can make it fail. Anything that
//! does not match the pattern is simply `Invalid`.
//!
//! The pattern: after trimming surrounding whitespace, the value must be all
//! digits, start with the `27` country prefix or a single `0` trunk prefix,
//! continue with one digit in `1..=8`, and end with exactly eight more digits.

use crate::record::Record;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;

/// Compiled once; the pattern literal is the only place the rule lives.
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(27|0)[1-8][0-9]{8}$").expect("phone pattern is valid"));

/// The outcome assigned to a record: exactly one of the two, never an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Classification {
    Valid,
    Invalid,
}

/// A record after classification: the identifier, the whitespace-trimmed
/// phone value the decision was made on, and the outcome.
///
/// This is all that survives of a record; the rest of the row is dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub id: String,
    /// The normalized (trimmed) phone value, as persisted to the partition.
    pub phone: String,
    pub outcome: Classification,
}

/// Classify one record.
///
/// Trims the phone value and tests it against the numbering-plan pattern.
/// Total: never panics or errors for any input string.
///
/// ```
/// use phonesift::{classify, Classification, Record};
///
/// let c = classify(&Record::new("1", " 0821234567 "));
/// assert_eq!(c.outcome, Classification::Valid);
/// assert_eq!(c.phone, "0821234567");
/// ```
#[must_use]
pub fn classify(record: &Record) -> Classified {
    let phone = record.phone_number.trim();
    let outcome = if PHONE_PATTERN.is_match(phone) {
        Classification::Valid
    } else {
        Classification::Invalid
    };
    Classified {
        id: record.id.clone(),
        phone: phone.to_string(),
        outcome,
    }
}
