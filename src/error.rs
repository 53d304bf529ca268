//! Defines the crate level error type.

use time::Date;

use crate::record::RecordId;

/// The errors that may occur while preparing chart data.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The start of a date range is after its end.
    ///
    /// Ranges are never swapped or clamped; the caller must fix the input.
    #[error("invalid date range: {from} is after {to}")]
    InvalidRange {
        /// The start of the range.
        from: Date,
        /// The end of the range.
        to: Date,
    },

    /// A single input record could not be turned into a transaction record,
    /// e.g., because its timestamp is not an ISO date.
    ///
    /// Loaders skip these records rather than failing the whole batch.
    #[error("malformed record {id}: {reason}")]
    MalformedRecord {
        /// The ID of the offending record.
        id: RecordId,
        /// What was wrong with the record.
        reason: String,
    },

    /// An input entry could not be decoded as a record at all and has no
    /// readable ID, e.g., a JSON object without an `id` field.
    ///
    /// Like [Error::MalformedRecord], loaders skip these entries.
    #[error("malformed entry {position}: {reason}")]
    MalformedEntry {
        /// The position of the entry in the input, counting from 1.
        position: usize,
        /// What was wrong with the entry.
        reason: String,
    },

    /// A significance threshold outside of `[0, 1)`.
    #[error("significance threshold must be in the range [0, 1), got {0}")]
    InvalidThreshold(String),

    /// A category budget below zero.
    #[error("the budget for {category} must not be negative, got {budget}")]
    InvalidBudget {
        /// The category the budget is for.
        category: String,
        /// The rejected budget.
        budget: String,
    },

    /// A month number outside of `1..=12`.
    #[error("month must be between 1 and 12, got {0}")]
    InvalidMonth(u8),

    /// A chart was given a dataset of the wrong shape, e.g., a point series
    /// for a donut chart.
    #[error("a {chart} chart cannot be drawn from a {dataset} dataset")]
    DatasetShape {
        /// The kind of chart that was requested.
        chart: &'static str,
        /// The kind of dataset that was supplied.
        dataset: &'static str,
    },

    /// The canonical timezone name did not match a known timezone.
    #[error("invalid timezone {0}")]
    InvalidTimezone(String),

    /// Adding up amounts went past the range of the decimal type.
    #[error("amounts are too large to add up")]
    Overflow,

    /// The input could not be decoded as a JSON array of records.
    #[error("could not parse JSON records: {0}")]
    InvalidJson(String),

    /// The input could not be decoded as CSV records.
    #[error("could not parse CSV records: {0}")]
    InvalidCsv(String),

    /// The records could not be read from disk or stdin.
    #[error("could not read records: {0}")]
    Io(String),
}

impl From<serde_json::Error> for Error {
    fn from(value: serde_json::Error) -> Self {
        Error::InvalidJson(value.to_string())
    }
}

impl From<csv::Error> for Error {
    fn from(value: csv::Error) -> Self {
        Error::InvalidCsv(value.to_string())
    }
}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Error::Io(value.to_string())
    }
}
