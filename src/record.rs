//! Defines the transaction records that feed the charts and how raw input
//! records are parsed into them.

use rust_decimal::Decimal;
use serde::Deserialize;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, Time, format_description::BorrowedFormatItem,
    format_description::well_known::Rfc3339, macros::format_description,
};

use crate::Error;

/// Alias for the integer type used to identify transaction records.
pub type RecordId = i64;

/// Alias for the integer type used to identify the card (account) a
/// transaction was made with.
pub type CardId = i64;

/// An expense or income on one of the user's cards.
///
/// Records are owned by the server. The chart stages only ever read them and
/// derive new values from copies.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionRecord {
    /// The ID of the record.
    pub id: RecordId,
    /// The card the transaction was made with.
    pub card_id: CardId,
    /// The display name of the category the transaction belongs to.
    pub category: String,
    /// The signed amount of money for the transaction.
    pub amount: Decimal,
    /// When the transaction happened, as written by the server.
    pub timestamp: PrimitiveDateTime,
}

impl TransactionRecord {
    /// Create a new record.
    pub fn new(
        id: RecordId,
        card_id: CardId,
        category: &str,
        amount: Decimal,
        timestamp: PrimitiveDateTime,
    ) -> Self {
        Self {
            id,
            card_id,
            category: category.to_owned(),
            amount,
            timestamp,
        }
    }

    /// The calendar day of the transaction, i.e. the timestamp with the time
    /// of day dropped.
    pub fn date(&self) -> Date {
        self.timestamp.date()
    }
}

/// A transaction record as it arrives from the server, before its timestamp
/// has been parsed.
///
/// The field aliases accept the names used by the web app's JSON payload
/// (`card`, `categoryName`, etc.).
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RawTransactionRecord {
    /// The ID of the record.
    pub id: RecordId,
    /// The card the transaction was made with.
    #[serde(alias = "card", alias = "cardId")]
    pub card_id: CardId,
    /// The display name of the category.
    #[serde(alias = "categoryName", alias = "category_name")]
    pub category: String,
    /// The signed amount of money for the transaction.
    pub amount: Decimal,
    /// An ISO-like date or date-time string.
    pub timestamp: String,
}

impl TryFrom<RawTransactionRecord> for TransactionRecord {
    type Error = Error;

    fn try_from(raw: RawTransactionRecord) -> Result<Self, Self::Error> {
        let timestamp =
            parse_timestamp(&raw.timestamp).map_err(|reason| Error::MalformedRecord {
                id: raw.id,
                reason,
            })?;

        Ok(Self {
            id: raw.id,
            card_id: raw.card_id,
            category: raw.category,
            amount: raw.amount,
            timestamp,
        })
    }
}

/// The result of parsing a batch of raw records.
#[derive(Debug, Default, PartialEq)]
pub struct ParsedRecords {
    /// The records that were parsed successfully, in input order.
    pub records: Vec<TransactionRecord>,
    /// One [Error::MalformedRecord] or [Error::MalformedEntry] for each
    /// record that was skipped.
    pub skipped: Vec<Error>,
}

impl ParsedRecords {
    /// The number of input records that could not be parsed.
    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }
}

/// Parses a batch of raw records.
///
/// A record with a malformed timestamp does not fail the batch: it is logged,
/// left out of [ParsedRecords::records] and reported in
/// [ParsedRecords::skipped].
pub fn parse_records(raw_records: impl IntoIterator<Item = RawTransactionRecord>) -> ParsedRecords {
    parse_decoded(raw_records.into_iter().map(Ok))
}

/// Parses a batch of records that were decoded one at a time, skipping the
/// ones that failed to decode as well as those with malformed timestamps.
pub(crate) fn parse_decoded(
    decoded: impl IntoIterator<Item = Result<RawTransactionRecord, Error>>,
) -> ParsedRecords {
    let mut parsed = ParsedRecords::default();

    for raw in decoded {
        match raw.and_then(TransactionRecord::try_from) {
            Ok(record) => parsed.records.push(record),
            Err(error) => {
                tracing::warn!("Skipping record: {error}");
                parsed.skipped.push(error);
            }
        }
    }

    if !parsed.skipped.is_empty() {
        tracing::debug!(
            "Parsed {} records, skipped {}",
            parsed.records.len(),
            parsed.skipped.len()
        );
    }

    parsed
}

const DATE_TIME_FORMATS: &[&[BorrowedFormatItem]] = &[
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second].[subsecond]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
    format_description!("[year]-[month]-[day]T[hour]:[minute]"),
    format_description!("[year]-[month]-[day] [hour]:[minute]"),
];

const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Parses an ISO-like date or date-time string.
///
/// Timestamps with a UTC offset keep the date and time as written, so the
/// calendar day of `2024-03-01T23:30:00-05:00` is 1 March. Plain dates are
/// placed at midnight.
pub fn parse_timestamp(text: &str) -> Result<PrimitiveDateTime, String> {
    let text = text.trim();

    if let Ok(date_time) = OffsetDateTime::parse(text, &Rfc3339) {
        return Ok(PrimitiveDateTime::new(date_time.date(), date_time.time()));
    }

    for format in DATE_TIME_FORMATS {
        if let Ok(date_time) = PrimitiveDateTime::parse(text, *format) {
            return Ok(date_time);
        }
    }

    Date::parse(text, DATE_FORMAT)
        .map(|date| PrimitiveDateTime::new(date, Time::MIDNIGHT))
        .map_err(|error| format!("could not parse timestamp \"{text}\": {error}"))
}
