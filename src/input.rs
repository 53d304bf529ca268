//! Functions to decode transaction records from JSON and CSV text.
//!
//! Entries are decoded one at a time so that a single bad entry is skipped
//! and reported instead of failing the whole batch.

use crate::{
    Error,
    record::{ParsedRecords, RawTransactionRecord, RecordId, parse_decoded},
};

/// Decodes a JSON array of records, as embedded in the web app's pages.
///
/// Entries that do not have the fields of [RawTransactionRecord], or whose
/// timestamp cannot be parsed, are left out and reported in
/// [ParsedRecords::skipped].
///
/// # Errors
/// Returns [Error::InvalidJson] if `text` is not a JSON array.
pub fn records_from_json(text: &str) -> Result<ParsedRecords, Error> {
    let entries: Vec<serde_json::Value> = serde_json::from_str(text)?;
    tracing::debug!("Decoding {} JSON entries", entries.len());

    let decoded = entries.into_iter().enumerate().map(|(index, entry)| {
        let id = entry.get("id").and_then(serde_json::Value::as_i64);
        serde_json::from_value::<RawTransactionRecord>(entry)
            .map_err(|error| malformed(id, index, error.to_string()))
    });

    Ok(parse_decoded(decoded))
}

/// Decodes CSV text with a header row naming the record fields, e.g.
///
/// ```text
/// id,card_id,category,amount,timestamp
/// 1,3,Food,12.50,2024-03-01 12:00:00
/// ```
///
/// Rows that are missing fields, have an amount or ID that is not a number,
/// or have a malformed timestamp are left out and reported in
/// [ParsedRecords::skipped].
///
/// # Errors
/// Returns [Error::InvalidCsv] if the header row cannot be read.
pub fn records_from_csv(text: &str) -> Result<ParsedRecords, Error> {
    let mut reader = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let id_column = headers.iter().position(|header| header == "id");

    let decoded = reader.records().enumerate().map(|(index, row)| {
        let row = row.map_err(|error| malformed(None, index, error.to_string()))?;
        let id = id_column
            .and_then(|column| row.get(column))
            .and_then(|id| id.parse::<RecordId>().ok());

        row.deserialize::<RawTransactionRecord>(Some(&headers))
            .map_err(|error| malformed(id, index, error.to_string()))
    });

    Ok(parse_decoded(decoded))
}

fn malformed(id: Option<RecordId>, index: usize, reason: String) -> Error {
    match id {
        Some(id) => Error::MalformedRecord { id, reason },
        None => Error::MalformedEntry {
            position: index + 1,
            reason,
        },
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use time::macros::datetime;

    use crate::{
        Error,
        input::{records_from_csv, records_from_json},
    };

    #[test]
    fn decodes_web_app_json() {
        let text = r#"[
            {"id": 1, "card": 3, "category": "Food", "amount": 12.5,
             "timestamp": "2024-03-01T12:00:00"},
            {"id": 2, "cardId": 3, "categoryName": "Rent", "amount": "1000.00",
             "timestamp": "2024-03-02"}
        ]"#;

        let parsed = records_from_json(text).unwrap();

        assert_eq!(parsed.skipped_count(), 0);
        let records = parsed.records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].card_id, 3);
        assert_eq!(records[0].amount, dec!(12.5));
        assert_eq!(records[0].timestamp, datetime!(2024-03-01 12:00));
        assert_eq!(records[1].category, "Rent");
        assert_eq!(records[1].amount, dec!(1000));
        assert_eq!(records[1].timestamp, datetime!(2024-03-02 00:00));
    }

    #[test]
    fn json_must_be_an_array() {
        assert!(matches!(
            records_from_json(r#"{"id": 1}"#),
            Err(Error::InvalidJson(_))
        ));
        assert!(matches!(
            records_from_json("not json"),
            Err(Error::InvalidJson(_))
        ));
    }

    #[test]
    fn bad_json_amount_skips_only_that_record() {
        let text = r#"[
            {"id": 1, "card": 3, "category": "Food", "amount": 12.5, "timestamp": "2024-03-01"},
            {"id": 2, "card": 3, "category": "Rent", "amount": null, "timestamp": "2024-03-02"},
            {"id": 3, "card": 3, "category": "Fuel", "amount": 40, "timestamp": "2024-03-03"}
        ]"#;

        let parsed = records_from_json(text).unwrap();

        let ids: Vec<i64> = parsed.records.iter().map(|record| record.id).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(parsed.skipped_count(), 1);
        assert!(matches!(
            parsed.skipped[0],
            Error::MalformedRecord { id: 2, .. }
        ));
    }

    #[test]
    fn json_entry_without_id_is_reported_by_position() {
        let text = r#"[
            {"id": 1, "card": 3, "category": "Food", "amount": 12.5, "timestamp": "2024-03-01"},
            {"card": 3, "category": "Rent", "amount": 900, "timestamp": "2024-03-02"},
            "not a record"
        ]"#;

        let parsed = records_from_json(text).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert!(matches!(
            parsed.skipped[..],
            [
                Error::MalformedEntry { position: 2, .. },
                Error::MalformedEntry { position: 3, .. }
            ]
        ));
    }

    #[test]
    fn json_timestamps_are_checked_too() {
        let text = r#"[
            {"id": 7, "card": 3, "category": "Food", "amount": 12.5, "timestamp": "soon"}
        ]"#;

        let parsed = records_from_json(text).unwrap();

        assert!(parsed.records.is_empty());
        assert!(matches!(
            parsed.skipped[0],
            Error::MalformedRecord { id: 7, .. }
        ));
    }

    #[test]
    fn empty_json_array_is_fine() {
        let parsed = records_from_json("[]").unwrap();

        assert!(parsed.records.is_empty());
        assert_eq!(parsed.skipped_count(), 0);
    }

    #[test]
    fn decodes_csv_with_header() {
        let text = "id,card_id,category,amount,timestamp\n\
                    1, 3, Food, 12.50, 2024-03-01 12:00:00\n\
                    2,3,Eating Out,-4.20,2024-03-02\n";

        let parsed = records_from_csv(text).unwrap();

        let records = parsed.records;
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].category, "Food");
        assert_eq!(records[0].amount, dec!(12.50));
        assert_eq!(records[0].timestamp, datetime!(2024-03-01 12:00));
        assert_eq!(records[1].category, "Eating Out");
        assert_eq!(records[1].amount, dec!(-4.20));
    }

    #[test]
    fn csv_row_with_bad_amount_is_skipped() {
        let text = "id,card_id,category,amount,timestamp\n\
                    1,3,Food,lots,2024-03-01\n\
                    2,3,Rent,900,2024-03-02\n";

        let parsed = records_from_csv(text).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].id, 2);
        assert!(matches!(
            parsed.skipped[..],
            [Error::MalformedRecord { id: 1, .. }]
        ));
    }

    #[test]
    fn csv_row_with_missing_fields_is_skipped() {
        let text = "id,card_id,category,amount,timestamp\n\
                    x,3,Food\n\
                    2,3,Rent,900,2024-03-02\n";

        let parsed = records_from_csv(text).unwrap();

        assert_eq!(parsed.records.len(), 1);
        assert!(matches!(
            parsed.skipped[..],
            [Error::MalformedEntry { position: 1, .. }]
        ));
    }
}
