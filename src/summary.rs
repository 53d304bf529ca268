//! Headline numbers shown next to the charts: total spending and the
//! average transaction amount for each day of the week.

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use time::Weekday;

use crate::{
    Error, aggregation::checked_sum, date_range::DateRange, record::TransactionRecord,
};

/// The average transaction amount on one day of the week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WeekdayAverage {
    /// The day of the week.
    pub weekday: Weekday,
    /// The mean amount per transaction, rounded to cents.
    #[serde(with = "rust_decimal::serde::float")]
    pub average: Decimal,
    /// How many transactions fell on this day of the week.
    pub transaction_count: usize,
}

fn round_to_cents(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// The sum of the amounts of the records in `range`, rounded to cents.
///
/// # Errors
/// Returns [Error::InvalidRange] if `range` starts after it ends, or
/// [Error::Overflow] if the amounts are too large to add up.
pub fn total_spending(records: &[TransactionRecord], range: &DateRange) -> Result<Decimal, Error> {
    range.validate()?;

    let total = checked_sum(
        records
            .iter()
            .filter(|record| range.contains(record.date()))
            .map(|record| record.amount),
    )?;

    Ok(round_to_cents(total))
}

/// The average transaction amount for each day of the week that has
/// transactions in `range`, starting from Monday.
///
/// # Errors
/// Returns [Error::InvalidRange] if `range` starts after it ends, or
/// [Error::Overflow] if a weekday's amounts are too large to add up.
pub fn weekday_averages(
    records: &[TransactionRecord],
    range: &DateRange,
) -> Result<Vec<WeekdayAverage>, Error> {
    range.validate()?;

    let mut totals: BTreeMap<u8, (Weekday, Decimal, usize)> = BTreeMap::new();

    for record in records.iter().filter(|record| range.contains(record.date())) {
        let weekday = record.date().weekday();
        let (_, total, count) = totals
            .entry(weekday.number_days_from_monday())
            .or_insert((weekday, Decimal::ZERO, 0));
        *total = total.checked_add(record.amount).ok_or(Error::Overflow)?;
        *count += 1;
    }

    Ok(totals
        .into_values()
        .map(|(weekday, total, count)| WeekdayAverage {
            weekday,
            average: round_to_cents(total / Decimal::from(count)),
            transaction_count: count,
        })
        .collect())
}
