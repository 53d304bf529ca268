//! Daily value series for the per-card line graphs.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use time::{Date, Month, PrimitiveDateTime};

use crate::{
    Error,
    aggregation::checked_sum,
    record::{CardId, TransactionRecord},
};

/// One point on a line graph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SeriesPoint {
    /// The calendar day of the point.
    pub date: Date,
    /// The value plotted for the day.
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
}

/// A month in a specific year, e.g. March 2024.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarMonth {
    year: i32,
    month: Month,
}

impl CalendarMonth {
    /// Create a calendar month from a year and a month number, where January
    /// is `1`.
    ///
    /// # Errors
    /// Returns [Error::InvalidMonth] if `month_number` is not in `1..=12`.
    pub fn new(year: i32, month_number: u8) -> Result<Self, Error> {
        let month = Month::try_from(month_number).map_err(|_| Error::InvalidMonth(month_number))?;

        Ok(Self { year, month })
    }

    /// The calendar month that `date` falls in.
    pub fn of(date: Date) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// The year.
    pub fn year(&self) -> i32 {
        self.year
    }

    /// The month of the year.
    pub fn month(&self) -> Month {
        self.month
    }

    /// Whether `date` falls in this month of this year.
    pub fn contains(&self, date: Date) -> bool {
        date.year() == self.year && date.month() == self.month
    }
}

/// How to turn several transactions on the same day into one point.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SameDayPolicy {
    /// Add up the day's amounts.
    #[default]
    Sum,
    /// Keep the amount with the earliest timestamp.
    First,
    /// Keep the amount with the latest timestamp.
    Last,
}

/// Whether points hold the day's value or the running total for the month.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SeriesMode {
    /// Each point holds its own day's value.
    #[default]
    Pointwise,
    /// Each point holds the sum of its day's value and all earlier days.
    Cumulative,
}

/// Options for [build_series].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeriesOptions {
    /// How to combine transactions on the same day.
    pub same_day: SameDayPolicy,
    /// Pointwise or cumulative values.
    pub mode: SeriesMode,
}

struct DayValue {
    timestamp: PrimitiveDateTime,
    value: Decimal,
}

/// Builds the line series for one card in one calendar month.
///
/// The result holds at most one point per day, sorted by date, and is empty
/// if the card has no transactions in `month`.
///
/// Ties between transactions with identical timestamps are broken by input
/// order: [SameDayPolicy::First] keeps the earlier record and
/// [SameDayPolicy::Last] the later one.
///
/// # Errors
/// Returns [Error::Overflow] if a day's amounts or the running total are too
/// large to add up.
pub fn build_series(
    records: &[TransactionRecord],
    card_id: CardId,
    month: CalendarMonth,
    options: SeriesOptions,
) -> Result<Vec<SeriesPoint>, Error> {
    let mut days: BTreeMap<Date, DayValue> = BTreeMap::new();

    let matching_records = records
        .iter()
        .filter(|record| record.card_id == card_id && month.contains(record.date()));

    for record in matching_records {
        let candidate = DayValue {
            timestamp: record.timestamp,
            value: record.amount,
        };

        match days.get_mut(&record.date()) {
            None => {
                days.insert(record.date(), candidate);
            }
            Some(day) => match options.same_day {
                SameDayPolicy::Sum => {
                    day.value = checked_sum([day.value, candidate.value])?;
                }
                SameDayPolicy::First if candidate.timestamp < day.timestamp => *day = candidate,
                SameDayPolicy::Last if candidate.timestamp >= day.timestamp => *day = candidate,
                SameDayPolicy::First | SameDayPolicy::Last => {}
            },
        }
    }

    let mut running_total = Decimal::ZERO;
    let mut points = Vec::with_capacity(days.len());

    for (date, day) in days {
        let value = match options.mode {
            SeriesMode::Pointwise => day.value,
            SeriesMode::Cumulative => {
                running_total = checked_sum([running_total, day.value])?;
                running_total
            }
        };

        points.push(SeriesPoint { date, value });
    }

    tracing::debug!(
        "Built {} points for card {card_id} in {} {}",
        points.len(),
        month.month(),
        month.year()
    );

    Ok(points)
}

/// Builds one series for each of `card_ids`, the way the home page shows one
/// graph per card.
///
/// Cards without transactions in `month` get an empty series.
///
/// # Errors
/// Returns [Error::Overflow] if any card's amounts are too large to add up.
pub fn build_series_by_card(
    records: &[TransactionRecord],
    card_ids: impl IntoIterator<Item = CardId>,
    month: CalendarMonth,
    options: SeriesOptions,
) -> Result<BTreeMap<CardId, Vec<SeriesPoint>>, Error> {
    card_ids
        .into_iter()
        .map(|card_id| {
            build_series(records, card_id, month, options).map(|points| (card_id, points))
        })
        .collect()
}

/// The IDs of every card that appears in `records`, in ascending order.
pub fn card_ids(records: &[TransactionRecord]) -> Vec<CardId> {
    let mut card_ids: Vec<CardId> = records.iter().map(|record| record.card_id).collect();
    card_ids.sort_unstable();
    card_ids.dedup();
    card_ids
}
