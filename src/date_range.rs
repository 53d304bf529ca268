//! Optional, inclusive date filters for chart data.

use time::Date;

use crate::Error;

/// An inclusive range of calendar days where either end may be left open.
///
/// A range with neither bound set includes every date.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    /// The first day included in the range.
    pub from: Option<Date>,
    /// The last day included in the range.
    pub to: Option<Date>,
}

impl DateRange {
    /// A range that includes every date.
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Create a range, checking that `from` is not after `to`.
    ///
    /// # Errors
    /// Returns [Error::InvalidRange] if both bounds are set and `from > to`.
    pub fn new(from: Option<Date>, to: Option<Date>) -> Result<Self, Error> {
        let range = Self { from, to };
        range.validate()?;
        Ok(range)
    }

    /// Check that the bounds are in order.
    ///
    /// # Errors
    /// Returns [Error::InvalidRange] if both bounds are set and `from > to`.
    pub fn validate(&self) -> Result<(), Error> {
        match (self.from, self.to) {
            (Some(from), Some(to)) if from > to => Err(Error::InvalidRange { from, to }),
            _ => Ok(()),
        }
    }

    /// Whether neither bound is set.
    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    /// Whether `date` falls within the range, bounds included.
    pub fn contains(&self, date: Date) -> bool {
        let after_start = self.from.is_none_or(|from| from <= date);
        let before_end = self.to.is_none_or(|to| date <= to);

        after_start && before_end
    }
}
