use time::{OffsetDateTime, UtcOffset};
use time_tz::{Offset, TimeZone};

use crate::{Error, series::CalendarMonth};

/// The UTC offset currently in effect for a canonical timezone name such as
/// "Europe/London".
pub fn get_local_offset(canonical_timezone: &str) -> Option<UtcOffset> {
    time_tz::timezones::get_by_name(canonical_timezone)
        .map(|tz| tz.get_offset_utc(&OffsetDateTime::now_utc()).to_utc())
}

/// The calendar month it currently is in `canonical_timezone`.
///
/// # Errors
/// Returns [Error::InvalidTimezone] if the timezone name is not recognised.
pub fn current_month(canonical_timezone: &str) -> Result<CalendarMonth, Error> {
    let offset = get_local_offset(canonical_timezone)
        .ok_or_else(|| Error::InvalidTimezone(canonical_timezone.to_owned()))?;

    Ok(CalendarMonth::of(OffsetDateTime::now_utc().to_offset(offset).date()))
}
