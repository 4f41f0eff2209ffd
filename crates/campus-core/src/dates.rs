//! Calendar dates in the bot's fixed `DD/MM/YYYY` convention.

use crate::error::CampusError;
use chrono::{Datelike, Duration, Local, NaiveDate};
use std::fmt;

/// The one textual date format the bot speaks.
pub const DATE_FORMAT: &str = "%d/%m/%Y";

/// A calendar date carried through view states and control tokens.
///
/// `parse(format(d)) == d` for every date producible by [`DayDate::today`]
/// and [`DayDate::shift`]; anything that does not match `DD/MM/YYYY`
/// is rejected outright rather than partially parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DayDate(NaiveDate);

impl DayDate {
    /// Parse the fixed `DD/MM/YYYY` pattern. Also accepts the feed's
    /// unpadded `D/M/YYYY` form (chrono's numeric fields allow both).
    pub fn parse(text: &str) -> Result<Self, CampusError> {
        NaiveDate::parse_from_str(text.trim(), DATE_FORMAT)
            .map(Self)
            .map_err(|_| {
                CampusError::Format(format!(
                    "Invalid date '{text}'. Use DD/MM/YYYY (e.g. 03/09/2024)."
                ))
            })
    }

    /// Today in the local timezone.
    pub fn today() -> Self {
        Self(Local::now().date_naive())
    }

    /// Shift by whole days. Total: month and year rollover is handled
    /// by the calendar, so shifting a valid date always yields one.
    #[must_use]
    pub fn shift(self, days: i64) -> Self {
        Self(self.0 + Duration::days(days))
    }

    /// Absolute distance in days.
    pub fn days_from(self, other: Self) -> i64 {
        (self.0 - other.0).num_days().abs()
    }

    /// Key form used by the activities feed: no leading zeros (`3/9/2024`).
    pub fn feed_key(&self) -> String {
        format!("{}/{}/{}", self.0.day(), self.0.month(), self.0.year())
    }
}

impl fmt::Display for DayDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format(DATE_FORMAT))
    }
}
