//! Calendar month and day, without a year.
//!
//! Reminder matching compares only the month and day of a stored date, so a
//! birthday of 1990-06-08 matches every June 8th.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MonthDayError {
    #[error("expected MM-DD, got {0:?}")]
    Format(String),
    #[error("{month:02}-{day:02} is not a calendar day")]
    OutOfRange { month: u32, day: u32 },
}

/// A `MM-DD` key. February 29th is a valid value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MonthDay {
    month: u32,
    day: u32,
}

impl MonthDay {
    /// # Errors
    ///
    /// Returns [`MonthDayError::OutOfRange`] if the pair never occurs in a
    /// (leap) year.
    pub fn new(month: u32, day: u32) -> Result<Self, MonthDayError> {
        // 2000 is a leap year, so this accepts 02-29.
        if NaiveDate::from_ymd_opt(2000, month, day).is_none() {
            return Err(MonthDayError::OutOfRange { month, day });
        }
        Ok(Self { month, day })
    }

    #[must_use]
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            month: date.month(),
            day: date.day(),
        }
    }

    #[must_use]
    pub const fn month(self) -> u32 {
        self.month
    }

    #[must_use]
    pub const fn day(self) -> u32 {
        self.day
    }

    /// True if `date` falls on this month and day.
    #[must_use]
    pub fn matches(self, date: NaiveDate) -> bool {
        date.month() == self.month && date.day() == self.day
    }

    /// The occurrence of this month-day in `year`, if that year has one.
    #[must_use]
    pub fn in_year(self, year: i32) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(year, self.month, self.day)
    }
}

impl std::fmt::Display for MonthDay {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:02}-{:02}", self.month, self.day)
    }
}

impl std::str::FromStr for MonthDay {
    type Err = MonthDayError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let format_err = || MonthDayError::Format(s.to_string());
        let (month, day) = s.split_once('-').ok_or_else(format_err)?;
        if month.len() != 2 || day.len() != 2 {
            return Err(format_err());
        }
        let month = month.parse().map_err(|_| format_err())?;
        let day = day.parse().map_err(|_| format_err())?;
        Self::new(month, day)
    }
}

impl TryFrom<String> for MonthDay {
    type Error = MonthDayError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MonthDay> for String {
    fn from(md: MonthDay) -> Self {
        md.to_string()
    }
}
