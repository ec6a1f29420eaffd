//! Full-day date ranges shared by every date-bounded report.
//!
//! A [`DateRange`] always covers whole UTC calendar days: the start bound is
//! `00:00:00.000` of the first day and the end bound is `23:59:59.999` of the
//! last day, whatever time of day the caller supplied.

use std::fmt;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
/// Inclusive range of calendar days.
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if end < start {
            return Err(DateRangeError::Inverted { start, end });
        }
        Ok(Self { start, end })
    }

    /// Builds a range from arbitrary instants, widening both ends to full days.
    pub fn from_instants(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, DateRangeError> {
        Self::new(start.date_naive(), end.date_naive())
    }

    pub fn single_day(day: NaiveDate) -> Self {
        Self {
            start: day,
            end: day,
        }
    }

    /// The `days` calendar days ending on (and including) `today`. Windows
    /// reaching past the earliest representable date start there instead.
    pub fn trailing_days(today: NaiveDate, days: u32) -> Self {
        let span = i64::from(days.max(1)) - 1;
        Self {
            start: today
                .checked_sub_signed(Duration::days(span))
                .unwrap_or(NaiveDate::MIN),
            end: today,
        }
    }

    /// Number of calendar days covered, counting both ends.
    pub fn day_count(&self) -> i64 {
        (self.end - self.start).num_days() + 1
    }

    /// `00:00:00.000` UTC on the first day.
    pub fn start_instant(&self) -> DateTime<Utc> {
        self.start.and_time(NaiveTime::default()).and_utc()
    }

    /// `23:59:59.999` UTC on the last day.
    pub fn end_instant(&self) -> DateTime<Utc> {
        match self.end.succ_opt() {
            Some(next) => {
                next.and_time(NaiveTime::default()).and_utc() - Duration::milliseconds(1)
            }
            None => DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.contains_date(instant.date_naive())
    }

    pub fn contains_date(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// The range of identical length ending the day before this one starts,
    /// cut short at the earliest representable date.
    pub fn previous_period(&self) -> Self {
        let days = self.day_count();
        let end = self.start.pred_opt().unwrap_or(NaiveDate::MIN);
        Self {
            start: end
                .checked_sub_signed(Duration::days(days - 1))
                .unwrap_or(NaiveDate::MIN),
            end,
        }
    }

    /// Iterates every calendar day in the range.
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.start
            .iter_days()
            .take_while(move |day| *day <= self.end)
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} .. {}", self.start, self.end)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Errors that can occur when constructing [`DateRange`] values.
pub enum DateRangeError {
    Inverted { start: NaiveDate, end: NaiveDate },
}

impl fmt::Display for DateRangeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DateRangeError::Inverted { start, end } => {
                write!(f, "date range end {end} is before start {start}")
            }
        }
    }
}

impl std::error::Error for DateRangeError {}
