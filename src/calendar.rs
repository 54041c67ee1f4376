//! Calendar context: the fixed zone plus the holiday predicate
//!
//! Every computation receives a `Calendar` explicitly; nothing in the crate
//! holds a process-wide zone or holiday table.

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use chrono_tz::Tz;
use std::sync::Arc;

use crate::boundary::{self, BoundaryKind};
use crate::error::{Error, Result};
use crate::holidays::{HolidayCalendar, JapanHolidays};

pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Asia::Tokyo;

#[derive(Debug, Clone)]
pub struct Calendar {
    tz: Tz,
    holidays: Arc<dyn HolidayCalendar>,
}

impl Default for Calendar {
    /// Asia/Tokyo with Japanese national holidays
    fn default() -> Self {
        Self::new(DEFAULT_TIMEZONE, Arc::new(JapanHolidays))
    }
}

impl Calendar {
    pub fn new(tz: Tz, holidays: Arc<dyn HolidayCalendar>) -> Self {
        Self { tz, holidays }
    }

    /// Build from an IANA zone name such as "Asia/Tokyo"
    pub fn with_timezone_name(name: &str, holidays: Arc<dyn HolidayCalendar>) -> Result<Self> {
        let tz: Tz = name
            .parse()
            .map_err(|_| Error::UnknownTimezone(name.to_string()))?;
        Ok(Self::new(tz, holidays))
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn holidays(&self) -> &dyn HolidayCalendar {
        self.holidays.as_ref()
    }

    /// Current instant in the calendar zone
    pub fn now(&self) -> DateTime<Tz> {
        self.at(Utc::now())
    }

    /// Project a UTC instant into the calendar zone
    pub fn at(&self, instant: DateTime<Utc>) -> DateTime<Tz> {
        instant.with_timezone(&self.tz)
    }

    /// Boundary of `kind` for the period containing `now`
    pub fn boundary(&self, kind: BoundaryKind, now: &DateTime<Utc>) -> DateTime<Tz> {
        kind.boundary(&self.at(*now))
    }

    /// Deadline of a date-only target: its last nanosecond in this zone
    pub fn end_of_date(&self, date: NaiveDate) -> DateTime<Tz> {
        boundary::end_of_date(&self.tz, date)
    }

    /// Monday–Friday and not a holiday
    pub fn is_business_day(&self, date: NaiveDate) -> bool {
        // ISO numbering: 1 = Monday .. 7 = Sunday
        let weekend = date.weekday().number_from_monday() >= 6;
        !weekend && !self.holidays.is_holiday(date)
    }

    /// Business days in `(start, end]`: start is excluded, end included.
    ///
    /// Returns 0 when `end <= start`.
    pub fn business_days_between(&self, start: NaiveDate, end: NaiveDate) -> u32 {
        if end <= start {
            return 0;
        }
        let count = start
            .iter_days()
            .skip(1)
            .take_while(|d| *d <= end)
            .filter(|d| self.is_business_day(*d))
            .count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }
}
