//! Period boundary calculators
//!
//! Every boundary is "first instant of the next period minus one nanosecond",
//! evaluated in the zone of the `now` it was computed from. Time-of-day is
//! dropped before any month arithmetic, so the result never depends on the
//! clock reading within the day.
//!
//! Half-years follow the fiscal convention: Apr–Sep and Oct–Mar.

use chrono::{
    DateTime, Datelike, Days, LocalResult, Months, NaiveDate, NaiveTime, Offset, TimeDelta,
    TimeZone,
};
use serde::{Deserialize, Serialize};

/// Month the fiscal year starts in (April)
pub const FISCAL_YEAR_START_MONTH: u32 = 4;

/// The built-in recurring targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryKind {
    EndOfMonth,
    EndOfQuarter,
    EndOfHalfYear,
    EndOfFiscalYear,
}

impl BoundaryKind {
    /// Display order on the board
    pub const ALL: [BoundaryKind; 4] = [
        BoundaryKind::EndOfMonth,
        BoundaryKind::EndOfQuarter,
        BoundaryKind::EndOfHalfYear,
        BoundaryKind::EndOfFiscalYear,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BoundaryKind::EndOfMonth => "月末",
            BoundaryKind::EndOfQuarter => "四半期末",
            BoundaryKind::EndOfHalfYear => "半期末",
            BoundaryKind::EndOfFiscalYear => "年度末",
        }
    }

    pub fn icon(self) -> &'static str {
        match self {
            BoundaryKind::EndOfMonth => "📅",
            BoundaryKind::EndOfQuarter => "📊",
            BoundaryKind::EndOfHalfYear => "📈",
            BoundaryKind::EndOfFiscalYear => "🎯",
        }
    }

    /// Boundary of this kind for the period containing `now`
    pub fn boundary<T: TimeZone>(self, now: &DateTime<T>) -> DateTime<T> {
        match self {
            BoundaryKind::EndOfMonth => end_of_month(now),
            BoundaryKind::EndOfQuarter => end_of_quarter(now),
            BoundaryKind::EndOfHalfYear => end_of_half_year(now),
            BoundaryKind::EndOfFiscalYear => end_of_fiscal_year(now),
        }
    }
}

/// Last nanosecond of the month containing `now`
pub fn end_of_month<T: TimeZone>(now: &DateTime<T>) -> DateTime<T> {
    period_end(now, 1)
}

/// Last nanosecond of the calendar quarter (Jan–Mar, Apr–Jun, Jul–Sep, Oct–Dec)
pub fn end_of_quarter<T: TimeZone>(now: &DateTime<T>) -> DateTime<T> {
    let month = now.month();
    let q = (month - 1) / 3;
    // 1-based month of the next quarter start; 13 means January next year
    let next_start = q * 3 + 4;
    period_end(now, next_start - month)
}

/// Last nanosecond of the fiscal half-year (Apr–Sep or Oct–Mar)
pub fn end_of_half_year<T: TimeZone>(now: &DateTime<T>) -> DateTime<T> {
    let month = now.month();
    let next_start = match month {
        1..=3 => FISCAL_YEAR_START_MONTH,
        4..=9 => FISCAL_YEAR_START_MONTH + 6,
        _ => FISCAL_YEAR_START_MONTH + 12,
    };
    period_end(now, next_start - month)
}

/// Last nanosecond of the fiscal year, which ends March 31
pub fn end_of_fiscal_year<T: TimeZone>(now: &DateTime<T>) -> DateTime<T> {
    let month = now.month();
    let next_start = if month < FISCAL_YEAR_START_MONTH {
        FISCAL_YEAR_START_MONTH
    } else {
        FISCAL_YEAR_START_MONTH + 12
    };
    period_end(now, next_start - month)
}

/// Last nanosecond of `date` in `tz`; the deadline of a custom target
pub fn end_of_date<T: TimeZone>(tz: &T, date: NaiveDate) -> DateTime<T> {
    period_start(tz, date + Days::new(1)) - TimeDelta::nanoseconds(1)
}

/// First instant of `date` in `tz`.
///
/// An ambiguous midnight resolves to the earlier instant. A midnight that
/// falls in a DST gap resolves to the first instant after the gap.
pub fn start_of_day<T: TimeZone>(tz: &T, date: NaiveDate) -> DateTime<T> {
    resolve_midnight(tz, date, |earliest, _| earliest)
}

/// Midnight that opens a new period. When midnight repeats, the old period
/// runs until the later occurrence, so the repeated hour still belongs to it.
fn period_start<T: TimeZone>(tz: &T, date: NaiveDate) -> DateTime<T> {
    resolve_midnight(tz, date, |_, latest| latest)
}

fn resolve_midnight<T: TimeZone>(
    tz: &T,
    date: NaiveDate,
    pick: fn(DateTime<T>, DateTime<T>) -> DateTime<T>,
) -> DateTime<T> {
    let midnight = date.and_time(NaiveTime::MIN);
    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(t) => t,
        LocalResult::Ambiguous(earliest, latest) => pick(earliest, latest),
        LocalResult::None => {
            let before = tz
                .offset_from_utc_datetime(&(midnight - TimeDelta::days(1)))
                .fix();
            let utc = midnight - TimeDelta::seconds(i64::from(before.local_minus_utc()));
            tz.from_utc_datetime(&utc)
        }
    }
}

/// Shift the first day of `now`'s month forward by `months`, then step back 1ns
fn period_end<T: TimeZone>(now: &DateTime<T>, months: u32) -> DateTime<T> {
    let today = now.date_naive();
    let month_start = today - Days::new(u64::from(today.day0()));
    let next_start = month_start + Months::new(months);
    period_start(&now.timezone(), next_start) - TimeDelta::nanoseconds(1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Timelike, Utc};
    use chrono_tz::Asia::Tokyo;
    use chrono_tz::Tz;

    fn tokyo(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> DateTime<Tz> {
        Tokyo.with_ymd_and_hms(y, m, d, h, min, s).unwrap()
    }

    fn assert_last_nano(t: &DateTime<Tz>, y: i32, m: u32, d: u32) {
        assert_eq!((t.year(), t.month(), t.day()), (y, m, d), "date of {}", t);
        assert_eq!((t.hour(), t.minute(), t.second()), (23, 59, 59), "time of {}", t);
        assert_eq!(t.nanosecond(), 999_999_999, "nanos of {}", t);
    }

    // === end_of_month ===

    #[test]
    fn test_end_of_month_basic() {
        assert_last_nano(&end_of_month(&tokyo(2024, 5, 10, 12, 0, 0)), 2024, 5, 31);
        assert_last_nano(&end_of_month(&tokyo(2024, 4, 1, 0, 0, 0)), 2024, 4, 30);
    }

    #[test]
    fn test_end_of_month_february() {
        assert_last_nano(&end_of_month(&tokyo(2024, 2, 15, 9, 0, 0)), 2024, 2, 29);
        assert_last_nano(&end_of_month(&tokyo(2023, 2, 15, 9, 0, 0)), 2023, 2, 28);
        assert_last_nano(&end_of_month(&tokyo(2100, 2, 1, 0, 0, 0)), 2100, 2, 28);
    }

    #[test]
    fn test_end_of_month_december_rolls_year() {
        let end = end_of_month(&tokyo(2024, 12, 31, 23, 59, 59));
        assert_last_nano(&end, 2024, 12, 31);
        let next = end + TimeDelta::nanoseconds(1);
        assert_eq!((next.year(), next.month(), next.day()), (2025, 1, 1));
    }

    #[test]
    fn test_end_of_month_at_last_nanosecond_is_itself() {
        let end = end_of_month(&tokyo(2024, 3, 3, 3, 3, 3));
        assert_eq!(end_of_month(&end), end);
    }

    // === end_of_quarter ===

    #[test]
    fn test_end_of_quarter_each_quarter() {
        assert_last_nano(&end_of_quarter(&tokyo(2024, 1, 5, 0, 0, 0)), 2024, 3, 31);
        assert_last_nano(&end_of_quarter(&tokyo(2024, 3, 31, 23, 0, 0)), 2024, 3, 31);
        assert_last_nano(&end_of_quarter(&tokyo(2024, 4, 1, 0, 0, 0)), 2024, 6, 30);
        assert_last_nano(&end_of_quarter(&tokyo(2024, 4, 30, 18, 0, 0)), 2024, 6, 30);
        assert_last_nano(&end_of_quarter(&tokyo(2024, 8, 15, 0, 0, 0)), 2024, 9, 30);
        assert_last_nano(&end_of_quarter(&tokyo(2024, 10, 1, 0, 0, 0)), 2024, 12, 31);
        assert_last_nano(&end_of_quarter(&tokyo(2024, 12, 31, 0, 0, 0)), 2024, 12, 31);
    }

    // === end_of_half_year ===

    #[test]
    fn test_end_of_half_year_fiscal_halves() {
        assert_last_nano(&end_of_half_year(&tokyo(2024, 4, 1, 0, 0, 0)), 2024, 9, 30);
        assert_last_nano(&end_of_half_year(&tokyo(2024, 9, 30, 23, 0, 0)), 2024, 9, 30);
        assert_last_nano(&end_of_half_year(&tokyo(2024, 10, 1, 0, 0, 0)), 2025, 3, 31);
        assert_last_nano(&end_of_half_year(&tokyo(2024, 12, 25, 0, 0, 0)), 2025, 3, 31);
    }

    #[test]
    fn test_end_of_half_year_january_to_march_ends_in_march() {
        for month in 1..=3 {
            let end = end_of_half_year(&tokyo(2025, month, 10, 8, 0, 0));
            assert_last_nano(&end, 2025, 3, 31);
        }
    }

    // === end_of_fiscal_year ===

    #[test]
    fn test_end_of_fiscal_year() {
        assert_last_nano(&end_of_fiscal_year(&tokyo(2024, 1, 1, 0, 0, 0)), 2024, 3, 31);
        assert_last_nano(&end_of_fiscal_year(&tokyo(2024, 3, 31, 23, 59, 59)), 2024, 3, 31);
        assert_last_nano(&end_of_fiscal_year(&tokyo(2024, 4, 1, 0, 0, 0)), 2025, 3, 31);
        assert_last_nano(&end_of_fiscal_year(&tokyo(2024, 12, 31, 12, 0, 0)), 2025, 3, 31);
    }

    // === end_of_date / start_of_day ===

    #[test]
    fn test_end_of_date() {
        let date = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let end = end_of_date(&Tokyo, date);
        assert_last_nano(&end, 2024, 12, 31);
    }

    #[test]
    fn test_start_of_day_in_dst_gap_moves_past_gap() {
        // São Paulo skipped 2018-11-04 00:00 -> 01:00
        let tz = chrono_tz::America::Sao_Paulo;
        let date = NaiveDate::from_ymd_opt(2018, 11, 4).unwrap();
        let start = start_of_day(&tz, date);
        assert_eq!(start.date_naive(), date);
        assert_eq!((start.hour(), start.minute()), (1, 0));
    }

    #[test]
    fn test_repeated_midnight_keeps_old_month() {
        // St. John's fell back at 00:01 NDT on 2009-11-01, so midnight came twice.
        // 03:00 UTC is 23:30 NST on Oct 31, inside the repeated hour.
        let tz = chrono_tz::America::St_Johns;
        let now = Utc.with_ymd_and_hms(2009, 11, 1, 3, 0, 0).unwrap().with_timezone(&tz);
        assert_eq!((now.month(), now.day(), now.hour(), now.minute()), (10, 31, 23, 30));

        let end = end_of_month(&now);
        assert!(end >= now, "{} < {}", end, now);
        assert_last_nano(&end, 2009, 10, 31);
        assert_eq!(end.offset().fix().local_minus_utc(), -(3 * 3600 + 1800));

        let deadline = end_of_date(&tz, NaiveDate::from_ymd_opt(2009, 10, 31).unwrap());
        assert_eq!(deadline, end);
    }

    #[test]
    fn test_start_of_day_repeated_midnight_is_first_occurrence() {
        let tz = chrono_tz::America::St_Johns;
        let start = start_of_day(&tz, NaiveDate::from_ymd_opt(2009, 11, 1).unwrap());
        // 00:00 NDT
        assert_eq!(start.offset().fix().local_minus_utc(), -(2 * 3600 + 1800));
        assert!(start < end_of_date(&tz, NaiveDate::from_ymd_opt(2009, 10, 31).unwrap()));
    }

    #[test]
    fn test_boundary_keeps_zone_offset() {
        let end = end_of_month(&tokyo(2024, 6, 1, 0, 0, 0));
        assert_eq!(end.offset().fix().local_minus_utc(), 9 * 3600);
    }

    #[test]
    fn test_boundary_kind_dispatch() {
        let now = tokyo(2024, 11, 20, 10, 0, 0);
        assert_eq!(BoundaryKind::EndOfMonth.boundary(&now), end_of_month(&now));
        assert_eq!(BoundaryKind::EndOfQuarter.boundary(&now), end_of_quarter(&now));
        assert_eq!(BoundaryKind::EndOfHalfYear.boundary(&now), end_of_half_year(&now));
        assert_eq!(BoundaryKind::EndOfFiscalYear.boundary(&now), end_of_fiscal_year(&now));
    }

    #[test]
    fn test_labels() {
        let labels: Vec<_> = BoundaryKind::ALL.iter().map(|k| k.label()).collect();
        assert_eq!(labels, ["月末", "四半期末", "半期末", "年度末"]);
    }
}
