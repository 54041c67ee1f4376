//! Public holiday calendars
//!
//! The business-day counter only ever asks one question per date, so a
//! holiday source is anything implementing [`HolidayCalendar`]. Two sources
//! ship with the crate: the rule-based [`JapanHolidays`] and a static
//! [`HolidayTable`] loaded from JSON.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// Per-date holiday lookup for one jurisdiction
pub trait HolidayCalendar: fmt::Debug + Send + Sync {
    /// Short identifier used in logs
    fn name(&self) -> &str;

    /// Name of the holiday on `date`, if any
    fn holiday_name(&self, date: NaiveDate) -> Option<String>;

    fn is_holiday(&self, date: NaiveDate) -> bool {
        self.holiday_name(date).is_some()
    }
}

/// Weekends only
#[derive(Debug, Clone, Copy, Default)]
pub struct NoHolidays;

impl HolidayCalendar for NoHolidays {
    fn name(&self) -> &str {
        "none"
    }

    fn holiday_name(&self, _date: NaiveDate) -> Option<String> {
        None
    }
}

/// National holidays of Japan (国民の祝日), 1949 through 2150.
///
/// Observed:
/// * fixed-date holidays and their historical moves
/// * Happy Monday holidays (Coming of Age and Sports Day from 2000, Marine Day
///   and Respect for the Aged Day from 2003)
/// * vernal and autumnal equinox days
/// * one-off days (1959, 1989, 1990, 1993, 2019) and the 2020/2021 Olympic moves
/// * substitute holidays (振替休日): the Monday after a Sunday holiday from
///   1973-04-12, the next non-holiday from 2007
/// * citizens' holidays (国民の休日): a non-Sunday sandwiched between two
///   holidays, from 1985-12-27
#[derive(Debug, Clone, Copy, Default)]
pub struct JapanHolidays;

impl HolidayCalendar for JapanHolidays {
    fn name(&self) -> &str {
        "jp"
    }

    fn holiday_name(&self, date: NaiveDate) -> Option<String> {
        if let Some(name) = national_holiday(date) {
            return Some(name.to_string());
        }
        if is_substitute_holiday(date) {
            return Some("振替休日".to_string());
        }
        if is_citizens_holiday(date) {
            return Some("国民の休日".to_string());
        }
        None
    }
}

const FIRST_SUBSTITUTE: (i32, u32, u32) = (1973, 4, 12);
const FIRST_CITIZENS: (i32, u32, u32) = (1985, 12, 27);

fn on_or_after(date: NaiveDate, (y, m, d): (i32, u32, u32)) -> bool {
    (date.year(), date.month(), date.day()) >= (y, m, d)
}

/// Holidays named by law, before substitute and citizens' rules apply
fn national_holiday(date: NaiveDate) -> Option<&'static str> {
    let y = date.year();
    if !(1949..=2150).contains(&y) {
        return None;
    }
    let m = date.month();
    let d = date.day();
    let nth_monday = |n: u32| date.weekday() == Weekday::Mon && (d - 1) / 7 + 1 == n;

    let name = match m {
        1 if d == 1 => "元日",
        1 if y >= 2000 && nth_monday(2) => "成人の日",
        1 if y < 2000 && d == 15 => "成人の日",
        2 if d == 11 && y >= 1967 => "建国記念の日",
        2 if d == 23 && y >= 2020 => "天皇誕生日",
        2 if y == 1989 && d == 24 => "昭和天皇の大喪の礼",
        3 if Some(d) == vernal_equinox_day(y) => "春分の日",
        4 if d == 29 && y >= 2007 => "昭和の日",
        4 if d == 29 && y >= 1989 => "みどりの日",
        4 if d == 29 => "天皇誕生日",
        4 if y == 1959 && d == 10 => "皇太子明仁親王の結婚の儀",
        5 if d == 3 => "憲法記念日",
        5 if d == 4 && y >= 2007 => "みどりの日",
        5 if d == 5 => "こどもの日",
        5 if y == 2019 && d == 1 => "天皇の即位の日",
        6 if y == 1993 && d == 9 => "皇太子徳仁親王の結婚の儀",
        7 if y == 2020 && d == 23 => "海の日",
        7 if y == 2021 && d == 22 => "海の日",
        7 if y == 2020 && d == 24 => "スポーツの日",
        7 if y == 2021 && d == 23 => "スポーツの日",
        7 if y >= 2003 && y != 2020 && y != 2021 && nth_monday(3) => "海の日",
        7 if (1996..=2002).contains(&y) && d == 20 => "海の日",
        8 if y == 2020 && d == 10 => "山の日",
        8 if y == 2021 && d == 8 => "山の日",
        8 if y >= 2016 && y != 2020 && y != 2021 && d == 11 => "山の日",
        9 if y >= 2003 && nth_monday(3) => "敬老の日",
        9 if (1966..=2002).contains(&y) && d == 15 => "敬老の日",
        9 if Some(d) == autumnal_equinox_day(y) => "秋分の日",
        10 if y >= 2022 && nth_monday(2) => "スポーツの日",
        10 if (2000..=2019).contains(&y) && nth_monday(2) => "体育の日",
        10 if (1966..=1999).contains(&y) && d == 10 => "体育の日",
        10 if y == 2019 && d == 22 => "即位礼正殿の儀",
        11 if d == 3 => "文化の日",
        11 if d == 23 => "勤労感謝の日",
        11 if y == 1990 && d == 12 => "即位礼正殿の儀",
        12 if d == 23 && (1989..=2018).contains(&y) => "天皇誕生日",
        _ => return None,
    };
    Some(name)
}

/// 振替休日: a Sunday holiday moves to the next day that is not itself a holiday
fn is_substitute_holiday(date: NaiveDate) -> bool {
    if !on_or_after(date, FIRST_SUBSTITUTE) || national_holiday(date).is_some() {
        return false;
    }
    if date.year() < 2007 {
        return date.weekday() == Weekday::Mon
            && date.pred_opt().is_some_and(|prev| national_holiday(prev).is_some());
    }
    let mut prev = date.pred_opt();
    while let Some(day) = prev {
        if national_holiday(day).is_none() {
            return false;
        }
        if day.weekday() == Weekday::Sun {
            return true;
        }
        prev = day.pred_opt();
    }
    false
}

/// 国民の休日: a weekday or Saturday with a holiday on both sides
fn is_citizens_holiday(date: NaiveDate) -> bool {
    if !on_or_after(date, FIRST_CITIZENS)
        || date.weekday() == Weekday::Sun
        || national_holiday(date).is_some()
    {
        return false;
    }
    let before = date.pred_opt().and_then(national_holiday);
    let after = date.succ_opt().and_then(national_holiday);
    before.is_some() && after.is_some()
}

/// Day of March of the vernal equinox (approximation used by the Cabinet Office tables)
fn vernal_equinox_day(year: i32) -> Option<u32> {
    let base = match year {
        1900..=1979 => 20.8357,
        1980..=2099 => 20.8431,
        2100..=2150 => 21.8510,
        _ => return None,
    };
    Some(equinox_day(year, base))
}

/// Day of September of the autumnal equinox
fn autumnal_equinox_day(year: i32) -> Option<u32> {
    let base = match year {
        1900..=1979 => 23.2588,
        1980..=2099 => 23.2488,
        2100..=2150 => 24.2488,
        _ => return None,
    };
    Some(equinox_day(year, base))
}

fn equinox_day(year: i32, base: f64) -> u32 {
    let offset = year - 1980;
    let day = base + 0.242194 * f64::from(offset) - f64::from(offset.div_euclid(4));
    day.floor() as u32
}

/// One row of a holiday table file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayEntry {
    pub date: NaiveDate,
    pub name: String,
}

/// Static, versioned holiday table for a single jurisdiction
#[derive(Debug, Clone, Default)]
pub struct HolidayTable {
    label: String,
    days: BTreeMap<NaiveDate, String>,
}

impl HolidayTable {
    pub fn new(label: impl Into<String>, entries: impl IntoIterator<Item = HolidayEntry>) -> Self {
        Self {
            label: label.into(),
            days: entries.into_iter().map(|e| (e.date, e.name)).collect(),
        }
    }

    /// Parse a JSON array of `{ "date": "YYYY-MM-DD", "name": "..." }`
    pub fn from_json(label: impl Into<String>, json: &str) -> serde_json::Result<Self> {
        let entries: Vec<HolidayEntry> = serde_json::from_str(json)?;
        Ok(Self::new(label, entries))
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Self::from_json(path.display().to_string(), &json).map_err(|e| Error::json(path, e))
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Holidays within `from..=to`
    pub fn between(&self, from: NaiveDate, to: NaiveDate) -> impl Iterator<Item = (&NaiveDate, &String)> {
        self.days.range(from..=to.max(from))
    }
}

impl HolidayCalendar for HolidayTable {
    fn name(&self) -> &str {
        &self.label
    }

    fn holiday_name(&self, date: NaiveDate) -> Option<String> {
        self.days.get(&date).cloned()
    }
}
