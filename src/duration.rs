//! Countdown arithmetic: whole seconds until a deadline, split for display

use chrono::{DateTime, TimeZone};
use std::fmt;
use std::time::Duration;

pub const SECS_PER_MINUTE: i64 = 60;
pub const SECS_PER_HOUR: i64 = 3_600;
pub const SECS_PER_DAY: i64 = 86_400;

/// Whole seconds from `now` to `target`, floored; negative once the target has passed
pub fn seconds_until<A: TimeZone, B: TimeZone>(now: &DateTime<A>, target: &DateTime<B>) -> i64 {
    let millis = target.timestamp_millis() - now.timestamp_millis();
    millis.div_euclid(1000)
}

/// Remaining time split into days, hours, minutes and seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Countdown {
    pub days: i64,
    pub hours: i64,
    pub minutes: i64,
    pub seconds: i64,
}

impl Countdown {
    /// Decompose `seconds`, clamping anything negative to zero
    pub fn from_seconds(seconds: i64) -> Self {
        let s = seconds.max(0);
        Self {
            days: s / SECS_PER_DAY,
            hours: (s % SECS_PER_DAY) / SECS_PER_HOUR,
            minutes: (s % SECS_PER_HOUR) / SECS_PER_MINUTE,
            seconds: s % SECS_PER_MINUTE,
        }
    }

    pub fn between<A: TimeZone, B: TimeZone>(now: &DateTime<A>, target: &DateTime<B>) -> Self {
        Self::from_seconds(seconds_until(now, target))
    }

    pub fn total_seconds(&self) -> i64 {
        self.days * SECS_PER_DAY
            + self.hours * SECS_PER_HOUR
            + self.minutes * SECS_PER_MINUTE
            + self.seconds
    }

    pub fn is_zero(&self) -> bool {
        self.total_seconds() == 0
    }

    /// "3日4時間5分", the form used in reminder bodies
    pub fn to_minutes_text(&self) -> String {
        format!("{}日{}時間{}分", self.days, self.hours, self.minutes)
    }
}

impl fmt::Display for Countdown {
    /// "3日 4時間 5分 6秒"
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}日 {}時間 {}分 {}秒",
            self.days, self.hours, self.minutes, self.seconds
        )
    }
}

/// Format duration for logging
pub fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    let days = secs / 86_400;
    let hours = (secs % 86_400) / 3600;
    let mins = (secs % 3600) / 60;

    if days > 0 {
        format!("{}d {}h {}m", days, hours, mins)
    } else if hours > 0 {
        format!("{}h {}m", hours, mins)
    } else if mins > 0 {
        format!("{}m", mins)
    } else {
        format!("{}s", secs)
    }
}



/// Kani formal verification proofs
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    #[kani::proof]
    fn decomposition_fields_bounded() {
        let secs: i64 = kani::any();
        let c = Countdown::from_seconds(secs);
        kani::assert(c.days >= 0, "days must be non-negative");
        kani::assert(c.hours >= 0 && c.hours < 24, "hours must be 0..24");
        kani::assert(c.minutes >= 0 && c.minutes < 60, "minutes must be 0..60");
        kani::assert(c.seconds >= 0 && c.seconds < 60, "seconds must be 0..60");
    }

    #[kani::proof]
    fn negative_clamps_to_zero() {
        let secs: i64 = kani::any();
        kani::assume(secs < 0);
        kani::assert(Countdown::from_seconds(secs).is_zero(), "negative must clamp");
    }
}
