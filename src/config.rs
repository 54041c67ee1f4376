use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

#[cfg(test)]
use std::collections::HashMap;

use crate::calendar::Calendar;
use crate::holidays::{HolidayCalendar, HolidayTable, JapanHolidays, NoHolidays};

pub const MIN_TICK_MS: u64 = 100;
pub const MAX_TICK_MS: u64 = 60_000;

/// Where the holiday predicate comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HolidaySource {
    /// Rule-based Japanese national holidays
    Japan,
    /// Weekends only
    None,
    /// JSON table on disk
    Table(PathBuf),
}

impl HolidaySource {
    fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "" | "jp" | "japan" => HolidaySource::Japan,
            "none" => HolidaySource::None,
            _ => HolidaySource::Table(PathBuf::from(value.trim())),
        }
    }

    pub fn load(&self) -> Result<Arc<dyn HolidayCalendar>> {
        Ok(match self {
            HolidaySource::Japan => Arc::new(JapanHolidays),
            HolidaySource::None => Arc::new(NoHolidays),
            HolidaySource::Table(path) => Arc::new(
                HolidayTable::load(path)
                    .with_context(|| format!("loading holiday table {}", path.display()))?,
            ),
        })
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    /// IANA zone every countdown is expressed in
    pub timezone: String,

    pub holidays: HolidaySource,

    /// JSON file holding custom targets
    pub targets_file: PathBuf,

    // Tick interval for the live board
    pub tick_ms: u64,

    // Render days and business days only
    pub simple: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // Load .env if present, ignore if missing
        Self::from_getter(|key| env::var(key).ok())
    }

    /// Parse config from a custom getter function (for testing)
    pub fn from_getter<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Config {
            timezone: get("COUNTDOWN_TIMEZONE")
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| "Asia/Tokyo".to_string()),

            holidays: get("COUNTDOWN_HOLIDAYS")
                .map(|s| HolidaySource::parse(&s))
                .unwrap_or(HolidaySource::Japan),

            targets_file: get("COUNTDOWN_TARGETS_FILE")
                .filter(|s| !s.trim().is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./targets.json")),

            tick_ms: get("COUNTDOWN_TICK_MS")
                .unwrap_or_else(|| "1000".to_string())
                .trim()
                .parse()
                .context("COUNTDOWN_TICK_MS must be a whole number of milliseconds")?,

            simple: match get("COUNTDOWN_SIMPLE") {
                Some(v) => parse_bool(&v).context("COUNTDOWN_SIMPLE must be true or false")?,
                None => false,
            },
        })
    }

    /// Create config from a HashMap (convenience for testing)
    #[cfg(test)]
    pub fn from_map(map: &HashMap<&str, &str>) -> Result<Self> {
        Self::from_getter(|key| map.get(key).map(|v| v.to_string()))
    }

    /// Tick interval for the live board, clamped to MIN_TICK_MS..=MAX_TICK_MS
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.clamp(MIN_TICK_MS, MAX_TICK_MS))
    }

    /// Build the calendar context this configuration describes
    pub fn calendar(&self) -> Result<Calendar> {
        let holidays = self.holidays.load()?;
        Calendar::with_timezone_name(&self.timezone, holidays)
            .context("COUNTDOWN_TIMEZONE must be an IANA zone name")
    }

    /// Validate configuration values at startup.
    /// Returns Ok(()) if all validations pass, or Err with details of what failed.
    pub fn validate(&self) -> Result<()> {
        let mut errors: Vec<String> = Vec::new();

        if self.timezone.parse::<chrono_tz::Tz>().is_err() {
            errors.push(format!(
                "COUNTDOWN_TIMEZONE '{}' is not a known IANA zone.",
                self.timezone
            ));
        }

        if let Err(e) = self.holidays.load() {
            errors.push(format!("COUNTDOWN_HOLIDAYS: {:#}", e));
        }

        if self.tick_ms < MIN_TICK_MS {
            errors.push(format!(
                "COUNTDOWN_TICK_MS={} is too short (min {}).",
                self.tick_ms, MIN_TICK_MS
            ));
        } else if self.tick_ms > MAX_TICK_MS {
            errors.push(format!(
                "COUNTDOWN_TICK_MS={} seems too long (max {}).",
                self.tick_ms, MAX_TICK_MS
            ));
        }

        if self.targets_file.is_dir() {
            errors.push(format!(
                "COUNTDOWN_TARGETS_FILE '{}' is a directory.",
                self.targets_file.display()
            ));
        }

        if errors.is_empty() {
            Ok(())
        } else {
            bail!(
                "Configuration validation failed:\n  - {}",
                errors.join("\n  - ")
            )
        }
    }
}

/// Parse a boolean flag value, accepting the usual spellings
pub fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => bail!("expected true or false, got '{}'", other),
    }
}
