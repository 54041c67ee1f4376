//! User-defined targets and their JSON store
//!
//! Targets arrive as opaque `YYYY-MM-DD` strings; they are validated here,
//! before anything reaches the calendar math.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::calendar::Calendar;
use crate::error::{Error, Result};

/// Parse a strict ISO calendar date (`YYYY-MM-DD`, zero-padded)
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let invalid = || Error::InvalidDate {
        input: input.to_string(),
    };
    let bytes = input.as_bytes();
    let shape_ok = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shape_ok {
        return Err(invalid());
    }
    NaiveDate::parse_from_str(input, "%Y-%m-%d").map_err(|_| invalid())
}

/// Parse `YYYY-MM-DDTHH:MM` or `YYYY-MM-DDTHH:MM:SS` without a zone
pub fn parse_naive_datetime(input: &str) -> Result<NaiveDateTime> {
    ["%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(input, fmt).ok())
        .ok_or_else(|| Error::InvalidDateTime {
            input: input.to_string(),
        })
}

/// Parse a wall-clock date-time and place it in `tz`.
///
/// Ambiguous times take the earlier instant; times inside a DST gap are rejected.
pub fn parse_local_datetime(input: &str, tz: &Tz) -> Result<DateTime<Tz>> {
    let naive = parse_naive_datetime(input)?;
    tz.from_local_datetime(&naive)
        .earliest()
        .ok_or_else(|| Error::NonexistentLocalTime {
            input: input.to_string(),
            timezone: tz.name().to_string(),
        })
}

/// A target saved by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomTarget {
    pub id: String,
    pub label: String,
    /// `YYYY-MM-DD`; kept as text so a bad row does not poison the whole file
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notify_at: Option<String>,
}

impl CustomTarget {
    pub fn parsed_date(&self) -> Result<NaiveDate> {
        parse_date(&self.date)
    }

    /// Last nanosecond of the target date in the calendar zone
    pub fn deadline(&self, calendar: &Calendar) -> Result<DateTime<Tz>> {
        Ok(calendar.end_of_date(self.parsed_date()?))
    }
}

/// A one-off target passed on the command line; never stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SharedTarget {
    pub label: String,
    pub date: NaiveDate,
}

impl SharedTarget {
    pub fn parse(label: &str, date: &str) -> Result<Self> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::EmptyLabel);
        }
        Ok(Self {
            label: label.to_string(),
            date: parse_date(date)?,
        })
    }

    pub fn deadline(&self, calendar: &Calendar) -> DateTime<Tz> {
        calendar.end_of_date(self.date)
    }
}

/// Custom targets persisted as a JSON array
#[derive(Debug)]
pub struct TargetStore {
    path: PathBuf,
    targets: Vec<CustomTarget>,
}

impl TargetStore {
    /// Load the store; a missing file is an empty store
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let targets = match std::fs::read_to_string(&path) {
            Ok(json) if json.trim().is_empty() => Vec::new(),
            Ok(json) => serde_json::from_str(&json).map_err(|e| Error::json(&path, e))?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No target file at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => return Err(Error::io(&path, e)),
        };
        Ok(Self { path, targets })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Targets in insertion order
    pub fn targets(&self) -> &[CustomTarget] {
        &self.targets
    }

    /// Validate and append a target. The reminder time must exist in `tz`.
    /// The id is the creation time in epoch milliseconds, bumped until unique.
    pub fn add(
        &mut self,
        label: &str,
        date: &str,
        notify_at: Option<&str>,
        tz: &Tz,
        created: DateTime<Utc>,
    ) -> Result<&CustomTarget> {
        let label = label.trim();
        if label.is_empty() {
            return Err(Error::EmptyLabel);
        }
        parse_date(date)?;
        let notify_at = notify_at.map(str::trim).filter(|s| !s.is_empty());
        if let Some(at) = notify_at {
            parse_local_datetime(at, tz)?;
        }

        let mut id = created.timestamp_millis();
        while self.targets.iter().any(|t| t.id == id.to_string()) {
            id += 1;
        }

        self.targets.push(CustomTarget {
            id: id.to_string(),
            label: label.to_string(),
            date: date.to_string(),
            notify_at: notify_at.map(str::to_string),
        });
        Ok(&self.targets[self.targets.len() - 1])
    }

    pub fn remove(&mut self, id: &str) -> Result<CustomTarget> {
        let index = self
            .targets
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| Error::TargetNotFound(id.to_string()))?;
        Ok(self.targets.remove(index))
    }

    /// Write the store via a temp file and rename
    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
        }
        let json = serde_json::to_string_pretty(&self.targets).map_err(|e| Error::json(&self.path, e))?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).map_err(|e| Error::io(&tmp, e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| Error::io(&self.path, e))?;
        debug!("Saved {} targets to {}", self.targets.len(), self.path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;
    use chrono_tz::America::New_York;
    use chrono_tz::Asia::Tokyo;

    fn created() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    // === parse_date ===

    #[test]
    fn test_parse_date_valid() {
        assert_eq!(
            parse_date("2024-02-29").unwrap(),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
    }

    #[test]
    fn test_parse_date_rejects_malformed() {
        for bad in [
            "",
            "2024-2-29",
            "2024/02/29",
            "2023-02-29",
            "2024-13-01",
            "2024-00-10",
            " 2024-02-01",
            "2024-02-01 ",
            "+2024-02-01",
            "20240201",
        ] {
            let err = parse_date(bad).unwrap_err();
            assert!(matches!(err, Error::InvalidDate { .. }), "{:?} accepted", bad);
        }
    }

    // === parse_local_datetime ===

    #[test]
    fn test_parse_local_datetime_minutes_and_seconds() {
        let tz = chrono_tz::Asia::Tokyo;
        let a = parse_local_datetime("2024-06-01T09:30", &tz).unwrap();
        assert_eq!((a.hour(), a.minute(), a.second()), (9, 30, 0));
        let b = parse_local_datetime("2024-06-01T09:30:15", &tz).unwrap();
        assert_eq!(b.second(), 15);
    }

    #[test]
    fn test_parse_local_datetime_rejects_gap() {
        let tz = chrono_tz::America::New_York;
        let err = parse_local_datetime("2024-03-10T02:30", &tz).unwrap_err();
        assert!(matches!(err, Error::NonexistentLocalTime { .. }));
    }

    #[test]
    fn test_parse_local_datetime_rejects_garbage() {
        let tz = chrono_tz::Asia::Tokyo;
        assert!(parse_local_datetime("tomorrow", &tz).is_err());
        assert!(parse_local_datetime("2024-06-01", &tz).is_err());
    }

    // === CustomTarget ===

    #[test]
    fn test_custom_target_json_shape() {
        let json = r#"[{"id":"1717200000000","label":"締切","date":"2024-06-30","notifyAt":"2024-06-29T09:00"}]"#;
        let targets: Vec<CustomTarget> = serde_json::from_str(json).unwrap();
        assert_eq!(targets[0].notify_at.as_deref(), Some("2024-06-29T09:00"));

        let without = CustomTarget {
            notify_at: None,
            ..targets[0].clone()
        };
        let out = serde_json::to_string(&without).unwrap();
        assert!(!out.contains("notifyAt"));
    }

    #[test]
    fn test_custom_target_deadline() {
        let target = CustomTarget {
            id: "1".into(),
            label: "release".into(),
            date: "2024-06-30".into(),
            notify_at: None,
        };
        let deadline = target.deadline(&Calendar::default()).unwrap();
        assert_eq!(deadline.date_naive(), NaiveDate::from_ymd_opt(2024, 6, 30).unwrap());
        assert_eq!(deadline.nanosecond(), 999_999_999);
    }

    // === SharedTarget ===

    #[test]
    fn test_shared_target_requires_both_fields() {
        assert!(matches!(SharedTarget::parse("  ", "2024-06-30"), Err(Error::EmptyLabel)));
        assert!(SharedTarget::parse("launch", "").is_err());
        let t = SharedTarget::parse(" launch ", "2024-06-30").unwrap();
        assert_eq!(t.label, "launch");
    }

    // === TargetStore ===

    #[test]
    fn test_store_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = TargetStore::open(dir.path().join("targets.json")).unwrap();
        assert!(store.targets().is_empty());
    }

    #[test]
    fn test_store_add_save_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("targets.json");

        let mut store = TargetStore::open(&path).unwrap();
        let id = store
            .add("締切", "2024-06-30", Some("2024-06-29T09:00"), &Tokyo, created())
            .unwrap()
            .id
            .clone();
        assert_eq!(id, created().timestamp_millis().to_string());
        store.save().unwrap();

        let reloaded = TargetStore::open(&path).unwrap();
        assert_eq!(reloaded.targets(), store.targets());
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_store_ids_unique_for_same_instant() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TargetStore::open(dir.path().join("t.json")).unwrap();
        let a = store.add("a", "2024-06-30", None, &Tokyo, created()).unwrap().id.clone();
        let b = store.add("b", "2024-06-30", None, &Tokyo, created()).unwrap().id.clone();
        assert_ne!(a, b);
    }

    #[test]
    fn test_store_add_validates() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TargetStore::open(dir.path().join("t.json")).unwrap();
        assert!(matches!(
            store.add("", "2024-06-30", None, &Tokyo, created()),
            Err(Error::EmptyLabel)
        ));
        assert!(store.add("x", "30/06/2024", None, &Tokyo, created()).is_err());
        assert!(store.add("x", "2024-06-30", Some("soon"), &Tokyo, created()).is_err());
        // blank reminder is treated as none
        let t = store.add("x", "2024-06-30", Some("  "), &Tokyo, created()).unwrap();
        assert!(t.notify_at.is_none());
    }

    #[test]
    fn test_store_add_rejects_reminder_in_dst_gap() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TargetStore::open(dir.path().join("t.json")).unwrap();
        // 02:30 on 2024-03-10 does not exist in New York
        let err = store
            .add("x", "2024-03-20", Some("2024-03-10T02:30"), &New_York, created())
            .unwrap_err();
        assert!(matches!(err, Error::NonexistentLocalTime { .. }), "{}", err);
        assert!(store.targets().is_empty());

        // Same wall-clock time is fine in Tokyo
        store
            .add("x", "2024-03-20", Some("2024-03-10T02:30"), &Tokyo, created())
            .unwrap();
        assert_eq!(store.targets().len(), 1);
    }

    #[test]
    fn test_store_remove() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = TargetStore::open(dir.path().join("t.json")).unwrap();
        let id = store.add("a", "2024-06-30", None, &Tokyo, created()).unwrap().id.clone();
        assert_eq!(store.remove(&id).unwrap().label, "a");
        assert!(matches!(store.remove(&id), Err(Error::TargetNotFound(_))));
    }

    #[test]
    fn test_store_malformed_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, "{not json").unwrap();
        assert!(matches!(TargetStore::open(&path), Err(Error::Json { .. })));
    }

    #[test]
    fn test_store_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.json");
        std::fs::write(&path, "\n").unwrap();
        assert!(TargetStore::open(&path).unwrap().targets().is_empty());
    }
}
