//! Reminders for custom targets
//!
//! A target with `notify_at` produces one reminder. The queue fires it on the
//! first tick at or after its time, and never twice for the same target id.

use chrono::DateTime;
use chrono_tz::Tz;
use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::calendar::Calendar;
use crate::duration::Countdown;
use crate::error::Result;
use crate::target::{parse_local_datetime, CustomTarget};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reminder {
    pub target_id: String,
    pub title: String,
    pub body: String,
    pub fire_at: DateTime<Tz>,
}

/// Title shown for a target's reminder
pub fn reminder_title(label: &str) -> String {
    format!("{}までのカウントダウン", label)
}

/// Body text: time left from the reminder to the end of the target date
pub fn reminder_body(label: &str, remaining: &Countdown) -> String {
    format!("{}まであと{}", label, remaining.to_minutes_text())
}

/// Plan the reminder for `target`, if it asks for one
pub fn plan_reminder(calendar: &Calendar, target: &CustomTarget) -> Result<Option<Reminder>> {
    let Some(notify_at) = target.notify_at.as_deref() else {
        return Ok(None);
    };
    let fire_at = parse_local_datetime(notify_at, &calendar.timezone())?;
    let deadline = target.deadline(calendar)?;
    let remaining = Countdown::between(&fire_at, &deadline);

    Ok(Some(Reminder {
        target_id: target.id.clone(),
        title: reminder_title(&target.label),
        body: reminder_body(&target.label, &remaining),
        fire_at,
    }))
}

/// Reminders waiting to fire
#[derive(Debug, Default)]
pub struct ReminderQueue {
    scheduled: HashSet<String>,
    pending: Vec<Reminder>,
}

impl ReminderQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Plan and enqueue reminders for targets not seen before.
    /// Returns how many were added.
    pub fn schedule_all(&mut self, calendar: &Calendar, targets: &[CustomTarget]) -> usize {
        let mut added = 0;
        for target in targets {
            if self.scheduled.contains(&target.id) {
                continue;
            }
            match plan_reminder(calendar, target) {
                Ok(Some(reminder)) => {
                    debug!("Reminder for '{}' at {}", target.label, reminder.fire_at);
                    self.scheduled.insert(target.id.clone());
                    self.pending.push(reminder);
                    added += 1;
                }
                Ok(None) => {}
                Err(e) => {
                    // Mark as seen so a bad row is reported once, not every tick
                    self.scheduled.insert(target.id.clone());
                    warn!("Cannot schedule reminder for '{}': {}", target.label, e);
                }
            }
        }
        added
    }

    /// Drop a pending reminder, e.g. after its target was deleted
    pub fn cancel(&mut self, target_id: &str) {
        self.pending.retain(|r| r.target_id != target_id);
    }

    /// Remove and return every reminder due at `now`, earliest first
    pub fn due(&mut self, now: &DateTime<Tz>) -> Vec<Reminder> {
        let (mut due, pending): (Vec<_>, Vec<_>) =
            self.pending.drain(..).partition(|r| r.fire_at <= *now);
        self.pending = pending;
        due.sort_by(|a, b| a.fire_at.cmp(&b.fire_at));
        due
    }

    pub fn pending(&self) -> &[Reminder] {
        &self.pending
    }
}

/// Delivery channel for reminders
pub trait Notifier {
    fn notify(&self, reminder: &Reminder);
}

/// Prints reminders to stdout and the log
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, reminder: &Reminder) {
        info!(target_id = %reminder.target_id, "Reminder: {}", reminder.title);
        println!("🔔 {}\n    {}", reminder.title, reminder.body);
    }
}
