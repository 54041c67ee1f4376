//! Tick scheduler
//! Samples "now" in the calendar zone at a fixed interval and hands it to the caller.
//! The calendar math never sees the timer; every tick is independent.

use chrono::DateTime;
use chrono_tz::Tz;
use std::time::Duration;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::calendar::Calendar;
use crate::duration::format_duration;

pub const DEFAULT_TICK: Duration = Duration::from_secs(1);

/// Time from `now` until the next multiple of `interval` since the epoch.
/// Ticks land on whole seconds so the display turns over with the clock.
pub fn delay_to_next_tick(now: &DateTime<Tz>, interval: Duration) -> Duration {
    let interval_ms = interval.as_millis().max(1) as i64;
    let now_ms = now.timestamp_millis();
    let into_tick = now_ms.rem_euclid(interval_ms);
    Duration::from_millis((interval_ms - into_tick) as u64)
}

/// Run the tick loop until `cancel` fires
pub async fn run_ticker<F>(
    calendar: &Calendar,
    interval: Duration,
    cancel: CancellationToken,
    mut on_tick: F,
) where
    F: FnMut(DateTime<Tz>),
{
    info!(
        "Ticker started ({}, every {})",
        calendar.timezone().name(),
        format_duration(interval)
    );

    loop {
        let now = calendar.now();
        debug!("Tick at {}", now);
        on_tick(now);

        let wait = delay_to_next_tick(&calendar.now(), interval);
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Ticker stopped");
                return;
            }
            _ = sleep(wait) => {}
        }
    }
}
