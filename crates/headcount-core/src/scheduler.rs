// ── Daily reset scheduler ──
//
// Sleeps until the configured local time of day, then resets occupancy
// through the engine. The next deadline is recomputed from the wall
// clock after every run, so DST shifts and clock corrections self-heal.

use std::time::Duration;

use chrono::{DateTime, Days, Local, NaiveTime, TimeZone};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::config::ResetSchedule;
use crate::engine::{EngineHandle, SCHEDULED_RESET};

/// First instant strictly after `now` whose local time is `at`.
///
/// A time that falls into a DST gap moves to the first valid instant
/// after it; an ambiguous time takes the earlier of the two.
pub fn next_occurrence<Tz: TimeZone>(now: &DateTime<Tz>, at: NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut day = now.date_naive();

    loop {
        let wall = day.and_time(at);
        let candidate = tz.from_local_datetime(&wall).earliest().or_else(|| {
            // DST gap: first valid local time after `wall`
            (1..=4)
                .filter_map(|h| {
                    tz.from_local_datetime(&(wall + chrono::Duration::hours(h)))
                        .earliest()
                })
                .next()
        });

        if let Some(candidate) = candidate.filter(|c| c > now) {
            return candidate;
        }
        match day.checked_add_days(Days::new(1)) {
            Some(next) => day = next,
            None => return now.clone(),
        }
    }
}

/// Time left until the next reset, measured in local time.
pub fn until_next_reset(schedule: ResetSchedule) -> Duration {
    let now = Local::now();
    let next = next_occurrence(&now, schedule.at);
    (next - now).to_std().unwrap_or(Duration::ZERO)
}

/// Reset occupancy every day at `schedule` until cancelled.
pub async fn run_reset_scheduler(
    schedule: ResetSchedule,
    engine: EngineHandle,
    cancel: CancellationToken,
) {
    loop {
        let wait = until_next_reset(schedule);
        debug!(wait_secs = wait.as_secs(), at = %schedule.at, "next scheduled reset");

        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            () = tokio::time::sleep(wait) => {}
        }

        match engine.reset_occupancy(SCHEDULED_RESET).await {
            Ok(Some(log)) => info!(reason = %log.reason, "scheduled occupancy reset"),
            Ok(None) => info!("scheduled reset: occupancy already zero"),
            Err(e) => {
                warn!(error = %e, "scheduled reset failed");
                break;
            }
        }

        // Step off the reset instant so the next deadline is tomorrow.
        tokio::select! {
            biased;
            _ = cancel.cancelled() => break,
            () = tokio::time::sleep(Duration::from_secs(1)) => {}
        }
    }
    debug!("reset scheduler stopped");
}
