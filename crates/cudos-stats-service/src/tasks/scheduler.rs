//! Daily wall-clock trigger

use super::RefreshOrchestrator;
use chrono::{DateTime, Duration as ChronoDuration, NaiveTime, Utc};
use std::sync::Arc;
use std::time::Duration;

/// Fires once per day at a fixed UTC time
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// First trigger strictly after `now`
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();
        if today > now {
            today
        } else {
            today + ChronoDuration::days(1)
        }
    }

    /// Time left until the next trigger
    pub fn until_next(&self, now: DateTime<Utc>) -> Duration {
        (self.next_after(now) - now).to_std().unwrap_or_default()
    }

    /// Run a cycle at every trigger
    ///
    /// Each cycle is awaited before the next trigger is computed, so cycles
    /// of the same orchestrator never overlap.
    pub async fn run(self, orchestrator: Arc<RefreshOrchestrator>) {
        loop {
            let now = Utc::now();
            let wait = self.until_next(now);
            tracing::info!(next_run = %self.next_after(now), "Waiting for scheduled refresh");
            tokio::time::sleep(wait).await;

            let report = orchestrator.run_once().await;
            if !report.is_success() {
                tracing::warn!("Scheduled refresh finished with failures, serving previous values");
            }
        }
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self::new(NaiveTime::MIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_next_after_same_day() {
        let schedule = DailySchedule::new(NaiveTime::from_hms_opt(3, 30, 0).unwrap());
        let now = Utc.with_ymd_and_hms(2024, 5, 1, 1, 0, 0).unwrap();
        assert_eq!(
            schedule.next_after(now),
            Utc.with_ymd_and_hms(2024, 5, 1, 3, 30, 0).unwrap()
        );
        assert_eq!(schedule.until_next(now), Duration::from_secs(9_000));
    }

    #[test]
    fn test_next_after_rolls_over() {
        let schedule = DailySchedule::default();
        let midnight = Utc.with_ymd_and_hms(2024, 12, 31, 0, 0, 0).unwrap();
        assert_eq!(
            schedule.next_after(midnight),
            Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );

        let late = Utc.with_ymd_and_hms(2024, 2, 28, 23, 59, 59).unwrap();
        assert_eq!(
            schedule.next_after(late),
            Utc.with_ymd_and_hms(2024, 2, 29, 0, 0, 0).unwrap()
        );
    }
}
