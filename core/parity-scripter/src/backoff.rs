use chrono::{DateTime, Utc};
use std::cmp;
use std::time::Duration;

const BACKOFF_STEP_SECS: u64 = 10;

/// Consecutive status read failures since the last good read.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FailureStreak {
    count: u32,
    since: Option<DateTime<Utc>>,
}

/// A streak that ended with a successful read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recovery {
    pub failures: u32,
    pub since: DateTime<Utc>,
}

impl FailureStreak {
    pub fn count(&self) -> u32 {
        self.count
    }

    /// Records a failure and returns true when it starts a new streak.
    pub fn record_failure(&mut self, now: DateTime<Utc>) -> bool {
        self.count = self.count.saturating_add(1);
        if self.since.is_none() {
            self.since = Some(now);
            return true;
        }
        false
    }

    pub fn record_success(&mut self) -> Option<Recovery> {
        let since = self.since.take()?;
        let failures = self.count;
        self.count = 0;
        Some(Recovery { failures, since })
    }
}

/// Delay before retrying a failed read. Grows with the streak and never
/// exceeds the regular poll interval.
pub fn compute_backoff(failures: u32, interval: Duration) -> Duration {
    let backoff = Duration::from_secs(BACKOFF_STEP_SECS.saturating_mul(u64::from(failures)));
    cmp::min(backoff, interval)
}
