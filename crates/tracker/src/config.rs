use std::time::Duration;

use crate::tracker::PollMode;

/// Default cadence while any job is pending or running.
pub const DEFAULT_FAST_INTERVAL: Duration = Duration::from_millis(1000);

/// Default cadence while no job is in flight.
pub const DEFAULT_SLOW_INTERVAL: Duration = Duration::from_millis(5000);

/// Shortest period a poll timer accepts.
pub const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Polling cadences for a [`JobTracker`](crate::tracker::JobTracker).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerConfig {
    pub fast_interval: Duration,
    pub slow_interval: Duration,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            fast_interval: DEFAULT_FAST_INTERVAL,
            slow_interval: DEFAULT_SLOW_INTERVAL,
        }
    }
}

impl TrackerConfig {
    /// Load intervals from the environment, falling back to defaults for
    /// missing or unparsable values.
    ///
    /// | Env Var                    | Default |
    /// |----------------------------|---------|
    /// | `TRACKER_FAST_INTERVAL_MS` | `1000`  |
    /// | `TRACKER_SLOW_INTERVAL_MS` | `5000`  |
    pub fn from_env() -> Self {
        let fast_interval = env_millis("TRACKER_FAST_INTERVAL_MS").unwrap_or(DEFAULT_FAST_INTERVAL);
        let slow_interval = env_millis("TRACKER_SLOW_INTERVAL_MS").unwrap_or(DEFAULT_SLOW_INTERVAL);
        Self {
            fast_interval,
            slow_interval,
        }
    }

    /// Copy with both periods raised to at least [`MIN_INTERVAL`].
    pub fn clamped(&self) -> Self {
        Self {
            fast_interval: self.fast_interval.max(MIN_INTERVAL),
            slow_interval: self.slow_interval.max(MIN_INTERVAL),
        }
    }

    /// Period for `mode`. `Idle` has no timer and maps to the slow period.
    pub fn interval_for(&self, mode: PollMode) -> Duration {
        match mode {
            PollMode::Fast => self.fast_interval,
            PollMode::Slow | PollMode::Idle => self.slow_interval,
        }
    }
}

fn env_millis(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|ms| *ms > 0)
        .map(Duration::from_millis)
}
