//! Configuration for the position poller.

use std::time::Duration;

/// Default poll interval.
pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 10;

/// Default capacity of the event broadcast channel.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 32;

/// Maximum backoff after consecutive fetch failures (5 minutes).
pub const MAX_BACKOFF: Duration = Duration::from_secs(300);

/// Configuration for a [`PositionPoller`](super::PositionPoller) subscription.
#[derive(Debug, Clone)]
pub struct PollerConfig {
    /// How often to fetch positions. The first fetch happens immediately;
    /// subsequent fetches every interval.
    pub poll_interval: Duration,

    /// Capacity of the broadcast channel carrying [`PollerEvent`](super::PollerEvent)s.
    pub channel_capacity: usize,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(DEFAULT_POLL_INTERVAL_SECS),
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

impl PollerConfig {
    /// Set the poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }
}

/// Calculate exponential backoff: 2^n seconds, capped at [`MAX_BACKOFF`].
pub(crate) fn calculate_backoff(consecutive_errors: u32) -> Duration {
    let secs = 2u64.saturating_pow(consecutive_errors.min(20));
    Duration::from_secs(secs).min(MAX_BACKOFF)
}
