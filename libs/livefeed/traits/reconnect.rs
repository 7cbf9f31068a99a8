use std::time::Duration;

/// Backoff delays never exceed `base_interval * BACKOFF_CAP_FACTOR`.
pub const BACKOFF_CAP_FACTOR: u32 = 32;

/// Trait for defining reconnection strategies
///
/// Implement this trait to control how a channel should behave when
/// reconnecting after a disconnection.
pub trait ReconnectionStrategy: Send + Sync {
    /// Get the delay before the next reconnection attempt
    ///
    /// # Arguments
    /// * `attempt` - The reconnection attempt number (0-indexed)
    ///
    /// # Returns
    /// * `Some(duration)` - Wait this long before reconnecting
    /// * `None` - Stop reconnecting
    fn next_delay(&self, attempt: usize) -> Option<Duration>;

    /// Check if we should continue reconnecting
    fn should_reconnect(&self, attempt: usize) -> bool;
}

/// Exponential backoff reconnection strategy
///
/// Delays between reconnection attempts grow exponentially:
/// `initial_delay * 2^attempt`, capped at `max_delay`
#[derive(Debug, Clone)]
pub struct ExponentialBackoff {
    initial_delay: Duration,
    max_delay: Duration,
    max_attempts: Option<usize>,
}

impl ExponentialBackoff {
    /// Create a new exponential backoff strategy
    ///
    /// # Arguments
    /// * `initial_delay` - The initial delay before first reconnect
    /// * `max_delay` - The maximum delay between reconnects
    /// * `max_attempts` - Maximum number of attempts (None = unlimited)
    pub fn new(initial_delay: Duration, max_delay: Duration, max_attempts: Option<usize>) -> Self {
        Self {
            initial_delay,
            max_delay,
            max_attempts,
        }
    }

    /// The feed client's standard shape: cap at [`BACKOFF_CAP_FACTOR`] times
    /// the base interval, bounded attempts.
    pub fn bounded(initial_delay: Duration, max_attempts: usize) -> Self {
        Self::new(
            initial_delay,
            initial_delay * BACKOFF_CAP_FACTOR,
            Some(max_attempts),
        )
    }
}

impl ReconnectionStrategy for ExponentialBackoff {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }

        let base = self.initial_delay.as_millis() as u64;
        let max = self.max_delay.as_millis() as u64;
        // Checked math: 2^attempt overflows quickly, clamp to the cap instead.
        let factor = u32::try_from(attempt)
            .ok()
            .and_then(|shift| 1u64.checked_shl(shift));
        let millis = match factor.and_then(|f| base.checked_mul(f)) {
            Some(millis) => millis.min(max),
            None => max,
        };
        Some(Duration::from_millis(millis))
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}

/// Fixed delay reconnection strategy
///
/// Always waits the same amount of time between reconnection attempts
#[derive(Debug, Clone)]
pub struct FixedDelay {
    delay: Duration,
    max_attempts: Option<usize>,
}

impl FixedDelay {
    /// Create a new fixed delay strategy
    pub fn new(delay: Duration, max_attempts: Option<usize>) -> Self {
        Self { delay, max_attempts }
    }
}

impl ReconnectionStrategy for FixedDelay {
    fn next_delay(&self, attempt: usize) -> Option<Duration> {
        if !self.should_reconnect(attempt) {
            return None;
        }
        Some(self.delay)
    }

    fn should_reconnect(&self, attempt: usize) -> bool {
        self.max_attempts.map_or(true, |max| attempt < max)
    }
}
