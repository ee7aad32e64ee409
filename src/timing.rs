//! Timing configuration for polling operations.
//!
//! Every polling operation (prompt discovery, command completion, timed
//! config collection) consumes the same immutable bundle of knobs. The
//! profile is cloned per operation and never mutated mid-flight.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Timing knobs consumed by every polling operation on a session.
///
/// The effective pause between read attempts is
/// `loop_delay * delay_factor`; slow devices are accommodated by raising
/// `delay_factor` rather than editing individual delays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingProfile {
    /// Base pause between channel polls.
    pub loop_delay: Duration,

    /// Global multiplier applied to `loop_delay` (and settle pauses).
    pub delay_factor: f64,

    /// Maximum number of poll iterations before a command is declared
    /// timed out.
    pub max_loops: u32,

    /// Overall ceiling for connection establishment.
    pub timeout: Duration,

    /// Blocking-read timeout applied to the underlying transport
    /// (SSH inactivity timeout).
    pub blocking_timeout: Duration,

    /// Optional transport keepalive interval.
    pub keepalive_interval: Option<Duration>,
}

impl TimingProfile {
    /// Effective pause between read attempts.
    pub fn poll_interval(&self) -> Duration {
        self.loop_delay.mul_f64(self.delay_factor.max(0.0))
    }

    /// Set the delay factor.
    pub fn with_delay_factor(mut self, factor: f64) -> Self {
        self.delay_factor = factor;
        self
    }

    /// Set the poll budget.
    pub fn with_max_loops(mut self, max_loops: u32) -> Self {
        self.max_loops = max_loops;
        self
    }

    /// Set the connection timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the base loop delay.
    pub fn with_loop_delay(mut self, delay: Duration) -> Self {
        self.loop_delay = delay;
        self
    }

    /// Enable transport keepalives.
    pub fn with_keepalive(mut self, interval: Duration) -> Self {
        self.keepalive_interval = Some(interval);
        self
    }
}

impl Default for TimingProfile {
    fn default() -> Self {
        Self {
            loop_delay: Duration::from_millis(200),
            delay_factor: 1.0,
            max_loops: 500,
            timeout: Duration::from_secs(100),
            blocking_timeout: Duration::from_secs(20),
            keepalive_interval: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn poll_interval_scales_with_delay_factor() {
        let timing = TimingProfile::default().with_delay_factor(2.0);
        assert_eq!(timing.poll_interval(), Duration::from_millis(400));
    }

    #[test]
    fn negative_delay_factor_clamps_to_zero() {
        let timing = TimingProfile::default().with_delay_factor(-1.0);
        assert_eq!(timing.poll_interval(), Duration::ZERO);
    }
}
