//! Reconnect backoff for real-time clients.

use std::time::Duration;

/// Delay before the first reconnect attempt.
pub const INITIAL_DELAY: Duration = Duration::from_millis(5000);
/// Upper bound on the reconnect delay.
pub const MAX_DELAY: Duration = Duration::from_millis(20000);
/// Growth factor applied after each failed attempt.
pub const MULTIPLIER: f64 = 1.5;

/// Reconnect delay policy shared by the browser and command-line clients.
///
/// A clean close waits the current delay. A connection error grows the delay
/// by [`MULTIPLIER`], capped at [`MAX_DELAY`]. A successful connection resets
/// it to [`INITIAL_DELAY`].
#[derive(Debug, Clone)]
pub struct ReconnectBackoff {
    initial: Duration,
    max: Duration,
    multiplier: f64,
    current: Duration,
}

impl ReconnectBackoff {
    pub fn new(initial: Duration, max: Duration, multiplier: f64) -> Self {
        Self {
            initial,
            max,
            multiplier,
            current: initial,
        }
    }

    /// The delay to wait before the next attempt.
    pub fn current(&self) -> Duration {
        self.current
    }

    /// Record a connection error and return the grown delay.
    pub fn on_error(&mut self) -> Duration {
        self.current = self.current.mul_f64(self.multiplier).min(self.max);
        self.current
    }

    /// Record a successful connection.
    pub fn reset(&mut self) {
        self.current = self.initial;
    }
}

impl Default for ReconnectBackoff {
    fn default() -> Self {
        Self::new(INITIAL_DELAY, MAX_DELAY, MULTIPLIER)
    }
}
