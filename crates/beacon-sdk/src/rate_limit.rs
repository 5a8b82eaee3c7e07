//! Sliding-window rate limiter.
//!
//! Caps the total number of accepted errors per trailing window,
//! independent of fingerprint and checked after deduplication.

use std::collections::VecDeque;

/// Maximum accepted errors per window.
pub const RATE_LIMIT_MAX: usize = 20;

/// Trailing window over which acceptances are counted.
pub const RATE_LIMIT_WINDOW_MS: u64 = 60_000;

/// Ordered acceptance timestamps within the trailing window.
///
/// Timestamps are appended in call order, so the queue is non-decreasing
/// and expired entries can be pruned from the front.
#[derive(Debug)]
pub struct RateWindow {
    window_ms: u64,
    max: usize,
    accepted: VecDeque<u64>,
}

impl RateWindow {
    /// Create a window with the default limits.
    #[must_use]
    pub fn new() -> Self {
        Self::with_limits(RATE_LIMIT_WINDOW_MS, RATE_LIMIT_MAX)
    }

    /// Create a window with explicit limits.
    #[must_use]
    pub fn with_limits(window_ms: u64, max: usize) -> Self {
        Self {
            window_ms,
            max,
            accepted: VecDeque::new(),
        }
    }

    /// Decide whether a capture at `now_ms` should be rate limited.
    ///
    /// Prunes timestamps strictly older than `now_ms - window`, then
    /// returns `true` (limited, `now_ms` not recorded) when the window is
    /// full, or records `now_ms` and returns `false`.
    pub fn should_limit(&mut self, now_ms: u64) -> bool {
        let cutoff = now_ms.saturating_sub(self.window_ms);
        while self.accepted.front().is_some_and(|&t| t < cutoff) {
            self.accepted.pop_front();
        }

        if self.accepted.len() >= self.max {
            return true;
        }

        self.accepted.push_back(now_ms);
        false
    }

    /// Number of acceptances currently recorded.
    #[must_use]
    pub fn len(&self) -> usize {
        self.accepted.len()
    }

    /// Whether no acceptances are recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accepted.is_empty()
    }
}

impl Default for RateWindow {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_up_to_the_cap_then_limits() {
        let mut window = RateWindow::new();
        for i in 0..RATE_LIMIT_MAX as u64 {
            assert!(!window.should_limit(i), "capture {i} should pass");
        }
        assert!(window.should_limit(RATE_LIMIT_MAX as u64));
        assert_eq!(window.len(), RATE_LIMIT_MAX);
    }

    #[test]
    fn limited_captures_are_not_recorded() {
        let mut window = RateWindow::with_limits(60_000, 2);
        assert!(!window.should_limit(0));
        assert!(!window.should_limit(1));
        assert!(window.should_limit(2));
        assert_eq!(window.len(), 2);
    }

    #[test]
    fn capacity_frees_as_the_window_rolls_past() {
        let mut window = RateWindow::with_limits(60_000, 3);
        assert!(!window.should_limit(0));
        assert!(!window.should_limit(10));
        assert!(!window.should_limit(20));
        assert!(window.should_limit(30));
        // At 60_000 the cutoff is 0 and nothing is strictly older.
        assert!(window.should_limit(60_000));
        // At 60_011 the entries at 0 and 10 have expired.
        assert!(!window.should_limit(60_011));
        assert!(!window.should_limit(60_012));
        assert!(window.should_limit(60_013));
    }
}
