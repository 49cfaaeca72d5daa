//! Monotonic time source for the control loop.
//!
//! The suppression behavior is a phase machine with timestamped deadlines
//! rather than in-line delays, so the controller only ever asks "what time is
//! it now". Abstracting that behind a trait lets tests drive the phases
//! without real waiting.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Monotonic milliseconds since an arbitrary start point.
pub trait Clock {
    /// Current time in milliseconds since start.
    fn now_ms(&self) -> u64;
}

/// Wall clock backed by [`Instant`], used by the daemon binary.
pub struct SystemClock {
    start: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// Manually advanced clock for deterministic tests.
///
/// Clones share the same underlying time, so a test can hold one handle and
/// advance it while the component under test holds another.
#[derive(Clone, Default)]
pub struct MockClock {
    current_ms: Arc<AtomicU64>,
}

impl MockClock {
    /// Create a new clock starting at time 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the current time to an absolute value.
    pub fn set(&self, ms: u64) {
        self.current_ms.store(ms, Ordering::Relaxed);
    }

    /// Advance the current time by the given amount.
    pub fn advance(&self, ms: u64) {
        self.current_ms.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for MockClock {
    fn now_ms(&self) -> u64 {
        self.current_ms.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_starts_at_zero() {
        let clock = MockClock::new();
        assert_eq!(clock.now_ms(), 0);
    }

    #[test]
    fn mock_clock_advance_accumulates() {
        let clock = MockClock::new();
        clock.advance(50);
        clock.advance(50);
        assert_eq!(clock.now_ms(), 100);
    }

    #[test]
    fn mock_clock_clones_share_time() {
        let clock = MockClock::new();
        let handle = clock.clone();
        handle.set(5000);
        assert_eq!(clock.now_ms(), 5000);
    }

    #[test]
    fn system_clock_is_monotonic() {
        let clock = SystemClock::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }
}
