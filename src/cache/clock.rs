//! Time source for entry timestamps and expiry checks.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Supplies "now" as epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u64;

    /// "Now" as a [`SystemTime`], for comparison against file mtimes.
    fn now_system(&self) -> SystemTime {
        UNIX_EPOCH + Duration::from_millis(self.now_millis())
    }
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }
}

/// Manually advanced clock for simulating the passage of time.
///
/// Starts at the current wall-clock time so freshly written file mtimes are
/// not in its future.
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::at(SystemClock.now_millis())
    }

    pub fn at(millis: u64) -> Self {
        Self {
            now: AtomicU64::new(millis),
        }
    }

    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::at(1_000);
        clock.advance(Duration::from_secs(2));
        assert_eq!(clock.now_millis(), 3_000);
        assert_eq!(clock.now_system(), UNIX_EPOCH + Duration::from_millis(3_000));
    }

    #[test]
    fn test_manual_clock_starts_near_wall_clock() {
        let before = SystemClock.now_millis();
        let clock = ManualClock::new();
        assert!(clock.now_millis() >= before);
    }
}
