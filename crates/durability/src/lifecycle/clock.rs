//! Injectable time source for retention decisions

use chrono::{DateTime, Duration, Utc};

/// Source of "now" for lifecycle passes
pub trait Clock: Send + Sync {
    /// Returns the current time
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock pinned to a chosen instant
#[derive(Debug, Clone)]
pub struct MockClock {
    /// Time returned by `now`
    pub current_time: DateTime<Utc>,
}

impl MockClock {
    /// Create a mock clock at `time`
    pub fn new(time: DateTime<Utc>) -> Self {
        Self { current_time: time }
    }

    /// Create a mock clock at 2026-01-15 12:00:00 UTC
    pub fn fixed() -> Self {
        Self {
            current_time: DateTime::<Utc>::from_timestamp(1_768_478_400, 0).unwrap_or_default(),
        }
    }

    /// Move the clock forward
    pub fn advance(&mut self, duration: Duration) {
        self.current_time += duration;
    }
}

impl Clock for MockClock {
    fn now(&self) -> DateTime<Utc> {
        self.current_time
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_time() {
        let clock = MockClock::fixed();
        assert_eq!(clock.now().to_rfc3339(), "2026-01-15T12:00:00+00:00");
    }

    #[test]
    fn test_advance() {
        let mut clock = MockClock::fixed();
        let before = clock.now();
        clock.advance(Duration::days(3));
        assert_eq!(clock.now() - before, Duration::days(3));
    }

    #[test]
    fn test_system_clock_moves() {
        let a = SystemClock.now();
        let b = SystemClock.now();
        assert!(b >= a);
    }
}
