use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Half-open creation-time window `[start, end)` in Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: i64,
    pub end: i64,
}

impl TimeWindow {
    pub fn new(start: i64, end: i64) -> Self {
        Self { start, end }
    }

    pub fn from_datetimes(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self::new(start.timestamp(), end.timestamp())
    }

    /// A window that admits every timestamp.
    pub fn unbounded() -> Self {
        Self::new(i64::MIN, i64::MAX)
    }

    pub fn is_after_end(&self, timestamp: i64) -> bool {
        timestamp >= self.end
    }

    pub fn is_before_start(&self, timestamp: i64) -> bool {
        timestamp < self.start
    }

    pub fn contains(&self, timestamp: i64) -> bool {
        !self.is_before_start(timestamp) && !self.is_after_end(timestamp)
    }
}

impl Default for TimeWindow {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_is_half_open() {
        let window = TimeWindow::new(100, 200);
        assert!(window.contains(100));
        assert!(window.contains(199));
        assert!(!window.contains(200));
        assert!(!window.contains(99));
        assert!(window.is_after_end(200));
        assert!(window.is_before_start(99));
    }

    #[test]
    fn test_unbounded_window_admits_everything() {
        let window = TimeWindow::unbounded();
        assert!(window.contains(0));
        assert!(window.contains(1_716_718_910));
        assert!(window.contains(-5));
    }
}
