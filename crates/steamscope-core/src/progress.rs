use std::collections::HashMap;
use std::time::Instant;
use tracing::{info, warn};

/// Counts per-app session results during a batch scrape and logs periodic
/// progress plus a final summary.
pub struct ProgressTracker {
    total: usize,
    scraped: usize,
    empty: usize,
    failed: usize,
    reviews: usize,
    start_time: Instant,
    progress_interval: usize,
    last_progress_log: usize,
    error_counts: HashMap<String, usize>,
}

impl ProgressTracker {
    /// # Arguments
    /// * `total` - Number of apps to scrape
    /// * `progress_interval` - Log progress every N apps
    pub fn new(total: usize, progress_interval: usize) -> Self {
        if total > 10 || progress_interval < total {
            info!("Starting scrape: {} apps to process", total);
        }
        Self {
            total,
            scraped: 0,
            empty: 0,
            failed: 0,
            reviews: 0,
            start_time: Instant::now(),
            progress_interval: progress_interval.max(1),
            last_progress_log: 0,
            error_counts: HashMap::new(),
        }
    }

    /// Record an app whose session produced `reviews` records
    pub fn record_scraped(&mut self, reviews: usize) {
        if reviews == 0 {
            self.empty += 1;
        } else {
            self.scraped += 1;
        }
        self.reviews += reviews;
    }

    /// Record an app whose session ended in a failure. Partial results still
    /// count towards the review total.
    pub fn record_failed_with_error(&mut self, error_category: &str, partial_reviews: usize) {
        self.failed += 1;
        self.reviews += partial_reviews;
        *self.error_counts.entry(error_category.to_string()).or_insert(0) += 1;
    }

    pub fn failed(&self) -> usize {
        self.failed
    }

    pub fn reviews(&self) -> usize {
        self.reviews
    }

    /// # Arguments
    /// * `current` - 1-based index of the app just processed
    pub fn log_progress(&mut self, current: usize) {
        if current - self.last_progress_log >= self.progress_interval || current == self.total {
            let elapsed = self.start_time.elapsed().as_secs_f64();
            let rate = if elapsed > 0.0 { current as f64 / elapsed } else { 0.0 };

            info!(
                "Progress: {}/{} ({:.2} apps/sec) | Scraped: {} | Empty: {} | Failed: {} | Reviews: {}",
                current, self.total, rate, self.scraped, self.empty, self.failed, self.reviews
            );
            self.last_progress_log = current;
        }
    }

    pub fn log_summary(&self, operation_name: &str) {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        if self.failed > 0 {
            warn!(
                "{} completed: {} apps in {:.1}s | Scraped: {} | Empty: {} | Failed: {} | Reviews: {}",
                operation_name, self.total, elapsed, self.scraped, self.empty, self.failed, self.reviews
            );

            let mut error_entries: Vec<_> = self.error_counts.iter().collect();
            error_entries.sort_by(|a, b| b.1.cmp(a.1).then_with(|| a.0.cmp(b.0)));
            let error_summary: Vec<String> = error_entries
                .iter()
                .map(|(category, count)| format!("{}: {}", category, count))
                .collect();
            info!("Error breakdown: {}", error_summary.join(", "));
        } else {
            info!(
                "{} completed: {} apps in {:.1}s | Scraped: {} | Empty: {} | Reviews: {}",
                operation_name, self.total, elapsed, self.scraped, self.empty, self.reviews
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts() {
        let mut tracker = ProgressTracker::new(3, 1);
        tracker.record_scraped(10);
        tracker.record_scraped(0);
        tracker.record_failed_with_error("transport", 2);
        tracker.log_progress(3);
        tracker.log_summary("Scrape");

        assert_eq!(tracker.failed(), 1);
        assert_eq!(tracker.reviews(), 12);
        assert_eq!(tracker.empty, 1);
        assert_eq!(tracker.scraped, 1);
    }
}
