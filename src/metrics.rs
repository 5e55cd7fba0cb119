//! Query statistics
//!
//! Counters are plain atomics so they can be bumped from concurrent shard
//! fetches without locking. With the `metrics` feature every update is also
//! forwarded to the `metrics` facade.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;

/// Performance metrics collector for the query path
#[derive(Debug)]
pub struct QueryMetrics {
    // Request counts
    /// Number of time-series queries
    query_count: AtomicUsize,
    /// Number of snapshot lookups
    snapshot_count: AtomicUsize,
    /// Number of requests rejected before any I/O
    rejected_count: AtomicUsize,
    /// Number of requests that failed on the backend
    failed_count: AtomicUsize,

    // Shard metrics
    /// Number of shard reads issued
    shard_fetches: AtomicUsize,
    /// Number of shard reads that failed
    shard_failures: AtomicUsize,
    /// Number of cells decoded into samples
    records_decoded: AtomicUsize,
    /// Number of cells skipped as corrupt
    records_skipped: AtomicUsize,

    // Timing metrics
    /// Total query duration in nanoseconds
    query_duration_ns: AtomicU64,
    /// Total shard read duration in nanoseconds
    fetch_duration_ns: AtomicU64,

    /// Start time of the metrics collector
    start_time: Instant,
    /// Whether updates are recorded at all
    enabled: bool,
}

impl Default for QueryMetrics {
    fn default() -> Self {
        Self::new()
    }
}

impl QueryMetrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            query_count: AtomicUsize::new(0),
            snapshot_count: AtomicUsize::new(0),
            rejected_count: AtomicUsize::new(0),
            failed_count: AtomicUsize::new(0),
            shard_fetches: AtomicUsize::new(0),
            shard_failures: AtomicUsize::new(0),
            records_decoded: AtomicUsize::new(0),
            records_skipped: AtomicUsize::new(0),
            query_duration_ns: AtomicU64::new(0),
            fetch_duration_ns: AtomicU64::new(0),
            start_time: Instant::now(),
            enabled: true,
        }
    }

    /// Create a collector that records only when `enabled` is set
    pub fn with_enabled(enabled: bool) -> Self {
        Self { enabled, ..Self::new() }
    }

    /// Check whether updates are recorded
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Increment query count
    pub fn increment_queries(&self) {
        if !self.enabled {
            return;
        }
        self.query_count.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::increment_counter!("gator_queries_total");
    }

    /// Increment snapshot count
    pub fn increment_snapshots(&self) {
        if !self.enabled {
            return;
        }
        self.snapshot_count.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::increment_counter!("gator_snapshots_total");
    }

    /// Record a request rejected by validation
    pub fn increment_rejected(&self) {
        if !self.enabled {
            return;
        }
        self.rejected_count.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::increment_counter!("gator_rejected_total");
    }

    /// Record a request that failed on the backend
    pub fn increment_failed(&self) {
        if !self.enabled {
            return;
        }
        self.failed_count.fetch_add(1, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::increment_counter!("gator_failed_total");
    }

    /// Record one shard read and how long it took
    pub fn record_fetch(&self, duration: Duration, ok: bool) {
        if !self.enabled {
            return;
        }
        self.shard_fetches.fetch_add(1, Ordering::Relaxed);
        self.fetch_duration_ns.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        if !ok {
            self.shard_failures.fetch_add(1, Ordering::Relaxed);
        }
        #[cfg(feature = "metrics")]
        {
            metrics::increment_counter!("gator_shard_fetches_total");
            metrics::histogram!("gator_shard_fetch_seconds", duration.as_secs_f64());
            if !ok {
                metrics::increment_counter!("gator_shard_failures_total");
            }
        }
    }

    /// Add decoded and skipped cell counts
    pub fn add_records(&self, decoded: usize, skipped: usize) {
        if !self.enabled {
            return;
        }
        self.records_decoded.fetch_add(decoded, Ordering::Relaxed);
        self.records_skipped.fetch_add(skipped, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        {
            metrics::counter!("gator_records_decoded_total", decoded as u64);
            metrics::counter!("gator_records_skipped_total", skipped as u64);
        }
    }

    /// Record a query duration
    pub fn record_query_duration(&self, duration: Duration) {
        if !self.enabled {
            return;
        }
        self.query_duration_ns.fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
        #[cfg(feature = "metrics")]
        metrics::histogram!("gator_query_seconds", duration.as_secs_f64());
    }

    /// Get number of time-series queries
    pub fn get_query_count(&self) -> usize {
        self.query_count.load(Ordering::Relaxed)
    }

    /// Get number of snapshot lookups
    pub fn get_snapshot_count(&self) -> usize {
        self.snapshot_count.load(Ordering::Relaxed)
    }

    /// Get number of rejected requests
    pub fn get_rejected_count(&self) -> usize {
        self.rejected_count.load(Ordering::Relaxed)
    }

    /// Get number of failed requests
    pub fn get_failed_count(&self) -> usize {
        self.failed_count.load(Ordering::Relaxed)
    }

    /// Get number of shard reads
    pub fn get_shard_fetches(&self) -> usize {
        self.shard_fetches.load(Ordering::Relaxed)
    }

    /// Get number of failed shard reads
    pub fn get_shard_failures(&self) -> usize {
        self.shard_failures.load(Ordering::Relaxed)
    }

    /// Get number of decoded cells
    pub fn get_records_decoded(&self) -> usize {
        self.records_decoded.load(Ordering::Relaxed)
    }

    /// Get number of skipped cells
    pub fn get_records_skipped(&self) -> usize {
        self.records_skipped.load(Ordering::Relaxed)
    }

    /// Get total query duration
    pub fn get_query_duration(&self) -> Duration {
        Duration::from_nanos(self.query_duration_ns.load(Ordering::Relaxed))
    }

    /// Get total shard read duration
    pub fn get_fetch_duration(&self) -> Duration {
        Duration::from_nanos(self.fetch_duration_ns.load(Ordering::Relaxed))
    }

    /// Get uptime of the metrics collector
    pub fn get_uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Take a serializable copy of the counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        let queries = self.get_query_count();
        let fetches = self.get_shard_fetches();

        MetricsSnapshot {
            uptime_secs: self.get_uptime().as_secs(),
            queries,
            snapshots: self.get_snapshot_count(),
            rejected: self.get_rejected_count(),
            failed: self.get_failed_count(),
            shard_fetches: fetches,
            shard_failures: self.get_shard_failures(),
            records_decoded: self.get_records_decoded(),
            records_skipped: self.get_records_skipped(),
            avg_query_micros: if queries == 0 {
                0
            } else {
                (self.get_query_duration().as_micros() / queries as u128) as u64
            },
            avg_fetch_micros: if fetches == 0 {
                0
            } else {
                (self.get_fetch_duration().as_micros() / fetches as u128) as u64
            },
        }
    }

    /// Reset all counters
    pub fn reset(&self) {
        self.query_count.store(0, Ordering::Relaxed);
        self.snapshot_count.store(0, Ordering::Relaxed);
        self.rejected_count.store(0, Ordering::Relaxed);
        self.failed_count.store(0, Ordering::Relaxed);
        self.shard_fetches.store(0, Ordering::Relaxed);
        self.shard_failures.store(0, Ordering::Relaxed);
        self.records_decoded.store(0, Ordering::Relaxed);
        self.records_skipped.store(0, Ordering::Relaxed);
        self.query_duration_ns.store(0, Ordering::Relaxed);
        self.fetch_duration_ns.store(0, Ordering::Relaxed);
    }

    /// Get a report of all metrics
    pub fn get_report(&self) -> String {
        let s = self.snapshot();
        let mut report = String::new();

        report.push_str("=== Gator Query Metrics ===\n\n");
        report.push_str(&format!("Uptime: {}s\n\n", s.uptime_secs));

        report.push_str("Requests:\n");
        report.push_str(&format!("  Queries: {}\n", s.queries));
        report.push_str(&format!("  Snapshots: {}\n", s.snapshots));
        report.push_str(&format!("  Rejected: {}\n", s.rejected));
        report.push_str(&format!("  Failed: {}\n\n", s.failed));

        report.push_str("Shards:\n");
        report.push_str(&format!("  Fetches: {}\n", s.shard_fetches));
        report.push_str(&format!("  Failures: {}\n", s.shard_failures));
        report.push_str(&format!("  Records Decoded: {}\n", s.records_decoded));
        report.push_str(&format!("  Records Skipped: {}\n\n", s.records_skipped));

        report.push_str("Performance:\n");
        report.push_str(&format!("  Avg. Query Time: {}µs\n", s.avg_query_micros));
        report.push_str(&format!("  Avg. Fetch Time: {}µs\n", s.avg_fetch_micros));

        report
    }
}

/// Point-in-time copy of [`QueryMetrics`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub uptime_secs: u64,
    pub queries: usize,
    pub snapshots: usize,
    pub rejected: usize,
    pub failed: usize,
    pub shard_fetches: usize,
    pub shard_failures: usize,
    pub records_decoded: usize,
    pub records_skipped: usize,
    pub avg_query_micros: u64,
    pub avg_fetch_micros: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_collector_records_nothing() {
        let metrics = QueryMetrics::with_enabled(false);
        assert!(!metrics.is_enabled());

        metrics.increment_queries();
        metrics.record_fetch(Duration::from_millis(3), false);
        metrics.add_records(5, 1);

        assert_eq!(metrics.get_query_count(), 0);
        assert_eq!(metrics.get_shard_fetches(), 0);
        assert_eq!(metrics.get_records_decoded(), 0);
    }

    #[test]
    fn test_counters() {
        let metrics = QueryMetrics::new();

        metrics.increment_queries();
        metrics.increment_snapshots();
        metrics.increment_rejected();
        metrics.record_fetch(Duration::from_millis(2), true);
        metrics.record_fetch(Duration::from_millis(4), false);
        metrics.add_records(10, 2);
        metrics.record_query_duration(Duration::from_millis(8));

        let s = metrics.snapshot();
        assert_eq!(s.queries, 1);
        assert_eq!(s.snapshots, 1);
        assert_eq!(s.rejected, 1);
        assert_eq!(s.shard_fetches, 2);
        assert_eq!(s.shard_failures, 1);
        assert_eq!(s.records_decoded, 10);
        assert_eq!(s.records_skipped, 2);
        assert_eq!(s.avg_fetch_micros, 3000);
        assert_eq!(s.avg_query_micros, 8000);
    }

    #[test]
    fn test_reset() {
        let metrics = QueryMetrics::new();
        metrics.increment_queries();
        metrics.add_records(3, 1);
        metrics.reset();

        let s = metrics.snapshot();
        assert_eq!(s.queries, 0);
        assert_eq!(s.records_decoded, 0);
        assert_eq!(s.avg_query_micros, 0);
    }

    #[test]
    fn test_report() {
        let metrics = QueryMetrics::new();
        metrics.increment_failed();

        let report = metrics.get_report();
        assert!(report.contains("Requests:"));
        assert!(report.contains("Failed: 1"));
        assert!(report.contains("Shards:"));
    }
}
