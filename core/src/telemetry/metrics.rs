use serde::Serialize;
use std::sync::Mutex;

/// Counters kept by a `SourceScan` over its lifetime.
pub struct ScanMetrics {
    inner: Mutex<MetricsSnapshot>,
}

/// Copy of the counters at one point in time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub grids_built: usize,
    pub cache_hits: usize,
    /// Rebuilds forced by a cache file that failed to load.
    pub cache_rebuilds: usize,
    pub scans: usize,
    pub mechanisms_scored: usize,
}

impl ScanMetrics {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    pub fn record_grid_built(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.grids_built += 1;
        }
    }

    pub fn record_cache_hit(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.cache_hits += 1;
        }
    }

    pub fn record_cache_rebuild(&self) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.cache_rebuilds += 1;
        }
    }

    pub fn record_scan(&self, mechanisms: usize) {
        if let Ok(mut metrics) = self.inner.lock() {
            metrics.scans += 1;
            metrics.mechanisms_scored += mechanisms;
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for ScanMetrics {
    fn default() -> Self {
        Self::new()
    }
}
