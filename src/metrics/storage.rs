//! Metric series storage keyed by fingerprint

use crate::metrics::types::MetricSeries;
use ahash::AHashMap;

/// Time series per fingerprint. Not synchronized; the coordinator owns the lock.
#[derive(Debug, Default)]
pub struct MetricStore {
    series: AHashMap<String, MetricSeries>,
}

impl MetricStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point, creating the series on first use
    pub fn record(&mut self, fingerprint: &str, timestamp: u64, value: f64) {
        match self.series.get_mut(fingerprint) {
            Some(series) => series.push(timestamp, value),
            None => {
                let mut series = MetricSeries::default();
                series.push(timestamp, value);
                self.series.insert(fingerprint.to_string(), series);
            },
        }
    }

    /// Every known fingerprint, unordered
    pub fn series_names(&self) -> Vec<String> {
        self.series.keys().cloned().collect()
    }

    /// Snapshot of one series
    pub fn series(&self, fingerprint: &str) -> Option<MetricSeries> {
        self.series.get(fingerprint).cloned()
    }

    /// Number of distinct series
    pub fn len(&self) -> usize {
        self.series.len()
    }

    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}
