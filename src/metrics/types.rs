//! Metric series types

/// Points recorded for one fingerprint, as parallel timestamp/value columns.
///
/// Append-only; repeated timestamps are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricSeries {
    /// Unix nanoseconds
    pub timestamps: Vec<u64>,
    pub values: Vec<f64>,
}

impl MetricSeries {
    pub fn push(&mut self, timestamp: u64, value: f64) {
        self.timestamps.push(timestamp);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Most recent point by arrival
    pub fn last(&self) -> Option<(u64, f64)> {
        Some((*self.timestamps.last()?, *self.values.last()?))
    }

    /// Iterate `(timestamp, value)` pairs in arrival order
    pub fn points(&self) -> impl Iterator<Item = (u64, f64)> + '_ {
        self.timestamps.iter().copied().zip(self.values.iter().copied())
    }
}

/// A scalar point extracted from an OTLP metric, ready to be recorded
#[derive(Debug, Clone, PartialEq)]
pub struct MetricPoint {
    pub fingerprint: String,
    pub timestamp: u64,
    pub value: f64,
}
