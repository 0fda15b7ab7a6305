//! In-memory time-series store.
//!
//! Keeps a bounded, time-ordered `VecDeque` per metric. Once a metric holds
//! `max_samples` samples, every new write evicts the oldest one.

use std::collections::{HashMap, VecDeque};
use async_trait::async_trait;
use perftune_core::{MetricSample, MetricSeries, Time};
use tokio::sync::RwLock;
use super::{Result, StorageError, TimeSeriesStore};

/// Bounded in-memory time-series store.
pub struct InMemoryTimeSeriesStore {
    max_samples: usize,
    series: RwLock<HashMap<String, VecDeque<MetricSample>>>,
}

impl InMemoryTimeSeriesStore {
    /// Create a store keeping at most `max_samples` samples per metric.
    ///
    /// A capacity of zero is treated as one.
    pub fn new(max_samples: usize) -> Self {
        Self {
            max_samples: max_samples.max(1),
            series: RwLock::new(HashMap::new()),
        }
    }

    /// Per-metric capacity.
    pub fn max_samples(&self) -> usize {
        self.max_samples
    }

    /// Total samples across all metrics.
    pub async fn total_samples(&self) -> usize {
        self.series.read().await.values().map(VecDeque::len).sum()
    }
}

impl Default for InMemoryTimeSeriesStore {
    fn default() -> Self {
        Self::new(10_000)
    }
}

#[async_trait]
impl TimeSeriesStore for InMemoryTimeSeriesStore {
    async fn record_at(&self, name: &str, timestamp: Time, value: f64) -> Result<()> {
        if name.is_empty() {
            return Err(StorageError::InvalidMetricName(name.to_string()));
        }
        if value.is_nan() {
            return Err(StorageError::NotANumber(name.to_string()));
        }

        let mut series = self.series.write().await;
        let samples = series
            .entry(name.to_string())
            .or_insert_with(|| VecDeque::with_capacity(self.max_samples.min(1024)));

        let sample = MetricSample::new(timestamp, value);
        match samples.back() {
            Some(last) if last.timestamp > timestamp => {
                // Late arrival: keep the deque ordered by time
                let at = samples.partition_point(|s| s.timestamp <= timestamp);
                samples.insert(at, sample);
            }
            _ => samples.push_back(sample),
        }

        while samples.len() > self.max_samples {
            samples.pop_front();
        }
        Ok(())
    }

    async fn range(&self, name: &str, from: Time, to: Time) -> Result<Vec<MetricSample>> {
        if from > to {
            return Err(StorageError::InvalidRange { from, to });
        }
        let series = self.series.read().await;
        Ok(series
            .get(name)
            .map(|samples| {
                samples
                    .iter()
                    .filter(|s| s.timestamp >= from && s.timestamp <= to)
                    .copied()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn latest(&self, name: &str) -> Option<MetricSample> {
        self.series.read().await.get(name).and_then(|s| s.back().copied())
    }

    async fn len(&self, name: &str) -> usize {
        self.series.read().await.get(name).map_or(0, VecDeque::len)
    }

    async fn metric_names(&self) -> Vec<String> {
        let series = self.series.read().await;
        let mut names: Vec<String> = series
            .iter()
            .filter(|(_, samples)| !samples.is_empty())
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    async fn history_span(&self) -> Option<chrono::Duration> {
        let series = self.series.read().await;
        let oldest = series.values().filter_map(|s| s.front()).map(|s| s.timestamp).min()?;
        let newest = series.values().filter_map(|s| s.back()).map(|s| s.timestamp).max()?;
        Some(newest - oldest)
    }

    async fn snapshot(&self) -> MetricSeries {
        self.series
            .read()
            .await
            .iter()
            .map(|(name, samples)| (name.clone(), samples.iter().copied().collect()))
            .collect()
    }

    async fn clear(&self) {
        self.series.write().await.clear();
    }
}
