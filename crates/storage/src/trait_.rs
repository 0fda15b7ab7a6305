//! Time-series store trait abstraction.

use async_trait::async_trait;
use perftune_core::{MetricSample, MetricSeries, Time};

/// Error type for storage operations.
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during storage operations.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum StorageError {
    /// Metric names must be non-empty
    #[error("Invalid metric name: {0:?}")]
    InvalidMetricName(String),

    /// NaN cannot be ordered or aggregated
    #[error("Metric {0} received a NaN value")]
    NotANumber(String),

    /// Query range end precedes its start
    #[error("Invalid range: {from} is after {to}")]
    InvalidRange {
        /// Range start
        from: Time,
        /// Range end
        to: Time,
    },
}

/// Bounded rolling history of named numeric metrics.
///
/// Implementations must tolerate concurrent writers and never hold more than
/// their configured number of samples per metric.
#[async_trait]
pub trait TimeSeriesStore: Send + Sync {
    /// Append a sample stamped with the current time.
    async fn record(&self, name: &str, value: f64) -> Result<()> {
        self.record_at(name, chrono::Utc::now(), value).await
    }

    /// Append a sample with an explicit timestamp.
    async fn record_at(&self, name: &str, timestamp: Time, value: f64) -> Result<()>;

    /// Samples of `name` with `from <= timestamp <= to`, oldest first.
    async fn range(&self, name: &str, from: Time, to: Time) -> Result<Vec<MetricSample>>;

    /// Most recent sample of `name`.
    async fn latest(&self, name: &str) -> Option<MetricSample>;

    /// Number of samples held for `name`.
    async fn len(&self, name: &str) -> usize;

    /// Names of all metrics with at least one sample.
    async fn metric_names(&self) -> Vec<String>;

    /// Time between the oldest and newest sample across all metrics.
    async fn history_span(&self) -> Option<chrono::Duration>;

    /// Copy of every series.
    async fn snapshot(&self) -> MetricSeries;

    /// Drop all samples.
    async fn clear(&self);
}
