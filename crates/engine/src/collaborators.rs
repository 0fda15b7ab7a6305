//! External collaborators the engine consumes.
//!
//! Each trait is a narrow contract so that tests and embedding applications
//! can plug in their own implementations.

use std::collections::HashMap;
use async_trait::async_trait;
use perftune_core::{LoadPatternData, MetricSeries, OptimizationStrategy, RequestExecutionMetrics, Time};
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

use crate::feedback::OptimizationFeedback;

/// Latest value of each named metric.
pub type MetricValues = HashMap<String, f64>;

/// Supplies raw metrics produced by the request dispatch layer.
#[async_trait]
pub trait MetricsAggregator: Send + Sync {
    /// Latest buffered series, without triggering a collection.
    ///
    /// A non-blocking read for embedders such as dashboards. The engine's
    /// scheduled collection always goes through
    /// [`collect_all_metrics`](Self::collect_all_metrics).
    fn latest_metrics(&self) -> MetricSeries;

    /// Collect every metric series.
    async fn collect_all_metrics(&self, cancel: &CancellationToken) -> anyhow::Result<MetricSeries>;

    /// Per-request-type execution snapshots.
    async fn request_metrics(&self) -> anyhow::Result<HashMap<String, RequestExecutionMetrics>>;
}

/// Turns raw metric values into an overall health score.
#[async_trait]
pub trait HealthScorer: Send + Sync {
    /// Overall score in [0, 1].
    async fn calculate_score(&self, values: &MetricValues, cancel: &CancellationToken) -> anyhow::Result<f64>;
}

/// Classifies the current load.
#[async_trait]
pub trait SystemAnalyzer: Send + Sync {
    /// Analyze load patterns from raw metric values.
    async fn analyze_load_patterns(
        &self,
        values: &MetricValues,
        cancel: &CancellationToken,
    ) -> anyhow::Result<LoadPatternData>;
}

/// Fire-and-forget sink for engine-computed metrics.
pub trait MetricsPublisher: Send + Sync {
    /// Publish one value.
    fn publish(&self, name: &str, value: f64);
}

/// Publisher that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopPublisher;

impl MetricsPublisher for NoopPublisher {
    fn publish(&self, _name: &str, _value: f64) {}
}

/// Version metadata of the prediction model. Opaque to the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    /// Model version
    pub version: String,
    /// When the model was last trained
    pub trained_at: Option<Time>,
}

/// The confidence model, treated as a black box.
#[async_trait]
pub trait PredictionModel: Send + Sync {
    /// Confidence that `strategy` helps a request with these metrics.
    fn predict_confidence(&self, strategy: OptimizationStrategy, metrics: &RequestExecutionMetrics) -> f64;

    /// Confidence of the model's forward-looking predictions.
    fn prediction_confidence(&self) -> f64;

    /// Retrain from history and verified feedback.
    async fn update(&self, history: &MetricSeries, feedback: &[OptimizationFeedback]) -> anyhow::Result<ModelInfo>;
}
