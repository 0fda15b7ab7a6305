//! Recommendation drafting from request execution metrics.

use std::time::Duration;
use perftune_core::{
    params, OptimizationConfig, OptimizationRecommendation, OptimizationStrategy, RequestExecutionMetrics, RiskLevel,
};

use crate::collaborators::PredictionModel;
use crate::feedback::LearningStats;

/// Executions required before a request type is considered at all.
pub const MIN_EXECUTIONS: u64 = 10;

/// Average time above which a read-like request is worth caching.
pub const CACHEABLE_AVERAGE: Duration = Duration::from_millis(100);

/// Database calls per execution that suggest batching.
pub const CHATTY_DATABASE_CALLS: f64 = 5.0;

/// Bytes allocated per execution that suggest pooling.
pub const LARGE_ALLOCATION_BYTES: f64 = 1024.0 * 1024.0;

/// External calls per execution that suggest parallelising them.
pub const FAN_OUT_CALLS: f64 = 2.0;

/// Concurrency below which parallel processing has headroom.
pub const LOW_CONCURRENCY: u32 = 4;

/// Upper bound on proposed parallelism.
pub const MAX_PARALLELISM: u32 = 8;

const DEFAULT_HIT_RATE: f64 = 0.6;
const DEFAULT_CACHE_SECS: i64 = 300;

/// Drafts recommendations for a request type.
///
/// Each heuristic proposes at most one strategy. Confidence comes from the
/// prediction model, blended with what feedback has taught so far.
#[derive(Debug, Clone)]
pub struct Recommender {
    config: OptimizationConfig,
}

impl Recommender {
    /// Create a recommender with the given configuration.
    pub fn new(config: OptimizationConfig) -> Self {
        Self { config }
    }

    /// Draft recommendations, most promising first.
    pub fn draft(
        &self,
        request_type: &str,
        metrics: &RequestExecutionMetrics,
        model: &dyn PredictionModel,
        learning: &LearningStats,
    ) -> Vec<OptimizationRecommendation> {
        if metrics.total_executions < MIN_EXECUTIONS {
            return Vec::new();
        }

        let mut drafts: Vec<OptimizationRecommendation> = [
            self.caching(request_type, metrics),
            self.batching(request_type, metrics),
            self.pooling(request_type, metrics),
            self.parallel(request_type, metrics),
            self.database(request_type, metrics),
        ]
        .into_iter()
        .flatten()
        .map(|draft| {
            let confidence = learning.adjust_confidence(draft.strategy, model.predict_confidence(draft.strategy, metrics));
            draft.with_confidence(confidence)
        })
        .collect();

        drafts.sort_by(|a, b| b.estimated_improvement.cmp(&a.estimated_improvement));
        drafts
    }

    fn caching(&self, request_type: &str, metrics: &RequestExecutionMetrics) -> Option<OptimizationRecommendation> {
        if request_type.contains("Command") || metrics.average_execution_time < CACHEABLE_AVERAGE {
            return None;
        }

        Some(
            OptimizationRecommendation::new(request_type, OptimizationStrategy::EnableCaching)
                .with_risk(RiskLevel::Low)
                .with_estimated_improvement(scaled(metrics.average_execution_time, DEFAULT_HIT_RATE))
                .with_parameter(params::REQUEST_TYPE, request_type)
                .with_parameter(params::EXPECTED_HIT_RATE, DEFAULT_HIT_RATE)
                .with_parameter(params::CACHE_DURATION_SECS, DEFAULT_CACHE_SECS)
                .with_reasoning(format!(
                    "Read-like request averaging {:.0}ms",
                    metrics.average_ms()
                )),
        )
    }

    fn batching(&self, request_type: &str, metrics: &RequestExecutionMetrics) -> Option<OptimizationRecommendation> {
        let calls = metrics.database_calls_per_execution();
        if calls < CHATTY_DATABASE_CALLS {
            return None;
        }

        let upper = self.config.max_batch_size.max(2);
        let batch_size = self.config.default_batch_size.clamp(2, upper);
        Some(
            OptimizationRecommendation::new(request_type, OptimizationStrategy::BatchProcessing)
                .with_risk(RiskLevel::Low)
                .with_estimated_improvement(scaled(metrics.average_execution_time, 0.3))
                .with_parameter(params::OPTIMAL_BATCH_SIZE, i64::from(batch_size))
                .with_reasoning(format!("{:.1} database calls per execution", calls)),
        )
    }

    fn pooling(&self, request_type: &str, metrics: &RequestExecutionMetrics) -> Option<OptimizationRecommendation> {
        let per_execution = metrics.memory_per_execution();
        if per_execution < LARGE_ALLOCATION_BYTES {
            return None;
        }

        let threshold = (per_execution / 2.0) as i64;
        Some(
            OptimizationRecommendation::new(request_type, OptimizationStrategy::MemoryPooling)
                .with_risk(RiskLevel::Low)
                .with_estimated_improvement(scaled(metrics.average_execution_time, 0.1))
                .with_parameter(params::MEMORY_THRESHOLD, threshold)
                .with_reasoning(format!("{:.0} KiB allocated per execution", per_execution / 1024.0)),
        )
    }

    fn parallel(&self, request_type: &str, metrics: &RequestExecutionMetrics) -> Option<OptimizationRecommendation> {
        let calls = metrics.external_calls_per_execution();
        if calls < FAN_OUT_CALLS || metrics.concurrent_executions >= LOW_CONCURRENCY {
            return None;
        }

        let parallelism = (calls.ceil() as u32).clamp(2, MAX_PARALLELISM);
        let saving = (1.0 - 1.0 / f64::from(parallelism)) * 0.5;
        Some(
            OptimizationRecommendation::new(request_type, OptimizationStrategy::ParallelProcessing)
                .with_risk(RiskLevel::Medium)
                .with_estimated_improvement(scaled(metrics.average_execution_time, saving))
                .with_parameter(params::MAX_PARALLELISM, i64::from(parallelism))
                .with_reasoning(format!(
                    "{:.1} external calls per execution at concurrency {}",
                    calls, metrics.concurrent_executions
                )),
        )
    }

    fn database(&self, request_type: &str, metrics: &RequestExecutionMetrics) -> Option<OptimizationRecommendation> {
        if metrics.database_calls == 0 || metrics.p95_execution_time < self.config.slow_request_threshold {
            return None;
        }

        Some(
            OptimizationRecommendation::new(request_type, OptimizationStrategy::DatabaseOptimization)
                .with_risk(RiskLevel::Medium)
                .with_estimated_improvement(scaled(metrics.p95_execution_time, 0.25))
                .with_reasoning(format!("p95 of {:.0}ms with database access", metrics.p95_ms())),
        )
    }
}

impl Default for Recommender {
    fn default() -> Self {
        Self::new(OptimizationConfig::default())
    }
}

fn scaled(duration: Duration, factor: f64) -> chrono::Duration {
    let micros = duration.as_secs_f64() * 1_000_000.0 * factor;
    chrono::Duration::microseconds(micros.round() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::ModelInfo;
    use async_trait::async_trait;
    use perftune_core::{MetricSeries, ParamValue, StrategyValidationResult};

    use crate::feedback::OptimizationFeedback;

    struct FixedModel(f64);

    #[async_trait]
    impl PredictionModel for FixedModel {
        fn predict_confidence(&self, _: OptimizationStrategy, _: &RequestExecutionMetrics) -> f64 {
            self.0
        }

        fn prediction_confidence(&self) -> f64 {
            self.0
        }

        async fn update(&self, _: &MetricSeries, _: &[OptimizationFeedback]) -> anyhow::Result<ModelInfo> {
            Ok(ModelInfo { version: "test".to_string(), trained_at: None })
        }
    }

    fn metrics() -> RequestExecutionMetrics {
        RequestExecutionMetrics {
            total_executions: 100,
            successful_executions: 100,
            average_execution_time: Duration::from_millis(20),
            p95_execution_time: Duration::from_millis(40),
            ..Default::default()
        }
    }

    fn strategies(drafts: &[OptimizationRecommendation]) -> Vec<OptimizationStrategy> {
        drafts.iter().map(|d| d.strategy).collect()
    }

    #[test]
    fn test_healthy_request_gets_nothing() {
        let drafts = Recommender::default().draft("GetUserQuery", &metrics(), &FixedModel(0.8), &LearningStats::new());
        assert!(drafts.is_empty());
    }

    #[test]
    fn test_too_few_executions() {
        let mut m = metrics();
        m.total_executions = 5;
        m.average_execution_time = Duration::from_secs(1);
        let drafts = Recommender::default().draft("GetUserQuery", &m, &FixedModel(0.8), &LearningStats::new());
        assert!(drafts.is_empty());
    }

    #[test]
    fn test_slow_query_gets_caching() {
        let mut m = metrics();
        m.average_execution_time = Duration::from_millis(200);
        let drafts = Recommender::default().draft("GetUserQuery", &m, &FixedModel(0.8), &LearningStats::new());

        assert_eq!(strategies(&drafts), vec![OptimizationStrategy::EnableCaching]);
        let caching = &drafts[0];
        assert_eq!(caching.confidence, 0.8);
        assert_eq!(caching.parameter(params::REQUEST_TYPE), Some(&ParamValue::from("GetUserQuery")));
        assert_eq!(caching.estimated_improvement, chrono::Duration::milliseconds(120));
    }

    #[test]
    fn test_commands_are_not_cached() {
        let mut m = metrics();
        m.average_execution_time = Duration::from_millis(200);
        let drafts = Recommender::default().draft("CreateOrderCommand", &m, &FixedModel(0.8), &LearningStats::new());
        assert!(drafts.is_empty());
    }

    #[test]
    fn test_batch_size_clamped_to_config() {
        let mut m = metrics();
        m.database_calls = 1000;
        let config = OptimizationConfig { default_batch_size: 500, max_batch_size: 50, ..Default::default() };

        let drafts = Recommender::new(config).draft("ImportCommand", &m, &FixedModel(0.8), &LearningStats::new());
        assert_eq!(strategies(&drafts), vec![OptimizationStrategy::BatchProcessing]);
        assert_eq!(drafts[0].parameter(params::OPTIMAL_BATCH_SIZE), Some(&ParamValue::Int(50)));
    }

    #[test]
    fn test_multiple_strategies_sorted_by_improvement() {
        let mut m = metrics();
        m.average_execution_time = Duration::from_millis(200);
        m.p95_execution_time = Duration::from_millis(900);
        m.database_calls = 800;
        m.memory_allocated = 400 * 1024 * 1024;
        m.external_api_calls = 300;
        m.concurrent_executions = 1;

        let drafts = Recommender::default().draft("GetReportQuery", &m, &FixedModel(0.8), &LearningStats::new());
        assert_eq!(drafts.len(), 5);
        for pair in drafts.windows(2) {
            assert!(pair[0].estimated_improvement >= pair[1].estimated_improvement);
        }
        let parallel = drafts
            .iter()
            .find(|d| d.strategy == OptimizationStrategy::ParallelProcessing)
            .unwrap();
        assert_eq!(parallel.parameter(params::MAX_PARALLELISM), Some(&ParamValue::Int(3)));
    }

    #[test]
    fn test_learning_adjusts_confidence() {
        let mut m = metrics();
        m.average_execution_time = Duration::from_millis(200);
        let mut learning = LearningStats::new();
        for _ in 0..5 {
            learning.record(&StrategyValidationResult {
                strategy: OptimizationStrategy::EnableCaching,
                was_successful: false,
                actual_improvement: chrono::Duration::zero(),
                performance_gain: -0.1,
            });
        }

        let drafts = Recommender::default().draft("GetUserQuery", &m, &FixedModel(0.8), &learning);
        assert!(drafts[0].confidence < 0.7);
    }
}
