//! The optimization engine - observe, analyze, recommend, validate, learn.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use perftune_core::{
    ConfigError, OptimizationConfig, OptimizationRecommendation, OptimizationStrategy, OptimizationValidationResult,
    RequestExecutionMetrics, SystemHealthValidationResult, SystemPerformanceInsights, ValidationResult,
};
use perftune_storage::{hour_of_day_key, InMemoryTimeSeriesStore, RollingWindowCache, TimeSeriesStore};
use perftune_validation::{OptimizationValidator, ValidationError, ValidationFramework};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::collaborators::{
    HealthScorer, MetricValues, MetricsAggregator, MetricsPublisher, ModelInfo, PredictionModel, SystemAnalyzer,
};
use crate::feedback::{LearningStats, OptimizationFeedback, StrategyStats};
use crate::insights::{self, InsightInputs};
use crate::recommender::Recommender;
use crate::scheduler::{spawn_periodic, SkipReason, TickGuard, TickOutcome};

/// Verified outcomes kept for model retraining.
pub const MAX_FEEDBACK: usize = 1000;

/// Deviation from the mean window count that marks a seasonal pattern.
pub const SEASONAL_THRESHOLD: f64 = 0.25;

/// Error type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;

/// Errors surfaced by engine entry points.
///
/// Scheduled ticks never return these; they report [`TickOutcome::Failed`].
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The engine has been disposed
    #[error("optimization engine has been disposed")]
    Disposed,

    /// `start` was called twice
    #[error("optimization engine already started")]
    AlreadyStarted,

    /// No metrics exist for the request type
    #[error("no metrics for request type {0}")]
    UnknownRequestType(String),

    /// The configuration is inconsistent
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Validation failed or was cancelled
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A collaborator failed
    #[error(transparent)]
    Collaborator(#[from] anyhow::Error),
}

/// Collaborators the engine is wired to.
#[derive(Clone)]
pub struct Collaborators {
    /// Source of raw metrics
    pub aggregator: Arc<dyn MetricsAggregator>,
    /// Overall health scorer
    pub scorer: Arc<dyn HealthScorer>,
    /// Load classifier
    pub analyzer: Arc<dyn SystemAnalyzer>,
    /// Confidence model
    pub model: Arc<dyn PredictionModel>,
    /// Sink for engine-computed metrics
    pub publisher: Arc<dyn MetricsPublisher>,
}

/// A drafted recommendation together with its gate decision.
#[derive(Debug, Clone, PartialEq)]
pub struct GatedRecommendation {
    /// The drafted recommendation
    pub recommendation: OptimizationRecommendation,
    /// Validation outcome
    pub validation: ValidationResult,
    /// Whether validation let it through
    pub approved: bool,
    /// Whether it may be applied without sign-off
    pub auto_apply: bool,
}

/// Snapshot of engine counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineStats {
    /// Completed model updates
    pub model_updates: u64,
    /// Failed model updates
    pub model_update_failures: u64,
    /// Completed metrics collections
    pub metrics_collections: u64,
    /// Failed metrics collections
    pub metrics_collection_failures: u64,
    /// Ticks that returned early
    pub skipped_ticks: u64,
    /// Recommendations drafted
    pub recommendations_drafted: u64,
    /// Recommendations that passed validation
    pub recommendations_approved: u64,
    /// Strategy outcomes learned from
    pub feedback_recorded: u64,
}

#[derive(Default)]
struct Counters {
    model_updates: AtomicU64,
    model_update_failures: AtomicU64,
    metrics_collections: AtomicU64,
    metrics_collection_failures: AtomicU64,
    skipped_ticks: AtomicU64,
    recommendations_drafted: AtomicU64,
    recommendations_approved: AtomicU64,
    feedback_recorded: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64, by: u64) {
        counter.fetch_add(by, Ordering::Relaxed);
    }

    fn snapshot(&self) -> EngineStats {
        EngineStats {
            model_updates: self.model_updates.load(Ordering::Relaxed),
            model_update_failures: self.model_update_failures.load(Ordering::Relaxed),
            metrics_collections: self.metrics_collections.load(Ordering::Relaxed),
            metrics_collection_failures: self.metrics_collection_failures.load(Ordering::Relaxed),
            skipped_ticks: self.skipped_ticks.load(Ordering::Relaxed),
            recommendations_drafted: self.recommendations_drafted.load(Ordering::Relaxed),
            recommendations_approved: self.recommendations_approved.load(Ordering::Relaxed),
            feedback_recorded: self.feedback_recorded.load(Ordering::Relaxed),
        }
    }
}

struct EngineState {
    insights: Option<SystemPerformanceInsights>,
    model_info: ModelInfo,
    learning: LearningStats,
    feedback: VecDeque<OptimizationFeedback>,
    request_metrics: HashMap<String, RequestExecutionMetrics>,
}

/// Self-tuning optimization engine.
///
/// Two scheduled ticks drive it: metrics collection feeds the store, the
/// rolling window and the insights snapshot; model update retrains the
/// prediction model once enough history exists. Both are plain public
/// methods so callers and tests can drive them directly.
pub struct OptimizationEngine {
    config: OptimizationConfig,
    collaborators: Collaborators,
    validator: Arc<dyn OptimizationValidator>,
    store: Arc<dyn TimeSeriesStore>,
    window: RollingWindowCache,
    recommender: Recommender,
    state: RwLock<EngineState>,
    disposed: AtomicBool,
    learning_enabled: AtomicBool,
    started: AtomicBool,
    model_guard: TickGuard,
    metrics_guard: TickGuard,
    shutdown: CancellationToken,
    counters: Counters,
}

impl OptimizationEngine {
    /// Create an engine with the default validator and an in-memory store.
    pub fn new(config: OptimizationConfig, collaborators: Collaborators) -> Result<Self> {
        config.validate()?;

        let model_info = ModelInfo {
            version: config.model_version.clone(),
            trained_at: config.model_training_date,
        };

        Ok(Self {
            validator: Arc::new(ValidationFramework::new(config.clone())),
            store: Arc::new(InMemoryTimeSeriesStore::new(config.time_series_max_samples)),
            window: RollingWindowCache::new(config.rolling_window_capacity),
            recommender: Recommender::new(config.clone()),
            state: RwLock::new(EngineState {
                insights: None,
                model_info,
                learning: LearningStats::new(),
                feedback: VecDeque::new(),
                request_metrics: HashMap::new(),
            }),
            disposed: AtomicBool::new(false),
            learning_enabled: AtomicBool::new(config.learning_enabled),
            started: AtomicBool::new(false),
            model_guard: TickGuard::new(),
            metrics_guard: TickGuard::new(),
            shutdown: CancellationToken::new(),
            counters: Counters::default(),
            collaborators,
            config,
        })
    }

    /// Replace the validator.
    pub fn with_validator(mut self, validator: Arc<dyn OptimizationValidator>) -> Self {
        self.validator = validator;
        self
    }

    /// Replace the time-series store.
    pub fn with_store(mut self, store: Arc<dyn TimeSeriesStore>) -> Self {
        self.store = store;
        self
    }

    /// Active configuration.
    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }

    /// Metric history.
    pub fn store(&self) -> &Arc<dyn TimeSeriesStore> {
        &self.store
    }

    /// Per-hour execution counts.
    pub fn rolling_window(&self) -> &RollingWindowCache {
        &self.window
    }

    /// Spawn the periodic model update and metrics collection loops.
    ///
    /// The loops hold only a weak reference and stop when the engine is
    /// disposed or dropped.
    pub fn start(self: &Arc<Self>) -> Result<()> {
        if self.is_disposed() {
            return Err(EngineError::Disposed);
        }
        if self.started.swap(true, Ordering::AcqRel) {
            return Err(EngineError::AlreadyStarted);
        }

        let weak = Arc::downgrade(self);
        spawn_periodic("model-update", self.config.model_update_interval, self.shutdown.clone(), move || {
            let weak = weak.clone();
            async move {
                match weak.upgrade() {
                    Some(engine) => {
                        engine.run_model_update().await;
                        true
                    }
                    None => false,
                }
            }
        });

        let weak = Arc::downgrade(self);
        spawn_periodic(
            "metrics-collection",
            self.config.metrics_collection_interval,
            self.shutdown.clone(),
            move || {
                let weak = weak.clone();
                async move {
                    match weak.upgrade() {
                        Some(engine) => {
                            engine.run_metrics_collection().await;
                            true
                        }
                        None => false,
                    }
                }
            },
        );

        info!(
            "Optimization engine started (model update every {:?}, metrics every {:?})",
            self.config.model_update_interval, self.config.metrics_collection_interval
        );
        Ok(())
    }

    /// Stop background work. Safe to call more than once.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return;
        }
        self.shutdown.cancel();
        info!("Optimization engine disposed");
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::Acquire)
    }

    /// Turn learning on or off at runtime.
    pub fn set_learning_enabled(&self, enabled: bool) {
        self.learning_enabled.store(enabled, Ordering::Release);
        info!("Learning {}", if enabled { "enabled" } else { "disabled" });
    }

    /// Whether learning is on.
    pub fn is_learning_enabled(&self) -> bool {
        self.learning_enabled.load(Ordering::Acquire)
    }

    fn skip(&self, tick: &str, reason: SkipReason) -> TickOutcome {
        Counters::bump(&self.counters.skipped_ticks, 1);
        debug!("Skipping {}: {}", tick, reason);
        TickOutcome::Skipped(reason)
    }

    /// Retrain the prediction model from history and feedback.
    pub async fn run_model_update(&self) -> TickOutcome {
        if self.is_disposed() {
            return self.skip("model update", SkipReason::Disposed);
        }
        if !self.is_learning_enabled() {
            return self.skip("model update", SkipReason::LearningDisabled);
        }
        let Some(_running) = self.model_guard.try_enter() else {
            return self.skip("model update", SkipReason::AlreadyRunning);
        };

        match self.update_model().await {
            Ok(TickOutcome::Completed) => {
                Counters::bump(&self.counters.model_updates, 1);
                TickOutcome::Completed
            }
            Ok(TickOutcome::Skipped(reason)) => self.skip("model update", reason),
            Ok(other) => other,
            Err(e) => {
                Counters::bump(&self.counters.model_update_failures, 1);
                error!("Model update failed: {:#}", e);
                TickOutcome::Failed(e.to_string())
            }
        }
    }

    async fn update_model(&self) -> anyhow::Result<TickOutcome> {
        let span = self
            .store
            .history_span()
            .await
            .and_then(|span| span.to_std().ok())
            .unwrap_or_default();
        if span < self.config.min_history_for_model_update {
            return Ok(TickOutcome::Skipped(SkipReason::InsufficientHistory));
        }

        let history = self.store.snapshot().await;
        let feedback: Vec<OptimizationFeedback> = self.state.read().await.feedback.iter().cloned().collect();
        let model_info = self.collaborators.model.update(&history, &feedback).await?;

        info!(
            "Prediction model updated to {} from {} series and {} outcomes",
            model_info.version,
            history.len(),
            feedback.len()
        );
        self.state.write().await.model_info = model_info;
        Ok(TickOutcome::Completed)
    }

    /// Pull metrics, record them and refresh the insights snapshot.
    pub async fn run_metrics_collection(&self) -> TickOutcome {
        if self.is_disposed() {
            return self.skip("metrics collection", SkipReason::Disposed);
        }
        let Some(_running) = self.metrics_guard.try_enter() else {
            return self.skip("metrics collection", SkipReason::AlreadyRunning);
        };

        match self.collect_metrics().await {
            Ok(()) => {
                Counters::bump(&self.counters.metrics_collections, 1);
                info!("Metrics collection completed");
                TickOutcome::Completed
            }
            Err(e) => {
                Counters::bump(&self.counters.metrics_collection_failures, 1);
                warn!("Metrics collection failed: {:#}", e);
                TickOutcome::Failed(e.to_string())
            }
        }
    }

    async fn collect_metrics(&self) -> anyhow::Result<()> {
        let cancel = self.shutdown.child_token();
        let aggregator = &self.collaborators.aggregator;
        let now = chrono::Utc::now();

        let series = aggregator.collect_all_metrics(&cancel).await?;
        let mut values = MetricValues::new();
        for (name, samples) in &series {
            // Skip samples an earlier tick already recorded.
            let newest = self.store.latest(name).await.map(|s| s.timestamp);
            for sample in samples.iter().filter(|s| newest.map_or(true, |t| s.timestamp > t)) {
                self.record_sample(name, sample.timestamp, sample.value).await;
            }
            if let Some(last) = samples.iter().max_by_key(|s| s.timestamp) {
                values.insert(name.clone(), last.value);
            }
        }

        let request_metrics = aggregator.request_metrics().await?;
        for (request_type, metrics) in &request_metrics {
            self.record_sample(&format!("request.{}.average_ms", request_type), now, metrics.average_ms()).await;
            self.record_sample(&format!("request.{}.p95_ms", request_type), now, metrics.p95_ms()).await;
            self.record_sample(&format!("request.{}.success_rate", request_type), now, metrics.success_rate).await;
        }

        let executed = {
            let state = self.state.read().await;
            request_metrics
                .iter()
                .map(|(request_type, metrics)| {
                    let previous = state.request_metrics.get(request_type).map_or(0, |m| m.total_executions);
                    metrics.total_executions.saturating_sub(previous)
                })
                .fold(0u64, u64::saturating_add)
        };
        self.window.add(&hour_of_day_key(&now), executed).await;

        let overall = self.collaborators.scorer.calculate_score(&values, &cancel).await?;
        let mut load = self.collaborators.analyzer.analyze_load_patterns(&values, &cancel).await?;
        {
            let state = self.state.read().await;
            let verified = state.learning.total_verified();
            if verified > 0 {
                load.total_predictions = verified;
                load.average_improvement = state.learning.average_improvement();
            }
        }

        let snapshot = insights::assemble(InsightInputs {
            overall,
            load,
            bottlenecks: insights::detect_bottlenecks(&request_metrics, self.config.slow_request_threshold),
            seasonal_patterns: self.window.seasonal_patterns(SEASONAL_THRESHOLD).await,
            next_window: hour_of_day_key(&(now + chrono::Duration::hours(1))),
            prediction_confidence: self.collaborators.model.prediction_confidence(),
            key_metrics: values.into_iter().collect(),
            now,
        });

        let publisher = &self.collaborators.publisher;
        publisher.publish("system.health_score", snapshot.health_score.overall);
        publisher.publish("system.bottlenecks", snapshot.bottlenecks.len() as f64);
        publisher.publish("system.prediction_confidence", snapshot.predictive_analysis.prediction_confidence);
        publisher.publish("system.executions", executed as f64);

        debug!(
            "Insights refreshed: grade {}, {} bottlenecks, {} request types",
            snapshot.performance_grade,
            snapshot.bottlenecks.len(),
            request_metrics.len()
        );

        let mut state = self.state.write().await;
        state.insights = Some(snapshot);
        state.request_metrics = request_metrics;
        Ok(())
    }

    async fn record_sample(&self, name: &str, timestamp: perftune_core::Time, value: f64) {
        if let Err(e) = self.store.record_at(name, timestamp, value).await {
            debug!("Dropped sample: {}", e);
        }
    }

    /// Draft recommendations for a request type without validating them.
    pub async fn recommend(&self, request_type: &str) -> Result<Vec<OptimizationRecommendation>> {
        if self.is_disposed() {
            return Err(EngineError::Disposed);
        }

        let cached = self.state.read().await.request_metrics.get(request_type).cloned();
        let metrics = match cached {
            Some(metrics) => metrics,
            None => self
                .collaborators
                .aggregator
                .request_metrics()
                .await?
                .remove(request_type)
                .ok_or_else(|| EngineError::UnknownRequestType(request_type.to_string()))?,
        };

        let state = self.state.read().await;
        let drafts = self
            .recommender
            .draft(request_type, &metrics, self.collaborators.model.as_ref(), &state.learning);
        Counters::bump(&self.counters.recommendations_drafted, drafts.len() as u64);
        Ok(drafts)
    }

    /// Draft recommendations for a request type and gate each one.
    pub async fn evaluate_request(
        &self,
        request_type: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<GatedRecommendation>> {
        let drafts = self.recommend(request_type).await?;

        let mut gated = Vec::with_capacity(drafts.len());
        for recommendation in drafts {
            let validation = self
                .validator
                .validate_recommendation(&recommendation, request_type, cancel)
                .await?;
            let approved = validation.is_valid();
            let auto_apply = approved
                && self.config.enable_automatic_optimization
                && recommendation.risk <= self.config.max_automatic_optimization_risk;
            if approved {
                Counters::bump(&self.counters.recommendations_approved, 1);
            }
            gated.push(GatedRecommendation { recommendation, validation, approved, auto_apply });
        }

        info!(
            "Evaluated {}: {} of {} recommendations approved",
            request_type,
            gated.iter().filter(|g| g.approved).count(),
            gated.len()
        );
        Ok(gated)
    }

    /// Learn from verified strategy outcomes.
    ///
    /// Returns `false` when learning is off and nothing was recorded.
    pub async fn record_feedback(&self, request_type: &str, result: &OptimizationValidationResult) -> Result<bool> {
        if self.is_disposed() {
            return Err(EngineError::Disposed);
        }
        if !self.is_learning_enabled() {
            debug!("Learning disabled, ignoring feedback for {}", request_type);
            return Ok(false);
        }

        let now = chrono::Utc::now();
        let (verified, average) = {
            let mut state = self.state.write().await;
            for outcome in &result.strategy_results {
                state.learning.record(outcome);
                state.feedback.push_back(OptimizationFeedback {
                    request_type: request_type.to_string(),
                    strategy: outcome.strategy,
                    was_successful: outcome.was_successful,
                    performance_gain: outcome.performance_gain,
                    recorded_at: now,
                });
                while state.feedback.len() > MAX_FEEDBACK {
                    state.feedback.pop_front();
                }
            }
            (state.learning.total_verified(), state.learning.average_improvement())
        };

        Counters::bump(&self.counters.feedback_recorded, result.strategy_results.len() as u64);
        self.collaborators.publisher.publish("optimization.verified_total", verified as f64);
        self.collaborators.publisher.publish("optimization.average_improvement", average);
        debug!(
            "Recorded {} outcomes for {} (overall improvement {:.3})",
            result.strategy_results.len(),
            request_type,
            result.overall_improvement
        );
        Ok(true)
    }

    /// Verify applied strategies against before/after metrics and learn from the outcome.
    pub async fn verify_and_record(
        &self,
        request_type: &str,
        strategies: &[OptimizationStrategy],
        before: &RequestExecutionMetrics,
        after: &RequestExecutionMetrics,
        cancel: &CancellationToken,
    ) -> Result<OptimizationValidationResult> {
        if self.is_disposed() {
            return Err(EngineError::Disposed);
        }
        let result = self
            .validator
            .validate_optimization_results(strategies, before, after, cancel)
            .await?;
        self.record_feedback(request_type, &result).await?;
        Ok(result)
    }

    /// Assess stability of the latest insights, if any have been collected.
    pub async fn check_stability(&self, cancel: &CancellationToken) -> Result<Option<SystemHealthValidationResult>> {
        if self.is_disposed() {
            return Err(EngineError::Disposed);
        }
        let Some(insights) = self.insights().await else {
            return Ok(None);
        };

        let result = self.validator.validate_system_health(&insights, cancel).await?;
        self.collaborators.publisher.publish("system.stability_score", result.stability_score);
        if !result.is_stable {
            warn!(
                "System unstable (score {:.2}): {} issues",
                result.stability_score,
                result.issues.len()
            );
        }
        Ok(Some(result))
    }

    /// Latest insights snapshot.
    pub async fn insights(&self) -> Option<SystemPerformanceInsights> {
        self.state.read().await.insights.clone()
    }

    /// Current model metadata.
    pub async fn model_info(&self) -> ModelInfo {
        self.state.read().await.model_info.clone()
    }

    /// Learned stats for one strategy.
    pub async fn strategy_stats(&self, strategy: OptimizationStrategy) -> Option<StrategyStats> {
        self.state.read().await.learning.get(strategy).cloned()
    }

    /// Outcomes buffered for the next model update.
    pub async fn feedback_len(&self) -> usize {
        self.state.read().await.feedback.len()
    }

    /// Counter snapshot.
    pub fn stats(&self) -> EngineStats {
        self.counters.snapshot()
    }
}

impl Drop for OptimizationEngine {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}
