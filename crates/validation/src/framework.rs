//! Validation framework entry points.

use async_trait::async_trait;
use perftune_core::{
    OptimizationConfig, OptimizationRecommendation, OptimizationStrategy, OptimizationValidationResult,
    RequestExecutionMetrics, SystemHealthValidationResult, SystemPerformanceInsights, ValidationResult,
};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{outcome, rules, stability};

/// Error type for validation operations.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Failures raised by the validation framework.
///
/// Policy violations are never errors; they are reported inside the
/// returned results.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ValidationError {
    /// The caller cancelled before validation started
    #[error("validation cancelled")]
    Cancelled,

    /// An input violates its contract
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Decision logic gating and verifying optimizations.
#[async_trait]
pub trait OptimizationValidator: Send + Sync {
    /// Gate a recommendation before it is applied.
    async fn validate_recommendation(
        &self,
        recommendation: &OptimizationRecommendation,
        target_request_type: &str,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult>;

    /// Check whether applied strategies delivered an improvement.
    async fn validate_optimization_results(
        &self,
        strategies: &[OptimizationStrategy],
        before: &RequestExecutionMetrics,
        after: &RequestExecutionMetrics,
        cancel: &CancellationToken,
    ) -> Result<OptimizationValidationResult>;

    /// Assess overall system stability.
    async fn validate_system_health(
        &self,
        insights: &SystemPerformanceInsights,
        cancel: &CancellationToken,
    ) -> Result<SystemHealthValidationResult>;
}

/// Policy-driven validator backed by an [`OptimizationConfig`].
#[derive(Debug, Clone)]
pub struct ValidationFramework {
    config: OptimizationConfig,
}

impl ValidationFramework {
    /// Create a validator with the given configuration.
    pub fn new(config: OptimizationConfig) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &OptimizationConfig {
        &self.config
    }
}

impl Default for ValidationFramework {
    fn default() -> Self {
        Self::new(OptimizationConfig::default())
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(ValidationError::Cancelled);
    }
    Ok(())
}

fn ensure_metrics(label: &str, metrics: &RequestExecutionMetrics) -> Result<()> {
    if !metrics.success_rate.is_finite() || !(0.0..=1.0).contains(&metrics.success_rate) {
        return Err(ValidationError::InvalidArgument(format!(
            "{} metrics have success rate {} outside [0, 1]",
            label, metrics.success_rate
        )));
    }
    Ok(())
}

fn ensure_insights(insights: &SystemPerformanceInsights) -> Result<()> {
    let health = &insights.health_score;
    let scores = [
        ("overall", health.overall),
        ("reliability", health.reliability),
        ("prediction confidence", insights.predictive_analysis.prediction_confidence),
    ];
    for (name, value) in scores {
        if !value.is_finite() {
            return Err(ValidationError::InvalidArgument(format!("{} score is {}", name, value)));
        }
    }
    Ok(())
}

#[async_trait]
impl OptimizationValidator for ValidationFramework {
    async fn validate_recommendation(
        &self,
        recommendation: &OptimizationRecommendation,
        target_request_type: &str,
        cancel: &CancellationToken,
    ) -> Result<ValidationResult> {
        ensure_not_cancelled(cancel)?;

        let result = rules::check_recommendation(&self.config, recommendation, target_request_type);
        debug!(
            "Validated {} for {}: {:?} ({} errors, {} warnings)",
            recommendation.strategy,
            target_request_type,
            result.severity(),
            result.errors().len(),
            result.warnings().len()
        );
        Ok(result)
    }

    async fn validate_optimization_results(
        &self,
        strategies: &[OptimizationStrategy],
        before: &RequestExecutionMetrics,
        after: &RequestExecutionMetrics,
        cancel: &CancellationToken,
    ) -> Result<OptimizationValidationResult> {
        ensure_not_cancelled(cancel)?;
        ensure_metrics("before", before)?;
        ensure_metrics("after", after)?;

        let result = outcome::score_strategies(strategies, before, after);
        debug!(
            "Verified {} strategies: overall improvement {:.3}",
            strategies.len(),
            result.overall_improvement
        );
        Ok(result)
    }

    async fn validate_system_health(
        &self,
        insights: &SystemPerformanceInsights,
        cancel: &CancellationToken,
    ) -> Result<SystemHealthValidationResult> {
        ensure_not_cancelled(cancel)?;
        ensure_insights(insights)?;

        let result = stability::assess(insights);
        debug!(
            "System stability {:.2} ({} issues, stable: {})",
            result.stability_score,
            result.issues.len(),
            result.is_stable
        );
        Ok(result)
    }
}
