//! perftune core data models.
//!
//! This crate defines the data structures shared by the time-series store,
//! the validation framework and the optimization engine.

#![warn(missing_docs)]

// Core identities
mod id;

// Metrics and recommendations
mod metrics;
mod recommendation;

// Validation and health
mod validation;
mod health;

// Configuration
mod config;

pub mod serde_millis;

// Re-exports
pub use id::*;

pub use metrics::{RequestExecutionMetrics, MetricSample, MetricSeries};
pub use recommendation::{
    params, OptimizationStrategy, RiskLevel, ParamValue, Parameters, OptimizationRecommendation,
};
pub use validation::{
    ValidationSeverity, ValidationResult, StrategyValidationResult, OptimizationValidationResult,
    HealthIssue, SystemHealthValidationResult,
};
pub use health::{
    SystemHealthScore, BottleneckSeverity, PerformanceBottleneck, PerformanceGrade, LoadLevel,
    LoadPatternData, SeasonalKind, SeasonalPattern, PredictiveAnalysis, SystemPerformanceInsights,
};
pub use config::{OptimizationConfig, ConfigError};

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;

/// Clamp a ratio into [0, 1]; NaN maps to 0.
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}
