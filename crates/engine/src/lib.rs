//! Optimization engine
//!
//! Periodically collects request metrics, assembles system insights,
//! drafts and gates optimization recommendations, and learns from their
//! verified outcomes.

#![warn(missing_docs)]

pub mod collaborators;
pub mod engine;
pub mod feedback;
pub mod insights;
pub mod recommender;
pub mod scheduler;

pub use collaborators::{
    HealthScorer, MetricValues, MetricsAggregator, MetricsPublisher, ModelInfo, NoopPublisher, PredictionModel,
    SystemAnalyzer,
};
pub use engine::{Collaborators, EngineError, EngineStats, GatedRecommendation, OptimizationEngine, Result};
pub use feedback::{LearningStats, OptimizationFeedback, StrategyStats};
pub use recommender::Recommender;
pub use scheduler::{SkipReason, TickOutcome};
