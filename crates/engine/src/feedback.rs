//! Feedback learning from verified optimization outcomes.

use std::collections::HashMap;
use perftune_core::{clamp_unit, OptimizationStrategy, StrategyValidationResult, Time};
use serde::{Deserialize, Serialize};

/// Attempts needed before learned success rates influence confidence.
pub const MIN_ATTEMPTS_FOR_ADJUSTMENT: u64 = 3;

/// Share of the adjusted confidence taken from the learned success rate.
pub const LEARNED_WEIGHT: f64 = 0.3;

/// One verified outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationFeedback {
    /// Request type the strategy was applied to
    pub request_type: String,
    /// Applied strategy
    pub strategy: OptimizationStrategy,
    /// Whether it improved performance
    pub was_successful: bool,
    /// Measured performance gain
    pub performance_gain: f64,
    /// When the outcome was recorded
    pub recorded_at: Time,
}

/// Running totals for one strategy.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StrategyStats {
    /// Verified applications
    pub attempts: u64,
    /// Applications that improved performance
    pub successes: u64,
    /// Sum of measured gains
    pub total_gain: f64,
}

impl StrategyStats {
    /// Fraction of successful applications.
    pub fn success_rate(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.successes as f64 / self.attempts as f64
        }
    }

    /// Mean measured gain.
    pub fn average_gain(&self) -> f64 {
        if self.attempts == 0 {
            0.0
        } else {
            self.total_gain / self.attempts as f64
        }
    }
}

/// Per-strategy learning state.
#[derive(Debug, Clone, Default)]
pub struct LearningStats {
    by_strategy: HashMap<OptimizationStrategy, StrategyStats>,
}

impl LearningStats {
    /// Create empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold in one verified strategy outcome.
    pub fn record(&mut self, result: &StrategyValidationResult) {
        let stats = self.by_strategy.entry(result.strategy).or_default();
        stats.attempts += 1;
        if result.was_successful {
            stats.successes += 1;
        }
        if result.performance_gain.is_finite() {
            stats.total_gain += result.performance_gain;
        }
    }

    /// Stats for one strategy.
    pub fn get(&self, strategy: OptimizationStrategy) -> Option<&StrategyStats> {
        self.by_strategy.get(&strategy)
    }

    /// Verified outcomes across all strategies.
    pub fn total_verified(&self) -> u64 {
        self.by_strategy.values().map(|s| s.attempts).sum()
    }

    /// Mean gain across all verified outcomes.
    pub fn average_improvement(&self) -> f64 {
        let total = self.total_verified();
        if total == 0 {
            return 0.0;
        }
        self.by_strategy.values().map(|s| s.total_gain).sum::<f64>() / total as f64
    }

    /// Blend a model confidence with the learned success rate.
    ///
    /// Leaves the model's value untouched until enough outcomes exist.
    pub fn adjust_confidence(&self, strategy: OptimizationStrategy, model_confidence: f64) -> f64 {
        let model_confidence = clamp_unit(model_confidence);
        match self.get(strategy) {
            Some(stats) if stats.attempts >= MIN_ATTEMPTS_FOR_ADJUSTMENT => clamp_unit(
                (1.0 - LEARNED_WEIGHT) * model_confidence + LEARNED_WEIGHT * stats.success_rate(),
            ),
            _ => model_confidence,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn outcome(strategy: OptimizationStrategy, gain: f64) -> StrategyValidationResult {
        StrategyValidationResult {
            strategy,
            was_successful: gain > 0.0,
            actual_improvement: chrono::Duration::milliseconds(10),
            performance_gain: gain,
        }
    }

    #[test]
    fn test_records_per_strategy() {
        let mut stats = LearningStats::new();
        stats.record(&outcome(OptimizationStrategy::EnableCaching, 0.4));
        stats.record(&outcome(OptimizationStrategy::EnableCaching, -0.2));
        stats.record(&outcome(OptimizationStrategy::BatchProcessing, 0.1));

        let caching = stats.get(OptimizationStrategy::EnableCaching).unwrap();
        assert_eq!(caching.attempts, 2);
        assert_eq!(caching.successes, 1);
        assert!((caching.average_gain() - 0.1).abs() < 1e-9);
        assert_eq!(stats.total_verified(), 3);
        assert!((stats.average_improvement() - 0.1).abs() < 1e-9);
    }

    #[test]
    fn test_confidence_untouched_without_history() {
        let mut stats = LearningStats::new();
        assert_eq!(stats.adjust_confidence(OptimizationStrategy::MemoryPooling, 0.8), 0.8);

        stats.record(&outcome(OptimizationStrategy::MemoryPooling, -0.1));
        stats.record(&outcome(OptimizationStrategy::MemoryPooling, -0.1));
        assert_eq!(stats.adjust_confidence(OptimizationStrategy::MemoryPooling, 0.8), 0.8);
    }

    #[test]
    fn test_failures_lower_confidence() {
        let mut stats = LearningStats::new();
        for _ in 0..4 {
            stats.record(&outcome(OptimizationStrategy::MemoryPooling, -0.1));
        }
        let adjusted = stats.adjust_confidence(OptimizationStrategy::MemoryPooling, 0.8);
        assert!((adjusted - 0.56).abs() < 1e-9);
    }

    #[test]
    fn test_successes_raise_confidence() {
        let mut stats = LearningStats::new();
        for _ in 0..3 {
            stats.record(&outcome(OptimizationStrategy::EnableCaching, 0.3));
        }
        let adjusted = stats.adjust_confidence(OptimizationStrategy::EnableCaching, 0.6);
        assert!(adjusted > 0.6);
        assert!(adjusted <= 1.0);
    }
}
