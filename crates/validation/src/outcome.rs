//! Post-application outcome scoring.
//!
//! The performance gain of an applied optimization is a weighted blend of
//! relative improvements:
//!
//! ```text
//! gain = 0.60 * Δtime + 0.25 * Δmemory + 0.15 * Δsuccess_rate
//! ```
//!
//! Each Δ is positive when the after-state is better and is clamped to
//! [-1, 1], so any one factor can pull the gain either way. A zero
//! baseline has no ratio, so the absolute change is used instead.

use perftune_core::{
    OptimizationStrategy, OptimizationValidationResult, RequestExecutionMetrics, StrategyValidationResult,
};

/// Weight of the execution-time improvement.
pub const TIME_WEIGHT: f64 = 0.60;
/// Weight of the memory-usage improvement.
pub const MEMORY_WEIGHT: f64 = 0.25;
/// Weight of the success-rate improvement.
pub const SUCCESS_RATE_WEIGHT: f64 = 0.15;

/// Relative reduction of `after` against `before` (positive = smaller).
fn relative_reduction(before: f64, after: f64) -> f64 {
    if before <= 0.0 {
        return (before - after).clamp(-1.0, 1.0);
    }
    ((before - after) / before).clamp(-1.0, 1.0)
}

/// Relative increase of `after` against `before` (positive = larger).
fn relative_increase(before: f64, after: f64) -> f64 {
    if before <= 0.0 {
        return (after - before).clamp(-1.0, 1.0);
    }
    ((after - before) / before).clamp(-1.0, 1.0)
}

/// Composite performance gain between two snapshots.
pub fn performance_gain(before: &RequestExecutionMetrics, after: &RequestExecutionMetrics) -> f64 {
    let time = relative_reduction(before.average_ms(), after.average_ms());
    let memory = relative_reduction(before.memory_usage as f64, after.memory_usage as f64);
    let success = relative_increase(before.success_rate, after.success_rate);

    TIME_WEIGHT * time + MEMORY_WEIGHT * memory + SUCCESS_RATE_WEIGHT * success
}

/// Reduction in average execution time; negative when the request got slower.
pub fn execution_time_delta(before: &RequestExecutionMetrics, after: &RequestExecutionMetrics) -> chrono::Duration {
    let micros = |d: std::time::Duration| i64::try_from(d.as_micros()).unwrap_or(i64::MAX);
    chrono::Duration::microseconds(
        micros(before.average_execution_time).saturating_sub(micros(after.average_execution_time)),
    )
}

/// Score every strategy against the same before/after pair.
pub fn score_strategies(
    strategies: &[OptimizationStrategy],
    before: &RequestExecutionMetrics,
    after: &RequestExecutionMetrics,
) -> OptimizationValidationResult {
    let gain = performance_gain(before, after);
    let actual_improvement = execution_time_delta(before, after);

    let strategy_results: Vec<StrategyValidationResult> = strategies
        .iter()
        .map(|&strategy| StrategyValidationResult {
            strategy,
            was_successful: gain > 0.0,
            actual_improvement,
            performance_gain: gain,
        })
        .collect();

    let overall_improvement = if strategy_results.is_empty() {
        0.0
    } else {
        strategy_results.iter().map(|r| r.performance_gain).sum::<f64>() / strategy_results.len() as f64
    };

    OptimizationValidationResult {
        was_successful: overall_improvement > 0.0,
        overall_improvement,
        strategy_results,
    }
}
