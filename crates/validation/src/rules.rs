//! Recommendation gating rules.
//!
//! Each check appends to a shared [`ValidationResult`]; severity is derived
//! from what was collected.

use perftune_core::{
    params, OptimizationConfig, OptimizationRecommendation, OptimizationStrategy, ValidationResult,
};

/// Cache hit rates below this are not worth the memory.
pub const MIN_CACHE_HIT_RATE: f64 = 0.3;

/// Smallest meaningful batch.
pub const MIN_BATCH_SIZE: i64 = 2;

/// Pool thresholds below this (bytes) pool almost every allocation.
pub const MIN_MEMORY_THRESHOLD: i64 = 1024;

/// Run every gating rule against `recommendation`.
pub fn check_recommendation(
    config: &OptimizationConfig,
    recommendation: &OptimizationRecommendation,
    target_request_type: &str,
) -> ValidationResult {
    let mut result = ValidationResult::success();

    let missing_required = check_required_parameters(recommendation, &mut result);
    check_confidence(config, recommendation, &mut result);
    check_risk(config, recommendation, &mut result);
    check_improvement(recommendation, &mut result);
    check_strategy(config, recommendation, target_request_type, &mut result);
    check_null_parameters(recommendation, &missing_required, &mut result);

    result
}

/// Returns the required parameters that were reported as missing or null.
fn check_required_parameters(
    recommendation: &OptimizationRecommendation,
    result: &mut ValidationResult,
) -> Vec<&'static str> {
    let strategy = recommendation.strategy;
    let required = strategy.required_parameters();

    let bag_empty = recommendation.parameters.as_ref().map_or(true, |p| p.is_empty());
    if bag_empty && !required.is_empty() {
        result.add_warning(format!("No parameters provided for {}", strategy));
    }

    let mut reported = Vec::new();
    for &name in required {
        match recommendation.parameter(name) {
            None => result.add_error(format!("Required parameter '{}' is missing for {}", name, strategy)),
            Some(value) if value.is_null() => {
                result.add_error(format!("Required parameter '{}' is null for {}", name, strategy))
            }
            Some(_) => continue,
        }
        reported.push(name);
    }
    reported
}

fn check_confidence(
    config: &OptimizationConfig,
    recommendation: &OptimizationRecommendation,
    result: &mut ValidationResult,
) {
    if recommendation.confidence < config.min_confidence_score {
        result.add_error(format!(
            "Recommendation confidence {:.2} is below minimum threshold {:.2}",
            recommendation.confidence, config.min_confidence_score
        ));
    }
}

fn check_risk(
    config: &OptimizationConfig,
    recommendation: &OptimizationRecommendation,
    result: &mut ValidationResult,
) {
    let risk = recommendation.risk;

    if config.enable_automatic_optimization && risk > config.max_automatic_optimization_risk {
        result.add_warning(format!(
            "Risk level {} exceeds maximum automatic optimization risk {}",
            risk, config.max_automatic_optimization_risk
        ));
    }

    if let Some(max) = recommendation.strategy.max_recommended_risk() {
        if risk > max {
            result.add_warning(format!(
                "Strategy risk {} exceeds recommended {} for {}",
                risk, max, recommendation.strategy
            ));
        }
    }
}

fn check_improvement(recommendation: &OptimizationRecommendation, result: &mut ValidationResult) {
    if recommendation.estimated_improvement <= chrono::Duration::zero() {
        result.add_warning(format!(
            "No performance improvement expected (estimated {} ms)",
            recommendation.estimated_improvement.num_milliseconds()
        ));
    }
}

fn check_strategy(
    config: &OptimizationConfig,
    recommendation: &OptimizationRecommendation,
    target_request_type: &str,
    result: &mut ValidationResult,
) {
    match recommendation.strategy {
        OptimizationStrategy::EnableCaching => {
            if let Some(hit_rate) = recommendation.parameter(params::EXPECTED_HIT_RATE).and_then(|v| v.as_f64()) {
                if hit_rate < MIN_CACHE_HIT_RATE {
                    result.add_warning(format!(
                        "Expected cache hit rate {:.2} is low (minimum recommended {:.2})",
                        hit_rate, MIN_CACHE_HIT_RATE
                    ));
                }
            }
            if target_request_type.contains("Command") {
                result.add_warning(format!(
                    "Commands modify state and are typically not suitable for caching ({})",
                    target_request_type
                ));
            }
        }
        OptimizationStrategy::BatchProcessing => {
            if let Some(size) = recommendation.parameter(params::OPTIMAL_BATCH_SIZE).and_then(|v| v.as_i64()) {
                if size < MIN_BATCH_SIZE {
                    result.add_error(format!("Batch size must be at least {} (got {})", MIN_BATCH_SIZE, size));
                } else if size > i64::from(config.max_batch_size) {
                    result.add_warning(format!(
                        "Batch size {} exceeds {} and may cause memory pressure",
                        size, config.max_batch_size
                    ));
                }
            }
        }
        OptimizationStrategy::MemoryPooling => {
            if let Some(threshold) = recommendation.parameter(params::MEMORY_THRESHOLD).and_then(|v| v.as_i64()) {
                if threshold < MIN_MEMORY_THRESHOLD {
                    result.add_warning(format!(
                        "Memory threshold {} bytes is very low (minimum recommended {})",
                        threshold, MIN_MEMORY_THRESHOLD
                    ));
                }
            }
        }
        // No strategy-specific rules
        _ => {}
    }
}

fn check_null_parameters(
    recommendation: &OptimizationRecommendation,
    already_reported: &[&str],
    result: &mut ValidationResult,
) {
    let Some(parameters) = &recommendation.parameters else {
        return;
    };
    for (name, value) in parameters {
        if value.is_null() && !already_reported.contains(&name.as_str()) {
            result.add_error(format!("Parameter '{}' is null", name));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use perftune_core::{ParamValue, RiskLevel, ValidationSeverity};

    fn config() -> OptimizationConfig {
        OptimizationConfig::default()
    }

    fn recommendation(strategy: OptimizationStrategy) -> OptimizationRecommendation {
        OptimizationRecommendation::new("GetUserQuery", strategy)
            .with_confidence(0.9)
            .with_risk(RiskLevel::Low)
            .with_estimated_improvement(chrono::Duration::milliseconds(50))
    }

    fn caching(hit_rate: f64) -> OptimizationRecommendation {
        recommendation(OptimizationStrategy::EnableCaching)
            .with_parameter(params::REQUEST_TYPE, "GetUserQuery")
            .with_parameter(params::EXPECTED_HIT_RATE, hit_rate)
    }

    fn batching(size: i64) -> OptimizationRecommendation {
        recommendation(OptimizationStrategy::BatchProcessing).with_parameter(params::OPTIMAL_BATCH_SIZE, size)
    }

    fn pooling(threshold: i64) -> OptimizationRecommendation {
        recommendation(OptimizationStrategy::MemoryPooling).with_parameter(params::MEMORY_THRESHOLD, threshold)
    }

    #[test]
    fn test_low_confidence_is_error() {
        for confidence in [0.0, 0.3, 0.69] {
            let rec = caching(0.8).with_confidence(confidence);
            let result = check_recommendation(&config(), &rec, "GetUserQuery");
            assert!(!result.is_valid());
            assert_eq!(result.severity(), ValidationSeverity::Error);
            assert!(result.errors().iter().any(|e| e.contains("confidence")));
        }
    }

    #[test]
    fn test_confidence_at_threshold_passes() {
        let rec = caching(0.8).with_confidence(0.7);
        let result = check_recommendation(&config(), &rec, "GetUserQuery");
        assert_eq!(result.severity(), ValidationSeverity::Success);
    }

    #[test]
    fn test_cache_hit_rate_boundary() {
        let result = check_recommendation(&config(), &caching(0.3), "GetUserQuery");
        assert_eq!(result.severity(), ValidationSeverity::Success);

        let result = check_recommendation(&config(), &caching(0.25), "GetUserQuery");
        assert_eq!(result.severity(), ValidationSeverity::Warning);
        assert!(result.is_valid());
        assert!(result.warnings().iter().any(|w| w.contains("low")));
    }

    #[test]
    fn test_caching_commands_warns() {
        let result = check_recommendation(&config(), &caching(0.8), "CreateOrderCommand");
        assert_eq!(result.severity(), ValidationSeverity::Warning);
        assert!(result.warnings()[0].contains("not suitable for caching"));
    }

    #[test]
    fn test_batch_size_boundaries() {
        let result = check_recommendation(&config(), &batching(1), "GetUserQuery");
        assert_eq!(result.severity(), ValidationSeverity::Error);
        assert!(result.errors().iter().any(|e| e.contains("at least 2")));

        assert_eq!(check_recommendation(&config(), &batching(2), "q").severity(), ValidationSeverity::Success);
        assert_eq!(check_recommendation(&config(), &batching(100), "q").severity(), ValidationSeverity::Success);

        let result = check_recommendation(&config(), &batching(150), "q");
        assert_eq!(result.severity(), ValidationSeverity::Warning);
        assert!(result.warnings().iter().any(|w| w.contains("memory pressure")));
    }

    #[test]
    fn test_memory_threshold_boundaries() {
        assert_eq!(check_recommendation(&config(), &pooling(1024), "q").severity(), ValidationSeverity::Success);
        for threshold in [512, 0, -1] {
            let result = check_recommendation(&config(), &pooling(threshold), "q");
            assert_eq!(result.severity(), ValidationSeverity::Warning);
            assert!(result.warnings().iter().any(|w| w.contains("very low")));
        }
    }

    #[test]
    fn test_wrong_typed_parameters_are_skipped() {
        let rec = recommendation(OptimizationStrategy::BatchProcessing)
            .with_parameter(params::OPTIMAL_BATCH_SIZE, "one");
        assert_eq!(check_recommendation(&config(), &rec, "q").severity(), ValidationSeverity::Success);

        let rec = recommendation(OptimizationStrategy::EnableCaching)
            .with_parameter(params::REQUEST_TYPE, "q")
            .with_parameter(params::EXPECTED_HIT_RATE, 0);
        assert_eq!(check_recommendation(&config(), &rec, "q").severity(), ValidationSeverity::Success);
    }

    #[test]
    fn test_missing_and_null_required_parameters() {
        let rec = recommendation(OptimizationStrategy::EnableCaching);
        let result = check_recommendation(&config(), &rec, "q");
        assert_eq!(result.severity(), ValidationSeverity::Error);
        assert_eq!(result.errors().len(), 2);
        assert!(result.warnings().iter().any(|w| w.contains("No parameters provided")));

        let rec = recommendation(OptimizationStrategy::EnableCaching)
            .with_parameter(params::REQUEST_TYPE, "q")
            .with_parameter(params::EXPECTED_HIT_RATE, ParamValue::Null);
        let result = check_recommendation(&config(), &rec, "q");
        assert_eq!(result.errors().len(), 1);
        assert!(result.errors()[0].contains("ExpectedHitRate"));
        assert!(result.warnings().is_empty());
    }

    #[test]
    fn test_optional_null_parameter_is_error() {
        let rec = pooling(4096).with_parameter("PoolName", ParamValue::Null);
        let result = check_recommendation(&config(), &rec, "q");
        assert!(!result.is_valid());
        assert_eq!(result.errors(), &["Parameter 'PoolName' is null".to_string()]);
    }

    #[test]
    fn test_unknown_strategy_without_parameters() {
        let rec = recommendation(OptimizationStrategy::None);
        let result = check_recommendation(&config(), &rec, "CreateOrderCommand");
        assert_eq!(result.severity(), ValidationSeverity::Success);

        let rec = rec.with_parameters(Some(Default::default()));
        assert_eq!(check_recommendation(&config(), &rec, "q").severity(), ValidationSeverity::Success);
    }

    #[test]
    fn test_no_improvement_warns() {
        let rec = pooling(4096).with_estimated_improvement(chrono::Duration::zero());
        let result = check_recommendation(&config(), &rec, "q");
        assert_eq!(result.severity(), ValidationSeverity::Warning);
        assert!(result.warnings()[0].contains("No performance improvement"));

        let rec = pooling(4096).with_estimated_improvement(chrono::Duration::milliseconds(-10));
        assert_eq!(check_recommendation(&config(), &rec, "q").severity(), ValidationSeverity::Warning);
    }

    #[test]
    fn test_risk_gates() {
        // Strategy ceiling applies even with automatic optimization disabled
        let rec = pooling(4096).with_risk(RiskLevel::Medium);
        let result = check_recommendation(&config(), &rec, "q");
        assert_eq!(result.warnings(), &["Strategy risk Medium exceeds recommended Low for MemoryPooling".to_string()]);

        // Automatic ceiling only when enabled
        let rec = recommendation(OptimizationStrategy::None).with_risk(RiskLevel::High);
        assert_eq!(check_recommendation(&config(), &rec, "q").severity(), ValidationSeverity::Success);

        let auto = config().with_automatic_optimization(true, RiskLevel::Medium);
        let result = check_recommendation(&auto, &rec, "q");
        assert_eq!(result.severity(), ValidationSeverity::Warning);
        assert!(result.warnings()[0].contains("automatic optimization"));
    }

    #[test]
    fn test_warning_plus_error_is_error() {
        let rec = batching(1).with_confidence(0.1).with_risk(RiskLevel::VeryHigh);
        let result = check_recommendation(&config(), &rec, "q");
        assert_eq!(result.severity(), ValidationSeverity::Error);
        assert_eq!(result.errors().len(), 2);
        assert_eq!(result.warnings().len(), 1);
    }
}
