//! Bottleneck detection and insight assembly.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use perftune_core::{
    clamp_unit, BottleneckSeverity, LoadLevel, LoadPatternData, PerformanceBottleneck, PerformanceGrade,
    PredictiveAnalysis, RequestExecutionMetrics, SeasonalKind, SeasonalPattern, SystemHealthScore,
    SystemPerformanceInsights, Time,
};

/// Key metric read for the security dimension, when reported.
pub const SECURITY_METRIC: &str = "security_score";
/// Key metric read for the maintainability dimension, when reported.
pub const MAINTAINABILITY_METRIC: &str = "maintainability_score";

const HEALTHY_SUCCESS_RATE: f64 = 0.95;
const HEAVY_ALLOCATION_BYTES: f64 = 10.0 * 1024.0 * 1024.0;
const CHATTY_DATABASE_CALLS: f64 = 20.0;
const VERY_CHATTY_DATABASE_CALLS: f64 = 50.0;

/// Find bottlenecks in per-request-type metrics, most severe first.
pub fn detect_bottlenecks(
    request_metrics: &HashMap<String, RequestExecutionMetrics>,
    slow_threshold: Duration,
) -> Vec<PerformanceBottleneck> {
    let mut found = Vec::new();

    for (request_type, metrics) in request_metrics {
        if metrics.total_executions == 0 {
            continue;
        }

        if !slow_threshold.is_zero() && metrics.p95_execution_time >= slow_threshold {
            let ratio = metrics.p95_execution_time.as_secs_f64() / slow_threshold.as_secs_f64();
            found.push(PerformanceBottleneck {
                component: request_type.clone(),
                severity: if ratio >= 4.0 { BottleneckSeverity::Critical } else { BottleneckSeverity::High },
                description: format!("p95 latency {:.0}ms exceeds {:.0}ms", metrics.p95_ms(), slow_threshold.as_secs_f64() * 1000.0),
                impact: clamp_unit(1.0 - 1.0 / ratio),
                recommended_actions: vec![
                    "Profile the slowest executions".to_string(),
                    "Consider caching or query optimization".to_string(),
                ],
            });
        }

        if metrics.success_rate < HEALTHY_SUCCESS_RATE {
            let severity = match metrics.success_rate {
                r if r < 0.5 => BottleneckSeverity::Critical,
                r if r < 0.8 => BottleneckSeverity::High,
                _ => BottleneckSeverity::Medium,
            };
            found.push(PerformanceBottleneck {
                component: request_type.clone(),
                severity,
                description: format!("Success rate {:.1}%", metrics.success_rate * 100.0),
                impact: metrics.failure_rate(),
                recommended_actions: vec![
                    "Inspect recent failures".to_string(),
                    "Consider a circuit breaker for failing dependencies".to_string(),
                ],
            });
        }

        let memory = metrics.memory_per_execution();
        if memory >= HEAVY_ALLOCATION_BYTES {
            found.push(PerformanceBottleneck {
                component: request_type.clone(),
                severity: BottleneckSeverity::Medium,
                description: format!("{:.1} MiB allocated per execution", memory / (1024.0 * 1024.0)),
                impact: 0.3,
                recommended_actions: vec!["Pool or stream large buffers".to_string()],
            });
        }

        let calls = metrics.database_calls_per_execution();
        if calls >= CHATTY_DATABASE_CALLS {
            found.push(PerformanceBottleneck {
                component: request_type.clone(),
                severity: if calls >= VERY_CHATTY_DATABASE_CALLS {
                    BottleneckSeverity::High
                } else {
                    BottleneckSeverity::Medium
                },
                description: format!("{:.0} database calls per execution", calls),
                impact: clamp_unit(calls / (VERY_CHATTY_DATABASE_CALLS * 2.0)),
                recommended_actions: vec!["Batch database access".to_string()],
            });
        }
    }

    found.sort_by(|a, b| b.severity.cmp(&a.severity).then_with(|| a.component.cmp(&b.component)));
    found
}

/// Scalability implied by the current load.
pub fn scalability_for(level: LoadLevel) -> f64 {
    match level {
        LoadLevel::Low => 1.0,
        LoadLevel::Medium => 0.85,
        LoadLevel::High => 0.6,
        LoadLevel::Critical => 0.3,
    }
}

/// Combine scorer output and load pattern into a health score.
pub fn health_score(overall: f64, load: &LoadPatternData, key_metrics: &BTreeMap<String, f64>) -> SystemHealthScore {
    let dimension = |name: &str| key_metrics.get(name).copied().filter(|v| v.is_finite()).unwrap_or(1.0);
    SystemHealthScore::new(
        overall,
        overall,
        load.success_rate,
        scalability_for(load.level),
        dimension(SECURITY_METRIC),
        dimension(MAINTAINABILITY_METRIC),
    )
}

/// Load expected in the next window.
///
/// A known peak raises the current level by one step, a trough lowers it.
pub fn predict_load(current: LoadLevel, next_window: &str, patterns: &[SeasonalPattern]) -> LoadLevel {
    match patterns.iter().find(|p| p.window == next_window).map(|p| p.kind) {
        Some(SeasonalKind::Peak) => match current {
            LoadLevel::Low => LoadLevel::Medium,
            LoadLevel::Medium => LoadLevel::High,
            LoadLevel::High | LoadLevel::Critical => LoadLevel::Critical,
        },
        Some(SeasonalKind::Trough) => match current {
            LoadLevel::Critical => LoadLevel::High,
            LoadLevel::High => LoadLevel::Medium,
            LoadLevel::Medium | LoadLevel::Low => LoadLevel::Low,
        },
        None => current,
    }
}

/// Inputs gathered during one metrics collection.
#[derive(Debug, Clone)]
pub struct InsightInputs {
    /// Overall score from the health scorer
    pub overall: f64,
    /// Load pattern from the system analyzer
    pub load: LoadPatternData,
    /// Detected bottlenecks
    pub bottlenecks: Vec<PerformanceBottleneck>,
    /// Seasonal patterns from the rolling window
    pub seasonal_patterns: Vec<SeasonalPattern>,
    /// Window key of the next period
    pub next_window: String,
    /// Confidence of the prediction model
    pub prediction_confidence: f64,
    /// Latest metric values
    pub key_metrics: BTreeMap<String, f64>,
    /// Assembly time
    pub now: Time,
}

/// Assemble an insights snapshot.
pub fn assemble(inputs: InsightInputs) -> SystemPerformanceInsights {
    let health_score = health_score(inputs.overall, &inputs.load, &inputs.key_metrics);
    let predicted_load = predict_load(inputs.load.level, &inputs.next_window, &inputs.seasonal_patterns);

    SystemPerformanceInsights {
        generated_at: inputs.now,
        performance_grade: PerformanceGrade::from_score(health_score.overall),
        health_score,
        bottlenecks: inputs.bottlenecks,
        predictive_analysis: PredictiveAnalysis {
            prediction_confidence: clamp_unit(inputs.prediction_confidence),
            seasonal_patterns: inputs.seasonal_patterns,
            predicted_load,
        },
        key_metrics: inputs.key_metrics,
        load_pattern: inputs.load,
    }
}
