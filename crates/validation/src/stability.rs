//! System stability assessment.

use perftune_core::{
    BottleneckSeverity, SystemHealthValidationResult, SystemPerformanceInsights, ValidationSeverity,
};

/// Overall health below this is an error.
pub const MIN_OVERALL_HEALTH: f64 = 0.7;
/// Reliability below this is a warning.
pub const MIN_RELIABILITY: f64 = 0.9;
/// Prediction confidence below this is a warning.
pub const MIN_PREDICTION_CONFIDENCE: f64 = 0.7;

const OVERALL_DEDUCTION: f64 = 0.30;
const GRADE_DEDUCTION: f64 = 0.20;
const RELIABILITY_DEDUCTION: f64 = 0.05;
const PREDICTION_DEDUCTION: f64 = 0.05;
const CRITICAL_BOTTLENECK_DEDUCTION: f64 = 0.15;

/// Assess stability from an insights snapshot.
pub fn assess(insights: &SystemPerformanceInsights) -> SystemHealthValidationResult {
    let mut result = SystemHealthValidationResult::stable();
    let health = &insights.health_score;

    if health.overall < MIN_OVERALL_HEALTH {
        result.record(
            "Overall System",
            ValidationSeverity::Error,
            format!("Overall health score {:.2} is below {:.2}", health.overall, MIN_OVERALL_HEALTH),
            OVERALL_DEDUCTION,
        );
    }

    if insights.performance_grade.is_failing() {
        result.record(
            "Performance",
            ValidationSeverity::Error,
            format!("Performance grade {} is failing", insights.performance_grade),
            GRADE_DEDUCTION,
        );
    }

    if health.reliability < MIN_RELIABILITY {
        result.record(
            "Reliability",
            ValidationSeverity::Warning,
            format!("Reliability score {:.2} is below {:.2}", health.reliability, MIN_RELIABILITY),
            RELIABILITY_DEDUCTION,
        );
    }

    let confidence = insights.predictive_analysis.prediction_confidence;
    if confidence < MIN_PREDICTION_CONFIDENCE {
        result.record(
            "Predictive Analytics",
            ValidationSeverity::Warning,
            format!("Prediction confidence {:.2} is below {:.2}", confidence, MIN_PREDICTION_CONFIDENCE),
            PREDICTION_DEDUCTION,
        );
    }

    for bottleneck in &insights.bottlenecks {
        if bottleneck.severity == BottleneckSeverity::Critical {
            result.record(
                bottleneck.component.clone(),
                ValidationSeverity::Error,
                format!("Critical bottleneck: {}", bottleneck.description),
                CRITICAL_BOTTLENECK_DEDUCTION,
            );
        }
    }

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use perftune_core::{PerformanceBottleneck, PerformanceGrade, PredictiveAnalysis, SystemHealthScore};

    fn insights(overall: f64, reliability: f64, grade: PerformanceGrade, confidence: f64) -> SystemPerformanceInsights {
        SystemPerformanceInsights {
            health_score: SystemHealthScore::new(overall, 0.9, reliability, 0.9, 1.0, 0.9),
            performance_grade: grade,
            predictive_analysis: PredictiveAnalysis {
                prediction_confidence: confidence,
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn bottleneck(component: &str, severity: BottleneckSeverity) -> PerformanceBottleneck {
        PerformanceBottleneck {
            component: component.to_string(),
            severity,
            description: format!("{} saturated", component),
            impact: 0.8,
            recommended_actions: vec!["Scale out".to_string()],
        }
    }

    #[test]
    fn test_healthy_system_is_stable() {
        let result = assess(&insights(0.9, 0.95, PerformanceGrade::A, 0.85));
        assert!(result.is_stable);
        assert!(result.issues.is_empty());
        assert_eq!(result.stability_score, 1.0);
    }

    #[test]
    fn test_compound_failures() {
        let mut snapshot = insights(0.6, 0.95, PerformanceGrade::D, 0.85);
        snapshot.bottlenecks = vec![
            bottleneck("Database", BottleneckSeverity::Critical),
            bottleneck("Cache", BottleneckSeverity::Critical),
        ];

        let result = assess(&snapshot);
        assert!(!result.is_stable);
        assert!(result.stability_score < 0.4);
        assert!(result.issues.len() >= 4);
        assert!(result.issues.iter().any(|i| i.component == "Database"));
        assert!(result.issues.iter().any(|i| i.component == "Overall System"));
    }

    #[test]
    fn test_low_reliability_alone_stays_stable() {
        let result = assess(&insights(0.9, 0.8, PerformanceGrade::B, 0.85));
        assert!(result.is_stable);
        assert_eq!(result.issues.len(), 1);
        assert_eq!(result.issues[0].component, "Reliability");
        assert_eq!(result.issues[0].severity, ValidationSeverity::Warning);
        assert!(result.stability_score < 1.0);
    }

    #[test]
    fn test_low_prediction_confidence_warns() {
        let result = assess(&insights(0.9, 0.95, PerformanceGrade::A, 0.5));
        assert!(result.is_stable);
        assert_eq!(result.issues[0].component, "Predictive Analytics");
    }

    #[test]
    fn test_non_critical_bottlenecks_are_ignored() {
        let mut snapshot = insights(0.9, 0.95, PerformanceGrade::A, 0.85);
        snapshot.bottlenecks = vec![
            bottleneck("Queue", BottleneckSeverity::Low),
            bottleneck("Disk", BottleneckSeverity::Medium),
            bottleneck("Network", BottleneckSeverity::High),
        ];
        let result = assess(&snapshot);
        assert!(result.is_stable);
        assert!(result.issues.is_empty());
    }

    #[test]
    fn test_failing_grade_is_error() {
        let result = assess(&insights(0.9, 0.95, PerformanceGrade::F, 0.85));
        assert!(!result.is_stable);
        assert_eq!(result.issues[0].component, "Performance");
    }

    #[test]
    fn test_score_never_negative() {
        let mut snapshot = insights(0.1, 0.1, PerformanceGrade::F, 0.1);
        snapshot.bottlenecks = (0..10)
            .map(|i| bottleneck(&format!("c{}", i), BottleneckSeverity::Critical))
            .collect();
        let result = assess(&snapshot);
        assert_eq!(result.stability_score, 0.0);
        assert_eq!(result.issues.len(), 14);
    }
}
