//! System health and performance insight model.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::{clamp_unit, Time};

/// Multi-dimensional health score. Each dimension is in [0, 1].
///
/// `overall` is supplied by the health scorer and need not be the mean of
/// the sub-scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealthScore {
    pub overall: f64,
    pub performance: f64,
    pub reliability: f64,
    pub scalability: f64,
    pub security: f64,
    pub maintainability: f64,
    /// Status label derived from `overall`
    pub status: String,
    /// Dimensions that need attention
    pub critical_areas: Vec<String>,
}

impl SystemHealthScore {
    /// Threshold below which a dimension is listed as a critical area.
    pub const CRITICAL_AREA_THRESHOLD: f64 = 0.7;

    /// Build a score, clamping every dimension and deriving status and critical areas.
    pub fn new(
        overall: f64,
        performance: f64,
        reliability: f64,
        scalability: f64,
        security: f64,
        maintainability: f64,
    ) -> Self {
        let mut score = Self {
            overall: clamp_unit(overall),
            performance: clamp_unit(performance),
            reliability: clamp_unit(reliability),
            scalability: clamp_unit(scalability),
            security: clamp_unit(security),
            maintainability: clamp_unit(maintainability),
            status: String::new(),
            critical_areas: Vec::new(),
        };
        score.status = Self::status_for(score.overall).to_string();
        score.critical_areas = [
            ("Performance", score.performance),
            ("Reliability", score.reliability),
            ("Scalability", score.scalability),
            ("Security", score.security),
            ("Maintainability", score.maintainability),
        ]
        .iter()
        .filter(|(_, value)| *value < Self::CRITICAL_AREA_THRESHOLD)
        .map(|(name, _)| name.to_string())
        .collect();
        score
    }

    /// Status label for an overall score.
    pub fn status_for(overall: f64) -> &'static str {
        if overall >= 0.9 {
            "Excellent"
        } else if overall >= 0.7 {
            "Good"
        } else if overall >= 0.5 {
            "Degraded"
        } else {
            "Critical"
        }
    }
}

impl Default for SystemHealthScore {
    fn default() -> Self {
        Self::new(1.0, 1.0, 1.0, 1.0, 1.0, 1.0)
    }
}

/// Bottleneck severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BottleneckSeverity {
    Low,
    Medium,
    High,
    Critical,
}

/// A component limiting system throughput.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerformanceBottleneck {
    /// Component name (usually a request type or resource)
    pub component: String,
    /// Severity
    pub severity: BottleneckSeverity,
    /// What was observed
    pub description: String,
    /// Estimated impact on throughput (0.0 to 1.0)
    pub impact: f64,
    /// Suggested remediation, most useful first
    pub recommended_actions: Vec<String>,
}

/// Letter grade for overall performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PerformanceGrade {
    A,
    B,
    C,
    D,
    F,
}

impl PerformanceGrade {
    /// Grade an overall score in [0, 1].
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 0.9 => Self::A,
            s if s >= 0.8 => Self::B,
            s if s >= 0.7 => Self::C,
            s if s >= 0.6 => Self::D,
            _ => Self::F,
        }
    }

    /// Whether the grade indicates failing performance.
    pub fn is_failing(&self) -> bool {
        matches!(self, Self::D | Self::F)
    }
}

impl std::fmt::Display for PerformanceGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Load classification reported by the system analyzer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LoadLevel {
    Low,
    Medium,
    High,
    Critical,
}

/// Load pattern snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadPatternData {
    /// Current load classification
    pub level: LoadLevel,
    /// Success rate of recent requests (0.0 to 1.0)
    pub success_rate: f64,
    /// Mean improvement delivered by applied optimizations
    pub average_improvement: f64,
    /// Predictions (recommendations) verified so far
    pub total_predictions: u64,
}

impl Default for LoadPatternData {
    fn default() -> Self {
        Self {
            level: LoadLevel::Low,
            success_rate: 1.0,
            average_improvement: 0.0,
            total_predictions: 0,
        }
    }
}

/// Whether a seasonal window runs hotter or colder than average.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SeasonalKind {
    Peak,
    Trough,
}

/// A recurring load pattern found in the rolling window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalPattern {
    /// Window key (e.g. `hour-13`)
    pub window: String,
    /// Peak or trough
    pub kind: SeasonalKind,
    /// Observed count in the window
    pub observed: u64,
    /// Ratio of observed to the mean window count
    pub ratio_to_mean: f64,
}

/// Forward-looking analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveAnalysis {
    /// Confidence in the predictions (0.0 to 1.0)
    pub prediction_confidence: f64,
    /// Seasonal patterns detected
    pub seasonal_patterns: Vec<SeasonalPattern>,
    /// Predicted load level for the next window
    pub predicted_load: LoadLevel,
}

impl Default for PredictiveAnalysis {
    fn default() -> Self {
        Self {
            prediction_confidence: 0.0,
            seasonal_patterns: Vec::new(),
            predicted_load: LoadLevel::Low,
        }
    }
}

/// Snapshot of everything known about system performance.
///
/// This is the input to stability validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemPerformanceInsights {
    /// When the snapshot was assembled
    pub generated_at: Time,
    /// Health score
    pub health_score: SystemHealthScore,
    /// Letter grade
    pub performance_grade: PerformanceGrade,
    /// Detected bottlenecks
    pub bottlenecks: Vec<PerformanceBottleneck>,
    /// Predictive analysis
    pub predictive_analysis: PredictiveAnalysis,
    /// Key metric values by name
    pub key_metrics: BTreeMap<String, f64>,
    /// Load pattern snapshot
    pub load_pattern: LoadPatternData,
}

impl Default for SystemPerformanceInsights {
    fn default() -> Self {
        Self {
            generated_at: chrono::Utc::now(),
            health_score: SystemHealthScore::default(),
            performance_grade: PerformanceGrade::A,
            bottlenecks: Vec::new(),
            predictive_analysis: PredictiveAnalysis::default(),
            key_metrics: BTreeMap::new(),
            load_pattern: LoadPatternData::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_health_score_clamps_and_labels() {
        let score = SystemHealthScore::new(1.4, 0.5, 0.95, -0.1, 1.0, 0.8);
        assert_eq!(score.overall, 1.0);
        assert_eq!(score.scalability, 0.0);
        assert_eq!(score.status, "Excellent");
        assert_eq!(score.critical_areas, vec!["Performance".to_string(), "Scalability".to_string()]);
    }

    #[test]
    fn test_status_boundaries() {
        assert_eq!(SystemHealthScore::status_for(0.9), "Excellent");
        assert_eq!(SystemHealthScore::status_for(0.7), "Good");
        assert_eq!(SystemHealthScore::status_for(0.69), "Degraded");
        assert_eq!(SystemHealthScore::status_for(0.2), "Critical");
    }

    #[test]
    fn test_grade_from_score() {
        assert_eq!(PerformanceGrade::from_score(0.95), PerformanceGrade::A);
        assert_eq!(PerformanceGrade::from_score(0.8), PerformanceGrade::B);
        assert_eq!(PerformanceGrade::from_score(0.75), PerformanceGrade::C);
        assert_eq!(PerformanceGrade::from_score(0.6), PerformanceGrade::D);
        assert_eq!(PerformanceGrade::from_score(0.1), PerformanceGrade::F);
        assert!(PerformanceGrade::D.is_failing());
        assert!(!PerformanceGrade::C.is_failing());
    }

    #[test]
    fn test_bottleneck_severity_ordering() {
        assert!(BottleneckSeverity::Critical > BottleneckSeverity::High);
        assert!(BottleneckSeverity::Low < BottleneckSeverity::Medium);
    }
}
