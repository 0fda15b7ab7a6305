//! Validation result model.

use serde::{Deserialize, Serialize};
use crate::recommendation::OptimizationStrategy;

/// Validation outcome severity. Ordered so that `max` yields the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ValidationSeverity {
    Success,
    Warning,
    Error,
}

impl ValidationSeverity {
    /// Worst of two severities.
    pub fn worst(self, other: Self) -> Self {
        self.max(other)
    }
}

/// Result of validating a single recommendation.
///
/// Fields are private so that an error always implies `is_valid == false`.
/// Deserialization recomputes validity and severity from the messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ValidationResultRepr")]
pub struct ValidationResult {
    is_valid: bool,
    severity: ValidationSeverity,
    errors: Vec<String>,
    warnings: Vec<String>,
}

#[derive(Deserialize)]
struct ValidationResultRepr {
    #[serde(default)]
    errors: Vec<String>,
    #[serde(default)]
    warnings: Vec<String>,
}

impl From<ValidationResultRepr> for ValidationResult {
    fn from(repr: ValidationResultRepr) -> Self {
        let mut result = Self::success();
        result.errors = repr.errors;
        result.warnings = repr.warnings;
        result.refresh();
        result
    }
}

impl ValidationResult {
    /// A clean result.
    pub fn success() -> Self {
        Self {
            is_valid: true,
            severity: ValidationSeverity::Success,
            errors: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Record an error.
    pub fn add_error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
        self.refresh();
    }

    /// Record a warning.
    pub fn add_warning(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
        self.refresh();
    }

    /// Fold another result into this one (worst-of severity, messages appended).
    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        self.warnings.extend(other.warnings);
        self.refresh();
    }

    fn refresh(&mut self) {
        self.severity = if !self.errors.is_empty() {
            ValidationSeverity::Error
        } else if !self.warnings.is_empty() {
            ValidationSeverity::Warning
        } else {
            ValidationSeverity::Success
        };
        self.is_valid = self.severity != ValidationSeverity::Error;
    }

    /// Whether the recommendation may be applied.
    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Overall severity.
    pub fn severity(&self) -> ValidationSeverity {
        self.severity
    }

    /// Error messages in discovery order.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }

    /// Warning messages in discovery order.
    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::success()
    }
}

/// Verified outcome of one applied strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StrategyValidationResult {
    /// Strategy that was applied
    pub strategy: OptimizationStrategy,
    /// Whether the strategy improved performance
    pub was_successful: bool,
    /// Reduction in average execution time (negative when slower)
    #[serde(with = "crate::serde_millis")]
    pub actual_improvement: chrono::Duration,
    /// Composite gain ratio (positive = better)
    pub performance_gain: f64,
}

/// Verified outcome of a set of applied strategies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationValidationResult {
    /// Whether the aggregate improvement is positive
    pub was_successful: bool,
    /// Mean performance gain across strategies
    pub overall_improvement: f64,
    /// Per-strategy results, in input order
    pub strategy_results: Vec<StrategyValidationResult>,
}

/// An issue found while assessing system stability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthIssue {
    /// Affected component
    pub component: String,
    /// Issue severity
    pub severity: ValidationSeverity,
    /// Human-readable description
    pub message: String,
}

/// Result of a system stability assessment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemHealthValidationResult {
    /// True when no error-level issue was found
    pub is_stable: bool,
    /// Stability score (0.0 to 1.0)
    pub stability_score: f64,
    /// Issues in discovery order
    pub issues: Vec<HealthIssue>,
}

impl SystemHealthValidationResult {
    /// A fully stable result.
    pub fn stable() -> Self {
        Self {
            is_stable: true,
            stability_score: 1.0,
            issues: Vec::new(),
        }
    }

    /// Record an issue and deduct from the stability score.
    pub fn record(
        &mut self,
        component: impl Into<String>,
        severity: ValidationSeverity,
        message: impl Into<String>,
        deduction: f64,
    ) {
        self.issues.push(HealthIssue {
            component: component.into(),
            severity,
            message: message.into(),
        });
        self.stability_score = (self.stability_score - deduction.max(0.0)).max(0.0);
        if severity == ValidationSeverity::Error {
            self.is_stable = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_worst_of() {
        assert_eq!(ValidationSeverity::Success.worst(ValidationSeverity::Warning), ValidationSeverity::Warning);
        assert_eq!(ValidationSeverity::Error.worst(ValidationSeverity::Warning), ValidationSeverity::Error);
        assert_eq!(ValidationSeverity::Success.worst(ValidationSeverity::Success), ValidationSeverity::Success);
    }

    #[test]
    fn test_deserialize_recomputes_validity() {
        let tampered = r#"{"is_valid":true,"severity":"Success","errors":["boom"],"warnings":[]}"#;
        let result: ValidationResult = serde_json::from_str(tampered).unwrap();
        assert!(!result.is_valid());
        assert_eq!(result.severity(), ValidationSeverity::Error);
        assert_eq!(result.errors(), &["boom".to_string()]);

        let mut original = ValidationResult::success();
        original.add_warning("slow");
        let json = serde_json::to_string(&original).unwrap();
        let restored: ValidationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, original);

        let bare: ValidationResult = serde_json::from_str("{}").unwrap();
        assert_eq!(bare, ValidationResult::success());
    }

    #[test]
    fn test_error_invalidates() {
        let mut result = ValidationResult::success();
        result.add_warning("slow");
        assert!(result.is_valid());
        assert_eq!(result.severity(), ValidationSeverity::Warning);

        result.add_error("broken");
        assert!(!result.is_valid());
        assert_eq!(result.severity(), ValidationSeverity::Error);
    }

    #[test]
    fn test_merge_takes_worst() {
        let mut a = ValidationResult::success();
        a.add_warning("w1");
        let mut b = ValidationResult::success();
        b.add_error("e1");

        a.merge(b);
        assert_eq!(a.severity(), ValidationSeverity::Error);
        assert_eq!(a.errors(), &["e1".to_string()]);
        assert_eq!(a.warnings(), &["w1".to_string()]);
    }

    #[test]
    fn test_stability_score_only_decreases() {
        let mut result = SystemHealthValidationResult::stable();
        result.record("Reliability", ValidationSeverity::Warning, "low", 0.05);
        assert!(result.is_stable);
        let before = result.stability_score;

        result.record("Cache", ValidationSeverity::Error, "critical", -1.0);
        assert!(!result.is_stable);
        assert!(result.stability_score <= before);

        result.record("Db", ValidationSeverity::Error, "critical", 5.0);
        assert_eq!(result.stability_score, 0.0);
    }
}
