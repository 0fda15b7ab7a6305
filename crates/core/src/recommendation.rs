//! Optimization recommendation model - strategies, risk, and parameter bags.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use crate::id::RecommendationId;
use crate::Time;

/// Well-known parameter names used by strategy-specific rules.
pub mod params {
    /// Request type the strategy targets
    pub const REQUEST_TYPE: &str = "RequestType";
    /// Expected cache hit rate (0.0 to 1.0)
    pub const EXPECTED_HIT_RATE: &str = "ExpectedHitRate";
    /// Cache entry lifetime in seconds
    pub const CACHE_DURATION_SECS: &str = "CacheDurationSeconds";
    /// Number of items per batch
    pub const OPTIMAL_BATCH_SIZE: &str = "OptimalBatchSize";
    /// Allocation size (bytes) above which pooling applies
    pub const MEMORY_THRESHOLD: &str = "MemoryThreshold";
    /// Maximum parallel downstream calls
    pub const MAX_PARALLELISM: &str = "MaxDegreeOfParallelism";
}

/// Optimization strategies the engine knows how to recommend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum OptimizationStrategy {
    /// Unknown or no strategy
    None,
    EnableCaching,
    BatchProcessing,
    MemoryPooling,
    ParallelProcessing,
    LazyLoading,
    StreamingOptimization,
    DatabaseOptimization,
    ConnectionPooling,
    ResponseCompression,
    CircuitBreaker,
}

impl OptimizationStrategy {
    /// Parameters a recommendation for this strategy must carry.
    pub fn required_parameters(&self) -> &'static [&'static str] {
        match self {
            Self::EnableCaching => &[params::REQUEST_TYPE, params::EXPECTED_HIT_RATE],
            Self::BatchProcessing => &[params::OPTIMAL_BATCH_SIZE],
            Self::MemoryPooling => &[params::MEMORY_THRESHOLD],
            _ => &[],
        }
    }

    /// Highest risk at which this strategy is still recommended, if bounded.
    pub fn max_recommended_risk(&self) -> Option<RiskLevel> {
        match self {
            Self::EnableCaching
            | Self::BatchProcessing
            | Self::ParallelProcessing
            | Self::StreamingOptimization
            | Self::DatabaseOptimization
            | Self::CircuitBreaker => Some(RiskLevel::Medium),
            Self::MemoryPooling
            | Self::LazyLoading
            | Self::ConnectionPooling
            | Self::ResponseCompression => Some(RiskLevel::Low),
            Self::None => None,
        }
    }

    /// Parse a strategy name; unknown names map to [`OptimizationStrategy::None`].
    pub fn from_name(name: &str) -> Self {
        match name {
            "EnableCaching" => Self::EnableCaching,
            "BatchProcessing" => Self::BatchProcessing,
            "MemoryPooling" => Self::MemoryPooling,
            "ParallelProcessing" => Self::ParallelProcessing,
            "LazyLoading" => Self::LazyLoading,
            "StreamingOptimization" => Self::StreamingOptimization,
            "DatabaseOptimization" => Self::DatabaseOptimization,
            "ConnectionPooling" => Self::ConnectionPooling,
            "ResponseCompression" => Self::ResponseCompression,
            "CircuitBreaker" => Self::CircuitBreaker,
            _ => Self::None,
        }
    }
}

impl std::fmt::Display for OptimizationStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// Qualitative risk of applying a recommendation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskLevel {
    VeryLow,
    Low,
    Medium,
    High,
    VeryHigh,
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Debug::fmt(self, f)
    }
}

/// A strategy parameter value.
///
/// `Null` is an explicit value and is distinct from an absent key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl ParamValue {
    /// Whether this is an explicit null.
    pub fn is_null(&self) -> bool {
        matches!(self, ParamValue::Null)
    }

    /// Float value, if this is a float.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Float(v) => Some(*v),
            _ => None,
        }
    }

    /// Integer value, if this is an integer.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Text value, if this is text.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(v) => Some(v),
            _ => None,
        }
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        ParamValue::Float(v)
    }
}

impl From<i64> for ParamValue {
    fn from(v: i64) -> Self {
        ParamValue::Int(v)
    }
}

impl From<i32> for ParamValue {
    fn from(v: i32) -> Self {
        ParamValue::Int(v as i64)
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        ParamValue::Bool(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        ParamValue::Text(v.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        ParamValue::Text(v)
    }
}

/// Strategy parameter bag, ordered by name.
pub type Parameters = BTreeMap<String, ParamValue>;

/// A proposed optimization for one request type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRecommendation {
    /// Unique identifier
    pub id: RecommendationId,

    /// Request type the recommendation targets
    pub request_type: String,

    /// Proposed strategy
    pub strategy: OptimizationStrategy,

    /// Model confidence (0.0 to 1.0)
    pub confidence: f64,

    /// Estimated risk
    pub risk: RiskLevel,

    /// Estimated reduction in average execution time
    #[serde(with = "crate::serde_millis")]
    pub estimated_improvement: chrono::Duration,

    /// Strategy parameters; the bag itself may be absent
    pub parameters: Option<Parameters>,

    /// Why the recommendation was made
    pub reasoning: String,

    /// When the recommendation was drafted
    pub created_at: Time,
}

impl OptimizationRecommendation {
    /// Create a recommendation with no parameters and zero confidence.
    pub fn new(request_type: impl Into<String>, strategy: OptimizationStrategy) -> Self {
        Self {
            id: RecommendationId::new(),
            request_type: request_type.into(),
            strategy,
            confidence: 0.0,
            risk: RiskLevel::Low,
            estimated_improvement: chrono::Duration::zero(),
            parameters: None,
            reasoning: String::new(),
            created_at: chrono::Utc::now(),
        }
    }

    /// Set confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = crate::clamp_unit(confidence);
        self
    }

    /// Set risk.
    pub fn with_risk(mut self, risk: RiskLevel) -> Self {
        self.risk = risk;
        self
    }

    /// Set estimated improvement.
    pub fn with_estimated_improvement(mut self, improvement: chrono::Duration) -> Self {
        self.estimated_improvement = improvement;
        self
    }

    /// Add a parameter, creating the bag if needed.
    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.parameters
            .get_or_insert_with(Parameters::new)
            .insert(name.into(), value.into());
        self
    }

    /// Replace the whole parameter bag.
    pub fn with_parameters(mut self, parameters: Option<Parameters>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Set reasoning.
    pub fn with_reasoning(mut self, reasoning: impl Into<String>) -> Self {
        self.reasoning = reasoning.into();
        self
    }

    /// Look up a parameter. `Some(&ParamValue::Null)` means explicitly null.
    pub fn parameter(&self, name: &str) -> Option<&ParamValue> {
        self.parameters.as_ref().and_then(|p| p.get(name))
    }
}
