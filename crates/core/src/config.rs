//! Engine and validation configuration.
//!
//! Plain values only; reading them from files or the environment is up to
//! the embedding application.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::recommendation::RiskLevel;
use crate::Time;

/// Errors raised when a configuration is internally inconsistent.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ConfigError {
    /// A value is outside its permitted range
    #[error("{field} out of range: {reason}")]
    OutOfRange {
        /// Offending field
        field: &'static str,
        /// What is wrong with it
        reason: String,
    },

    /// An interval is zero
    #[error("{0} must be greater than zero")]
    ZeroInterval(&'static str),
}

/// Configuration shared by the validation framework and optimization engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OptimizationConfig {
    /// Recommendations below this confidence are rejected
    pub min_confidence_score: f64,
    /// Highest risk applied without human sign-off
    pub max_automatic_optimization_risk: RiskLevel,
    /// Whether optimizations may be applied automatically
    pub enable_automatic_optimization: bool,
    /// Whether the engine keeps learning from history and feedback
    pub learning_enabled: bool,
    /// Period of the model update task
    pub model_update_interval: Duration,
    /// Period of the metrics collection task
    pub metrics_collection_interval: Duration,
    /// History required before the model is recomputed
    pub min_history_for_model_update: Duration,
    /// Batch size proposed when batching is recommended
    pub default_batch_size: u32,
    /// Upper bound for proposed batch sizes
    pub max_batch_size: u32,
    /// Samples kept per metric in the time-series store
    pub time_series_max_samples: usize,
    /// Windows kept in the rolling-window cache
    pub rolling_window_capacity: usize,
    /// p95 above which a request type counts as slow
    pub slow_request_threshold: Duration,
    /// Opaque model version, passed through
    pub model_version: String,
    /// Opaque model training date, passed through
    pub model_training_date: Option<Time>,
}

impl Default for OptimizationConfig {
    fn default() -> Self {
        Self {
            min_confidence_score: 0.7,
            max_automatic_optimization_risk: RiskLevel::Medium,
            enable_automatic_optimization: false,
            learning_enabled: true,
            model_update_interval: Duration::from_secs(60 * 60),
            metrics_collection_interval: Duration::from_secs(30),
            min_history_for_model_update: Duration::from_secs(24 * 60 * 60),
            default_batch_size: 10,
            max_batch_size: 100,
            time_series_max_samples: 10_000,
            rolling_window_capacity: 168,
            slow_request_threshold: Duration::from_millis(500),
            model_version: "1.0.0".to_string(),
            model_training_date: None,
        }
    }
}

impl OptimizationConfig {
    /// Create the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the minimum confidence score.
    pub fn with_min_confidence(mut self, score: f64) -> Self {
        self.min_confidence_score = score;
        self
    }

    /// Enable or disable automatic optimization with the given risk ceiling.
    pub fn with_automatic_optimization(mut self, enabled: bool, max_risk: RiskLevel) -> Self {
        self.enable_automatic_optimization = enabled;
        self.max_automatic_optimization_risk = max_risk;
        self
    }

    /// Enable or disable learning.
    pub fn with_learning(mut self, enabled: bool) -> Self {
        self.learning_enabled = enabled;
        self
    }

    /// Set both background task periods.
    pub fn with_intervals(mut self, model_update: Duration, metrics_collection: Duration) -> Self {
        self.model_update_interval = model_update;
        self.metrics_collection_interval = metrics_collection;
        self
    }

    /// Set the history required before a model update.
    pub fn with_min_history(mut self, history: Duration) -> Self {
        self.min_history_for_model_update = history;
        self
    }

    /// Set batch sizing.
    pub fn with_batch_sizes(mut self, default_size: u32, max_size: u32) -> Self {
        self.default_batch_size = default_size;
        self.max_batch_size = max_size;
        self
    }

    /// Set storage bounds.
    pub fn with_capacity(mut self, max_samples: usize, window_capacity: usize) -> Self {
        self.time_series_max_samples = max_samples;
        self.rolling_window_capacity = window_capacity;
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.min_confidence_score) {
            return Err(ConfigError::OutOfRange {
                field: "min_confidence_score",
                reason: format!("{} is not within [0, 1]", self.min_confidence_score),
            });
        }
        if self.model_update_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("model_update_interval"));
        }
        if self.metrics_collection_interval.is_zero() {
            return Err(ConfigError::ZeroInterval("metrics_collection_interval"));
        }
        if self.max_batch_size < 2 {
            return Err(ConfigError::OutOfRange {
                field: "max_batch_size",
                reason: format!("{} is below the minimum batch size of 2", self.max_batch_size),
            });
        }
        if self.time_series_max_samples == 0 {
            return Err(ConfigError::OutOfRange {
                field: "time_series_max_samples",
                reason: "must keep at least one sample".to_string(),
            });
        }
        if self.rolling_window_capacity == 0 {
            return Err(ConfigError::OutOfRange {
                field: "rolling_window_capacity",
                reason: "must keep at least one window".to_string(),
            });
        }
        Ok(())
    }
}
