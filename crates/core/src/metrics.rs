//! Execution metrics model.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use crate::Time;

/// Execution metrics for a single request type.
///
/// Produced by the metrics aggregator and consumed read-only by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestExecutionMetrics {
    /// Total executions observed
    pub total_executions: u64,

    /// Executions that completed successfully
    pub successful_executions: u64,

    /// Executions that failed
    pub failed_executions: u64,

    /// Mean execution time
    pub average_execution_time: Duration,

    /// 95th percentile execution time
    pub p95_execution_time: Duration,

    /// Executions in flight when the snapshot was taken
    pub concurrent_executions: u32,

    /// Memory in use (bytes)
    pub memory_usage: u64,

    /// Memory allocated over the window (bytes)
    pub memory_allocated: u64,

    /// Downstream database calls
    pub database_calls: u64,

    /// Downstream external API calls
    pub external_api_calls: u64,

    /// Success rate (0.0 to 1.0)
    pub success_rate: f64,

    /// Last time this request type executed
    pub last_execution: Time,
}

impl RequestExecutionMetrics {
    /// Database calls issued per execution.
    pub fn database_calls_per_execution(&self) -> f64 {
        per_execution(self.database_calls, self.total_executions)
    }

    /// External API calls issued per execution.
    pub fn external_calls_per_execution(&self) -> f64 {
        per_execution(self.external_api_calls, self.total_executions)
    }

    /// Bytes allocated per execution.
    pub fn memory_per_execution(&self) -> f64 {
        per_execution(self.memory_allocated, self.total_executions)
    }

    /// Failure rate (complement of the success rate).
    pub fn failure_rate(&self) -> f64 {
        (1.0 - self.success_rate).clamp(0.0, 1.0)
    }

    /// Average execution time in fractional milliseconds.
    pub fn average_ms(&self) -> f64 {
        self.average_execution_time.as_secs_f64() * 1000.0
    }

    /// 95th percentile execution time in fractional milliseconds.
    pub fn p95_ms(&self) -> f64 {
        self.p95_execution_time.as_secs_f64() * 1000.0
    }
}

impl Default for RequestExecutionMetrics {
    fn default() -> Self {
        Self {
            total_executions: 0,
            successful_executions: 0,
            failed_executions: 0,
            average_execution_time: Duration::ZERO,
            p95_execution_time: Duration::ZERO,
            concurrent_executions: 0,
            memory_usage: 0,
            memory_allocated: 0,
            database_calls: 0,
            external_api_calls: 0,
            success_rate: 1.0,
            last_execution: chrono::Utc::now(),
        }
    }
}

fn per_execution(count: u64, executions: u64) -> f64 {
    if executions == 0 {
        0.0
    } else {
        count as f64 / executions as f64
    }
}

/// A single timestamped metric value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MetricSample {
    /// When the value was observed
    pub timestamp: Time,
    /// Observed value
    pub value: f64,
}

impl MetricSample {
    /// Create a sample.
    pub fn new(timestamp: Time, value: f64) -> Self {
        Self { timestamp, value }
    }

    /// Create a sample stamped with the current time.
    pub fn now(value: f64) -> Self {
        Self::new(chrono::Utc::now(), value)
    }
}

/// Named metric series, as supplied by the metrics aggregator.
pub type MetricSeries = std::collections::HashMap<String, Vec<MetricSample>>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_per_execution_helpers() {
        let metrics = RequestExecutionMetrics {
            total_executions: 10,
            database_calls: 45,
            external_api_calls: 5,
            memory_allocated: 10 * 1024 * 1024,
            ..Default::default()
        };

        assert_eq!(metrics.database_calls_per_execution(), 4.5);
        assert_eq!(metrics.external_calls_per_execution(), 0.5);
        assert_eq!(metrics.memory_per_execution(), 1024.0 * 1024.0);
    }

    #[test]
    fn test_zero_executions_do_not_divide_by_zero() {
        let metrics = RequestExecutionMetrics {
            database_calls: 12,
            ..Default::default()
        };
        assert_eq!(metrics.database_calls_per_execution(), 0.0);
        assert_eq!(metrics.memory_per_execution(), 0.0);
    }

    #[test]
    fn test_millisecond_accessors() {
        let metrics = RequestExecutionMetrics {
            average_execution_time: Duration::from_micros(1500),
            p95_execution_time: Duration::from_millis(20),
            success_rate: 0.75,
            ..Default::default()
        };
        assert!((metrics.average_ms() - 1.5).abs() < f64::EPSILON);
        assert!((metrics.p95_ms() - 20.0).abs() < f64::EPSILON);
        assert!((metrics.failure_rate() - 0.25).abs() < f64::EPSILON);
    }
}
