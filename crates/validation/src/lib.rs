//! Validation framework
//!
//! Gates recommendations before application, verifies their outcome
//! afterwards, and assesses overall system stability.

#![warn(missing_docs)]

pub mod framework;
pub mod rules;
pub mod outcome;
pub mod stability;

pub use framework::{OptimizationValidator, ValidationFramework, ValidationError, Result};
pub use outcome::{performance_gain, TIME_WEIGHT, MEMORY_WEIGHT, SUCCESS_RATE_WEIGHT};
