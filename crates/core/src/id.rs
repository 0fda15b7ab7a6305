//! Unique identifiers for perftune entities.

use serde::{Deserialize, Serialize};
use ulid::Ulid;

/// Unique identifier for an optimization recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecommendationId(Ulid);

impl RecommendationId {
    /// Generate a new RecommendationId
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for RecommendationId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecommendationId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl std::str::FromStr for RecommendationId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}
