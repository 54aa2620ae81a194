//! Deviation engine configuration contracts shared across crates.

use serde::{Deserialize, Serialize};

use crate::ProjectionMode;

/// Deviation engine configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviationEngineConfig {
    /// Projection of the test point onto the bracketing pair
    #[serde(default)]
    pub projection: ProjectionMode,

    /// A bracket whose xy length is at or below this value is degenerate
    #[serde(default)]
    pub degenerate_epsilon: f64,

    /// Reject reference trajectories with decreasing timestamps in time-based modes
    #[serde(default = "default_validate_reference_order")]
    pub validate_reference_order: bool,
}

fn default_validate_reference_order() -> bool {
    true
}

impl Default for DeviationEngineConfig {
    fn default() -> Self {
        Self {
            projection: ProjectionMode::Line,
            degenerate_epsilon: 0.0,
            validate_reference_order: true,
        }
    }
}

impl DeviationEngineConfig {
    pub fn with_projection(mut self, projection: ProjectionMode) -> Self {
        self.projection = projection;
        self
    }

    pub fn with_degenerate_epsilon(mut self, epsilon: f64) -> Self {
        self.degenerate_epsilon = epsilon;
        self
    }

    pub fn with_reference_order_check(mut self, enabled: bool) -> Self {
        self.validate_reference_order = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeviationEngineConfig::default();
        assert_eq!(config.projection, ProjectionMode::Line);
        assert_eq!(config.degenerate_epsilon, 0.0);
        assert!(config.validate_reference_order);
    }

    #[test]
    fn test_partial_deserialize_uses_defaults() {
        let config: DeviationEngineConfig =
            serde_json::from_str(r#"{"projection":"segment"}"#).unwrap();
        assert_eq!(config.projection, ProjectionMode::Segment);
        assert!(config.validate_reference_order);
    }
}
