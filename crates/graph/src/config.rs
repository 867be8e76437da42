use serde::{Deserialize, Serialize};

use crate::edge_calculator::{EdgeCalculatorCoefficients, EdgeCalculatorSettings};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub settings: EdgeCalculatorSettings,
    pub coefficients: EdgeCalculatorCoefficients,
    /// Half-size in meters of the box searched for edge candidates.
    pub spatial_area_threshold: f64,
    /// Computed altitude in meters used when the metadata has none.
    pub default_altitude: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            settings: EdgeCalculatorSettings::default(),
            coefficients: EdgeCalculatorCoefficients::default(),
            spatial_area_threshold: 20.0,
            default_altitude: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GraphConfig;

    #[test]
    fn nested_overrides_keep_other_defaults() {
        let config: GraphConfig = serde_json::from_str(
            r#"{"spatial_area_threshold": 30.0, "coefficients": {"step_motion": 1.5}}"#,
        )
        .unwrap();
        assert_eq!(config.spatial_area_threshold, 30.0);
        assert_eq!(config.default_altitude, 2.0);
        assert_eq!(config.coefficients.step_motion, 1.5);
        assert_eq!(config.coefficients.turn_distance, 4.0);
        assert_eq!(config.settings, GraphConfig::default().settings);
    }
}
