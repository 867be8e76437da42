use serde::{Deserialize, Serialize};

/// Weights of the terms in the edge candidate scores. Lower scores win.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeCalculatorCoefficients {
    pub pano_preferred_distance: f64,
    pub pano_motion: f64,
    pub pano_sequence_penalty: f64,
    pub pano_merge_cc_penalty: f64,

    pub step_preferred_distance: f64,
    pub step_motion: f64,
    pub step_rotation: f64,
    pub step_sequence_penalty: f64,
    pub step_merge_cc_penalty: f64,

    pub similar_distance: f64,
    pub similar_rotation: f64,

    pub turn_distance: f64,
    pub turn_motion: f64,
    pub turn_sequence_penalty: f64,
    pub turn_merge_cc_penalty: f64,
}

impl Default for EdgeCalculatorCoefficients {
    fn default() -> Self {
        Self {
            pano_preferred_distance: 2.0,
            pano_motion: 2.0,
            pano_sequence_penalty: 1.0,
            pano_merge_cc_penalty: 4.0,

            step_preferred_distance: 4.0,
            step_motion: 3.0,
            step_rotation: 4.0,
            step_sequence_penalty: 2.0,
            step_merge_cc_penalty: 6.0,

            similar_distance: 2.0,
            similar_rotation: 3.0,

            turn_distance: 4.0,
            turn_motion: 2.0,
            turn_sequence_penalty: 1.0,
            turn_merge_cc_penalty: 4.0,
        }
    }
}
