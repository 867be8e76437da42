use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

/// Distance (meters) and angle (radians) limits for edge candidates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EdgeCalculatorSettings {
    pub pano_min_distance: f64,
    pub pano_max_distance: f64,
    pub pano_preferred_distance: f64,
    /// Number of angular sectors around a spherical source.
    pub pano_max_items: usize,
    pub pano_max_step_turn_change: f64,

    pub similar_max_direction_change: f64,
    pub similar_max_distance: f64,
    /// Captures by the same creator closer in time than this (ms) are not similar.
    pub similar_min_time_difference: i64,

    pub step_max_distance: f64,
    pub step_max_direction_change: f64,
    pub step_max_drift: f64,
    pub step_preferred_distance: f64,

    pub turn_max_distance: f64,
    pub turn_max_direction_change: f64,
    /// Candidates closer than this are treated as part of the same camera rig.
    pub turn_max_rig_distance: f64,
    pub turn_min_rig_direction_change: f64,
}

impl Default for EdgeCalculatorSettings {
    fn default() -> Self {
        Self {
            pano_min_distance: 0.1,
            pano_max_distance: 20.0,
            pano_preferred_distance: 5.0,
            pano_max_items: 4,
            pano_max_step_turn_change: PI / 8.0,

            similar_max_direction_change: PI / 8.0,
            similar_max_distance: 12.0,
            similar_min_time_difference: 12 * 3600 * 1000,

            step_max_distance: 20.0,
            step_max_direction_change: PI / 6.0,
            step_max_drift: PI / 6.0,
            step_preferred_distance: 4.0,

            turn_max_distance: 15.0,
            turn_max_direction_change: 2.0 * PI / 9.0,
            turn_max_rig_distance: 0.65,
            turn_min_rig_direction_change: PI / 6.0,
        }
    }
}

impl EdgeCalculatorSettings {
    /// Largest distance at which any edge type can connect two nodes.
    pub fn max_distance(&self) -> f64 {
        self.pano_max_distance
            .max(self.similar_max_distance)
            .max(self.step_max_distance)
            .max(self.turn_max_distance)
    }
}
