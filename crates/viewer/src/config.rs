use serde::{Deserialize, Serialize};

use crate::render_mode::RenderMode;

/// Camera and animation defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderCameraConfig {
    /// Vertical field of view in degrees used before any image is shown.
    pub initial_fov: f64,

    pub near: f64,
    pub far: f64,

    /// Alpha advanced per frame at 60 fps.
    pub animation_speed: f64,

    pub render_mode: RenderMode,
}

impl Default for RenderCameraConfig {
    fn default() -> Self {
        Self {
            initial_fov: 60.0,
            near: 0.1,
            far: 10_000.0,
            animation_speed: 1.0 / 40.0,
            render_mode: RenderMode::Fill,
        }
    }
}
