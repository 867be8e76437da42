use std::f64::consts::FRAC_PI_2;

use foundation::math::Vec3;

use crate::transform::Transform;

/// Distance along the optical axis used to place the look-at point.
const LOOKAT_DISTANCE: f64 = 10.0;

/// Position, look-at point, up direction and focal length of a viewing camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraPose {
    pub position: Vec3,
    pub lookat: Vec3,
    pub up: Vec3,
    pub focal: f64,
}

impl Default for CameraPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            lookat: Vec3::new(1.0, 0.0, 0.0),
            up: Vec3::new(0.0, 0.0, 1.0),
            focal: 1.0,
        }
    }
}

impl CameraPose {
    /// Pose of the capturing camera of an image.
    pub fn from_transform(transform: &Transform) -> Self {
        Self {
            position: transform.unproject_sfm([0.0, 0.0], 0.0, false),
            lookat: transform.unproject_sfm([0.0, 0.0], LOOKAT_DISTANCE, false),
            up: transform.up_vector(),
            focal: focal_for(transform),
        }
    }

    /// Component-wise linear interpolation from `a` (alpha 0) to `b` (alpha 1).
    pub fn lerp(a: &CameraPose, b: &CameraPose, alpha: f64) -> CameraPose {
        CameraPose {
            position: a.position.lerp(b.position, alpha),
            lookat: a.lookat.lerp(b.lookat, alpha),
            up: a.up.lerp(b.up, alpha),
            focal: (1.0 - alpha) * a.focal + alpha * b.focal,
        }
    }

    /// Largest of the squared position, look-at and up distances and
    /// `100 * |focal difference|`.
    pub fn diff(&self, other: &CameraPose) -> f64 {
        let pd = self.position.distance_squared(other.position);
        let ld = self.lookat.distance_squared(other.lookat);
        let ud = self.up.distance_squared(other.up);
        let fd = 100.0 * (self.focal - other.focal).abs();
        pd.max(ld).max(ud).max(fd)
    }

    pub fn direction(&self) -> Vec3 {
        self.lookat - self.position
    }
}

fn focal_for(transform: &Transform) -> f64 {
    if transform.camera_type().is_spherical() {
        // Vanishing focal for a full sphere.
        0.5 / FRAC_PI_2.tan()
    } else {
        transform.focal()
    }
}
