// Rotations are angle-axis vectors: the direction is the axis, the length is
// the angle in radians.

use std::f64::consts::{FRAC_PI_2, PI};

use crate::math::{Mat4, Vec3};

/// Convert an azimuthal angle (counter-clockwise from east) to a compass
/// bearing (clockwise from north), both in radians.
pub fn azimuthal_to_bearing(phi: f64) -> f64 {
    -phi + FRAC_PI_2
}

/// Wrap `value` into `[min, max]` by whole intervals.
pub fn wrap(value: f64, min: f64, max: f64) -> f64 {
    if !value.is_finite() || max <= min {
        return value;
    }
    let interval = max - min;
    let mut v = value;
    while v > max {
        v -= interval;
    }
    while v < min {
        v += interval;
    }
    v
}

/// Wrap an angle onto `[-pi, pi]`.
pub fn wrap_angle(angle: f64) -> f64 {
    wrap(angle, -PI, PI)
}

/// Signed angle from `v1` to `v2` in the plane, wrapped onto `[-pi, pi]`.
pub fn angle_between_vector2(v1x: f64, v1y: f64, v2x: f64, v2y: f64) -> f64 {
    wrap_angle(v2y.atan2(v2x) - v1y.atan2(v1x))
}

/// Unsigned angle between two 3D vectors.
pub fn angle_between_vector3(v1: Vec3, v2: Vec3) -> f64 {
    let denom = v1.length() * v2.length();
    if denom == 0.0 {
        return 0.0;
    }
    (v1.dot(v2) / denom).clamp(-1.0, 1.0).acos()
}

/// Wrapped difference `a1 - a2`.
pub fn angle_difference(a1: f64, a2: f64) -> f64 {
    wrap_angle(a1 - a2)
}

/// Elevation of `vector` above the plane with normal `plane_normal`.
pub fn angle_to_plane(vector: Vec3, plane_normal: Vec3) -> f64 {
    let denom = plane_normal.length() * vector.length();
    if denom == 0.0 {
        return 0.0;
    }
    (plane_normal.dot(vector) / denom).clamp(-1.0, 1.0).asin()
}

pub fn rotation_matrix(angle_axis: Vec3) -> Mat4 {
    let angle = angle_axis.length();
    if angle == 0.0 {
        return Mat4::IDENTITY;
    }
    Mat4::from_axis_angle(angle_axis * (1.0 / angle), angle)
}

pub fn rotate(vector: Vec3, angle_axis: Vec3) -> Vec3 {
    rotation_matrix(angle_axis).transform_direction(vector)
}

/// Camera center in world coordinates for the extrinsics `x_cam = R x + t`.
pub fn optical_center(rotation: Vec3, translation: Vec3) -> Vec3 {
    rotate(-translation, -rotation)
}

/// Camera optical axis (+Z in camera space) expressed in world coordinates.
pub fn viewing_direction(rotation: Vec3) -> Vec3 {
    rotate(Vec3::new(0.0, 0.0, 1.0), -rotation)
}

/// Angle of the rotation taking camera 1 to camera 2.
pub fn relative_rotation_angle(rotation1: Vec3, rotation2: Vec3) -> f64 {
    let r1t = rotation_matrix(-rotation1);
    let r2 = rotation_matrix(rotation2);
    let r = r1t * r2;
    let trace = r.get(0, 0) + r.get(1, 1) + r.get(2, 2);
    ((trace - 1.0) / 2.0).clamp(-1.0, 1.0).acos()
}

/// Azimuth of `direction` projected onto the plane orthogonal to `up`.
pub fn azimuthal(direction: Vec3, up: Vec3) -> f64 {
    let up_projection = direction.dot(up);
    let plane = direction - up * up_projection;
    plane.y.atan2(plane.x)
}
