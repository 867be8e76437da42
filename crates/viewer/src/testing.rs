use foundation::math::Vec3;
use geometry::{CameraType, Transform, TransformParams};
use std::f64::consts::FRAC_PI_2;

use crate::animation::TrajectoryImage;

/// North-facing 640x480 image whose camera center sits at `(east, north, 0)`.
pub(crate) fn image(
    key: &str,
    east: f64,
    north: f64,
    camera_type: CameraType,
    focal: f64,
) -> TrajectoryImage {
    let params = |translation: Vec3| TransformParams {
        width: 640.0,
        height: 480.0,
        rotation: Vec3::new(FRAC_PI_2, 0.0, 0.0),
        translation,
        camera_type,
        camera_parameters: vec![focal],
        ..TransformParams::default()
    };
    // A camera center c needs the translation -R c.
    let rotation = Transform::new(params(Vec3::ZERO));
    let rotated = rotation.rt().transform_direction(Vec3::new(east, north, 0.0));
    TrajectoryImage::new(key, Transform::new(params(-rotated)), Some("m".into()))
}
