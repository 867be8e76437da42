use std::f64::consts::{FRAC_PI_2, PI};

use foundation::bounds::Aabb2;
use foundation::geo::{LngLat, bounding_box_around};
use foundation::math::{Mat4, Vec3};

/// Angle-axis world-to-camera rotation of a level camera facing
/// `compass_deg` (clockwise from north), for an EXIF `orientation`.
pub fn rotation_from_compass(compass_deg: f64, orientation: u32) -> Vec3 {
    let (x, y, z) = match orientation {
        1 => (FRAC_PI_2, 0.0, 0.0),
        3 => (-FRAC_PI_2, 0.0, PI),
        6 => (0.0, -FRAC_PI_2, -FRAC_PI_2),
        8 => (0.0, FRAC_PI_2, FRAC_PI_2),
        _ => (0.0, 0.0, 0.0),
    };
    let re = Mat4::from_euler_xyz(x, y, compass_deg.to_radians());
    let rz = Mat4::from_rotation_z(z);
    (re * rz).to_angle_axis()
}

/// Lng/lat query box for the spatial area around a node.
pub fn spatial_area_bounds(center: LngLat, threshold_m: f64) -> Aabb2 {
    bounding_box_around(center, threshold_m)
}

#[cfg(test)]
mod tests {
    use super::rotation_from_compass;
    use foundation::math::Vec3;
    use foundation::spatial::{angle_to_plane, azimuthal, viewing_direction};
    use std::f64::consts::FRAC_PI_2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    const UP: Vec3 = Vec3::new(0.0, 0.0, 1.0);

    #[test]
    fn north_facing_camera() {
        let r = rotation_from_compass(0.0, 1);
        assert_close(r.x, FRAC_PI_2, 1e-9);
        assert_close(r.y, 0.0, 1e-9);
        assert_close(r.z, 0.0, 1e-9);
    }

    #[test]
    fn viewing_direction_follows_compass() {
        for (compass, azimuth) in [(90.0, 0.0), (0.0, FRAC_PI_2), (180.0, -FRAC_PI_2)] {
            let d = viewing_direction(rotation_from_compass(compass, 1));
            assert_close(azimuthal(d, UP), azimuth, 1e-6);
            assert_close(angle_to_plane(d, UP), 0.0, 1e-6);
        }
    }

    #[test]
    fn rotated_exif_keeps_level_view() {
        for orientation in [3, 6, 8] {
            let d = viewing_direction(rotation_from_compass(45.0, orientation));
            assert_close(angle_to_plane(d, UP), 0.0, 1e-6);
            assert_close(azimuthal(d, UP), FRAC_PI_2 / 2.0, 1e-6);
        }
    }
}
