use foundation::math::Vec3;

use crate::perspective::PerspectiveCamera;
use crate::transform::Transform;
use crate::viewport::ViewportCoords;

/// Unprojection distance for boundary samples; far enough to sit on the
/// image rather than the near plane.
const SAMPLE_DISTANCE: f64 = 10_000.0;

/// Sample basic points along polylines starting at `vertices` and stepping
/// by `directions`, then express each sample as `[|x / z|, |y / z|]` in the
/// frame of the capturing camera.
///
/// The result is the tangent of the horizontal and vertical half angle
/// needed to see that point, which drives field of view selection.
pub fn compute_projected_points(
    transform: &Transform,
    vertices: &[[f64; 2]],
    directions: &[[f64; 2]],
    points_per_line: usize,
) -> Vec<[f64; 2]> {
    let basic_points = sample_basic_points(vertices, directions, points_per_line);

    let mut camera = PerspectiveCamera::new(60.0, 1.0, 0.1, SAMPLE_DISTANCE);
    camera.set_pose(
        transform.unproject_sfm([0.0, 0.0], 0.0, false),
        transform.up_vector(),
        transform.unproject_sfm([0.0, 0.0], 10.0, false),
    );

    let coords = ViewportCoords::default();
    basic_points
        .into_iter()
        .map(|basic| {
            let world = transform.unproject_basic(basic, SAMPLE_DISTANCE, false);
            let Vec3 { x, y, z } = coords.world_to_camera(world, &camera);
            [(x / z).abs(), (y / z).abs()]
        })
        .collect()
}

fn sample_basic_points(
    vertices: &[[f64; 2]],
    directions: &[[f64; 2]],
    points_per_line: usize,
) -> Vec<[f64; 2]> {
    let steps = points_per_line.max(1);
    let mut out = Vec::with_capacity(vertices.len() * (steps + 1));
    for (vertex, direction) in vertices.iter().zip(directions) {
        for i in 0..=steps {
            let t = i as f64 / steps as f64;
            out.push([vertex[0] + direction[0] * t, vertex[1] + direction[1] * t]);
        }
    }
    out
}
