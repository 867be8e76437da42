// Viewport coordinates are normalized device coordinates on `[-1, 1]` with
// y up. Canvas coordinates are pixels with a top-left origin.

use foundation::math::Vec3;

use crate::perspective::PerspectiveCamera;
use crate::transform::Transform;

/// Pixel size of the render surface.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct CanvasSize {
    pub width: f64,
    pub height: f64,
}

impl CanvasSize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

/// Stateless coordinate converter.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct ViewportCoords {
    /// Depth used when unprojecting basic coordinates onto the image plane.
    pub unproject_depth: f64,
}

impl Default for ViewportCoords {
    fn default() -> Self {
        Self {
            unproject_depth: 200.0,
        }
    }
}

impl ViewportCoords {
    pub fn basic_to_canvas(
        &self,
        basic: [f64; 2],
        size: CanvasSize,
        transform: &Transform,
        camera: &PerspectiveCamera,
    ) -> [f64; 2] {
        let point = transform.unproject_basic(basic, self.unproject_depth, true);
        self.project_to_canvas(point, size, camera)
    }

    /// Like [`Self::basic_to_canvas`] but `None` when the point is behind the camera.
    pub fn basic_to_canvas_safe(
        &self,
        basic: [f64; 2],
        size: CanvasSize,
        transform: &Transform,
        camera: &PerspectiveCamera,
    ) -> Option<[f64; 2]> {
        let viewport = self.basic_to_viewport_safe(basic, transform, camera)?;
        Some(self.viewport_to_canvas(viewport, size))
    }

    pub fn basic_to_viewport(
        &self,
        basic: [f64; 2],
        transform: &Transform,
        camera: &PerspectiveCamera,
    ) -> [f64; 2] {
        let point = transform.unproject_basic(basic, self.unproject_depth, true);
        self.project_to_viewport(point, camera)
    }

    pub fn basic_to_viewport_safe(
        &self,
        basic: [f64; 2],
        transform: &Transform,
        camera: &PerspectiveCamera,
    ) -> Option<[f64; 2]> {
        let point = transform.unproject_basic(basic, self.unproject_depth, true);
        let camera_point = self.world_to_camera(point, camera);
        // The camera looks down -Z.
        if camera_point.z > 0.0 {
            return None;
        }
        Some(self.camera_to_viewport(camera_point, camera))
    }

    pub fn canvas_to_basic(
        &self,
        canvas: [f64; 2],
        size: CanvasSize,
        transform: &Transform,
        camera: &PerspectiveCamera,
    ) -> [f64; 2] {
        let point = self.unproject_from_canvas(canvas, size, camera);
        transform.project_basic(point)
    }

    pub fn canvas_to_viewport(&self, canvas: [f64; 2], size: CanvasSize) -> [f64; 2] {
        [
            2.0 * canvas[0] / size.width - 1.0,
            1.0 - 2.0 * canvas[1] / size.height,
        ]
    }

    pub fn viewport_to_canvas(&self, viewport: [f64; 2], size: CanvasSize) -> [f64; 2] {
        [
            size.width * (viewport[0] + 1.0) / 2.0,
            -size.height * (viewport[1] - 1.0) / 2.0,
        ]
    }

    pub fn viewport_to_basic(
        &self,
        viewport: [f64; 2],
        transform: &Transform,
        camera: &PerspectiveCamera,
    ) -> [f64; 2] {
        let point = self.unproject_from_viewport(viewport, camera);
        transform.project_basic(point)
    }

    /// World point on the far side of the frustum under a viewport position.
    pub fn unproject_from_viewport(&self, viewport: [f64; 2], camera: &PerspectiveCamera) -> Vec3 {
        camera.unproject(Vec3::new(viewport[0], viewport[1], 1.0))
    }

    pub fn unproject_from_canvas(
        &self,
        canvas: [f64; 2],
        size: CanvasSize,
        camera: &PerspectiveCamera,
    ) -> Vec3 {
        self.unproject_from_viewport(self.canvas_to_viewport(canvas, size), camera)
    }

    pub fn project_to_viewport(&self, point: Vec3, camera: &PerspectiveCamera) -> [f64; 2] {
        let ndc = camera.project(point);
        [ndc.x, ndc.y]
    }

    pub fn project_to_canvas(
        &self,
        point: Vec3,
        size: CanvasSize,
        camera: &PerspectiveCamera,
    ) -> [f64; 2] {
        let viewport = self.project_to_viewport(point, camera);
        self.viewport_to_canvas(viewport, size)
    }

    pub fn world_to_camera(&self, point: Vec3, camera: &PerspectiveCamera) -> Vec3 {
        camera.matrix_world_inverse().transform_point(point)
    }

    pub fn camera_to_viewport(&self, point: Vec3, camera: &PerspectiveCamera) -> [f64; 2] {
        let ndc = camera.projection_matrix().transform_point(point);
        [ndc.x, ndc.y]
    }

    pub fn inside_viewport(&self, viewport: [f64; 2]) -> bool {
        viewport[0] >= -1.0 && viewport[0] <= 1.0 && viewport[1] >= -1.0 && viewport[1] <= 1.0
    }

    /// Basic distances `[top, right, bottom, left]` by which the viewport
    /// corners extend past the image edges; zero where the image covers them.
    pub fn get_basic_distances(&self, transform: &Transform, camera: &PerspectiveCamera) -> [f64; 4] {
        let top_left = self.viewport_to_basic([-1.0, 1.0], transform, camera);
        let bottom_right = self.viewport_to_basic([1.0, -1.0], transform, camera);
        [
            top_left[1].max(0.0),
            (bottom_right[0] - 1.0).max(0.0),
            (bottom_right[1] - 1.0).max(0.0),
            top_left[0].max(0.0),
        ]
    }

    /// Pixel distances `[top, right, bottom, left]` between the canvas edges
    /// and the image edges, for edges where the image does not reach the canvas.
    pub fn get_pixel_distances(
        &self,
        size: CanvasSize,
        transform: &Transform,
        camera: &PerspectiveCamera,
    ) -> [f64; 4] {
        let [top_b, right_b, bottom_b, left_b] = self.get_basic_distances(transform, camera);

        let top = if top_b > 0.0 {
            self.basic_to_canvas([0.5, 0.0], size, transform, camera)[1].max(0.0)
        } else {
            0.0
        };
        let right = if right_b > 0.0 {
            (size.width - self.basic_to_canvas([1.0, 0.5], size, transform, camera)[0]).max(0.0)
        } else {
            0.0
        };
        let bottom = if bottom_b > 0.0 {
            (size.height - self.basic_to_canvas([0.5, 1.0], size, transform, camera)[1]).max(0.0)
        } else {
            0.0
        };
        let left = if left_b > 0.0 {
            self.basic_to_canvas([0.0, 0.5], size, transform, camera)[0].max(0.0)
        } else {
            0.0
        };
        [top, right, bottom, left]
    }
}

#[cfg(test)]
mod tests {
    use super::{CanvasSize, ViewportCoords};
    use crate::camera::CameraPose;
    use crate::camera_type::CameraType;
    use crate::perspective::PerspectiveCamera;
    use crate::transform::{Transform, TransformParams};
    use foundation::math::Vec3;
    use std::f64::consts::FRAC_PI_2;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn setup(fov: f64) -> (Transform, PerspectiveCamera) {
        let transform = Transform::new(TransformParams {
            width: 400.0,
            height: 300.0,
            rotation: Vec3::new(FRAC_PI_2, 0.0, 0.0),
            camera_type: CameraType::Perspective,
            camera_parameters: vec![1.0],
            ..TransformParams::default()
        });
        let pose = CameraPose::from_transform(&transform);
        let mut camera = PerspectiveCamera::new(fov, 4.0 / 3.0, 0.1, 10000.0);
        camera.set_pose(pose.position, pose.up, pose.lookat);
        (transform, camera)
    }

    #[test]
    fn canvas_viewport_round_trip() {
        let coords = ViewportCoords::default();
        let size = CanvasSize::new(800.0, 600.0);
        assert_eq!(coords.canvas_to_viewport([0.0, 0.0], size), [-1.0, 1.0]);
        assert_eq!(coords.canvas_to_viewport([800.0, 600.0], size), [1.0, -1.0]);
        assert_eq!(coords.viewport_to_canvas([0.0, 0.0], size), [400.0, 300.0]);
        let v = coords.canvas_to_viewport([123.0, 456.0], size);
        assert_eq!(coords.viewport_to_canvas(v, size), [123.0, 456.0]);
    }

    #[test]
    fn image_center_is_viewport_center() {
        let (transform, camera) = setup(50.0);
        let coords = ViewportCoords::default();
        let v = coords.basic_to_viewport([0.5, 0.5], &transform, &camera);
        assert_close(v[0], 0.0, 1e-9);
        assert_close(v[1], 0.0, 1e-9);
        assert!(coords.inside_viewport(v));

        let basic = coords.viewport_to_basic([0.0, 0.0], &transform, &camera);
        assert_close(basic[0], 0.5, 1e-6);
        assert_close(basic[1], 0.5, 1e-6);
    }

    #[test]
    fn basic_and_canvas_round_trip() {
        let (transform, camera) = setup(50.0);
        let coords = ViewportCoords::default();
        let size = CanvasSize::new(640.0, 480.0);
        let canvas = coords.basic_to_canvas([0.3, 0.6], size, &transform, &camera);
        let basic = coords.canvas_to_basic(canvas, size, &transform, &camera);
        assert_close(basic[0], 0.3, 1e-6);
        assert_close(basic[1], 0.6, 1e-6);
        // Image top is at the top of the canvas side: y grows downward in both.
        let top = coords.basic_to_canvas([0.5, 0.0], size, &transform, &camera);
        assert!(top[1] < canvas[1]);
    }

    #[test]
    fn safe_projection_rejects_points_behind_camera() {
        let (transform, mut camera) = setup(50.0);
        let coords = ViewportCoords::default();
        assert!(coords.basic_to_viewport_safe([0.5, 0.5], &transform, &camera).is_some());
        // Turn around.
        let position = camera.position;
        camera.look_at(position - Vec3::new(0.0, 10.0, 0.0));
        assert!(coords.basic_to_viewport_safe([0.5, 0.5], &transform, &camera).is_none());
        assert!(
            coords
                .basic_to_canvas_safe([0.5, 0.5], CanvasSize::new(10.0, 10.0), &transform, &camera)
                .is_none()
        );
    }

    #[test]
    fn basic_distances_zero_when_zoomed_in() {
        // A narrow field of view shows only the image interior.
        let (transform, camera) = setup(20.0);
        let coords = ViewportCoords::default();
        assert_eq!(coords.get_basic_distances(&transform, &camera), [0.0; 4]);
        let size = CanvasSize::new(640.0, 480.0);
        assert_eq!(coords.get_pixel_distances(size, &transform, &camera), [0.0; 4]);
    }

    #[test]
    fn basic_distances_positive_when_zoomed_out() {
        let (transform, camera) = setup(120.0);
        let coords = ViewportCoords::default();
        let d = coords.get_basic_distances(&transform, &camera);
        assert!(d.iter().all(|v| *v > 0.0), "{d:?}");
        let size = CanvasSize::new(640.0, 480.0);
        let p = coords.get_pixel_distances(size, &transform, &camera);
        assert!(p.iter().all(|v| *v > 0.0), "{p:?}");
        assert!(p[0] < 240.0 && p[3] < 320.0);
    }
}
