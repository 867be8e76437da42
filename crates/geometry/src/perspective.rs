use foundation::math::{Mat4, Vec3};

/// Symmetric perspective camera with a vertical field of view in degrees.
///
/// Matrices are cached and refreshed by [`PerspectiveCamera::update_projection_matrix`]
/// and [`PerspectiveCamera::look_at`]. Degenerate aspects (0 or infinity)
/// produce non-finite matrices instead of panicking.
#[derive(Debug, Clone, PartialEq)]
pub struct PerspectiveCamera {
    pub fov: f64,
    pub aspect: f64,
    pub near: f64,
    pub far: f64,
    pub zoom: f64,
    pub position: Vec3,
    pub up: Vec3,
    matrix_world: Mat4,
    matrix_world_inverse: Mat4,
    projection_matrix: Mat4,
    projection_matrix_inverse: Mat4,
}

impl PerspectiveCamera {
    pub fn new(fov: f64, aspect: f64, near: f64, far: f64) -> Self {
        let mut camera = Self {
            fov,
            aspect,
            near,
            far,
            zoom: 1.0,
            position: Vec3::ZERO,
            up: Vec3::new(0.0, 1.0, 0.0),
            matrix_world: Mat4::IDENTITY,
            matrix_world_inverse: Mat4::IDENTITY,
            projection_matrix: Mat4::IDENTITY,
            projection_matrix_inverse: Mat4::IDENTITY,
        };
        camera.update_projection_matrix();
        camera
    }

    pub fn update_projection_matrix(&mut self) {
        let top = self.near * (0.5 * self.fov).to_radians().tan() / self.zoom;
        let height = 2.0 * top;
        let width = self.aspect * height;
        let left = -0.5 * width;
        self.projection_matrix =
            Mat4::perspective(left, left + width, top, top - height, self.near, self.far);
        self.projection_matrix_inverse = invert_or_zero(&self.projection_matrix);
    }

    /// Orient the camera at `position` towards `target` using the current `up`.
    pub fn look_at(&mut self, target: Vec3) {
        self.matrix_world = Mat4::look_at(self.position, target, self.up);
        self.matrix_world_inverse = invert_or_zero(&self.matrix_world);
    }

    pub fn set_pose(&mut self, position: Vec3, up: Vec3, target: Vec3) {
        self.position = position;
        self.up = up;
        self.look_at(target);
    }

    pub fn matrix_world(&self) -> &Mat4 {
        &self.matrix_world
    }

    /// View matrix.
    pub fn matrix_world_inverse(&self) -> &Mat4 {
        &self.matrix_world_inverse
    }

    pub fn projection_matrix(&self) -> &Mat4 {
        &self.projection_matrix
    }

    pub fn projection_matrix_inverse(&self) -> &Mat4 {
        &self.projection_matrix_inverse
    }

    /// World point to normalized device coordinates.
    pub fn project(&self, world: Vec3) -> Vec3 {
        let camera = self.matrix_world_inverse.transform_point(world);
        self.projection_matrix.transform_point(camera)
    }

    /// Normalized device coordinates to a world point.
    pub fn unproject(&self, ndc: Vec3) -> Vec3 {
        let camera = self.projection_matrix_inverse.transform_point(ndc);
        self.matrix_world.transform_point(camera)
    }
}

fn invert_or_zero(m: &Mat4) -> Mat4 {
    m.inverse().unwrap_or(Mat4 { elements: [0.0; 16] })
}

#[cfg(test)]
mod tests {
    use super::PerspectiveCamera;
    use foundation::math::Vec3;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn project_unproject_round_trip() {
        let mut camera = PerspectiveCamera::new(60.0, 1.5, 0.1, 10000.0);
        camera.set_pose(
            Vec3::new(1.0, 2.0, 1.5),
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::new(1.0, 12.0, 1.5),
        );
        let world = Vec3::new(3.0, 20.0, 2.0);
        let ndc = camera.project(world);
        assert!(ndc.x.abs() <= 1.0 && ndc.y.abs() <= 1.0);
        let back = camera.unproject(ndc);
        assert_close(back.x, world.x, 1e-6);
        assert_close(back.y, world.y, 1e-6);
        assert_close(back.z, world.z, 1e-6);
    }

    #[test]
    fn top_edge_of_fov_maps_to_ndc_one() {
        let mut camera = PerspectiveCamera::new(90.0, 1.0, 0.1, 100.0);
        camera.set_pose(Vec3::ZERO, Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, -1.0));
        let ndc = camera.project(Vec3::new(0.0, 5.0, -5.0));
        assert_close(ndc.y, 1.0, 1e-12);
    }

    #[test]
    fn degenerate_aspects_do_not_panic() {
        let mut camera = PerspectiveCamera::new(60.0, 0.0, 0.1, 100.0);
        assert!(!camera.projection_matrix().elements[0].is_finite());
        camera.aspect = f64::INFINITY;
        camera.update_projection_matrix();
        let ndc = camera.project(Vec3::new(0.0, 0.0, -1.0));
        assert!(!ndc.x.is_finite() || ndc.x == 0.0);
        let _ = camera.unproject(Vec3::new(0.0, 0.0, 1.0));
    }
}
