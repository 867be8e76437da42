//! The perspective camera the renderer draws with, updated once per frame.
//!
//! `changed` reports whether the last frame differed from the one before:
//! an image, zoom, alpha or pose change, or a size or render mode change made
//! since the previous frame. Identical frames report no change whatever their
//! ids.

use std::f64::consts::FRAC_PI_2;

use foundation::math::Vec3;
use foundation::spatial::{angle_to_plane, azimuthal};
use geometry::{CameraPose, PerspectiveCamera, compute_projected_points};

use crate::animation::{AnimationFrame, TrajectoryImage};
use crate::config::RenderCameraConfig;
use crate::render_mode::RenderMode;

/// Pose differences at or below this are ignored.
const POSE_EPSILON: f64 = 1e-9;

/// Basic points the boundary samples start from: top center and top right.
const BOUNDARY_VERTICES: [[f64; 2]; 2] = [[0.5, 0.0], [1.0, 0.0]];
/// Sample directions: along the top edge and down the right edge.
const BOUNDARY_DIRECTIONS: [[f64; 2]; 2] = [[0.5, 0.0], [0.0, 0.5]];
const POINTS_PER_LINE: usize = 100;

/// Keeps image edges out of view in fill mode.
const FILL_MARGIN: f64 = 0.995;

/// Horizontal and polar angle of the viewing direction.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rotation {
    pub phi: f64,
    pub theta: f64,
}

#[derive(Debug, Clone, Default)]
struct ImageFov {
    key: Option<String>,
    spherical: bool,
    projected_points: Vec<[f64; 2]>,
}

impl ImageFov {
    fn update(&mut self, image: Option<&TrajectoryImage>) -> bool {
        let key = image.map(|i| i.key.as_str());
        if key == self.key.as_deref() {
            return false;
        }
        self.key = key.map(str::to_string);
        self.spherical = image.is_some_and(|i| i.spherical);
        self.projected_points = match image {
            Some(image) if !image.spherical => compute_projected_points(
                &image.transform,
                &BOUNDARY_VERTICES,
                &BOUNDARY_DIRECTIONS,
                POINTS_PER_LINE,
            ),
            _ => Vec::new(),
        };
        true
    }
}

#[derive(Debug, Clone)]
pub struct RenderCamera {
    initial_fov: f64,
    size: (f64, f64),
    render_mode: RenderMode,
    alpha: f64,
    zoom: f64,
    frame_id: Option<u64>,
    changed: bool,
    pending: bool,
    current: ImageFov,
    previous: ImageFov,
    current_fov: f64,
    previous_fov: f64,
    pose: CameraPose,
    rotation: Rotation,
    perspective: PerspectiveCamera,
}

impl RenderCamera {
    pub fn new(config: &RenderCameraConfig, width: f64, height: f64) -> Self {
        let pose = CameraPose::default();
        let mut perspective = PerspectiveCamera::new(
            config.initial_fov,
            compute_aspect(width, height),
            config.near,
            config.far,
        );
        perspective.set_pose(pose.position, pose.up, pose.lookat);
        Self {
            initial_fov: config.initial_fov,
            size: (width, height),
            render_mode: config.render_mode,
            alpha: -1.0,
            zoom: 0.0,
            frame_id: None,
            changed: false,
            pending: false,
            current: ImageFov::default(),
            previous: ImageFov::default(),
            current_fov: config.initial_fov,
            previous_fov: config.initial_fov,
            rotation: compute_rotation(&pose),
            pose,
            perspective,
        }
    }

    pub fn perspective(&self) -> &PerspectiveCamera {
        &self.perspective
    }

    pub fn pose(&self) -> &CameraPose {
        &self.pose
    }

    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    pub fn render_mode(&self) -> RenderMode {
        self.render_mode
    }

    pub fn size(&self) -> (f64, f64) {
        self.size
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn frame_id(&self) -> Option<u64> {
        self.frame_id
    }

    /// Whether the renderer has to draw again.
    pub fn changed(&self) -> bool {
        self.changed || self.pending
    }

    /// Consume one animation frame. Returns whether anything changed.
    pub fn set_frame(&mut self, frame: &AnimationFrame) -> bool {
        let state = &frame.state;
        let mut changed = std::mem::take(&mut self.pending);

        if self.current.update(state.current.as_deref()) {
            changed = true;
        }
        if self.previous.update(state.previous.as_deref()) {
            changed = true;
        }
        if state.zoom != self.zoom {
            self.zoom = state.zoom;
            changed = true;
        }
        if changed {
            self.update_fovs();
        }

        if changed || state.alpha != self.alpha {
            self.alpha = state.alpha;
            self.apply_fov();
            changed = true;
        }

        if self.pose.diff(&state.camera) > POSE_EPSILON {
            self.pose = state.camera;
            self.rotation = compute_rotation(&self.pose);
            self.perspective
                .set_pose(self.pose.position, self.pose.up, self.pose.lookat);
            changed = true;
        }

        self.frame_id = Some(frame.id);
        self.changed = changed;
        changed
    }

    /// Resize the viewport. A zero width gives aspect 0 and a zero height an
    /// infinite aspect; neither is an error.
    pub fn set_size(&mut self, width: f64, height: f64) {
        self.size = (width, height);
        self.perspective.aspect = compute_aspect(width, height);
        self.update_fovs();
        self.apply_fov();
        self.pending = true;
    }

    pub fn set_render_mode(&mut self, render_mode: RenderMode) {
        self.render_mode = render_mode;
        self.update_fovs();
        self.apply_fov();
        self.pending = true;
    }

    fn update_fovs(&mut self) {
        self.current_fov = self.compute_current_fov();
        self.previous_fov = self.compute_previous_fov();
    }

    fn apply_fov(&mut self) {
        let alpha = self.alpha.clamp(0.0, 1.0);
        self.perspective.fov = alpha * self.current_fov + (1.0 - alpha) * self.previous_fov;
        self.perspective.update_projection_matrix();
    }

    fn compute_current_fov(&self) -> f64 {
        if self.perspective.aspect == 0.0 {
            return 0.0;
        }
        if self.current.key.is_none() {
            return self.initial_fov;
        }
        self.image_fov(&self.current)
    }

    fn compute_previous_fov(&self) -> f64 {
        if self.perspective.aspect == 0.0 {
            return 0.0;
        }
        if self.current.key.is_none() {
            return self.initial_fov;
        }
        if self.previous.key.is_none() {
            return self.current_fov;
        }
        self.image_fov(&self.previous)
    }

    fn image_fov(&self, image: &ImageFov) -> f64 {
        if image.spherical || image.projected_points.is_empty() {
            return y_to_fov(1.0, self.zoom);
        }
        let aspect = self.perspective.aspect;
        let fovs = image
            .projected_points
            .iter()
            .map(|p| y_to_fov((p[0] / aspect).max(p[1]), self.zoom));
        match self.render_mode {
            RenderMode::Fill => FILL_MARGIN * fovs.fold(f64::INFINITY, f64::min),
            RenderMode::Letterbox => fovs.fold(f64::NEG_INFINITY, f64::max),
        }
    }
}

fn compute_aspect(width: f64, height: f64) -> f64 {
    if width == 0.0 { 0.0 } else { width / height }
}

/// Vertical field of view in degrees showing `y` (tangent of the half angle)
/// at `zoom`.
fn y_to_fov(y: f64, zoom: f64) -> f64 {
    2.0 * (y / 2f64.powf(zoom)).atan().to_degrees()
}

fn compute_rotation(pose: &CameraPose) -> Rotation {
    let direction = pose.direction();
    Rotation {
        phi: azimuthal(direction, pose.up),
        theta: FRAC_PI_2 - angle_to_plane(direction, Vec3::new(0.0, 0.0, 1.0)),
    }
}

#[cfg(test)]
mod tests {
    use super::{RenderCamera, y_to_fov};
    use crate::animation::{AnimationFrame, FrameState, TrajectoryImage};
    use crate::config::RenderCameraConfig;
    use crate::render_mode::RenderMode;
    use crate::testing::image;
    use geometry::{CameraPose, CameraType};
    use std::sync::Arc;

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn frame(
        id: u64,
        current: Option<&TrajectoryImage>,
        previous: Option<&TrajectoryImage>,
        alpha: f64,
    ) -> AnimationFrame {
        let camera = current.map_or_else(CameraPose::default, |i| i.pose);
        AnimationFrame {
            id,
            fps: 60.0,
            state: FrameState {
                current: current.cloned().map(Arc::new),
                previous: previous.cloned().map(Arc::new),
                alpha,
                zoom: 0.0,
                camera,
                motionless: false,
            },
        }
    }

    fn camera(width: f64, height: f64) -> RenderCamera {
        RenderCamera::new(&RenderCameraConfig::default(), width, height)
    }

    #[test]
    fn identical_frames_are_not_changes() {
        let mut rc = camera(640.0, 480.0);
        let a = image("a", 0.0, 0.0, CameraType::Perspective, 0.8);

        assert!(rc.set_frame(&frame(1, Some(&a), None, 1.0)));
        assert!(rc.changed());
        assert!(!rc.set_frame(&frame(1, Some(&a), None, 1.0)));
        assert!(!rc.changed());
        assert!(!rc.set_frame(&frame(2, Some(&a), None, 1.0)));
        assert_eq!(rc.frame_id(), Some(2));

        // Alpha alone is a change.
        assert!(rc.set_frame(&frame(3, Some(&a), None, 0.5)));
    }

    #[test]
    fn empty_state_uses_initial_fov() {
        let mut rc = camera(640.0, 480.0);
        assert_eq!(rc.perspective().fov, 60.0);
        rc.set_frame(&frame(0, None, None, 1.0));
        assert_eq!(rc.perspective().fov, 60.0);
        assert!(!rc.set_frame(&frame(1, None, None, 1.0)));
    }

    #[test]
    fn fill_crops_and_letterbox_fits() {
        let a = image("a", 0.0, 0.0, CameraType::Perspective, 0.8);
        let mut rc = camera(800.0, 800.0);
        rc.set_frame(&frame(1, Some(&a), None, 1.0));
        let fill = rc.perspective().fov;

        rc.set_render_mode(RenderMode::Letterbox);
        assert!(rc.changed());
        let letterbox = rc.perspective().fov;
        assert!(fill < letterbox, "{fill} >= {letterbox}");

        // Square viewport: letterbox must fit the half width of 0.5 / 0.8.
        assert_close(letterbox, y_to_fov(0.625, 0.0), 1e-6);

        // The pending change is reported on the next frame, then cleared.
        assert!(rc.set_frame(&frame(2, Some(&a), None, 1.0)));
        assert!(!rc.set_frame(&frame(3, Some(&a), None, 1.0)));
    }

    #[test]
    fn fov_blends_between_previous_and_current() {
        let wide = image("wide", 0.0, 0.0, CameraType::Perspective, 0.5);
        let narrow = image("narrow", 0.0, 1.0, CameraType::Perspective, 1.0);
        let mut rc = camera(640.0, 480.0);

        rc.set_frame(&frame(1, Some(&narrow), Some(&wide), 0.0));
        let start = rc.perspective().fov;
        rc.set_frame(&frame(2, Some(&narrow), Some(&wide), 1.0));
        let end = rc.perspective().fov;
        rc.set_frame(&frame(3, Some(&narrow), Some(&wide), 0.5));
        assert!(start > end);
        assert_close(rc.perspective().fov, 0.5 * (start + end), 1e-9);
    }

    #[test]
    fn spherical_fov_follows_zoom() {
        let pano = image("p", 0.0, 0.0, CameraType::Spherical, 0.8);
        let mut rc = camera(640.0, 480.0);
        rc.set_frame(&frame(1, Some(&pano), None, 1.0));
        assert_close(rc.perspective().fov, 90.0, 1e-9);

        let mut zoomed = frame(2, Some(&pano), None, 1.0);
        zoomed.state.zoom = 1.0;
        assert!(rc.set_frame(&zoomed));
        assert_close(rc.perspective().fov, 2.0 * 0.5f64.atan().to_degrees(), 1e-9);
    }

    #[test]
    fn degenerate_sizes_do_not_fail() {
        let a = image("a", 0.0, 0.0, CameraType::Perspective, 0.8);
        let mut rc = camera(640.0, 480.0);
        rc.set_frame(&frame(1, Some(&a), None, 1.0));

        rc.set_size(0.0, 480.0);
        assert_eq!(rc.perspective().aspect, 0.0);
        assert_eq!(rc.perspective().fov, 0.0);
        assert!(rc.changed());

        rc.set_size(640.0, 0.0);
        assert_eq!(rc.perspective().aspect, f64::INFINITY);
        assert!(rc.perspective().fov.is_finite());
        assert!(rc.set_frame(&frame(2, Some(&a), None, 1.0)));
        assert_eq!(rc.size(), (640.0, 0.0));
    }

    #[test]
    fn tiny_pose_changes_are_ignored() {
        let a = image("a", 0.0, 0.0, CameraType::Perspective, 0.8);
        let mut rc = camera(640.0, 480.0);
        rc.set_frame(&frame(1, Some(&a), None, 1.0));

        let mut nudged = frame(2, Some(&a), None, 1.0);
        nudged.state.camera.position.x += 1e-6;
        assert!(!rc.set_frame(&nudged));

        let mut moved = frame(3, Some(&a), None, 1.0);
        moved.state.camera.position.x += 0.1;
        assert!(rc.set_frame(&moved));
        assert_close(rc.pose().position.x, 0.1, 1e-12);
        assert_close(rc.perspective().position.x, 0.1, 1e-12);
    }

    #[test]
    fn rotation_tracks_viewing_direction() {
        let a = image("a", 0.0, 0.0, CameraType::Perspective, 0.8);
        let mut rc = camera(640.0, 480.0);
        rc.set_frame(&frame(1, Some(&a), None, 1.0));
        // Looking north along the horizon.
        assert_close(rc.rotation().phi, std::f64::consts::FRAC_PI_2, 1e-9);
        assert_close(rc.rotation().theta, std::f64::consts::FRAC_PI_2, 1e-9);
    }
}
