use std::sync::Arc;

use geometry::{CameraPose, Transform};
use graph::Node;

use crate::bezier::UnitBezier;

/// Camera movement between images further apart than this is replaced by a
/// cross-fade in place.
const MAX_MOTION_DISTANCE: f64 = 25.0;

const MIN_ZOOM: f64 = 0.0;
const MAX_ZOOM: f64 = 3.0;
const MAX_SPEED: f64 = 10.0;

/// Accumulated alpha this close to 1 counts as a finished transition.
const ALPHA_EPSILON: f64 = 1e-9;

/// An image on the trajectory with the camera state derived from it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryImage {
    pub key: String,
    pub spherical: bool,
    pub merge_id: Option<String>,
    pub transform: Transform,
    pub pose: CameraPose,
}

impl TrajectoryImage {
    pub fn new(key: impl Into<String>, transform: Transform, merge_id: Option<String>) -> Self {
        Self {
            key: key.into(),
            spherical: transform.camera_type().is_spherical(),
            merge_id,
            pose: CameraPose::from_transform(&transform),
            transform,
        }
    }

    /// `None` while the node lacks spatial metadata.
    pub fn from_node(node: &Node) -> Option<Self> {
        let transform = node.transform()?;
        Some(Self::new(
            node.key(),
            transform,
            node.merge_id().map(str::to_string),
        ))
    }

    pub fn merged(&self) -> bool {
        self.merge_id.is_some()
    }
}

/// What a renderer needs from the animation for one frame.
#[derive(Debug, Clone)]
pub struct FrameState {
    pub current: Option<Arc<TrajectoryImage>>,
    pub previous: Option<Arc<TrajectoryImage>>,
    /// Blend from previous (0) to current (1).
    pub alpha: f64,
    pub zoom: f64,
    pub camera: CameraPose,
    pub motionless: bool,
}

/// Frame id plus animation state, consumed by the render camera.
#[derive(Debug, Clone)]
pub struct AnimationFrame {
    pub id: u64,
    pub fps: f64,
    pub state: FrameState,
}

#[derive(Debug, Clone)]
pub struct AnimationState {
    trajectory: Vec<Arc<TrajectoryImage>>,
    current_index: usize,
    current: Option<Arc<TrajectoryImage>>,
    previous: Option<Arc<TrajectoryImage>>,
    current_pose: CameraPose,
    previous_pose: CameraPose,
    camera: CameraPose,
    alpha: f64,
    base_alpha: f64,
    animation_speed: f64,
    speed_coefficient: f64,
    use_bezier: bool,
    bezier: UnitBezier,
    motionless: bool,
    zoom: f64,
}

impl AnimationState {
    pub fn new(animation_speed: f64) -> Self {
        Self {
            trajectory: Vec::new(),
            current_index: 0,
            current: None,
            previous: None,
            current_pose: CameraPose::default(),
            previous_pose: CameraPose::default(),
            camera: CameraPose::default(),
            alpha: 1.0,
            base_alpha: 1.0,
            animation_speed,
            speed_coefficient: 1.0,
            use_bezier: false,
            bezier: UnitBezier::new(0.74, 0.67, 0.38, 0.96),
            motionless: false,
            zoom: 0.0,
        }
    }

    pub fn trajectory(&self) -> &[Arc<TrajectoryImage>] {
        &self.trajectory
    }

    /// Keys of every image on the trajectory, which must stay cached.
    pub fn trajectory_keys(&self) -> Vec<String> {
        self.trajectory.iter().map(|i| i.key.clone()).collect()
    }

    pub fn current_index(&self) -> usize {
        self.current_index
    }

    pub fn current(&self) -> Option<&Arc<TrajectoryImage>> {
        self.current.as_ref()
    }

    pub fn previous(&self) -> Option<&Arc<TrajectoryImage>> {
        self.previous.as_ref()
    }

    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    pub fn zoom(&self) -> f64 {
        self.zoom
    }

    pub fn camera(&self) -> &CameraPose {
        &self.camera
    }

    pub fn motionless(&self) -> bool {
        self.motionless
    }

    pub fn set_zoom(&mut self, zoom: f64) {
        self.zoom = zoom.clamp(MIN_ZOOM, MAX_ZOOM);
    }

    /// Multiplier on the animation speed, clamped to `[0, 10]`.
    pub fn set_speed(&mut self, coefficient: f64) {
        self.speed_coefficient = coefficient.clamp(0.0, MAX_SPEED);
    }

    /// Replace the trajectory. The current image, if any, stays as the
    /// starting point of the transition to the first new image.
    pub fn set(&mut self, images: Vec<TrajectoryImage>) {
        if images.is_empty() {
            return;
        }
        let images = images.into_iter().map(Arc::new);
        match self.current.clone() {
            Some(current) => {
                self.trajectory = std::iter::once(current).chain(images).collect();
                self.current_index = 1;
            }
            None => {
                self.trajectory = images.collect();
                self.current_index = 0;
            }
        }
        self.set_current();
        self.reset_transition();
        self.use_bezier = self.trajectory.len() < 3;
    }

    pub fn append(&mut self, images: Vec<TrajectoryImage>) {
        if images.is_empty() {
            return;
        }
        let was_empty = self.trajectory.is_empty();
        self.trajectory.extend(images.into_iter().map(Arc::new));
        if was_empty {
            self.current_index = 0;
            self.set_current();
            self.reset_transition();
        }
    }

    pub fn prepend(&mut self, images: Vec<TrajectoryImage>) {
        if images.is_empty() {
            return;
        }
        let was_empty = self.trajectory.is_empty();
        let count = images.len();
        let mut trajectory: Vec<_> = images.into_iter().map(Arc::new).collect();
        trajectory.append(&mut self.trajectory);
        self.trajectory = trajectory;
        if was_empty {
            self.current_index = 0;
            self.set_current();
            self.reset_transition();
        } else {
            self.current_index += count;
        }
    }

    /// Drop every image after the current one.
    pub fn cut(&mut self) {
        self.trajectory.truncate(self.current_index + 1);
    }

    /// Advance the transition by one frame at `fps`.
    pub fn update(&mut self, fps: f64) {
        if self.trajectory.is_empty() {
            return;
        }
        if self.base_alpha >= 1.0 && self.current_index + 1 < self.trajectory.len() {
            self.current_index += 1;
            self.use_bezier =
                self.trajectory.len() < 3 && self.current_index + 1 == self.trajectory.len();
            self.set_current();
            self.reset_transition();
        }

        let fps = if fps > 0.0 { fps } else { 60.0 };
        let step = self.speed_coefficient * self.animation_speed * (60.0 / fps);
        self.base_alpha = (self.base_alpha + step).min(1.0);
        if 1.0 - self.base_alpha < ALPHA_EPSILON {
            self.base_alpha = 1.0;
        }
        self.alpha = if self.use_bezier {
            self.bezier.solve(self.base_alpha)
        } else {
            self.base_alpha
        };
        self.update_camera();
    }

    pub fn frame_state(&self) -> FrameState {
        FrameState {
            current: self.current.clone(),
            previous: self.previous.clone(),
            alpha: self.alpha,
            zoom: self.zoom,
            camera: self.camera,
            motionless: self.motionless,
        }
    }

    /// Zoom at which the shown field of view equals `fov` degrees.
    pub fn fov_to_zoom(&self, fov: f64) -> f64 {
        if self.current.is_none() {
            return 0.0;
        }
        let current_fov = focal_to_fov(self.current_pose.focal);
        let actual_fov = if self.alpha >= 1.0 || self.previous.is_none() {
            current_fov
        } else {
            let previous_fov = focal_to_fov(self.previous_pose.focal);
            self.alpha * current_fov + (1.0 - self.alpha) * previous_fov
        };
        let y0 = (0.5 * actual_fov).to_radians().tan();
        let y1 = (0.5 * fov).to_radians().tan();
        (y0 / y1).log2()
    }

    fn set_current(&mut self) {
        self.current = self.trajectory.get(self.current_index).cloned();
        self.previous = if self.current_index > 0 {
            self.trajectory.get(self.current_index - 1).cloned()
        } else {
            None
        };

        let Some(current) = self.current.clone() else {
            return;
        };
        self.current_pose = current.pose;
        if !current.spherical {
            self.zoom = 0.0;
        }
        self.motionless = self
            .previous
            .as_ref()
            .is_some_and(|previous| is_motionless(previous, &current));
        self.previous_pose = match &self.previous {
            Some(previous) if self.motionless => {
                // Turn in place at the current position.
                let direction = previous.pose.direction();
                CameraPose {
                    position: current.pose.position,
                    lookat: current.pose.position + direction,
                    up: previous.pose.up,
                    focal: previous.pose.focal,
                }
            }
            Some(previous) => previous.pose,
            None => current.pose,
        };
    }

    fn reset_transition(&mut self) {
        self.alpha = 0.0;
        self.base_alpha = 0.0;
        self.update_camera();
    }

    fn update_camera(&mut self) {
        self.camera = CameraPose::lerp(&self.previous_pose, &self.current_pose, self.alpha);
    }
}

impl Default for AnimationState {
    fn default() -> Self {
        Self::new(1.0 / 40.0)
    }
}

/// Vertical field of view in degrees for a normalized focal length.
pub fn focal_to_fov(focal: f64) -> f64 {
    2.0 * 1f64.atan2(2.0 * focal).to_degrees()
}

fn is_motionless(previous: &TrajectoryImage, current: &TrajectoryImage) -> bool {
    let connected = previous.merged() && current.merged() && previous.merge_id == current.merge_id;
    let near =
        previous.pose.position.distance_squared(current.pose.position) < MAX_MOTION_DISTANCE.powi(2);
    !(connected && near)
}
