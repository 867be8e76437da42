pub mod animation;
pub mod bezier;
pub mod config;
pub mod render_camera;
pub mod render_mode;
pub mod viewer;

#[cfg(test)]
mod testing;

pub use animation::{AnimationFrame, AnimationState, FrameState, TrajectoryImage, focal_to_fov};
pub use bezier::UnitBezier;
pub use config::RenderCameraConfig;
pub use render_camera::{RenderCamera, Rotation};
pub use render_mode::RenderMode;
pub use viewer::Viewer;
