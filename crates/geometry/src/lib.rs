pub mod camera;
pub mod camera_type;
pub mod image_plane;
pub mod perspective;
pub mod projection;
pub mod transform;
pub mod viewport;

pub use camera::CameraPose;
pub use camera_type::{CameraParameters, CameraType};
pub use image_plane::{IMAGE_PLANE_DEPTH, ImagePlane, ImagePlaneKind};
pub use perspective::PerspectiveCamera;
pub use projection::compute_projected_points;
pub use transform::{CameraModel, Orientation, Transform, TransformParams};
pub use viewport::{CanvasSize, ViewportCoords};
