//! Per-image camera model.
//!
//! A [`Transform`] converts between four spaces:
//! - basic: image-relative `[0, 1] x [0, 1]`, top-left origin, orientation corrected
//! - SfM: sensor plane normalized by `max(width, height)`, centered on the principal point
//! - bearing: unit direction in camera space (x right, y down, z forward)
//! - world: topocentric ENU meters relative to the session reference

use std::f64::consts::PI;

use foundation::math::{Mat4, Vec3};
use foundation::spatial;

use crate::camera_type::{CameraParameters, CameraType};

const EPSILON: f64 = 1e-8;

/// Fixed-point iterations used when inverting the radial distortion.
pub const DISTORTION_ITERATIONS: usize = 10;

/// Lower and upper bound (exclusive) of an atomic scale that is trusted for
/// mesh based projection.
pub const VALID_SCALE_RANGE: (f64, f64) = (1e-2, 50.0);

/// EXIF orientation of the stored image.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Normal,
    UpsideDown,
    RotatedCw,
    RotatedCcw,
}

impl Orientation {
    /// Map an EXIF orientation tag. Mirrored and unknown tags read as normal.
    pub fn from_exif(tag: u32) -> Self {
        match tag {
            3 => Orientation::UpsideDown,
            6 => Orientation::RotatedCw,
            8 => Orientation::RotatedCcw,
            _ => Orientation::Normal,
        }
    }

    pub fn exif(self) -> u32 {
        match self {
            Orientation::Normal => 1,
            Orientation::UpsideDown => 3,
            Orientation::RotatedCw => 6,
            Orientation::RotatedCcw => 8,
        }
    }

    /// Whether image rows stay rows after correction.
    pub fn keeps_axes(self) -> bool {
        matches!(self, Orientation::Normal | Orientation::UpsideDown)
    }

    fn z_rotation(self) -> f64 {
        match self {
            Orientation::Normal => 0.0,
            Orientation::UpsideDown => PI,
            Orientation::RotatedCw => PI / 2.0,
            Orientation::RotatedCcw => 3.0 * PI / 2.0,
        }
    }
}

/// Closed set of projection models, chosen once at construction.
///
/// `radial_peak` is the undistorted radius (perspective) or angle (fisheye)
/// past which the distortion polynomial stops being monotonic; `INFINITY`
/// when it never turns.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum CameraModel {
    Perspective {
        focal: f64,
        k1: f64,
        k2: f64,
        radial_peak: f64,
    },
    Fisheye {
        focal: f64,
        k1: f64,
        k2: f64,
        radial_peak: f64,
    },
    Spherical,
}

impl CameraModel {
    pub fn new(camera_type: CameraType, params: CameraParameters) -> Self {
        let CameraParameters { focal, k1, k2 } = params;
        match camera_type {
            CameraType::Spherical => CameraModel::Spherical,
            CameraType::Fisheye => CameraModel::Fisheye {
                focal,
                k1,
                k2,
                radial_peak: radial_peak(k1, k2),
            },
            CameraType::Perspective => CameraModel::Perspective {
                focal,
                k1,
                k2,
                radial_peak: radial_peak(k1, k2),
            },
        }
    }

    pub fn camera_type(&self) -> CameraType {
        match self {
            CameraModel::Perspective { .. } => CameraType::Perspective,
            CameraModel::Fisheye { .. } => CameraType::Fisheye,
            CameraModel::Spherical => CameraType::Spherical,
        }
    }

    /// Camera-space bearing to SfM coordinates. Bearings behind the image
    /// plane of a perspective or fisheye camera map to signed infinities.
    pub fn bearing_to_sfm(&self, bearing: Vec3) -> [f64; 2] {
        let Vec3 { x, y, z } = bearing;
        match *self {
            CameraModel::Spherical => {
                let lng = x.atan2(z);
                let lat = (-y).atan2((x * x + z * z).sqrt());
                [lng / (2.0 * PI), -lat / (2.0 * PI)]
            }
            CameraModel::Fisheye {
                focal,
                k1,
                k2,
                radial_peak,
            } => {
                if z <= 0.0 {
                    return behind_camera(bearing);
                }
                let r = (x * x + y * y).sqrt();
                if r == 0.0 {
                    return [0.0, 0.0];
                }
                let theta = r.atan2(z).min(radial_peak);
                let theta2 = theta * theta;
                let distortion = 1.0 + theta2 * (k1 + theta2 * k2);
                let s = focal * distortion * theta / r;
                [s * x, s * y]
            }
            CameraModel::Perspective {
                focal,
                k1,
                k2,
                radial_peak,
            } => {
                if z <= 0.0 {
                    return behind_camera(bearing);
                }
                let xn = x / z;
                let yn = y / z;
                let r2 = (xn * xn + yn * yn).min(radial_peak * radial_peak);
                let d = 1.0 + k1 * r2 + k2 * r2 * r2;
                [focal * d * xn, focal * d * yn]
            }
        }
    }

    /// SfM coordinates to a unit camera-space bearing.
    pub fn sfm_to_bearing(&self, sfm: [f64; 2]) -> Vec3 {
        match *self {
            CameraModel::Spherical => {
                let lng = sfm[0] * 2.0 * PI;
                let lat = -sfm[1] * 2.0 * PI;
                Vec3::new(lat.cos() * lng.sin(), -lat.sin(), lat.cos() * lng.cos())
            }
            CameraModel::Fisheye {
                focal,
                k1,
                k2,
                radial_peak,
            } => {
                let dxn = sfm[0] / focal;
                let dyn_ = sfm[1] / focal;
                let d_theta = (dxn * dxn + dyn_ * dyn_).sqrt();
                let d = distortion_from_distorted_radius(d_theta, k1, k2, radial_peak);
                let theta = d_theta / d;
                let r = theta.sin();
                let denom = if d_theta > EPSILON { 1.0 / d_theta } else { 1.0 };
                Vec3::new(r * dxn * denom, r * dyn_ * denom, theta.cos())
            }
            CameraModel::Perspective {
                focal,
                k1,
                k2,
                radial_peak,
            } => {
                let dxn = sfm[0] / focal;
                let dyn_ = sfm[1] / focal;
                let dr = (dxn * dxn + dyn_ * dyn_).sqrt();
                let d = distortion_from_distorted_radius(dr, k1, k2, radial_peak);
                Vec3::new(dxn / d, dyn_ / d, 1.0).normalize()
            }
        }
    }
}

fn behind_camera(bearing: Vec3) -> [f64; 2] {
    let sign = |v: f64| {
        if v < 0.0 {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        }
    };
    [sign(bearing.x), sign(bearing.y)]
}

/// Invert `r_d = r * (1 + k1 r^2 + k2 r^4)` by fixed-point iteration,
/// returning the distortion factor. The undistorted radius is clamped to the
/// radial peak on every step.
fn distortion_from_distorted_radius(distorted: f64, k1: f64, k2: f64, radial_peak: f64) -> f64 {
    let mut d = 1.0;
    for _ in 0..DISTORTION_ITERATIONS {
        let radius = (distorted / d).min(radial_peak);
        let r2 = radius * radius;
        d = 1.0 + k1 * r2 + k2 * r2 * r2;
    }
    d
}

/// Smallest positive root of `d/dr [r (1 + k1 r^2 + k2 r^4)] = 0`.
///
/// With `x = r^2` the derivative is `5 k2 x^2 + 3 k1 x + 1`. A vanishing `k2`
/// degrades to the linear case `x = -1 / (3 k1)`.
pub fn radial_peak(k1: f64, k2: f64) -> f64 {
    let a = 5.0 * k2;
    let b = 3.0 * k1;
    let c = 1.0;

    if a == 0.0 {
        if b < 0.0 {
            return (-c / b).sqrt();
        }
        return f64::INFINITY;
    }

    let disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        return f64::INFINITY;
    }
    let root1 = (-b - disc.sqrt()) / 2.0 / a;
    let root2 = (-b + disc.sqrt()) / 2.0 / a;
    let min_root = root1.min(root2);
    let max_root = root1.max(root2);
    if min_root > 0.0 {
        min_root.sqrt()
    } else if max_root > 0.0 {
        max_root.sqrt()
    } else {
        f64::INFINITY
    }
}

/// Inputs for building a [`Transform`].
#[derive(Debug, Clone, PartialEq)]
pub struct TransformParams {
    /// Raw EXIF orientation tag.
    pub orientation: u32,
    pub width: f64,
    pub height: f64,
    /// Atomic reconstruction scale; non-positive means unknown.
    pub scale: f64,
    /// Angle-axis world-to-camera rotation.
    pub rotation: Vec3,
    /// World-to-camera translation.
    pub translation: Vec3,
    pub camera_type: CameraType,
    /// Raw `[focal, k1, k2]`, sanitized on construction.
    pub camera_parameters: Vec<f64>,
    pub texture_scale: Option<[f64; 2]>,
}

impl Default for TransformParams {
    fn default() -> Self {
        Self {
            orientation: 1,
            width: 0.0,
            height: 0.0,
            scale: 0.0,
            rotation: Vec3::ZERO,
            translation: Vec3::ZERO,
            camera_type: CameraType::Perspective,
            camera_parameters: Vec::new(),
            texture_scale: None,
        }
    }
}

/// Camera model and extrinsics of one image.
#[derive(Debug, Clone, PartialEq)]
pub struct Transform {
    orientation: Orientation,
    width: f64,
    height: f64,
    basic_width: f64,
    basic_height: f64,
    basic_aspect: f64,
    scale: f64,
    texture_scale: [f64; 2],
    model: CameraModel,
    rt: Mat4,
    rt_inverse: Mat4,
    srt: Mat4,
    srt_inverse: Mat4,
    basic_rt: Mat4,
}

impl Transform {
    pub fn new(params: TransformParams) -> Self {
        let orientation = Orientation::from_exif(params.orientation);
        let keep = orientation.keeps_axes();
        // Placeholder image dimensions when the backend omits them.
        let (fallback_w, fallback_h) = if keep { (4.0, 3.0) } else { (3.0, 4.0) };
        let width = positive_or(params.width, fallback_w);
        let height = positive_or(params.height, fallback_h);
        let (basic_width, basic_height) = if keep { (width, height) } else { (height, width) };

        let params_clean = if params.camera_type.is_spherical() {
            CameraParameters::default()
        } else {
            CameraParameters::sanitize(&params.camera_parameters)
        };
        let model = CameraModel::new(params.camera_type, params_clean);

        let scale = positive_or(params.scale, 0.0);
        let rt = extrinsics(params.rotation, params.translation);
        let mut srt = rt;
        srt.set_translation(rt.translation() * scale);
        let basic_rt = Mat4::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), orientation.z_rotation()) * rt;

        Self {
            orientation,
            width,
            height,
            basic_width,
            basic_height,
            basic_aspect: basic_width / basic_height,
            scale,
            texture_scale: params.texture_scale.unwrap_or([1.0, 1.0]),
            model,
            rt_inverse: rigid_inverse(&rt),
            srt_inverse: rigid_inverse(&srt),
            rt,
            srt,
            basic_rt,
        }
    }

    pub fn model(&self) -> &CameraModel {
        &self.model
    }

    pub fn camera_type(&self) -> CameraType {
        self.model.camera_type()
    }

    pub fn orientation(&self) -> Orientation {
        self.orientation
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Width of the orientation corrected image.
    pub fn basic_width(&self) -> f64 {
        self.basic_width
    }

    pub fn basic_height(&self) -> f64 {
        self.basic_height
    }

    pub fn basic_aspect(&self) -> f64 {
        self.basic_aspect
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn texture_scale(&self) -> [f64; 2] {
        self.texture_scale
    }

    pub fn focal(&self) -> f64 {
        match self.model {
            CameraModel::Perspective { focal, .. } | CameraModel::Fisheye { focal, .. } => focal,
            CameraModel::Spherical => 1.0,
        }
    }

    pub fn ck1(&self) -> f64 {
        match self.model {
            CameraModel::Perspective { k1, .. } | CameraModel::Fisheye { k1, .. } => k1,
            CameraModel::Spherical => 0.0,
        }
    }

    pub fn ck2(&self) -> f64 {
        match self.model {
            CameraModel::Perspective { k2, .. } | CameraModel::Fisheye { k2, .. } => k2,
            CameraModel::Spherical => 0.0,
        }
    }

    pub fn radial_peak(&self) -> f64 {
        match self.model {
            CameraModel::Perspective { radial_peak, .. }
            | CameraModel::Fisheye { radial_peak, .. } => radial_peak,
            CameraModel::Spherical => f64::INFINITY,
        }
    }

    /// Whether the atomic scale is trusted enough to place the image mesh.
    pub fn has_valid_scale(&self) -> bool {
        self.scale > VALID_SCALE_RANGE.0 && self.scale < VALID_SCALE_RANGE.1
    }

    /// World-to-camera matrix.
    pub fn rt(&self) -> &Mat4 {
        &self.rt
    }

    /// World-to-camera matrix with the translation multiplied by the scale.
    pub fn srt(&self) -> &Mat4 {
        &self.srt
    }

    pub fn srt_inverse(&self) -> &Mat4 {
        &self.srt_inverse
    }

    /// World-to-camera matrix followed by the orientation correction.
    pub fn basic_rt(&self) -> &Mat4 {
        &self.basic_rt
    }

    /// Camera center in world coordinates.
    pub fn position(&self) -> Vec3 {
        self.rt_inverse.translation()
    }

    /// World direction that appears as up in the corrected image.
    pub fn up_vector(&self) -> Vec3 {
        let e = &self.rt.elements;
        match self.orientation {
            Orientation::Normal => Vec3::new(-e[1], -e[5], -e[9]),
            Orientation::UpsideDown => Vec3::new(e[1], e[5], e[9]),
            Orientation::RotatedCw => Vec3::new(-e[0], -e[4], -e[8]),
            Orientation::RotatedCcw => Vec3::new(e[0], e[4], e[8]),
        }
    }

    /// Matrix taking world points to homogeneous texture coordinates of a
    /// perspective image, for projective texturing.
    pub fn projector_matrix(&self) -> Mat4 {
        let f = self.focal();
        let projection = Mat4::from_rows([
            [f, 0.0, 0.0, 0.0],
            [0.0, f, 0.0, 0.0],
            [0.0, 0.0, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
        ]);
        self.normalized_to_texture() * projection * self.rt
    }

    fn normalized_to_texture(&self) -> Mat4 {
        let size = self.width.max(self.height);
        let (sx, sy) = if self.orientation.keeps_axes() {
            (self.texture_scale[0], self.texture_scale[1])
        } else {
            (self.texture_scale[1], self.texture_scale[0])
        };
        let w = size / self.width * sx;
        let h = size / self.height * sy;
        let rows = match self.orientation {
            Orientation::Normal => [[w, 0.0, 0.0, 0.5], [0.0, -h, 0.0, 0.5]],
            Orientation::UpsideDown => [[-w, 0.0, 0.0, 0.5], [0.0, h, 0.0, 0.5]],
            Orientation::RotatedCw => [[0.0, -h, 0.0, 0.5], [-w, 0.0, 0.0, 0.5]],
            Orientation::RotatedCcw => [[0.0, h, 0.0, 0.5], [w, 0.0, 0.0, 0.5]],
        };
        Mat4::from_rows([
            rows[0],
            rows[1],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// World point to basic coordinates.
    pub fn project_basic(&self, point: Vec3) -> [f64; 2] {
        self.sfm_to_basic(self.project_sfm(point))
    }

    /// Basic coordinates to a world point `distance` away from the camera.
    ///
    /// With `depth` set, `distance` is measured along the optical axis; it is
    /// ignored for spherical cameras.
    pub fn unproject_basic(&self, basic: [f64; 2], distance: f64, depth: bool) -> Vec3 {
        self.unproject_sfm(self.basic_to_sfm(basic), distance, depth)
    }

    pub fn project_sfm(&self, point: Vec3) -> [f64; 2] {
        let camera = self.rt.transform_point(point);
        self.model.bearing_to_sfm(camera)
    }

    pub fn unproject_sfm(&self, sfm: [f64; 2], distance: f64, depth: bool) -> Vec3 {
        let bearing = self.model.sfm_to_bearing(sfm);
        let camera = if depth && !self.camera_type().is_spherical() {
            Vec3::new(
                distance * bearing.x / bearing.z,
                distance * bearing.y / bearing.z,
                distance,
            )
        } else {
            bearing * distance
        };
        self.rt_inverse.transform_point(camera)
    }

    pub fn basic_to_sfm(&self, basic: [f64; 2]) -> [f64; 2] {
        let [bx, by] = basic;
        let (rx, ry) = match self.orientation {
            Orientation::Normal => (bx, by),
            Orientation::UpsideDown => (1.0 - bx, 1.0 - by),
            Orientation::RotatedCw => (by, 1.0 - bx),
            Orientation::RotatedCcw => (1.0 - by, bx),
        };
        let w = self.width;
        let h = self.height;
        let s = w.max(h);
        [rx * w / s - w / s / 2.0, ry * h / s - h / s / 2.0]
    }

    pub fn sfm_to_basic(&self, sfm: [f64; 2]) -> [f64; 2] {
        let w = self.width;
        let h = self.height;
        let s = w.max(h);
        let rx = (sfm[0] + w / s / 2.0) / w * s;
        let ry = (sfm[1] + h / s / 2.0) / h * s;
        match self.orientation {
            Orientation::Normal => [rx, ry],
            Orientation::UpsideDown => [1.0 - rx, 1.0 - ry],
            Orientation::RotatedCw => [1.0 - ry, rx],
            Orientation::RotatedCcw => [ry, 1.0 - rx],
        }
    }
}

fn positive_or(value: f64, fallback: f64) -> f64 {
    if value > 0.0 { value } else { fallback }
}

fn extrinsics(rotation: Vec3, translation: Vec3) -> Mat4 {
    let mut rt = spatial::rotation_matrix(rotation);
    rt.set_translation(translation);
    rt
}

/// Inverse of a rotation plus translation: `[R^T | -R^T t]`.
fn rigid_inverse(m: &Mat4) -> Mat4 {
    let rt = m.transpose();
    let mut inv = Mat4::from_rows([
        [rt.get(0, 0), rt.get(0, 1), rt.get(0, 2), 0.0],
        [rt.get(1, 0), rt.get(1, 1), rt.get(1, 2), 0.0],
        [rt.get(2, 0), rt.get(2, 1), rt.get(2, 2), 0.0],
        [0.0, 0.0, 0.0, 1.0],
    ]);
    let t = inv.transform_direction(m.translation());
    inv.set_translation(-t);
    inv
}
