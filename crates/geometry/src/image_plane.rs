use foundation::math::Vec3;

use crate::transform::Transform;

/// Distance of the flat plane and radius of the sphere.
pub const IMAGE_PLANE_DEPTH: f64 = 200.0;
/// Mesh vertices closer than this many scaled meters are pushed back.
const MIN_MESH_DEPTH: f64 = 5.0;

const SPHERE_LNG_SEGMENTS: u32 = 40;
const SPHERE_LAT_SEGMENTS: u32 = 20;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ImagePlaneKind {
    /// Equirectangular sphere around the camera.
    Sphere,
    /// Reconstructed per-image depth mesh.
    Mesh,
    /// Quad at a fixed depth in front of the camera.
    Flat,
}

/// Triangle soup in world coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct ImagePlane {
    pub kind: ImagePlaneKind,
    pub positions: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl ImagePlane {
    /// Pick the projection surface for an image.
    ///
    /// Spherical images get a sphere. Other images use their mesh when it is
    /// well formed and the atomic scale is trusted, and a flat quad otherwise.
    /// `vertices` are camera-space xyz triples, `faces` index triples.
    pub fn for_transform(transform: &Transform, vertices: &[f32], faces: &[u32]) -> Self {
        if transform.camera_type().is_spherical() {
            return Self::sphere(transform);
        }
        if transform.has_valid_scale() && mesh_is_valid(vertices, faces) {
            return Self::mesh(transform, vertices, faces);
        }
        Self::flat(transform)
    }

    pub fn sphere(transform: &Transform) -> Self {
        let mut positions = Vec::new();
        for j in 0..=SPHERE_LAT_SEGMENTS {
            // sfm y spans a quarter turn on either side of the horizon.
            let y = -0.25 + 0.5 * j as f64 / SPHERE_LAT_SEGMENTS as f64;
            for i in 0..=SPHERE_LNG_SEGMENTS {
                let x = -0.5 + i as f64 / SPHERE_LNG_SEGMENTS as f64;
                positions.push(transform.unproject_sfm([x, y], IMAGE_PLANE_DEPTH, false));
            }
        }

        let row = SPHERE_LNG_SEGMENTS + 1;
        let mut indices = Vec::new();
        for j in 0..SPHERE_LAT_SEGMENTS {
            for i in 0..SPHERE_LNG_SEGMENTS {
                let a = j * row + i;
                let b = a + 1;
                let c = a + row;
                let d = c + 1;
                indices.extend_from_slice(&[a, c, b, b, c, d]);
            }
        }

        Self {
            kind: ImagePlaneKind::Sphere,
            positions,
            indices,
        }
    }

    pub fn mesh(transform: &Transform, vertices: &[f32], faces: &[u32]) -> Self {
        let scale = transform.scale();
        let min_z = MIN_MESH_DEPTH * scale;
        let max_z = IMAGE_PLANE_DEPTH * scale;
        let to_world = transform.srt_inverse();

        let positions = vertices
            .chunks_exact(3)
            .map(|v| {
                let z = (v[2] as f64).clamp(min_z, max_z);
                to_world.transform_point(Vec3::new(v[0] as f64, v[1] as f64, z))
            })
            .collect();

        Self {
            kind: ImagePlaneKind::Mesh,
            positions,
            indices: faces.to_vec(),
        }
    }

    pub fn flat(transform: &Transform) -> Self {
        let corners = [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]];
        let positions = corners
            .iter()
            .map(|c| transform.unproject_basic(*c, IMAGE_PLANE_DEPTH, true))
            .collect();
        Self {
            kind: ImagePlaneKind::Flat,
            positions,
            indices: vec![0, 1, 3, 1, 2, 3],
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }
}

fn mesh_is_valid(vertices: &[f32], faces: &[u32]) -> bool {
    if vertices.is_empty() || vertices.len() % 3 != 0 || faces.len() % 3 != 0 {
        return false;
    }
    let count = (vertices.len() / 3) as u32;
    faces.iter().all(|f| *f < count)
}
