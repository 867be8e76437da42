use super::Vec3;

/// 4x4 matrix stored column-major (`elements[col * 4 + row]`).
///
/// Conventions match a right-handed, OpenGL-style pipeline: points are column
/// vectors and `a * b` applies `b` first.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Mat4 {
    pub elements: [f64; 16],
}

impl Default for Mat4 {
    fn default() -> Self {
        Self::IDENTITY
    }
}

impl Mat4 {
    pub const IDENTITY: Mat4 = Mat4 {
        elements: [
            1.0, 0.0, 0.0, 0.0, //
            0.0, 1.0, 0.0, 0.0, //
            0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 1.0,
        ],
    };

    /// Build from rows as written on paper.
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        let mut elements = [0.0; 16];
        for (r, row) in rows.iter().enumerate() {
            for (c, v) in row.iter().enumerate() {
                elements[c * 4 + r] = *v;
            }
        }
        Self { elements }
    }

    #[inline]
    pub fn get(&self, row: usize, col: usize) -> f64 {
        self.elements[col * 4 + row]
    }

    #[inline]
    fn set(&mut self, row: usize, col: usize, v: f64) {
        self.elements[col * 4 + row] = v;
    }

    pub fn transpose(&self) -> Self {
        let mut out = Self { elements: [0.0; 16] };
        for r in 0..4 {
            for c in 0..4 {
                out.set(c, r, self.get(r, c));
            }
        }
        out
    }

    /// Rotation of `angle` radians around the unit vector `axis`.
    pub fn from_axis_angle(axis: Vec3, angle: f64) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        let t = 1.0 - c;
        let Vec3 { x, y, z } = axis;
        let tx = t * x;
        let ty = t * y;

        Self::from_rows([
            [tx * x + c, tx * y - s * z, tx * z + s * y, 0.0],
            [tx * y + s * z, ty * y + c, ty * z - s * x, 0.0],
            [tx * z - s * y, ty * z + s * x, t * z * z + c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn from_rotation_z(angle: f64) -> Self {
        let c = angle.cos();
        let s = angle.sin();
        Self::from_rows([
            [c, -s, 0.0, 0.0],
            [s, c, 0.0, 0.0],
            [0.0, 0.0, 1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Intrinsic XYZ Euler rotation.
    pub fn from_euler_xyz(x: f64, y: f64, z: f64) -> Self {
        let (a, b) = (x.cos(), x.sin());
        let (c, d) = (y.cos(), y.sin());
        let (e, f) = (z.cos(), z.sin());
        let ae = a * e;
        let af = a * f;
        let be = b * e;
        let bf = b * f;

        Self::from_rows([
            [c * e, -c * f, d, 0.0],
            [af + be * d, ae - bf * d, -b * c, 0.0],
            [bf - ae * d, be + af * d, a * c, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    pub fn from_translation(t: Vec3) -> Self {
        let mut m = Self::IDENTITY;
        m.set_translation(t);
        m
    }

    pub fn set_translation(&mut self, t: Vec3) {
        self.elements[12] = t.x;
        self.elements[13] = t.y;
        self.elements[14] = t.z;
    }

    pub fn translation(&self) -> Vec3 {
        Vec3::new(self.elements[12], self.elements[13], self.elements[14])
    }

    /// World matrix of an object at `eye` looking towards `target` with its
    /// local -Z axis.
    pub fn look_at(eye: Vec3, target: Vec3, up: Vec3) -> Self {
        let mut z = eye - target;
        if z.length_squared() == 0.0 {
            z.z = 1.0;
        }
        z = z.normalize();

        let mut x = up.cross(z);
        if x.length_squared() == 0.0 {
            if up.z.abs() == 1.0 {
                z.x += 0.0001;
            } else {
                z.z += 0.0001;
            }
            z = z.normalize();
            x = up.cross(z);
        }
        let x = x.normalize();
        let y = z.cross(x);

        Self::from_rows([
            [x.x, y.x, z.x, eye.x],
            [x.y, y.y, z.y, eye.y],
            [x.z, y.z, z.z, eye.z],
            [0.0, 0.0, 0.0, 1.0],
        ])
    }

    /// Off-center perspective frustum mapping view space to clip space.
    pub fn perspective(left: f64, right: f64, top: f64, bottom: f64, near: f64, far: f64) -> Self {
        let x = 2.0 * near / (right - left);
        let y = 2.0 * near / (top - bottom);
        let a = (right + left) / (right - left);
        let b = (top + bottom) / (top - bottom);
        let c = -(far + near) / (far - near);
        let d = -2.0 * far * near / (far - near);

        Self::from_rows([
            [x, 0.0, a, 0.0],
            [0.0, y, b, 0.0],
            [0.0, 0.0, c, d],
            [0.0, 0.0, -1.0, 0.0],
        ])
    }

    pub fn determinant(&self) -> f64 {
        let mut m = [[0.0; 4]; 4];
        for (r, row) in m.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = self.get(r, c);
            }
        }

        let mut det = 1.0;
        for col in 0..4 {
            let pivot = (col..4)
                .max_by(|&a, &b| m[a][col].abs().total_cmp(&m[b][col].abs()))
                .unwrap_or(col);
            if m[pivot][col] == 0.0 {
                return 0.0;
            }
            if pivot != col {
                m.swap(pivot, col);
                det = -det;
            }
            det *= m[col][col];
            for r in (col + 1)..4 {
                let f = m[r][col] / m[col][col];
                for c in col..4 {
                    m[r][c] -= f * m[col][c];
                }
            }
        }
        det
    }

    /// Gauss-Jordan inverse with partial pivoting. `None` when singular or
    /// non-finite.
    pub fn inverse(&self) -> Option<Self> {
        let mut a = [[0.0; 8]; 4];
        for (r, row) in a.iter_mut().enumerate() {
            for c in 0..4 {
                row[c] = self.get(r, c);
            }
            row[4 + r] = 1.0;
        }

        for col in 0..4 {
            let pivot = (col..4)
                .max_by(|&x, &y| a[x][col].abs().total_cmp(&a[y][col].abs()))
                .unwrap_or(col);
            let p = a[pivot][col];
            if p == 0.0 || !p.is_finite() {
                return None;
            }
            a.swap(pivot, col);

            let inv = 1.0 / a[col][col];
            for v in a[col].iter_mut() {
                *v *= inv;
            }
            for r in 0..4 {
                if r == col {
                    continue;
                }
                let f = a[r][col];
                if f == 0.0 {
                    continue;
                }
                for c in 0..8 {
                    a[r][c] -= f * a[col][c];
                }
            }
        }

        let mut out = Self { elements: [0.0; 16] };
        for (r, row) in a.iter().enumerate() {
            for c in 0..4 {
                out.set(r, c, row[4 + c]);
            }
        }
        if out.elements.iter().all(|v| v.is_finite()) {
            Some(out)
        } else {
            None
        }
    }

    pub fn transform_vec4(&self, v: [f64; 4]) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (r, o) in out.iter_mut().enumerate() {
            *o = self.get(r, 0) * v[0]
                + self.get(r, 1) * v[1]
                + self.get(r, 2) * v[2]
                + self.get(r, 3) * v[3];
        }
        out
    }

    /// Transform a point, dividing by the resulting `w`.
    pub fn transform_point(&self, p: Vec3) -> Vec3 {
        let [x, y, z, w] = self.transform_vec4([p.x, p.y, p.z, 1.0]);
        Vec3::new(x / w, y / w, z / w)
    }

    /// Apply only the upper 3x3 block.
    pub fn transform_direction(&self, v: Vec3) -> Vec3 {
        let [x, y, z, _] = self.transform_vec4([v.x, v.y, v.z, 0.0]);
        Vec3::new(x, y, z)
    }

    /// Angle-axis vector (unit axis scaled by the angle) of the rotation in
    /// the upper 3x3 block.
    pub fn to_angle_axis(&self) -> Vec3 {
        let (m11, m12, m13) = (self.get(0, 0), self.get(0, 1), self.get(0, 2));
        let (m21, m22, m23) = (self.get(1, 0), self.get(1, 1), self.get(1, 2));
        let (m31, m32, m33) = (self.get(2, 0), self.get(2, 1), self.get(2, 2));

        const EPS: f64 = 0.01;
        const EPS2: f64 = 0.1;

        if (m12 - m21).abs() < EPS && (m13 - m31).abs() < EPS && (m23 - m32).abs() < EPS {
            if (m12 + m21).abs() < EPS2
                && (m13 + m31).abs() < EPS2
                && (m23 + m32).abs() < EPS2
                && (m11 + m22 + m33 - 3.0).abs() < EPS2
            {
                return Vec3::ZERO;
            }

            // 180 degree rotation.
            let angle = std::f64::consts::PI;
            let xx = (m11 + 1.0) / 2.0;
            let yy = (m22 + 1.0) / 2.0;
            let zz = (m33 + 1.0) / 2.0;
            let xy = (m12 + m21) / 4.0;
            let xz = (m13 + m31) / 4.0;
            let yz = (m23 + m32) / 4.0;
            let h = std::f64::consts::FRAC_1_SQRT_2;

            let axis = if xx > yy && xx > zz {
                if xx < EPS {
                    Vec3::new(0.0, h, h)
                } else {
                    let x = xx.sqrt();
                    Vec3::new(x, xy / x, xz / x)
                }
            } else if yy > zz {
                if yy < EPS {
                    Vec3::new(h, 0.0, h)
                } else {
                    let y = yy.sqrt();
                    Vec3::new(xy / y, y, yz / y)
                }
            } else if zz < EPS {
                Vec3::new(h, h, 0.0)
            } else {
                let z = zz.sqrt();
                Vec3::new(xz / z, yz / z, z)
            };
            return axis * angle;
        }

        let mut s = ((m32 - m23).powi(2) + (m13 - m31).powi(2) + (m21 - m12).powi(2)).sqrt();
        if s.abs() < 0.001 {
            s = 1.0;
        }
        let axis = Vec3::new((m32 - m23) / s, (m13 - m31) / s, (m21 - m12) / s);
        let angle = ((m11 + m22 + m33 - 1.0) / 2.0).clamp(-1.0, 1.0).acos();
        axis * angle
    }
}

impl std::ops::Mul for Mat4 {
    type Output = Mat4;

    fn mul(self, other: Mat4) -> Mat4 {
        let mut out = Mat4 { elements: [0.0; 16] };
        for r in 0..4 {
            for c in 0..4 {
                let mut acc = 0.0;
                for k in 0..4 {
                    acc += self.get(r, k) * other.get(k, c);
                }
                out.set(r, c, acc);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::Mat4;
    use crate::math::Vec3;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    fn assert_vec_close(a: Vec3, b: Vec3, eps: f64) {
        assert_close(a.x, b.x, eps);
        assert_close(a.y, b.y, eps);
        assert_close(a.z, b.z, eps);
    }

    #[test]
    fn from_rows_is_column_major() {
        let m = Mat4::from_rows([
            [1.0, 2.0, 3.0, 4.0],
            [5.0, 6.0, 7.0, 8.0],
            [9.0, 10.0, 11.0, 12.0],
            [13.0, 14.0, 15.0, 16.0],
        ]);
        assert_eq!(m.elements[1], 5.0);
        assert_eq!(m.elements[4], 2.0);
        assert_eq!(m.get(2, 3), 12.0);
        assert_eq!(m.transpose().get(3, 2), 12.0);
    }

    #[test]
    fn axis_angle_rotates_x_onto_y() {
        let m = Mat4::from_axis_angle(Vec3::new(0.0, 0.0, 1.0), FRAC_PI_2);
        assert_vec_close(
            m.transform_point(Vec3::new(1.0, 0.0, 0.0)),
            Vec3::new(0.0, 1.0, 0.0),
            1e-12,
        );
        assert_vec_close(
            Mat4::from_rotation_z(FRAC_PI_2).transform_direction(Vec3::new(1.0, 0.0, 0.0)),
            Vec3::new(0.0, 1.0, 0.0),
            1e-12,
        );
    }

    #[test]
    fn inverse_undoes_rigid_transform() {
        let mut m = Mat4::from_axis_angle(Vec3::new(1.0, 2.0, 3.0).normalize(), 0.7);
        m.set_translation(Vec3::new(4.0, -2.0, 9.0));
        let inv = m.inverse().unwrap();
        let p = Vec3::new(0.3, -1.2, 5.5);
        assert_vec_close(inv.transform_point(m.transform_point(p)), p, 1e-12);
        assert_close(m.determinant(), 1.0, 1e-12);
    }

    #[test]
    fn singular_matrix_has_no_inverse() {
        let m = Mat4 { elements: [0.0; 16] };
        assert!(m.inverse().is_none());
        assert_eq!(m.determinant(), 0.0);
    }

    #[test]
    fn angle_axis_round_trips_through_matrix() {
        let r = Vec3::new(0.2, -0.4, 1.1);
        let m = Mat4::from_axis_angle(r.normalize(), r.length());
        assert_vec_close(m.to_angle_axis(), r, 1e-9);

        let half_turn = Mat4::from_axis_angle(Vec3::new(0.0, 1.0, 0.0), PI);
        assert_vec_close(half_turn.to_angle_axis(), Vec3::new(0.0, PI, 0.0), 1e-9);
        assert_eq!(Mat4::IDENTITY.to_angle_axis(), Vec3::ZERO);
    }

    #[test]
    fn look_at_points_negative_z_at_target() {
        let eye = Vec3::new(1.0, 2.0, 3.0);
        let target = Vec3::new(1.0, 12.0, 3.0);
        let m = Mat4::look_at(eye, target, Vec3::new(0.0, 0.0, 1.0));
        let forward = m.transform_direction(Vec3::new(0.0, 0.0, -1.0));
        assert_vec_close(forward, Vec3::new(0.0, 1.0, 0.0), 1e-12);
        assert_vec_close(m.translation(), eye, 0.0);
    }

    #[test]
    fn perspective_maps_near_plane_to_minus_one() {
        let p = Mat4::perspective(-1.0, 1.0, 1.0, -1.0, 1.0, 100.0);
        let ndc = p.transform_point(Vec3::new(0.0, 0.0, -1.0));
        assert_close(ndc.z, -1.0, 1e-12);
        let far = p.transform_point(Vec3::new(0.0, 0.0, -100.0));
        assert_close(far.z, 1.0, 1e-12);
    }
}
