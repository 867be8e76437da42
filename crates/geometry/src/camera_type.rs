use serde::{Deserialize, Serialize};

/// Projection model of a capture.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CameraType {
    #[default]
    Perspective,
    Fisheye,
    #[serde(alias = "equirectangular")]
    Spherical,
}

impl CameraType {
    pub fn as_str(self) -> &'static str {
        match self {
            CameraType::Perspective => "perspective",
            CameraType::Fisheye => "fisheye",
            CameraType::Spherical => "spherical",
        }
    }

    /// Parse a backend camera type string. Unknown or missing values fall
    /// back to perspective.
    pub fn parse_lossy(s: Option<&str>) -> Self {
        match s.map(str::trim) {
            Some("fisheye") => CameraType::Fisheye,
            Some("spherical") | Some("equirectangular") => CameraType::Spherical,
            _ => CameraType::Perspective,
        }
    }

    pub fn is_spherical(self) -> bool {
        self == CameraType::Spherical
    }
}

impl std::fmt::Display for CameraType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Intrinsics of a perspective or fisheye camera.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CameraParameters {
    pub focal: f64,
    pub k1: f64,
    pub k2: f64,
}

impl Default for CameraParameters {
    fn default() -> Self {
        Self {
            focal: 1.0,
            k1: 0.0,
            k2: 0.0,
        }
    }
}

impl CameraParameters {
    /// Build from a raw `[focal, k1, k2]` list, substituting defaults for
    /// malformed entries: a missing, non-finite or non-positive focal becomes
    /// 1 and a missing or non-finite distortion coefficient becomes 0.
    pub fn sanitize(raw: &[f64]) -> Self {
        let focal = match raw.first() {
            Some(f) if f.is_finite() && *f > 0.0 => *f,
            _ => 1.0,
        };
        let coeff = |i: usize| match raw.get(i) {
            Some(k) if k.is_finite() => *k,
            _ => 0.0,
        };
        Self {
            focal,
            k1: coeff(1),
            k2: coeff(2),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CameraParameters, CameraType};

    #[test]
    fn parses_backend_strings() {
        assert_eq!(CameraType::parse_lossy(Some("fisheye")), CameraType::Fisheye);
        assert_eq!(CameraType::parse_lossy(Some("spherical")), CameraType::Spherical);
        assert_eq!(
            CameraType::parse_lossy(Some("equirectangular")),
            CameraType::Spherical
        );
        assert_eq!(CameraType::parse_lossy(Some("brown")), CameraType::Perspective);
        assert_eq!(CameraType::parse_lossy(None), CameraType::Perspective);
        assert_eq!(CameraType::Fisheye.to_string(), "fisheye");
    }

    #[test]
    fn malformed_parameters_are_defaulted() {
        assert_eq!(CameraParameters::sanitize(&[]), CameraParameters::default());
        assert_eq!(
            CameraParameters::sanitize(&[f64::NAN, f64::NAN, f64::INFINITY]),
            CameraParameters::default()
        );
        assert_eq!(
            CameraParameters::sanitize(&[-2.0, 0.1]),
            CameraParameters {
                focal: 1.0,
                k1: 0.1,
                k2: 0.0
            }
        );
        assert_eq!(
            CameraParameters::sanitize(&[0.85, -0.1, 0.02]),
            CameraParameters {
                focal: 0.85,
                k1: -0.1,
                k2: 0.02
            }
        );
    }
}
