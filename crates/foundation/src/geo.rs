use crate::bounds::Aabb2;
use crate::math::Vec3;

/// Mean Earth radius used for great-circle distances (meters).
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

const WGS84_A: f64 = 6_378_137.0;
const WGS84_F: f64 = 1.0 / 298.257_223_563;
const WGS84_B: f64 = WGS84_A * (1.0 - WGS84_F);
const WGS84_E2: f64 = WGS84_F * (2.0 - WGS84_F);
const WGS84_EP2: f64 = WGS84_E2 / (1.0 - WGS84_E2);

/// Longitude/latitude in degrees.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct LngLat {
    pub lng: f64,
    pub lat: f64,
}

impl LngLat {
    pub fn new(lng: f64, lat: f64) -> Self {
        Self { lng, lat }
    }

    pub fn with_alt(self, alt: f64) -> LngLatAlt {
        LngLatAlt::new(self.lng, self.lat, alt)
    }
}

/// Longitude/latitude in degrees plus altitude in meters.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct LngLatAlt {
    pub lng: f64,
    pub lat: f64,
    pub alt: f64,
}

impl LngLatAlt {
    pub fn new(lng: f64, lat: f64, alt: f64) -> Self {
        Self { lng, lat, alt }
    }

    pub fn lng_lat(self) -> LngLat {
        LngLat::new(self.lng, self.lat)
    }

    /// Earth-centered, Earth-fixed position in meters.
    pub fn to_ecef(self) -> Vec3 {
        let (sin_lat, cos_lat) = self.lat.to_radians().sin_cos();
        let (sin_lng, cos_lng) = self.lng.to_radians().sin_cos();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        Vec3::new(
            (n + self.alt) * cos_lat * cos_lng,
            (n + self.alt) * cos_lat * sin_lng,
            (n * (1.0 - WGS84_E2) + self.alt) * sin_lat,
        )
    }

    /// Inverse of [`LngLatAlt::to_ecef`] (Bowring's closed form).
    pub fn from_ecef(ecef: Vec3) -> Self {
        let p = ecef.x.hypot(ecef.y);
        let theta = (ecef.z * WGS84_A).atan2(p * WGS84_B);
        let (sin_t, cos_t) = theta.sin_cos();
        let lat = (ecef.z + WGS84_EP2 * WGS84_B * sin_t.powi(3))
            .atan2(p - WGS84_E2 * WGS84_A * cos_t.powi(3));
        let sin_lat = lat.sin();
        let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();
        Self::new(
            ecef.y.atan2(ecef.x).to_degrees(),
            lat.to_degrees(),
            p / lat.cos() - n,
        )
    }
}

/// Unit east, north and up axes at `reference`, in ECEF.
fn enu_axes(reference: LngLatAlt) -> [Vec3; 3] {
    let (sin_lat, cos_lat) = reference.lat.to_radians().sin_cos();
    let (sin_lng, cos_lng) = reference.lng.to_radians().sin_cos();
    [
        Vec3::new(-sin_lng, cos_lng, 0.0),
        Vec3::new(-sin_lat * cos_lng, -sin_lat * sin_lng, cos_lat),
        Vec3::new(cos_lat * cos_lng, cos_lat * sin_lng, sin_lat),
    ]
}

/// Topocentric position of `point` relative to `reference` (x east, y north, z up).
pub fn geodetic_to_enu(point: LngLatAlt, reference: LngLatAlt) -> Vec3 {
    let offset = point.to_ecef() - reference.to_ecef();
    let [east, north, up] = enu_axes(reference);
    Vec3::new(offset.dot(east), offset.dot(north), offset.dot(up))
}

pub fn enu_to_geodetic(enu: Vec3, reference: LngLatAlt) -> LngLatAlt {
    let [east, north, up] = enu_axes(reference);
    let ecef = reference.to_ecef() + east * enu.x + north * enu.y + up * enu.z;
    LngLatAlt::from_ecef(ecef)
}

/// Haversine great-circle distance in meters.
pub fn distance_from_lng_lat(a: LngLat, b: LngLat) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let hav = (d_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * hav.sqrt().atan2((1.0 - hav).sqrt())
}

/// Lng/lat box spanning `threshold_m` in every horizontal direction around `center`.
///
/// `min` is the south-west corner, `max` the north-east one, both `[lng, lat]`.
pub fn bounding_box_around(center: LngLat, threshold_m: f64) -> Aabb2 {
    let reference = center.with_alt(0.0);
    let sw = enu_to_geodetic(Vec3::new(-threshold_m, -threshold_m, 0.0), reference);
    let ne = enu_to_geodetic(Vec3::new(threshold_m, threshold_m, 0.0), reference);
    Aabb2::new([sw.lng, sw.lat], [ne.lng, ne.lat])
}
