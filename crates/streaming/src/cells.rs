use foundation::bounds::Aabb2;
use foundation::geo::LngLat;
use graph::spatial_area_bounds;
use serde::{Deserialize, Serialize};

/// Cell coordinate in ZXY scheme.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CellId {
    pub z: u8,
    pub x: u32,
    pub y: u32,
}

impl CellId {
    pub fn new(z: u8, x: u32, y: u32) -> Self {
        Self { z, x, y }
    }

    /// Cell containing `lng_lat` at zoom `z`.
    pub fn containing(lng_lat: LngLat, z: u8) -> Self {
        Self::new(z, lon_to_cell_x(lng_lat.lng, z), lat_to_cell_y(lng_lat.lat, z))
    }

    /// Geographic bounds as a `[lng, lat]` box.
    pub fn bounds(&self) -> Aabb2 {
        let n = (1u32 << self.z) as f64;
        let lon_min = (self.x as f64 / n) * 360.0 - 180.0;
        let lon_max = ((self.x + 1) as f64 / n) * 360.0 - 180.0;

        // Web Mercator Y flip
        let lat_max = cell_y_to_lat(self.y, self.z);
        let lat_min = cell_y_to_lat(self.y + 1, self.z);

        Aabb2::new([lon_min, lat_min], [lon_max, lat_max])
    }

    pub fn key(&self) -> String {
        format!("{}/{}/{}", self.z, self.x, self.y)
    }
}

impl std::fmt::Display for CellId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.z, self.x, self.y)
    }
}

/// Cells at zoom `z` intersecting `bounds`, in row-major order.
pub fn cells_in_bounds(bounds: &Aabb2, z: u8) -> Vec<CellId> {
    let x_min = lon_to_cell_x(bounds.min[0], z);
    let x_max = lon_to_cell_x(bounds.max[0], z);
    // Y grows southwards.
    let y_min = lat_to_cell_y(bounds.max[1].min(85.0), z);
    let y_max = lat_to_cell_y(bounds.min[1].max(-85.0), z);

    let mut cells = Vec::with_capacity(((x_max - x_min + 1) * (y_max - y_min + 1)) as usize);
    for y in y_min..=y_max {
        for x in x_min..=x_max {
            cells.push(CellId::new(z, x, y));
        }
    }
    cells
}

/// Cells covering the spatial area of radius `radius_m` around `center`.
pub fn cells_around(center: LngLat, radius_m: f64, z: u8) -> Vec<CellId> {
    cells_in_bounds(&spatial_area_bounds(center, radius_m), z)
}

fn lon_to_cell_x(lon: f64, z: u8) -> u32 {
    let n = 1u32 << z;
    let x = ((lon + 180.0) / 360.0 * n as f64).floor() as i64;
    x.clamp(0, n as i64 - 1) as u32
}

fn lat_to_cell_y(lat: f64, z: u8) -> u32 {
    let n = 1u32 << z;
    let lat_rad = lat.to_radians();
    let y = ((1.0 - lat_rad.tan().asinh() / std::f64::consts::PI) / 2.0 * n as f64).floor() as i64;
    y.clamp(0, n as i64 - 1) as u32
}

fn cell_y_to_lat(y: u32, z: u8) -> f64 {
    let n = std::f64::consts::PI - 2.0 * std::f64::consts::PI * (y as f64) / (1u32 << z) as f64;
    n.sinh().atan().to_degrees()
}

#[cfg(test)]
mod tests {
    use super::{CellId, cells_in_bounds};
    use foundation::bounds::Aabb2;
    use foundation::geo::{LngLat, bounding_box_around};

    #[test]
    fn world_cell_covers_everything() {
        let b = CellId::new(0, 0, 0).bounds();
        assert!((b.min[0] + 180.0).abs() < 1e-9);
        assert!((b.max[0] - 180.0).abs() < 1e-9);
        assert!(b.min[1] < -85.0 && b.max[1] > 85.0);
        assert_eq!(CellId::containing(LngLat::new(13.0, 55.6), 0), CellId::new(0, 0, 0));
    }

    #[test]
    fn containing_cell_holds_the_point() {
        let p = LngLat::new(13.0005, 55.6001);
        let cell = CellId::containing(p, 17);
        assert!(cell.bounds().contains([p.lng, p.lat]));
        assert_eq!(cell.key(), format!("17/{}/{}", cell.x, cell.y));
        assert_eq!(cell.to_string(), cell.key());
    }

    #[test]
    fn bounds_query_covers_neighbors() {
        let center = LngLat::new(13.0, 55.6);
        let area = bounding_box_around(center, 20.0);
        let cells = cells_in_bounds(&area, 17);
        assert!(!cells.is_empty());
        assert!(cells.contains(&CellId::containing(center, 17)));
        for cell in &cells {
            assert!(cell.bounds().intersects(&area));
        }

        // A box straddling a cell corner touches four cells.
        let corner = CellId::new(17, 70_000, 41_000).bounds();
        let eps = 1e-7;
        let straddle = Aabb2::new(
            [corner.min[0] - eps, corner.min[1] - eps],
            [corner.min[0] + eps, corner.min[1] + eps],
        );
        assert_eq!(cells_in_bounds(&straddle, 17).len(), 4);
    }
}
