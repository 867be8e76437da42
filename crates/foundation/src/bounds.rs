/// Axis-aligned bounding boxes.
///
/// Geographic boxes store `[lng, lat]` in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Aabb2 {
    pub min: [f64; 2],
    pub max: [f64; 2],
}

impl Aabb2 {
    pub fn new(min: [f64; 2], max: [f64; 2]) -> Self {
        Aabb2 { min, max }
    }

    pub fn point(p: [f64; 2]) -> Self {
        Aabb2 { min: p, max: p }
    }

    /// Inclusive overlap test; touching edges intersect.
    pub fn intersects(&self, other: &Aabb2) -> bool {
        self.min[0] <= other.max[0]
            && self.max[0] >= other.min[0]
            && self.min[1] <= other.max[1]
            && self.max[1] >= other.min[1]
    }

    pub fn contains(&self, p: [f64; 2]) -> bool {
        p[0] >= self.min[0] && p[0] <= self.max[0] && p[1] >= self.min[1] && p[1] <= self.max[1]
    }

    pub fn union(&self, other: &Aabb2) -> Aabb2 {
        Aabb2 {
            min: [self.min[0].min(other.min[0]), self.min[1].min(other.min[1])],
            max: [self.max[0].max(other.max[0]), self.max[1].max(other.max[1])],
        }
    }

    pub fn center(&self) -> [f64; 2] {
        [
            (self.min[0] + self.max[0]) * 0.5,
            (self.min[1] + self.max[1]) * 0.5,
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::Aabb2;

    #[test]
    fn touching_boxes_intersect() {
        let a = Aabb2::new([0.0, 0.0], [1.0, 1.0]);
        let b = Aabb2::new([1.0, 0.5], [2.0, 2.0]);
        let c = Aabb2::new([1.5, 1.5], [2.0, 2.0]);
        assert!(a.intersects(&b));
        assert!(!a.intersects(&c));
        assert!(a.contains([0.5, 1.0]));
        assert!(Aabb2::point([0.5, 0.5]).intersects(&a));
    }

    #[test]
    fn union_covers_both() {
        let a = Aabb2::new([0.0, 0.0], [1.0, 1.0]);
        let b = Aabb2::new([-1.0, 0.5], [0.5, 3.0]);
        let u = a.union(&b);
        assert_eq!(u, Aabb2::new([-1.0, 0.0], [1.0, 3.0]));
        assert_eq!(u.center(), [0.0, 1.5]);
    }
}
