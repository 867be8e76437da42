use std::cmp::Ordering;

use foundation::math::precision::stable_total_cmp_f64;
use foundation::time::Timestamp;

/// A candidate target annotated relative to the source node.
///
/// Angles are radians. `motion_change` and `direction_change` are signed,
/// counter-clockwise positive, relative to the source viewing direction.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialEdge {
    pub id: String,
    pub sequence_id: String,
    pub captured_at: Timestamp,
    pub distance: f64,
    pub motion_change: f64,
    pub vertical_motion: f64,
    pub direction_change: f64,
    pub vertical_direction_change: f64,
    /// Angle of the relative rotation between the two cameras.
    pub rotation: f64,
    /// Azimuth of the source-to-target motion, counter-clockwise from east.
    pub world_motion_azimuth: f64,
    pub same_sequence: bool,
    pub same_merge_cc: bool,
    pub same_user: bool,
    pub spherical: bool,
}

/// Candidate ordering: lower score, then shorter distance, then key.
pub(crate) fn rank(a_score: f64, a: &PotentialEdge, b_score: f64, b: &PotentialEdge) -> Ordering {
    stable_total_cmp_f64(a_score, b_score)
        .then_with(|| stable_total_cmp_f64(a.distance, b.distance))
        .then_with(|| a.id.cmp(&b.id))
}

/// Running minimum over scored candidates, independent of offer order.
pub(crate) struct Best<'a> {
    best: Option<(f64, &'a PotentialEdge)>,
}

impl<'a> Best<'a> {
    pub(crate) fn new() -> Self {
        Self { best: None }
    }

    pub(crate) fn offer(&mut self, score: f64, edge: &'a PotentialEdge) {
        let replace = match self.best {
            None => true,
            Some((s, current)) => rank(score, edge, s, current) == Ordering::Less,
        };
        if replace {
            self.best = Some((score, edge));
        }
    }

    pub(crate) fn get(&self) -> Option<&'a PotentialEdge> {
        self.best.map(|(_, edge)| edge)
    }
}

#[cfg(test)]
mod tests {
    use super::{Best, PotentialEdge};
    use foundation::time::Timestamp;

    fn potential(id: &str, distance: f64) -> PotentialEdge {
        PotentialEdge {
            id: id.into(),
            sequence_id: "s".into(),
            captured_at: Timestamp(0),
            distance,
            motion_change: 0.0,
            vertical_motion: 0.0,
            direction_change: 0.0,
            vertical_direction_change: 0.0,
            rotation: 0.0,
            world_motion_azimuth: 0.0,
            same_sequence: false,
            same_merge_cc: true,
            same_user: false,
            spherical: false,
        }
    }

    #[test]
    fn ties_break_on_distance_then_key() {
        let a = potential("a", 2.0);
        let b = potential("b", 1.0);
        let c = potential("c", 1.0);
        for order in [[&a, &b, &c], [&c, &b, &a], [&b, &a, &c]] {
            let mut best = Best::new();
            for p in order {
                best.offer(1.0, p);
            }
            assert_eq!(best.get().map(|p| p.id.as_str()), Some("b"));
        }

        let mut best = Best::new();
        best.offer(0.5, &a);
        best.offer(1.0, &b);
        assert_eq!(best.get().map(|p| p.id.as_str()), Some("a"));
        assert!(Best::new().get().is_none());
    }
}
