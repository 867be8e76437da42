//! Typed adjacency between nearby nodes.
//!
//! Every compute method is a pure function of the source node and its
//! annotated candidates. Ties between equally scored candidates are broken by
//! distance and then key, so results do not depend on candidate order.

pub mod coefficients;
pub mod directions;
pub mod potential;
pub mod settings;

pub use coefficients::*;
pub use directions::*;
pub use potential::*;
pub use settings::*;

use std::collections::BTreeMap;
use std::f64::consts::PI;

use foundation::geo::geodetic_to_enu;
use foundation::math::Vec3;
use foundation::spatial::{
    angle_between_vector2, angle_difference, angle_to_plane, relative_rotation_angle,
    viewing_direction,
};

use crate::edge::{NavigationDirection, NavigationEdge};
use crate::error::GraphError;
use crate::node::Node;
use crate::sequence::Sequence;

const UP: Vec3 = Vec3::new(0.0, 0.0, 1.0);

#[derive(Debug, Clone, Default)]
pub struct EdgeCalculator {
    settings: EdgeCalculatorSettings,
    coefficients: EdgeCalculatorCoefficients,
    directions: EdgeCalculatorDirections,
}

impl EdgeCalculator {
    pub fn new(settings: EdgeCalculatorSettings, coefficients: EdgeCalculatorCoefficients) -> Self {
        Self {
            settings,
            coefficients,
            directions: EdgeCalculatorDirections::default(),
        }
    }

    pub fn settings(&self) -> &EdgeCalculatorSettings {
        &self.settings
    }

    /// Annotate `candidates` relative to `node`.
    ///
    /// Candidates that are not merged, not full or farther than the largest
    /// edge distance are dropped, except keys in `fallback_keys` which are kept
    /// regardless of distance. An unmerged source has no candidates.
    pub fn get_potential_edges(
        &self,
        node: &Node,
        candidates: &[&Node],
        fallback_keys: &[&str],
    ) -> Result<Vec<PotentialEdge>, GraphError> {
        let (Some(rotation), Some(position)) = (node.rotation(), node.lng_lat_alt()) else {
            return Err(GraphError::NotFull(node.key().to_string()));
        };
        if !node.merged() {
            return Ok(Vec::new());
        }

        let current = viewing_direction(rotation);
        let current_vertical = angle_to_plane(current, UP);
        let max_distance = self.settings.max_distance();

        let mut potentials = Vec::new();
        for candidate in candidates {
            if !candidate.merged() || candidate.key() == node.key() {
                continue;
            }
            let (Some(c_rotation), Some(c_position), Some(spatial)) = (
                candidate.rotation(),
                candidate.lng_lat_alt(),
                candidate.spatial(),
            ) else {
                continue;
            };

            let motion = geodetic_to_enu(c_position, position);
            let distance = motion.length();
            if distance > max_distance && !fallback_keys.contains(&candidate.key()) {
                continue;
            }

            let direction = viewing_direction(c_rotation);
            potentials.push(PotentialEdge {
                id: candidate.key().to_string(),
                sequence_id: candidate.sequence_id().to_string(),
                captured_at: spatial.captured_at,
                distance,
                motion_change: angle_between_vector2(current.x, current.y, motion.x, motion.y),
                vertical_motion: angle_to_plane(motion, UP),
                direction_change: angle_between_vector2(
                    current.x,
                    current.y,
                    direction.x,
                    direction.y,
                ),
                vertical_direction_change: angle_to_plane(direction, UP) - current_vertical,
                rotation: relative_rotation_angle(rotation, c_rotation),
                world_motion_azimuth: angle_between_vector2(1.0, 0.0, motion.x, motion.y),
                same_sequence: candidate.sequence_id() == node.sequence_id(),
                same_merge_cc: candidate.merge_id() == node.merge_id(),
                same_user: candidate.creator_id().is_some()
                    && candidate.creator_id() == node.creator_id(),
                spherical: candidate.is_spherical(),
            });
        }

        Ok(potentials)
    }

    /// Next and previous edges from the capture order of `sequence`.
    pub fn compute_sequence_edges(
        &self,
        node: &Node,
        sequence: &Sequence,
    ) -> Result<Vec<NavigationEdge>, GraphError> {
        if node.sequence_id() != sequence.id() {
            return Err(GraphError::SequenceMismatch {
                node: node.key().to_string(),
                sequence: sequence.id().to_string(),
            });
        }

        let mut edges = Vec::new();
        if let Some(next) = sequence.find_next(node.key()) {
            edges.push(NavigationEdge::new(
                node.key(),
                next,
                NavigationDirection::Next,
                None,
            ));
        }
        if let Some(prev) = sequence.find_prev(node.key()) {
            edges.push(NavigationEdge::new(
                node.key(),
                prev,
                NavigationDirection::Prev,
                None,
            ));
        }
        Ok(edges)
    }

    /// Best nearby candidate from each other sequence.
    pub fn compute_similar_edges(
        &self,
        node: &Node,
        potentials: &[PotentialEdge],
    ) -> Result<Vec<NavigationEdge>, GraphError> {
        let captured_at = node
            .captured_at()
            .ok_or_else(|| GraphError::NotFull(node.key().to_string()))?;
        let s = &self.settings;
        let c = &self.coefficients;
        let spherical = node.is_spherical();

        let mut per_sequence: BTreeMap<&str, Best<'_>> = BTreeMap::new();
        for p in potentials {
            if p.same_sequence {
                continue;
            }
            if spherical {
                if !p.spherical {
                    continue;
                }
            } else if !p.spherical && p.direction_change.abs() > s.similar_max_direction_change {
                continue;
            }
            if p.distance > s.similar_max_distance {
                continue;
            }
            if p.same_user
                && (p.captured_at.millis() - captured_at.millis()).abs()
                    < s.similar_min_time_difference
            {
                continue;
            }

            let score = if spherical {
                p.distance
            } else {
                c.similar_distance * p.distance + c.similar_rotation * p.rotation
            };
            per_sequence
                .entry(p.sequence_id.as_str())
                .or_insert_with(Best::new)
                .offer(score, p);
        }

        Ok(per_sequence
            .values()
            .filter_map(Best::get)
            .map(|p| to_edge(node, p, NavigationDirection::Similar))
            .collect())
    }

    /// Step edges of a perspective source. Forward and backward fall back to
    /// the sequence neighbors when nothing qualifies within the step distance.
    pub fn compute_step_edges(
        &self,
        node: &Node,
        potentials: &[PotentialEdge],
        prev_key: Option<&str>,
        next_key: Option<&str>,
    ) -> Result<Vec<NavigationEdge>, GraphError> {
        require_full(node)?;
        if node.is_spherical() {
            return Ok(Vec::new());
        }
        let s = &self.settings;
        let c = &self.coefficients;

        let mut edges = Vec::new();
        for step in &self.directions.steps {
            let mut best = Best::new();
            let mut fallback = Best::new();

            for p in potentials {
                if p.direction_change.abs() > s.step_max_direction_change {
                    continue;
                }

                let motion_difference = angle_difference(step.motion_change, p.motion_change);
                let direction_motion_difference =
                    angle_difference(p.direction_change, motion_difference);
                let drift = motion_difference.abs().max(direction_motion_difference.abs());
                if drift > s.step_max_drift {
                    continue;
                }

                if step.use_fallback
                    && (prev_key == Some(p.id.as_str()) || next_key == Some(p.id.as_str()))
                {
                    fallback.offer(p.distance, p);
                }

                if p.distance > s.step_max_distance {
                    continue;
                }

                let motion_difference = (motion_difference * motion_difference
                    + p.vertical_motion * p.vertical_motion)
                    .sqrt();
                let score = c.step_preferred_distance
                    * (p.distance - s.step_preferred_distance).abs()
                    / s.step_max_distance
                    + c.step_motion * motion_difference / s.step_max_drift
                    + c.step_rotation * p.rotation / s.step_max_direction_change
                    + c.step_sequence_penalty * penalty(p.same_sequence)
                    + c.step_merge_cc_penalty * penalty(!p.same_merge_cc);
                best.offer(score, p);
            }

            if let Some(p) = best.get().or_else(|| fallback.get()) {
                edges.push(to_edge(node, p, step.direction));
            }
        }
        Ok(edges)
    }

    /// Turn edges of a perspective source, keyed on the candidate's own
    /// viewing direction.
    pub fn compute_turn_edges(
        &self,
        node: &Node,
        potentials: &[PotentialEdge],
    ) -> Result<Vec<NavigationEdge>, GraphError> {
        require_full(node)?;
        if node.is_spherical() {
            return Ok(Vec::new());
        }
        let s = &self.settings;
        let c = &self.coefficients;

        let mut edges = Vec::new();
        for turn in &self.directions.turns {
            let mut best = Best::new();

            for p in potentials {
                if p.spherical || p.distance > s.turn_max_distance {
                    continue;
                }

                let rig = turn.direction != NavigationDirection::TurnU
                    && p.distance < s.turn_max_rig_distance
                    && p.direction_change.abs() > s.turn_min_rig_direction_change;

                let score = if rig
                    && p.direction_change * turn.direction_change > 0.0
                    && p.direction_change.abs() < turn.direction_change.abs()
                {
                    -PI / 2.0 + p.direction_change.abs()
                } else {
                    let direction_difference =
                        angle_difference(turn.direction_change, p.direction_change);
                    if direction_difference.abs() > s.turn_max_direction_change {
                        continue;
                    }
                    let motion_difference = turn
                        .motion_change
                        .map_or(0.0, |m| angle_difference(m, p.motion_change));
                    let motion_difference = (motion_difference * motion_difference
                        + p.vertical_motion * p.vertical_motion)
                        .sqrt();
                    c.turn_distance * p.distance / s.turn_max_distance
                        + c.turn_motion * motion_difference / PI
                        + c.turn_sequence_penalty * penalty(p.same_sequence)
                        + c.turn_merge_cc_penalty * penalty(!p.same_merge_cc)
                };
                best.offer(score, p);
            }

            if let Some(p) = best.get() {
                edges.push(to_edge(node, p, turn.direction));
            }
        }
        Ok(edges)
    }

    /// Single spherical edge from a perspective source.
    pub fn compute_perspective_to_spherical_edges(
        &self,
        node: &Node,
        potentials: &[PotentialEdge],
    ) -> Result<Vec<NavigationEdge>, GraphError> {
        require_full(node)?;
        if node.is_spherical() {
            return Ok(Vec::new());
        }
        let s = &self.settings;
        let c = &self.coefficients;

        let mut best = Best::new();
        for p in potentials {
            if !p.spherical || p.distance > s.pano_max_distance {
                continue;
            }
            let score = c.pano_preferred_distance
                * (p.distance - s.pano_preferred_distance).abs()
                / s.pano_max_distance
                + c.pano_motion * p.motion_change.abs() / PI
                + c.pano_merge_cc_penalty * penalty(!p.same_merge_cc);
            best.offer(score, p);
        }

        Ok(best
            .get()
            .map(|p| to_edge(node, p, NavigationDirection::Spherical))
            .into_iter()
            .collect())
    }

    /// Edges of a spherical source: one spherical edge per angular sector,
    /// then step edges to perspective candidates in the sectors left empty.
    pub fn compute_spherical_edges(
        &self,
        node: &Node,
        potentials: &[PotentialEdge],
    ) -> Result<Vec<NavigationEdge>, GraphError> {
        require_full(node)?;
        if !node.is_spherical() {
            return Ok(Vec::new());
        }
        let s = &self.settings;
        let c = &self.coefficients;

        let mut spherical_candidates: Vec<&PotentialEdge> = Vec::new();
        let mut step_candidates: Vec<(NavigationDirection, &PotentialEdge)> = Vec::new();
        for p in potentials {
            if p.distance > s.pano_max_distance {
                continue;
            }
            if p.spherical {
                if p.distance < s.pano_min_distance {
                    continue;
                }
                spherical_candidates.push(p);
            } else {
                let turn = angle_difference(p.direction_change, p.motion_change);
                for direction in &self.directions.spherical {
                    let turn_change = angle_difference(direction.direction_change, turn);
                    if turn_change.abs() > s.pano_max_step_turn_change {
                        continue;
                    }
                    step_candidates.push((direction.direction, p));
                }
            }
        }

        let items = s.pano_max_items.max(1);
        let max_rotation_difference = PI / items as f64;
        let mut edges = Vec::new();
        let mut occupied: Vec<f64> = Vec::new();
        let mut step_angles: Vec<f64> = Vec::new();

        for index in 0..items {
            let rotation = index as f64 / items as f64 * 2.0 * PI;
            let mut best = Best::new();
            for p in &spherical_candidates {
                let motion_difference = angle_difference(rotation, p.motion_change);
                if motion_difference.abs() > max_rotation_difference {
                    continue;
                }
                if min_difference(&occupied, p.motion_change) <= max_rotation_difference {
                    continue;
                }
                let score = c.pano_preferred_distance
                    * (p.distance - s.pano_preferred_distance).abs()
                    / s.pano_max_distance
                    + c.pano_motion * motion_difference.abs() / max_rotation_difference
                    + c.pano_sequence_penalty * penalty(p.same_sequence)
                    + c.pano_merge_cc_penalty * penalty(!p.same_merge_cc);
                best.offer(score, p);
            }

            match best.get() {
                Some(p) => {
                    occupied.push(p.motion_change);
                    edges.push(to_edge(node, p, NavigationDirection::Spherical));
                }
                None => step_angles.push(rotation),
            }
        }

        let mut occupied_steps: BTreeMap<NavigationDirection, Vec<f64>> = BTreeMap::new();
        occupied_steps.insert(NavigationDirection::Spherical, occupied);
        for direction in &self.directions.spherical {
            occupied_steps.insert(direction.direction, Vec::new());
        }

        for step_angle in step_angles {
            let mut occupations: Vec<(NavigationDirection, f64)> = Vec::new();
            for direction in &self.directions.spherical {
                let all_occupied: Vec<f64> = [
                    NavigationDirection::Spherical,
                    direction.direction,
                    direction.prev,
                    direction.next,
                ]
                .iter()
                .filter_map(|d| occupied_steps.get(d))
                .flatten()
                .copied()
                .collect();

                let mut best = Best::new();
                for (candidate_direction, p) in &step_candidates {
                    if *candidate_direction != direction.direction {
                        continue;
                    }
                    let motion_change = angle_difference(step_angle, p.motion_change);
                    if motion_change.abs() > max_rotation_difference {
                        continue;
                    }
                    if min_difference(&all_occupied, p.motion_change) <= max_rotation_difference {
                        continue;
                    }
                    let score = c.pano_preferred_distance
                        * (p.distance - s.pano_preferred_distance).abs()
                        / s.pano_max_distance
                        + c.pano_motion * motion_change.abs() / max_rotation_difference
                        + c.pano_merge_cc_penalty * penalty(!p.same_merge_cc);
                    best.offer(score, p);
                }

                if let Some(p) = best.get() {
                    occupations.push((direction.direction, p.motion_change));
                    edges.push(to_edge(node, p, direction.direction));
                }
            }

            for (direction, angle) in occupations {
                occupied_steps.entry(direction).or_default().push(angle);
            }
        }

        Ok(edges)
    }
}

fn require_full(node: &Node) -> Result<(), GraphError> {
    if node.is_full() {
        Ok(())
    } else {
        Err(GraphError::NotFull(node.key().to_string()))
    }
}

fn penalty(flag: bool) -> f64 {
    if flag { 1.0 } else { 0.0 }
}

/// Smallest absolute angular distance from `angle` to any of `occupied`.
fn min_difference(occupied: &[f64], angle: f64) -> f64 {
    occupied
        .iter()
        .map(|o| angle_difference(*o, angle).abs())
        .fold(f64::MAX, f64::min)
}

fn to_edge(node: &Node, p: &PotentialEdge, direction: NavigationDirection) -> NavigationEdge {
    NavigationEdge::new(node.key(), &p.id, direction, Some(p.world_motion_azimuth))
}
