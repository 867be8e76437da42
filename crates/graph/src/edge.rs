use serde::{Deserialize, Serialize};

/// Typed navigation direction of an edge.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationDirection {
    Next,
    Prev,
    StepForward,
    StepBackward,
    StepLeft,
    StepRight,
    TurnLeft,
    TurnRight,
    TurnU,
    Spherical,
    Similar,
}

impl NavigationDirection {
    pub const ALL: [NavigationDirection; 11] = [
        NavigationDirection::Next,
        NavigationDirection::Prev,
        NavigationDirection::StepForward,
        NavigationDirection::StepBackward,
        NavigationDirection::StepLeft,
        NavigationDirection::StepRight,
        NavigationDirection::TurnLeft,
        NavigationDirection::TurnRight,
        NavigationDirection::TurnU,
        NavigationDirection::Spherical,
        NavigationDirection::Similar,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            NavigationDirection::Next => "next",
            NavigationDirection::Prev => "prev",
            NavigationDirection::StepForward => "step_forward",
            NavigationDirection::StepBackward => "step_backward",
            NavigationDirection::StepLeft => "step_left",
            NavigationDirection::StepRight => "step_right",
            NavigationDirection::TurnLeft => "turn_left",
            NavigationDirection::TurnRight => "turn_right",
            NavigationDirection::TurnU => "turn_u",
            NavigationDirection::Spherical => "spherical",
            NavigationDirection::Similar => "similar",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|d| d.as_str() == s)
    }

    pub fn is_sequence(self) -> bool {
        matches!(self, NavigationDirection::Next | NavigationDirection::Prev)
    }
}

impl std::fmt::Display for NavigationDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeData {
    pub direction: NavigationDirection,
    /// Azimuth of the source-to-target motion, counter-clockwise from east.
    /// `None` for sequence edges.
    pub world_motion_azimuth: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NavigationEdge {
    pub source: String,
    pub target: String,
    pub data: EdgeData,
}

impl NavigationEdge {
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        direction: NavigationDirection,
        world_motion_azimuth: Option<f64>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            data: EdgeData {
                direction,
                world_motion_azimuth,
            },
        }
    }

    pub fn direction(&self) -> NavigationDirection {
        self.data.direction
    }
}

/// Cached adjacency of one node. `None` means not computed yet.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeEdges {
    pub sequence: Option<Vec<NavigationEdge>>,
    pub spatial: Option<Vec<NavigationEdge>>,
}

impl NodeEdges {
    pub fn is_complete(&self) -> bool {
        self.sequence.is_some() && self.spatial.is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NavigationEdge> {
        self.sequence
            .iter()
            .flatten()
            .chain(self.spatial.iter().flatten())
    }

    /// First edge in `direction`.
    pub fn find(&self, direction: NavigationDirection) -> Option<&NavigationEdge> {
        self.iter().find(|e| e.direction() == direction)
    }
}

#[cfg(test)]
mod tests {
    use super::{NavigationDirection, NavigationEdge, NodeEdges};

    #[test]
    fn direction_names_round_trip() {
        for d in NavigationDirection::ALL {
            assert_eq!(NavigationDirection::parse(d.as_str()), Some(d));
        }
        assert_eq!(NavigationDirection::parse("sideways"), None);
        assert!(NavigationDirection::Prev.is_sequence());
        assert!(!NavigationDirection::TurnU.is_sequence());
    }

    #[test]
    fn node_edges_lookup() {
        let mut edges = NodeEdges::default();
        assert!(!edges.is_complete());
        assert!(edges.find(NavigationDirection::Next).is_none());

        edges.sequence = Some(vec![NavigationEdge::new("a", "b", NavigationDirection::Next, None)]);
        edges.spatial = Some(vec![NavigationEdge::new(
            "a",
            "c",
            NavigationDirection::StepLeft,
            Some(1.0),
        )]);
        assert!(edges.is_complete());
        assert_eq!(edges.iter().count(), 2);
        assert_eq!(edges.find(NavigationDirection::StepLeft).map(|e| e.target.as_str()), Some("c"));
    }
}
