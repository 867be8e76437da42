use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

use crate::edge::NavigationDirection;

/// Canonical motion of a step edge relative to the source viewing direction.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct StepDirection {
    pub direction: NavigationDirection,
    pub motion_change: f64,
    /// Fall back to a sequence neighbor when no candidate is close enough.
    pub use_fallback: bool,
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TurnDirection {
    pub direction: NavigationDirection,
    pub direction_change: f64,
    /// `None` for a U-turn, where motion is irrelevant.
    pub motion_change: Option<f64>,
}

/// Step direction around a spherical source and its angular neighbors.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SphericalDirection {
    pub direction: NavigationDirection,
    pub direction_change: f64,
    pub next: NavigationDirection,
    pub prev: NavigationDirection,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EdgeCalculatorDirections {
    pub steps: [StepDirection; 4],
    pub turns: [TurnDirection; 3],
    pub spherical: [SphericalDirection; 4],
}

impl Default for EdgeCalculatorDirections {
    fn default() -> Self {
        use NavigationDirection::*;
        Self {
            steps: [
                StepDirection {
                    direction: StepForward,
                    motion_change: 0.0,
                    use_fallback: true,
                },
                StepDirection {
                    direction: StepBackward,
                    motion_change: PI,
                    use_fallback: true,
                },
                StepDirection {
                    direction: StepLeft,
                    motion_change: FRAC_PI_2,
                    use_fallback: false,
                },
                StepDirection {
                    direction: StepRight,
                    motion_change: -FRAC_PI_2,
                    use_fallback: false,
                },
            ],
            turns: [
                TurnDirection {
                    direction: TurnLeft,
                    direction_change: FRAC_PI_2,
                    motion_change: Some(FRAC_PI_4),
                },
                TurnDirection {
                    direction: TurnRight,
                    direction_change: -FRAC_PI_2,
                    motion_change: Some(-FRAC_PI_4),
                },
                TurnDirection {
                    direction: TurnU,
                    direction_change: PI,
                    motion_change: None,
                },
            ],
            spherical: [
                SphericalDirection {
                    direction: StepForward,
                    direction_change: 0.0,
                    next: StepLeft,
                    prev: StepRight,
                },
                SphericalDirection {
                    direction: StepBackward,
                    direction_change: PI,
                    next: StepRight,
                    prev: StepLeft,
                },
                SphericalDirection {
                    direction: StepLeft,
                    direction_change: FRAC_PI_2,
                    next: StepBackward,
                    prev: StepForward,
                },
                SphericalDirection {
                    direction: StepRight,
                    direction_change: -FRAC_PI_2,
                    next: StepForward,
                    prev: StepBackward,
                },
            ],
        }
    }
}
