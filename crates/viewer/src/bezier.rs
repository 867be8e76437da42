const NEWTON_ITERATIONS: usize = 8;
const BISECTION_ITERATIONS: usize = 64;

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UnitBezier {
    ax: f64,
    bx: f64,
    cx: f64,
    ay: f64,
    by: f64,
    cy: f64,
}

impl UnitBezier {
    /// Curve through the control points `(p1x, p1y)` and `(p2x, p2y)`.
    pub fn new(p1x: f64, p1y: f64, p2x: f64, p2y: f64) -> Self {
        let cx = 3.0 * p1x;
        let bx = 3.0 * (p2x - p1x) - cx;
        let cy = 3.0 * p1y;
        let by = 3.0 * (p2y - p1y) - cy;
        Self {
            ax: 1.0 - cx - bx,
            bx,
            cx,
            ay: 1.0 - cy - by,
            by,
            cy,
        }
    }

    /// Eased value for progress `x` in `[0, 1]`.
    pub fn solve(&self, x: f64) -> f64 {
        self.solve_with_epsilon(x, 1e-6)
    }

    pub fn solve_with_epsilon(&self, x: f64, epsilon: f64) -> f64 {
        self.sample_y(self.solve_x(x.clamp(0.0, 1.0), epsilon))
    }

    fn sample_x(&self, t: f64) -> f64 {
        ((self.ax * t + self.bx) * t + self.cx) * t
    }

    fn sample_y(&self, t: f64) -> f64 {
        ((self.ay * t + self.by) * t + self.cy) * t
    }

    fn sample_derivative_x(&self, t: f64) -> f64 {
        (3.0 * self.ax * t + 2.0 * self.bx) * t + self.cx
    }

    /// Curve parameter `t` with `sample_x(t) == x`.
    fn solve_x(&self, x: f64, epsilon: f64) -> f64 {
        let mut t = x;
        for _ in 0..NEWTON_ITERATIONS {
            let error = self.sample_x(t) - x;
            if error.abs() < epsilon {
                return t;
            }
            let derivative = self.sample_derivative_x(t);
            if derivative.abs() < 1e-6 {
                break;
            }
            t -= error / derivative;
        }

        // Newton failed; bisect.
        let (mut lo, mut hi) = (0.0, 1.0);
        t = x;
        if t < lo {
            return lo;
        }
        if t > hi {
            return hi;
        }
        for _ in 0..BISECTION_ITERATIONS {
            let sample = self.sample_x(t);
            if (sample - x).abs() < epsilon {
                return t;
            }
            if x > sample {
                lo = t;
            } else {
                hi = t;
            }
            t = (hi - lo) * 0.5 + lo;
        }
        t
    }
}
