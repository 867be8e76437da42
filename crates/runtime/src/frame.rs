use foundation::time::Time;

/// Deterministic frame metadata.
///
/// The frame index doubles as the monotonically increasing frame id that
/// render-state change tracking is keyed on.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct Frame {
    /// 0-based frame index.
    pub index: u64,
    /// Fixed delta time (seconds).
    pub dt_s: f64,
    /// Time at the start of the frame (seconds).
    pub time: Time,
}

impl Frame {
    pub fn new(index: u64, dt_s: f64) -> Self {
        Self {
            index,
            dt_s,
            time: Time(index as f64 * dt_s),
        }
    }

    pub fn next(self) -> Self {
        Self::new(self.index + 1, self.dt_s)
    }

    /// Frames per second implied by the fixed step; 0 when the step is not positive.
    pub fn fps(&self) -> f64 {
        if self.dt_s > 0.0 { 1.0 / self.dt_s } else { 0.0 }
    }
}

/// Hands out frames with strictly increasing ids.
#[derive(Debug, Clone)]
pub struct FrameClock {
    current: Frame,
    started: bool,
}

impl FrameClock {
    pub fn new(fps: f64) -> Self {
        let dt_s = if fps > 0.0 { 1.0 / fps } else { 1.0 / 60.0 };
        Self {
            current: Frame::new(0, dt_s),
            started: false,
        }
    }

    /// The next frame; the first call yields index 0.
    pub fn tick(&mut self) -> Frame {
        if self.started {
            self.current = self.current.next();
        } else {
            self.started = true;
        }
        self.current
    }

    pub fn current(&self) -> Frame {
        self.current
    }
}

impl Default for FrameClock {
    fn default() -> Self {
        Self::new(60.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Frame, FrameClock};
    use foundation::time::Time;

    #[test]
    fn frame_time_is_deterministic() {
        let a = Frame::new(10, 1.0 / 60.0);
        let b = Frame::new(10, 1.0 / 60.0);
        assert_eq!(a, b);
        assert_eq!(a.time, Time(10.0 / 60.0));
    }

    #[test]
    fn next_advances_index_and_time() {
        let f0 = Frame::new(0, 0.5);
        let f1 = f0.next();
        assert_eq!(f1.index, 1);
        assert_eq!(f1.time, Time(0.5));
        assert_eq!(f1.fps(), 2.0);
    }

    #[test]
    fn clock_ids_strictly_increase() {
        let mut clock = FrameClock::new(30.0);
        let ids: Vec<u64> = (0..4).map(|_| clock.tick().index).collect();
        assert_eq!(ids, vec![0, 1, 2, 3]);
        assert_eq!(clock.current().index, 3);
    }
}
