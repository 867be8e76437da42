/// Engine time in seconds.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Default)]
pub struct Time(pub f64);

impl Time {
    pub fn seconds(self) -> f64 {
        self.0
    }
}

/// Capture timestamp in milliseconds since the Unix epoch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Timestamp(pub i64);

impl Timestamp {
    pub fn millis(self) -> i64 {
        self.0
    }

    /// Absolute difference in milliseconds.
    pub fn abs_diff_ms(self, other: Timestamp) -> u64 {
        self.0.abs_diff(other.0)
    }
}

#[cfg(test)]
mod tests {
    use super::{Time, Timestamp};

    #[test]
    fn timestamp_difference_is_symmetric() {
        let a = Timestamp(1_000);
        let b = Timestamp(-500);
        assert_eq!(a.abs_diff_ms(b), 1_500);
        assert_eq!(b.abs_diff_ms(a), 1_500);
        assert_eq!(Time(2.5).seconds(), 2.5);
    }
}
