//! Deterministic float ordering for sort keys.

use core::cmp::Ordering;

/// Total order that treats `-0.0` as `0.0` and all NaNs as one value.
pub fn stable_total_cmp_f64(a: f64, b: f64) -> Ordering {
    fn canonical(v: f64) -> f64 {
        match v {
            v if v == 0.0 => 0.0,
            v if v.is_nan() => f64::NAN,
            v => v,
        }
    }
    canonical(a).total_cmp(&canonical(b))
}

#[cfg(test)]
mod tests {
    use super::stable_total_cmp_f64;
    use core::cmp::Ordering;

    #[test]
    fn zeros_and_nans_compare_equal() {
        assert_eq!(stable_total_cmp_f64(-0.0, 0.0), Ordering::Equal);
        assert_eq!(stable_total_cmp_f64(f64::NAN, -f64::NAN), Ordering::Equal);
        assert_eq!(stable_total_cmp_f64(1.0, 2.0), Ordering::Less);
    }

    #[test]
    fn sorts_scores_independent_of_input_order() {
        let mut a = vec![2.5, -0.0, -1.0, 0.0];
        let mut b = vec![0.0, -1.0, 2.5, -0.0];
        a.sort_by(|x, y| stable_total_cmp_f64(*x, *y));
        b.sort_by(|x, y| stable_total_cmp_f64(*x, *y));
        assert_eq!(a[0], -1.0);
        assert_eq!(a[3], 2.5);
        assert_eq!(a.len(), b.len());
        assert!(a.iter().zip(&b).all(|(x, y)| stable_total_cmp_f64(*x, *y).is_eq()));
    }
}
