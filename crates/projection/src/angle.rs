//! Angle bookkeeping helpers.

use std::f64::consts::PI;

/// Fold right ascensions onto a contiguous branch.
///
/// Values are first normalized into `[0, 2π)`. If the normalized values span
/// more than π, the data is assumed to cross RA = 0 and every value below π
/// is shifted up by 2π, so a map straddling the seam does not smear across
/// the whole sky.
pub fn unwrap_ra(values: &mut [f64]) {
    if values.is_empty() {
        return;
    }
    let two_pi = 2.0 * PI;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;
    for value in values.iter_mut() {
        *value = value.rem_euclid(two_pi);
        min = min.min(*value);
        max = max.max(*value);
    }
    if max - min > PI {
        for value in values.iter_mut() {
            if *value < PI {
                *value += two_pi;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contiguous_values_untouched() {
        let mut ra = [1.0, 1.1, 1.2];
        unwrap_ra(&mut ra);
        assert_eq!(ra, [1.0, 1.1, 1.2]);
    }

    #[test]
    fn test_seam_crossing_is_unwrapped() {
        let mut ra = [0.1, 2.0 * PI - 0.1];
        unwrap_ra(&mut ra);
        let span = ra.iter().fold(f64::NEG_INFINITY, |a, &b| a.max(b))
            - ra.iter().fold(f64::INFINITY, |a, &b| a.min(b));
        assert!(span < 0.3, "span {span} should be small after unwrapping");
    }

    #[test]
    fn test_negative_input_normalized() {
        let mut ra = [-0.1, 0.1];
        unwrap_ra(&mut ra);
        // -0.1 normalizes to 2π - 0.1, then 0.1 is shifted next to it.
        assert!((ra[0] - (2.0 * PI - 0.1)).abs() < 1e-12);
        assert!((ra[1] - (2.0 * PI + 0.1)).abs() < 1e-12);
    }

    #[test]
    fn test_empty_slice() {
        unwrap_ra(&mut []);
    }
}
