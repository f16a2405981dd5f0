//! Numeric policy for value nodes:
//! - lerp (scalar linear interpolation)
//! - interpolate (piecewise-linear over ordered breakpoints)
//! - track_toward (exponential decay toward a moving target)
//!
//! This is the one consistent policy the whole graph uses. Interpolation is
//! standard piecewise-linear; outside the table's domain the output is
//! clamped unless the table opts into extrapolation.

use crate::types::Extrapolate;

/// Linear interpolation of scalars.
#[inline]
pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Map `x` through a piecewise-linear breakpoint table.
///
/// `input_range` must be sorted ascending; the effective table length is the
/// shorter of the two slices. Outside the domain, [`Extrapolate::Clamp`] pins
/// to the edge output and [`Extrapolate::Extend`] continues the edge
/// segment's slope. Degenerate tables yield the single output, or 0.0 when
/// empty.
pub fn interpolate(
    x: f32,
    input_range: &[f32],
    output_range: &[f32],
    extrapolate: Extrapolate,
) -> f32 {
    let n = input_range.len().min(output_range.len());
    if n == 0 {
        return 0.0;
    }
    if n == 1 {
        return output_range[0];
    }

    if matches!(extrapolate, Extrapolate::Clamp) {
        if x <= input_range[0] {
            return output_range[0];
        }
        if x >= input_range[n - 1] {
            return output_range[n - 1];
        }
    }

    // Pick the segment whose right breakpoint is the first one past `x`;
    // under Extend, out-of-domain inputs fall into the edge segment and the
    // lerp runs with t outside [0, 1].
    let mut hi = 1;
    while hi < n - 1 && input_range[hi] < x {
        hi += 1;
    }
    let lo = hi - 1;

    let (x0, x1) = (input_range[lo], input_range[hi]);
    let (y0, y1) = (output_range[lo], output_range[hi]);
    if (x1 - x0).abs() <= f32::EPSILON {
        return y0;
    }
    lerp(y0, y1, (x - x0) / (x1 - x0))
}

/// Exponential decay step toward `target`.
///
/// `rate` is the fraction of the remaining distance covered this tick,
/// clamped to `[0, 1]`; 1.0 snaps to the target.
#[inline]
pub fn track_toward(current: f32, target: f32, rate: f32) -> f32 {
    let rate = rate.clamp(0.0, 1.0);
    current + (target - current) * rate
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lerp_endpoints_and_midpoint() {
        assert_eq!(lerp(0.0, 10.0, 0.0), 0.0);
        assert_eq!(lerp(0.0, 10.0, 1.0), 10.0);
        assert_eq!(lerp(0.0, 10.0, 0.5), 5.0);
    }

    #[test]
    fn interpolate_within_domain() {
        let inputs = [0.0, 1.0];
        let outputs = [0.0, 100.0];
        assert_eq!(interpolate(0.25, &inputs, &outputs, Extrapolate::Clamp), 25.0);
    }

    #[test]
    fn interpolate_picks_correct_segment() {
        let inputs = [0.0, 1.0, 2.0];
        let outputs = [0.0, 10.0, 110.0];
        assert_eq!(interpolate(0.5, &inputs, &outputs, Extrapolate::Clamp), 5.0);
        assert_eq!(interpolate(1.5, &inputs, &outputs, Extrapolate::Clamp), 60.0);
    }

    #[test]
    fn interpolate_clamps_outside_domain() {
        let inputs = [0.0, 1.0];
        let outputs = [5.0, 15.0];
        assert_eq!(interpolate(-2.0, &inputs, &outputs, Extrapolate::Clamp), 5.0);
        assert_eq!(interpolate(3.0, &inputs, &outputs, Extrapolate::Clamp), 15.0);
    }

    #[test]
    fn interpolate_extends_edge_slope() {
        let inputs = [0.0, 1.0];
        let outputs = [0.0, 10.0];
        assert_eq!(interpolate(2.0, &inputs, &outputs, Extrapolate::Extend), 20.0);
        assert_eq!(interpolate(-1.0, &inputs, &outputs, Extrapolate::Extend), -10.0);
    }

    #[test]
    fn interpolate_degenerate_tables() {
        assert_eq!(interpolate(0.5, &[], &[], Extrapolate::Clamp), 0.0);
        assert_eq!(interpolate(0.5, &[0.0], &[7.0], Extrapolate::Clamp), 7.0);
        // Zero-width segment falls back to the left output.
        assert_eq!(
            interpolate(1.0, &[1.0, 1.0], &[3.0, 9.0], Extrapolate::Extend),
            3.0
        );
    }

    #[test]
    fn track_covers_rate_fraction() {
        assert_eq!(track_toward(0.0, 1.0, 0.5), 0.5);
        assert_eq!(track_toward(0.5, 1.0, 0.5), 0.75);
    }

    #[test]
    fn track_rate_is_clamped() {
        assert_eq!(track_toward(0.0, 1.0, 2.0), 1.0);
        assert_eq!(track_toward(0.25, 1.0, -1.0), 0.25);
    }
}
