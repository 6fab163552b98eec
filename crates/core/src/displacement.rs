//! Closed-form swirl field that drives the mesh warp.
//!
//! The velocity at `(x, y)` is a point vortex centered on `(0.5, 0.5)` with
//! strength `sa`, plus a constant rightward bias. Speeds above `dmax` are
//! rescaled to exactly `dmax`, so no vertex moves more than a few texels per
//! frame and the warped mesh never folds over itself.

use crate::config::IbfvConfig;
use std::f64::consts::TAU;

/// A 2D displacement field evaluated in normalized mesh space `[0, 1]²`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DisplacementField {
    dmax: f64,
    bias: f64,
    epsilon: f64,
}

impl DisplacementField {
    /// Creates a field with the given speed limit, rightward bias and
    /// minimum squared radius.
    pub fn new(dmax: f64, bias: f64, epsilon: f64) -> Self {
        Self {
            dmax,
            bias,
            epsilon,
        }
    }

    pub fn from_config(config: &IbfvConfig) -> Self {
        Self::new(config.dmax(), config.bias, config.epsilon)
    }

    /// Maximum displacement magnitude.
    pub fn dmax(&self) -> f64 {
        self.dmax
    }

    /// Velocity at `(x, y)` for swirl strength `sa`, after clamping.
    pub fn velocity(&self, x: f64, y: f64, sa: f64) -> (f64, f64) {
        let dx = x - 0.5;
        let dy = y - 0.5;
        let r = (dx * dx + dy * dy).max(self.epsilon);
        let mut vx = sa * dx / r + self.bias;
        let mut vy = sa * dy / r;
        let speed_sq = vx * vx + vy * vy;
        if speed_sq > self.dmax * self.dmax {
            let k = self.dmax / speed_sq.sqrt();
            vx *= k;
            vy *= k;
        }
        (vx, vy)
    }

    /// Displaced position of the lattice point `(x, y)`.
    pub fn displace(&self, x: f64, y: f64, sa: f64) -> (f64, f64) {
        let (vx, vy) = self.velocity(x, y, sa);
        (x + vx, y + vy)
    }
}

/// Swirl strength for a frame: `amplitude * cos(frame * 2π / period)`.
///
/// The sign flips every half period, which reverses the vortex and keeps
/// the texture from drifting monotonically in one direction.
pub fn swirl_amplitude(frame: u64, amplitude: f64, period: f64) -> f64 {
    amplitude * (frame as f64 * TAU / period).cos()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reference_field() -> DisplacementField {
        DisplacementField::from_config(&IbfvConfig::default())
    }

    fn magnitude((x0, y0): (f64, f64), (x1, y1): (f64, f64)) -> f64 {
        ((x1 - x0).powi(2) + (y1 - y0).powi(2)).sqrt()
    }

    #[test]
    fn zero_swirl_gives_pure_bias_clamped_to_dmax() {
        let f = reference_field();
        let (px, py) = f.displace(0.3, 0.7, 0.0);
        // bias 0.02 exceeds dmax 4/512, so the step is exactly dmax to the right.
        assert!((px - (0.3 + 4.0 / 512.0)).abs() < 1e-12, "px = {px}");
        assert!((py - 0.7).abs() < 1e-12, "py = {py}");
    }

    #[test]
    fn small_bias_passes_through_unclamped() {
        let f = DisplacementField::new(0.1, 0.02, 1e-4);
        let (px, py) = f.displace(0.25, 0.25, 0.0);
        assert!((px - 0.27).abs() < 1e-12);
        assert!((py - 0.25).abs() < 1e-12);
    }

    #[test]
    fn center_is_guarded_not_singular() {
        let f = reference_field();
        let (px, py) = f.displace(0.5, 0.5, 0.01);
        assert!(px.is_finite() && py.is_finite());
        assert!(magnitude((0.5, 0.5), (px, py)) <= f.dmax() + 1e-12);
    }

    #[test]
    fn clamp_preserves_direction() {
        let f = DisplacementField::new(0.001, 0.0, 1e-4);
        let (vx, vy) = f.velocity(0.9, 0.6, 0.01);
        // Unclamped velocity points along (dx, dy) = (0.4, 0.1).
        assert!((vy / vx - 0.25).abs() < 1e-9, "direction changed: ({vx}, {vy})");
        assert!(((vx * vx + vy * vy).sqrt() - 0.001).abs() < 1e-12);
    }

    #[test]
    fn swirl_amplitude_oscillates_with_period() {
        assert!((swirl_amplitude(0, 0.01, 200.0) - 0.01).abs() < 1e-15);
        assert!((swirl_amplitude(100, 0.01, 200.0) + 0.01).abs() < 1e-12);
        assert!(swirl_amplitude(50, 0.01, 200.0).abs() < 1e-12);
        let a = swirl_amplitude(37, 0.01, 200.0);
        let b = swirl_amplitude(237, 0.01, 200.0);
        assert!((a - b).abs() < 1e-12);
    }

    #[test]
    fn swirl_amplitude_zero_amplitude_is_always_zero() {
        for frame in [0, 1, 99, 1_000_000] {
            assert_eq!(swirl_amplitude(frame, 0.0, 200.0), 0.0);
        }
    }

    mod proptests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn displacement_never_exceeds_dmax(
                x in 0.0_f64..=1.0,
                y in 0.0_f64..=1.0,
                sa in -1.0_f64..1.0,
            ) {
                let f = reference_field();
                let d = magnitude((x, y), f.displace(x, y, sa));
                prop_assert!(d <= f.dmax() * (1.0 + 1e-12), "|d| = {d} at ({x}, {y}), sa {sa}");
            }

            #[test]
            fn clamped_displacement_sits_exactly_on_dmax(
                x in 0.0_f64..=1.0,
                y in 0.0_f64..=1.0,
                sa in -1.0_f64..1.0,
            ) {
                let f = reference_field();
                let dx = x - 0.5;
                let dy = y - 0.5;
                let r = (dx * dx + dy * dy).max(1e-4);
                let raw = ((sa * dx / r + 0.02).powi(2) + (sa * dy / r).powi(2)).sqrt();
                prop_assume!(raw > f.dmax());
                let d = magnitude((x, y), f.displace(x, y, sa));
                prop_assert!((d - f.dmax()).abs() < 1e-12, "|d| = {d}, dmax = {}", f.dmax());
            }

            #[test]
            fn displaced_points_stay_within_margin(
                x in 0.0_f64..=1.0,
                y in 0.0_f64..=1.0,
                sa in -0.05_f64..0.05,
            ) {
                let f = reference_field();
                let (px, py) = f.displace(x, y, sa);
                let m = f.dmax() + 1e-12;
                prop_assert!((-m..=1.0 + m).contains(&px));
                prop_assert!((-m..=1.0 + m).contains(&py));
            }

            #[test]
            fn nearby_inputs_map_to_nearby_outputs(
                x in 0.0_f64..=1.0,
                y in 0.0_f64..=1.0,
                sa in -0.02_f64..0.02,
            ) {
                // Outside the clamped core the field is smooth; a tiny input
                // step moves the output by a bounded multiple of that step.
                let f = reference_field();
                let h = 1e-7;
                let a = f.displace(x, y, sa);
                let b = f.displace(x + h, y + h, sa);
                prop_assert!(magnitude(a, b) < 1e-3, "jump of {} for step {h}", magnitude(a, b));
            }
        }
    }
}
