// SPDX-License-Identifier: MIT OR Apache-2.0
//! Easing curves for reshaping interpolation progress.

use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

/// Easing curve applied to a normalized 0..1 progress value.
///
/// Output is not clamped: `Elastic` deliberately overshoots outside [0, 1]
/// near the end of the curve, so callers must not assume a bounded result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum Easing {
    /// Identity
    #[default]
    Linear,
    /// Quadratic acceleration
    EaseIn,
    /// Quadratic deceleration
    EaseOut,
    /// Quadratic acceleration then deceleration
    EaseInOut,
    /// Four-segment decaying bounce
    Bounce,
    /// Exponentially damped oscillation
    Elastic,
}

impl Easing {
    /// Reshape a progress value through this curve.
    pub fn apply(self, t: f64) -> f64 {
        match self {
            Self::Linear => t,
            Self::EaseIn => t * t,
            Self::EaseOut => 1.0 - (1.0 - t) * (1.0 - t),
            Self::EaseInOut => {
                if t < 0.5 {
                    2.0 * t * t
                } else {
                    1.0 - 2.0 * (1.0 - t) * (1.0 - t)
                }
            }
            Self::Bounce => bounce(t),
            Self::Elastic => elastic(t),
        }
    }
}

/// Piecewise quadratic with breakpoints at t = 1/2.75, 2/2.75, 2.5/2.75.
fn bounce(t: f64) -> f64 {
    if t < 1.0 / 2.75 {
        7.5625 * t * t
    } else if t < 2.0 / 2.75 {
        let t = t - 1.5 / 2.75;
        7.5625 * t * t + 0.75
    } else if t < 2.5 / 2.75 {
        let t = t - 2.25 / 2.75;
        7.5625 * t * t + 0.9375
    } else {
        let t = t - 2.625 / 2.75;
        7.5625 * t * t + 0.984375
    }
}

fn elastic(t: f64) -> f64 {
    if t == 0.0 || t == 1.0 {
        return t;
    }
    let p = 0.3;
    let s = p / 4.0;
    -(2f64.powf(10.0 * (t - 1.0)) * ((t - 1.0 - s) * TAU / p).sin())
}

/// Cubic bezier progress curve with scalar control points.
///
/// Keyframes tagged [`InterpolationMode::Bezier`] use the fixed pair
/// `(0.25, 0.75)`.
///
/// [`InterpolationMode::Bezier`]: crate::keyframe::InterpolationMode::Bezier
pub fn cubic_bezier(t: f64, p1: f64, p2: f64) -> f64 {
    let u = 1.0 - t;
    3.0 * u * u * t * p1 + 3.0 * u * t * t * p2 + t * t * t
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [Easing; 6] = [
        Easing::Linear,
        Easing::EaseIn,
        Easing::EaseOut,
        Easing::EaseInOut,
        Easing::Bounce,
        Easing::Elastic,
    ];

    #[test]
    fn endpoints_are_stable() {
        for ease in ALL {
            assert_eq!(ease.apply(0.0), 0.0, "{ease:?} at 0");
            assert!((ease.apply(1.0) - 1.0).abs() < 1e-9, "{ease:?} at 1");
        }
    }

    #[test]
    fn quadratic_curves_hit_known_values() {
        assert_eq!(Easing::EaseIn.apply(0.5), 0.25);
        assert_eq!(Easing::EaseOut.apply(0.5), 0.75);
        assert_eq!(Easing::EaseInOut.apply(0.25), 0.125);
        assert_eq!(Easing::EaseInOut.apply(0.75), 0.875);
    }

    #[test]
    fn bounce_stays_within_unit_interval() {
        for i in 0..=1000 {
            let t = i as f64 / 1000.0;
            let v = Easing::Bounce.apply(t);
            assert!((-1e-12..=1.0 + 1e-9).contains(&v), "bounce({t}) = {v}");
        }
    }

    #[test]
    fn bounce_segment_offsets() {
        // Each segment bottoms out at its documented offset
        assert!((Easing::Bounce.apply(1.5 / 2.75) - 0.75).abs() < 1e-12);
        assert!((Easing::Bounce.apply(2.25 / 2.75) - 0.9375).abs() < 1e-12);
        assert!((Easing::Bounce.apply(2.625 / 2.75) - 0.984375).abs() < 1e-12);
    }

    #[test]
    fn elastic_overshoots_by_design() {
        let overshoots = (1..100).any(|i| {
            let v = Easing::Elastic.apply(i as f64 / 100.0);
            !(0.0..=1.0).contains(&v)
        });
        assert!(overshoots);
    }

    #[test]
    fn cubic_bezier_endpoints_and_symmetry() {
        assert_eq!(cubic_bezier(0.0, 0.25, 0.75), 0.0);
        assert_eq!(cubic_bezier(1.0, 0.25, 0.75), 1.0);
        // Symmetric control points make the midpoint exact
        assert!((cubic_bezier(0.5, 0.25, 0.75) - 0.5).abs() < 1e-12);
    }
}
