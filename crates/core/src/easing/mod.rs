use serde::{Deserialize, Serialize};

/// Strategy used to shape a value change over a span of time.
///
/// Arguments follow the classic Penner convention: `local_time` since the
/// start of the span, the `start` value, the total `delta` to travel and the
/// span's `duration`. Implementations are opaque to the engine.
pub trait Easing {
    fn ease(&self, local_time: f64, start: f64, delta: f64, duration: f64) -> f64;
}

/// Named easing curves. Serialisable so configuration files can pick one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EasingCurve {
    #[default]
    Linear,
    /// Holds the start value for the whole span.
    Step,
    SineIn,
    SineOut,
    SineInOut,
    QuadIn,
    QuadOut,
    QuadInOut,
    CubicIn,
    CubicOut,
    CubicInOut,
    QuartIn,
    QuartOut,
    QuartInOut,
    QuintIn,
    QuintOut,
    QuintInOut,
    ExpoIn,
    ExpoOut,
    ExpoInOut,
    CircIn,
    CircOut,
    CircInOut,
    BounceIn,
    BounceOut,
    BounceInOut,
}

impl EasingCurve {
    /// Maps normalised time `t` in `[0, 1]` to normalised progress.
    ///
    /// `Linear` and `Step` are computed in `f64` and are exact. The named
    /// curves go through `simple_easing`, which works in `f32`, so their
    /// mid-curve results carry roughly `1e-7` of relative error. A weight
    /// whose transition has finished still lands exactly on its end value.
    pub fn progress(self, t: f64) -> f64 {
        let curve: fn(f32) -> f32 = match self {
            EasingCurve::Linear => return t,
            EasingCurve::Step => return 0.0,
            EasingCurve::SineIn => simple_easing::sine_in,
            EasingCurve::SineOut => simple_easing::sine_out,
            EasingCurve::SineInOut => simple_easing::sine_in_out,
            EasingCurve::QuadIn => simple_easing::quad_in,
            EasingCurve::QuadOut => simple_easing::quad_out,
            EasingCurve::QuadInOut => simple_easing::quad_in_out,
            EasingCurve::CubicIn => simple_easing::cubic_in,
            EasingCurve::CubicOut => simple_easing::cubic_out,
            EasingCurve::CubicInOut => simple_easing::cubic_in_out,
            EasingCurve::QuartIn => simple_easing::quart_in,
            EasingCurve::QuartOut => simple_easing::quart_out,
            EasingCurve::QuartInOut => simple_easing::quart_in_out,
            EasingCurve::QuintIn => simple_easing::quint_in,
            EasingCurve::QuintOut => simple_easing::quint_out,
            EasingCurve::QuintInOut => simple_easing::quint_in_out,
            EasingCurve::ExpoIn => simple_easing::expo_in,
            EasingCurve::ExpoOut => simple_easing::expo_out,
            EasingCurve::ExpoInOut => simple_easing::expo_in_out,
            EasingCurve::CircIn => simple_easing::circ_in,
            EasingCurve::CircOut => simple_easing::circ_out,
            EasingCurve::CircInOut => simple_easing::circ_in_out,
            EasingCurve::BounceIn => simple_easing::bounce_in,
            EasingCurve::BounceOut => simple_easing::bounce_out,
            EasingCurve::BounceInOut => simple_easing::bounce_in_out,
        };
        curve(t as f32) as f64
    }
}

impl Easing for EasingCurve {
    fn ease(&self, local_time: f64, start: f64, delta: f64, duration: f64) -> f64 {
        if duration <= 0.0 {
            return start + delta;
        }
        start + self.progress(local_time / duration) * delta
    }
}

/// Easer that ignores its inputs and always yields `0.0`.
///
/// Used for the filler segments a built timeline inserts into coverage gaps.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroEasing;

impl Easing for ZeroEasing {
    fn ease(&self, _local_time: f64, _start: f64, _delta: f64, _duration: f64) -> f64 {
        0.0
    }
}

/// Adapts a normalised interpolation function `f: [0, 1] -> [0, 1]` into an
/// [`Easing`]: `start + f(local_time / duration) * delta`.
#[derive(Clone, Copy)]
pub struct Interpolation<F>(pub F);

impl<F> Easing for Interpolation<F>
where
    F: Fn(f64) -> f64,
{
    fn ease(&self, local_time: f64, start: f64, delta: f64, duration: f64) -> f64 {
        if duration <= 0.0 {
            return start + delta;
        }
        start + (self.0)(local_time / duration) * delta
    }
}

impl<F> std::fmt::Debug for Interpolation<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Interpolation").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CURVES: [EasingCurve; 8] = [
        EasingCurve::Linear,
        EasingCurve::SineInOut,
        EasingCurve::QuadIn,
        EasingCurve::CubicOut,
        EasingCurve::QuintInOut,
        EasingCurve::ExpoOut,
        EasingCurve::CircIn,
        EasingCurve::BounceOut,
    ];

    #[test]
    fn linear_is_exact() {
        let linear = EasingCurve::Linear;
        assert_eq!(linear.ease(0.5, 1.0, -1.0, 1.0), 0.5);
        assert_eq!(linear.ease(1.5, 0.0, 4.0, 2.0), 3.0);
    }

    #[test]
    fn curves_hit_their_endpoints() {
        for curve in CURVES {
            let begin = curve.ease(0.0, 2.0, 3.0, 4.0);
            let end = curve.ease(4.0, 2.0, 3.0, 4.0);
            assert!((begin - 2.0).abs() < 1e-3, "{curve:?} starts at {begin}");
            assert!((end - 5.0).abs() < 1e-3, "{curve:?} ends at {end}");
        }
    }

    #[test]
    fn named_curves_stay_within_single_precision() {
        for t in [0.1, 0.3, 0.7, 0.9] {
            let quad = EasingCurve::QuadIn.progress(t);
            assert!((quad - t * t).abs() < 1e-6, "quadIn({t}) = {quad}");
            let cubic = EasingCurve::CubicIn.progress(t);
            assert!((cubic - t * t * t).abs() < 1e-6, "cubicIn({t}) = {cubic}");
        }
    }

    #[test]
    fn step_holds_the_start_value() {
        assert_eq!(EasingCurve::Step.ease(0.99, 7.0, 3.0, 1.0), 7.0);
    }

    #[test]
    fn zero_duration_jumps_to_the_end() {
        assert_eq!(EasingCurve::QuadIn.ease(0.0, 1.0, 2.0, 0.0), 3.0);
        assert_eq!(Interpolation(|t: f64| t * t).ease(0.0, 1.0, 2.0, 0.0), 3.0);
    }

    #[test]
    fn interpolation_adapts_normalised_functions() {
        let square = Interpolation(|t: f64| t * t);
        assert!((square.ease(1.0, 0.0, 10.0, 2.0) - 2.5).abs() < 1e-12);
    }

    #[test]
    fn zero_easing_ignores_inputs() {
        assert_eq!(ZeroEasing.ease(0.3, 5.0, 5.0, 1.0), 0.0);
    }

    #[test]
    fn curves_deserialise_from_camel_case() {
        let curve: EasingCurve = serde_json::from_str("\"sineInOut\"").unwrap();
        assert_eq!(curve, EasingCurve::SineInOut);
    }
}
