//! Distance metrics for cellular noise.
//!
//! Each metric is a zero-sized type so the choice is resolved at compile
//! time inside the kernel's neighbour loop. [`DistanceFunction`] is the
//! runtime/serialized name used by configuration.

use crate::backend::SimdF32;
use core::fmt::Debug;
use serde::{Deserialize, Serialize};

/// Runtime name of a distance metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceFunction {
    #[default]
    Euclidean,
    EuclideanSquared,
    Manhattan,
    Hybrid,
    MaxAxis,
}

/// A distance metric over `D` per-axis offsets.
pub trait Distance: Copy + Default + Debug + Send + Sync + 'static {
    const FUNCTION: DistanceFunction;

    fn calc<F: SimdF32, const D: usize>(d: [F; D]) -> F;
}

#[inline(always)]
fn sum_squares<F: SimdF32, const D: usize>(d: [F; D]) -> F {
    d.into_iter().fold(F::splat(0.0), |acc, v| v.mul_add(v, acc))
}

/// `sqrt(Σ d²)`, computed as `rsqrt(Σ d²) · Σ d²`.
///
/// A zero offset is forced to 0, since `rsqrt(0) · 0` is NaN.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euclidean;

impl Distance for Euclidean {
    const FUNCTION: DistanceFunction = DistanceFunction::Euclidean;

    #[inline(always)]
    fn calc<F: SimdF32, const D: usize>(d: [F; D]) -> F {
        let sq = sum_squares(d);
        (sq.rsqrt() * sq).mask_zero(sq.cmp_gt(F::splat(0.0)))
    }
}

/// `Σ d²`.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanSquared;

impl Distance for EuclideanSquared {
    const FUNCTION: DistanceFunction = DistanceFunction::EuclideanSquared;

    #[inline(always)]
    fn calc<F: SimdF32, const D: usize>(d: [F; D]) -> F {
        sum_squares(d)
    }
}

/// `Σ |d|`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Manhattan;

impl Distance for Manhattan {
    const FUNCTION: DistanceFunction = DistanceFunction::Manhattan;

    #[inline(always)]
    fn calc<F: SimdF32, const D: usize>(d: [F; D]) -> F {
        d.into_iter().fold(F::splat(0.0), |acc, v| acc + v.abs())
    }
}

/// `Σ (d² + |d|)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Hybrid;

impl Distance for Hybrid {
    const FUNCTION: DistanceFunction = DistanceFunction::Hybrid;

    #[inline(always)]
    fn calc<F: SimdF32, const D: usize>(d: [F; D]) -> F {
        d.into_iter()
            .fold(F::splat(0.0), |acc, v| acc + v.mul_add(v, v.abs()))
    }
}

/// `max |d|`.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaxAxis;

impl Distance for MaxAxis {
    const FUNCTION: DistanceFunction = DistanceFunction::MaxAxis;

    #[inline(always)]
    fn calc<F: SimdF32, const D: usize>(d: [F; D]) -> F {
        d.into_iter().fold(F::splat(0.0), |acc, v| acc.max(v.abs()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scalar::ScalarF32;

    fn eval<M: Distance>(d: [f32; 3]) -> f32 {
        M::calc(d.map(ScalarF32)).0
    }

    #[test]
    fn metrics_on_a_known_offset() {
        let d = [3.0, -4.0, 0.0];
        assert!((eval::<Euclidean>(d) - 5.0).abs() < 1e-5);
        assert_eq!(eval::<EuclideanSquared>(d), 25.0);
        assert_eq!(eval::<Manhattan>(d), 7.0);
        assert_eq!(eval::<Hybrid>(d), 32.0);
        assert_eq!(eval::<MaxAxis>(d), 4.0);
    }

    #[test]
    fn euclidean_of_zero_offset_is_zero() {
        assert_eq!(eval::<Euclidean>([0.0, 0.0, 0.0]), 0.0);
        assert_eq!(eval::<Euclidean>([-0.0, 0.0, -0.0]), 0.0);
    }

    #[test]
    fn works_for_every_dimension() {
        let two = Manhattan::calc([ScalarF32(1.0), ScalarF32(-1.0)]).0;
        let four = MaxAxis::calc([ScalarF32(1.0), ScalarF32(-2.0), ScalarF32(0.5), ScalarF32(1.5)]).0;
        assert_eq!(two, 2.0);
        assert_eq!(four, 2.0);
    }

    #[test]
    fn function_names_round_trip_through_serde() {
        let json = serde_json::to_string(&DistanceFunction::EuclideanSquared).unwrap();
        assert_eq!(json, "\"euclidean_squared\"");
        let back: DistanceFunction = serde_json::from_str("\"max_axis\"").unwrap();
        assert_eq!(back, MaxAxis::FUNCTION);
        assert_eq!(DistanceFunction::default(), Euclidean::FUNCTION);
    }
}
