use super::{Gen2D, Gen3D, Gen4D};
use crate::backend::{SimdF32, SimdI32};
use crate::gradient::{gradient_dot_2d, gradient_dot_3d, gradient_dot_4d};
use crate::hash::{hash_primes, primes};
use crate::math::{interp_quintic, lerp};

const SCALE_2D: f32 = 0.579_106_986_522_674_560_546_875;
const SCALE_3D: f32 = 0.964_921_414_852_142_333_984_375;
const SCALE_4D: f32 = 0.964_921_414_852_142_333_984_375;

/// Classic gradient noise on the integer lattice with quintic smoothing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Perlin;

/// Lattice origin, primed index of the low and high corner, and the two
/// fractional offsets along one axis.
struct Axis<F: SimdF32> {
    i0: F::I32,
    i1: F::I32,
    f0: F,
    f1: F,
    weight: F,
}

impl<F: SimdF32> Axis<F> {
    #[inline(always)]
    fn new(coord: F, prime: i32) -> Self {
        let origin = coord.floor();
        let i0 = origin.to_i32_trunc() * F::I32::splat(prime);
        let f0 = coord - origin;
        Self {
            i0,
            i1: i0 + F::I32::splat(prime),
            f0,
            f1: f0 - F::splat(1.0),
            weight: interp_quintic(f0),
        }
    }

    #[inline(always)]
    fn index(&self, high: bool) -> F::I32 {
        if high {
            self.i1
        } else {
            self.i0
        }
    }

    #[inline(always)]
    fn offset(&self, high: bool) -> F {
        if high {
            self.f1
        } else {
            self.f0
        }
    }
}

impl Gen2D for Perlin {
    #[inline(always)]
    fn gen_2d<F: SimdF32>(&self, seed: F::I32, x: F, y: F) -> F {
        let ax = Axis::<F>::new(x, primes::X);
        let ay = Axis::<F>::new(y, primes::Y);

        let corner = |hx: bool, hy: bool| {
            let hash = hash_primes(seed, [ax.index(hx), ay.index(hy)]);
            gradient_dot_2d(hash, ax.offset(hx), ay.offset(hy))
        };

        let y0 = lerp(corner(false, false), corner(true, false), ax.weight);
        let y1 = lerp(corner(false, true), corner(true, true), ax.weight);
        F::splat(SCALE_2D) * lerp(y0, y1, ay.weight)
    }
}

impl Gen3D for Perlin {
    #[inline(always)]
    fn gen_3d<F: SimdF32>(&self, seed: F::I32, x: F, y: F, z: F) -> F {
        let ax = Axis::<F>::new(x, primes::X);
        let ay = Axis::<F>::new(y, primes::Y);
        let az = Axis::<F>::new(z, primes::Z);

        let corner = |hx: bool, hy: bool, hz: bool| {
            let hash = hash_primes(seed, [ax.index(hx), ay.index(hy), az.index(hz)]);
            gradient_dot_3d(hash, ax.offset(hx), ay.offset(hy), az.offset(hz))
        };
        let edge = |hy: bool, hz: bool| {
            lerp(corner(false, hy, hz), corner(true, hy, hz), ax.weight)
        };
        let face = |hz: bool| lerp(edge(false, hz), edge(true, hz), ay.weight);

        F::splat(SCALE_3D) * lerp(face(false), face(true), az.weight)
    }
}

impl Gen4D for Perlin {
    #[inline(always)]
    fn gen_4d<F: SimdF32>(&self, seed: F::I32, x: F, y: F, z: F, w: F) -> F {
        let ax = Axis::<F>::new(x, primes::X);
        let ay = Axis::<F>::new(y, primes::Y);
        let az = Axis::<F>::new(z, primes::Z);
        let aw = Axis::<F>::new(w, primes::W);

        let corner = |hx: bool, hy: bool, hz: bool, hw: bool| {
            let hash = hash_primes(
                seed,
                [ax.index(hx), ay.index(hy), az.index(hz), aw.index(hw)],
            );
            gradient_dot_4d(
                hash,
                ax.offset(hx),
                ay.offset(hy),
                az.offset(hz),
                aw.offset(hw),
            )
        };
        let edge = |hy: bool, hz: bool, hw: bool| {
            lerp(corner(false, hy, hz, hw), corner(true, hy, hz, hw), ax.weight)
        };
        let face = |hz: bool, hw: bool| lerp(edge(false, hz, hw), edge(true, hz, hw), ay.weight);
        let cube = |hw: bool| lerp(face(false, hw), face(true, hw), az.weight);

        F::splat(SCALE_4D) * lerp(cube(false), cube(true), aw.weight)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::portable::{PF32, PI32};
    use crate::backend::scalar::{ScalarF32, ScalarI32};

    fn perlin_2d(seed: i32, x: f32, y: f32) -> f32 {
        Perlin.gen_2d(ScalarI32(seed), ScalarF32(x), ScalarF32(y)).0
    }

    #[test_log::test]
    fn lattice_points_are_zero() {
        for seed in [0, 1234, -7] {
            assert_eq!(perlin_2d(seed, 3.0, 5.0), 0.0);
            let v3 = Perlin.gen_3d(
                ScalarI32(seed),
                ScalarF32(-2.0),
                ScalarF32(0.0),
                ScalarF32(9.0),
            );
            assert_eq!(v3.0, 0.0);
        }
    }

    #[test_log::test]
    fn varies_between_lattice_points() {
        let samples: Vec<f32> = (0..32).map(|i| perlin_2d(1337, 0.37 + i as f32 * 0.71, 0.5)).collect();
        assert!(samples.iter().any(|v| v.abs() > 0.05));
        assert!(samples.iter().all(|v| v.abs() <= 1.05));
    }

    #[test_log::test]
    fn seed_changes_output() {
        let a = perlin_2d(1, 0.3, 0.7);
        let b = perlin_2d(2, 0.3, 0.7);
        assert_ne!(a, b);
    }

    #[test_log::test]
    fn lanes_match_scalar_evaluation() {
        let xs = [0.1, -3.7, 12.25, 0.5];
        let ys = [4.4, 0.0, -1.5, 100.125];
        let v = Perlin.gen_3d(
            PI32::<4>::splat(99),
            PF32(xs),
            PF32(ys),
            PF32([0.3; 4]),
        );
        for lane in 0..4 {
            let s = Perlin.gen_3d(
                ScalarI32(99),
                ScalarF32(xs[lane]),
                ScalarF32(ys[lane]),
                ScalarF32(0.3),
            );
            assert_eq!(v.0[lane], s.0);
        }
    }
}
