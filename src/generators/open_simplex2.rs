use super::simplex::triangle_2d;
use super::{falloff, Gen2D, Gen3D, Gen4D, Simplex};
use crate::backend::{MaskOps, SimdF32, SimdI32};
use crate::gradient::{gradient_dot_2d_fancy, gradient_dot_3d};
use crate::hash::{hash_primes, primes};

/// OpenSimplex2 noise.
///
/// The 2D form is the triangular lattice with a smoother gradient set. The
/// 3D form evaluates two offset body-centred-cubic lattices: each pass
/// rounds to the nearest lattice point, adds a second point one step along
/// the dominant axis, and the seed is complemented between passes. 4D
/// requests use the Simplex 4D lattice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OpenSimplex2;

impl Gen2D for OpenSimplex2 {
    #[inline(always)]
    fn gen_2d<F: SimdF32>(&self, seed: F::I32, x: F, y: F) -> F {
        let n = triangle_2d(seed, x, y, 0.5, gradient_dot_2d_fancy::<F>);
        F::splat(49.918_426_513_671_875) * n
    }
}

impl Gen3D for OpenSimplex2 {
    #[inline(always)]
    fn gen_3d<F: SimdF32>(&self, seed: F::I32, x: F, y: F, z: F) -> F {
        let f = F::splat(2.0 / 3.0) * (x + y + z);
        let mut r = [f - x, f - y, f - z];
        let mut seed = seed;
        let mut value = F::splat(0.0);

        let axis_primes = [primes::X, primes::Y, primes::Z].map(F::I32::splat);
        let one = F::splat(1.0);
        let neg_zero = F::splat(-0.0);

        for pass in 0..2 {
            let v0 = r.map(|c| c.round());
            let d0 = [r[0] - v0[0], r[1] - v0[1], r[2] - v0[2]];
            let score = d0.map(|d| d.abs());

            let dir_x = score[1].max(score[2]).cmp_le(score[0]);
            let dir_y = score[2].max(score[0]).cmp_le(score[1]).and_not(dir_x);
            let dir_z = !(dir_x | dir_y);
            let dir = [dir_x, dir_y, dir_z];

            let mut v1 = v0;
            for axis in 0..3 {
                // ±1 carrying the sign of the offset
                let step = one | (neg_zero & d0[axis]);
                v1[axis] = v0[axis].masked_add(step, dir[axis]);
            }
            let d1 = [r[0] - v1[0], r[1] - v1[1], r[2] - v1[2]];

            let h0 = [0, 1, 2].map(|a| v0[a].to_i32_round() * axis_primes[a]);
            let h1 = [0, 1, 2].map(|a| v1[a].to_i32_round() * axis_primes[a]);

            let radius = |d: [F; 3]| {
                falloff(
                    d[2].neg_mul_add(d[2], d[1].neg_mul_add(d[1], d[0].neg_mul_add(d[0], F::splat(0.6)))),
                )
            };
            let t0 = radius(d0);
            let t1 = radius(d1);

            let n0 = gradient_dot_3d(hash_primes(seed, h0), d0[0], d0[1], d0[2]);
            let n1 = gradient_dot_3d(hash_primes(seed, h1), d1[0], d1[1], d1[2]);
            value = n0.mul_add(t0, n1.mul_add(t1, value));

            if pass == 0 {
                r = r.map(|c| c + F::splat(0.5));
                seed = !seed;
            }
        }

        F::splat(32.694_282_531_738_281_25) * value
    }
}

impl Gen4D for OpenSimplex2 {
    #[inline(always)]
    fn gen_4d<F: SimdF32>(&self, seed: F::I32, x: F, y: F, z: F, w: F) -> F {
        Simplex.gen_4d(seed, x, y, z, w)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::portable::{PF32, PI32};
    use crate::backend::scalar::{ScalarF32, ScalarI32};

    #[test_log::test]
    fn bounded_and_varied_2d_3d() {
        let mut seen = Vec::new();
        let mut x = -15.0f32;
        while x < 15.0 {
            let y = 0.77 * x - 2.0;
            let v2 = OpenSimplex2.gen_2d(ScalarI32(31), ScalarF32(x), ScalarF32(y)).0;
            let v3 = OpenSimplex2
                .gen_3d(ScalarI32(31), ScalarF32(x), ScalarF32(y), ScalarF32(x * 0.3))
                .0;
            assert!(v2.abs() <= 1.05 && v3.abs() <= 1.05, "{} {} at {}", v2, v3, x);
            seen.push(v3);
            x += 0.0917;
        }
        assert!(seen.iter().any(|v| v.abs() > 0.1));
    }

    #[test_log::test]
    fn four_d_matches_simplex() {
        let args = (ScalarI32(3), ScalarF32(0.2), ScalarF32(1.7), ScalarF32(-4.0), ScalarF32(9.5));
        let a = OpenSimplex2.gen_4d(args.0, args.1, args.2, args.3, args.4);
        let b = Simplex.gen_4d(args.0, args.1, args.2, args.3, args.4);
        assert_eq!(a.0, b.0);
    }

    #[test_log::test]
    fn lanes_match_scalar_3d() {
        let xs = [0.0, 1.5, -2.25, 10.0];
        let v = OpenSimplex2.gen_3d(PI32::<4>::splat(8), PF32(xs), PF32([0.5; 4]), PF32(xs));
        for lane in 0..4 {
            let s = OpenSimplex2.gen_3d(
                ScalarI32(8),
                ScalarF32(xs[lane]),
                ScalarF32(0.5),
                ScalarF32(xs[lane]),
            );
            assert_eq!(v.0[lane], s.0);
        }
    }
}
