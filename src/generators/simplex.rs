use super::{falloff, Gen2D, Gen3D, Gen4D};
use crate::backend::{MaskOps, SimdF32, SimdI32};
use crate::gradient::{gradient_dot_2d, gradient_dot_3d, gradient_dot_4d};
use crate::hash::{hash_primes, primes};

const SQRT3: f32 = 1.732_050_8;
const SQRT5: f32 = 2.236_068;

const F2: f32 = 0.5 * (SQRT3 - 1.0);
const G2: f32 = (3.0 - SQRT3) / 6.0;

const F3: f32 = 1.0 / 3.0;
const G3: f32 = 1.0 / 6.0;

const F4: f32 = (SQRT5 - 1.0) / 4.0;
const G4: f32 = (5.0 - SQRT5) / 20.0;

/// Simplex noise: the sample is assigned to the simplex containing it and
/// only its D+1 corners contribute, each through a radial falloff.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Simplex;

/// Triangular-lattice evaluation shared with OpenSimplex2's 2D form, which
/// differs only in the gradient set, falloff radius and scale.
#[inline(always)]
pub(super) fn triangle_2d<F, G>(seed: F::I32, x: F, y: F, radius_sq: f32, gradient: G) -> F
where
    F: SimdF32,
    G: Fn(F::I32, F, F) -> F,
{
    let f = F::splat(F2) * (x + y);
    let x0 = (x + f).floor();
    let y0 = (y + f).floor();

    let i = x0.to_i32_trunc() * F::I32::splat(primes::X);
    let j = y0.to_i32_trunc() * F::I32::splat(primes::Y);

    let g = F::splat(G2) * (x0 + y0);
    let x0 = x - (x0 - g);
    let y0 = y - (y0 - g);

    let i1 = x0.cmp_gt(y0);

    let one = F::splat(1.0);
    let x1 = x0.masked_sub(one, i1) + F::splat(G2);
    let y1 = y0.nmasked_sub(one, i1) + F::splat(G2);

    let x2 = x0 + F::splat(G2 * 2.0 - 1.0);
    let y2 = y0 + F::splat(G2 * 2.0 - 1.0);

    let r = F::splat(radius_sq);
    let t0 = falloff(y0.neg_mul_add(y0, x0.neg_mul_add(x0, r)));
    let t1 = falloff(y1.neg_mul_add(y1, x1.neg_mul_add(x1, r)));
    let t2 = falloff(y2.neg_mul_add(y2, x2.neg_mul_add(x2, r)));

    let px = F::I32::splat(primes::X);
    let py = F::I32::splat(primes::Y);
    let n0 = gradient(hash_primes(seed, [i, j]), x0, y0);
    let n1 = gradient(
        hash_primes(seed, [i.masked_add(px, i1), j.nmasked_add(py, i1)]),
        x1,
        y1,
    );
    let n2 = gradient(hash_primes(seed, [i + px, j + py]), x2, y2);

    n0.mul_add(t0, n1.mul_add(t1, n2 * t2))
}

impl Gen2D for Simplex {
    #[inline(always)]
    fn gen_2d<F: SimdF32>(&self, seed: F::I32, x: F, y: F) -> F {
        let n = triangle_2d(seed, x, y, 0.5, gradient_dot_2d::<F>);
        F::splat(38.283_687_591_552_734_375) * n
    }
}

impl Gen3D for Simplex {
    #[inline(always)]
    fn gen_3d<F: SimdF32>(&self, seed: F::I32, x: F, y: F, z: F) -> F {
        let f = F::splat(F3) * (x + y + z);
        let x0 = (x + f).floor();
        let y0 = (y + f).floor();
        let z0 = (z + f).floor();

        let px = F::I32::splat(primes::X);
        let py = F::I32::splat(primes::Y);
        let pz = F::I32::splat(primes::Z);
        let i = x0.to_i32_trunc() * px;
        let j = y0.to_i32_trunc() * py;
        let k = z0.to_i32_trunc() * pz;

        let g = F::splat(G3) * (x0 + y0 + z0);
        let x0 = x - (x0 - g);
        let y0 = y - (y0 - g);
        let z0 = z - (z0 - g);

        let x_ge_y = x0.cmp_ge(y0);
        let y_ge_z = y0.cmp_ge(z0);
        let x_ge_z = x0.cmp_ge(z0);

        // Second corner steps along the largest axis, third along the two
        // largest. `k2` is inverted: z steps unless it is the smallest.
        let i1 = x_ge_y & x_ge_z;
        let j1 = y_ge_z.and_not(x_ge_y);
        let k1 = (!x_ge_z).and_not(y_ge_z);

        let i2 = x_ge_y | x_ge_z;
        let j2 = !x_ge_y | y_ge_z;
        let k2 = x_ge_z & y_ge_z;

        let one = F::splat(1.0);
        let x1 = x0.masked_sub(one, i1) + F::splat(G3);
        let y1 = y0.masked_sub(one, j1) + F::splat(G3);
        let z1 = z0.masked_sub(one, k1) + F::splat(G3);
        let x2 = x0.masked_sub(one, i2) + F::splat(G3 * 2.0);
        let y2 = y0.masked_sub(one, j2) + F::splat(G3 * 2.0);
        let z2 = z0.nmasked_sub(one, k2) + F::splat(G3 * 2.0);
        let x3 = x0 + F::splat(G3 * 3.0 - 1.0);
        let y3 = y0 + F::splat(G3 * 3.0 - 1.0);
        let z3 = z0 + F::splat(G3 * 3.0 - 1.0);

        let r = F::splat(0.6);
        let t = |dx: F, dy: F, dz: F| {
            falloff(dz.neg_mul_add(dz, dy.neg_mul_add(dy, dx.neg_mul_add(dx, r))))
        };
        let t0 = t(x0, y0, z0);
        let t1 = t(x1, y1, z1);
        let t2 = t(x2, y2, z2);
        let t3 = t(x3, y3, z3);

        let n0 = gradient_dot_3d(hash_primes(seed, [i, j, k]), x0, y0, z0);
        let n1 = gradient_dot_3d(
            hash_primes(
                seed,
                [i.masked_add(px, i1), j.masked_add(py, j1), k.masked_add(pz, k1)],
            ),
            x1,
            y1,
            z1,
        );
        let n2 = gradient_dot_3d(
            hash_primes(
                seed,
                [i.masked_add(px, i2), j.masked_add(py, j2), k.nmasked_add(pz, k2)],
            ),
            x2,
            y2,
            z2,
        );
        let n3 = gradient_dot_3d(hash_primes(seed, [i + px, j + py, k + pz]), x3, y3, z3);

        F::splat(32.694_282_531_738_281_25)
            * n0.mul_add(t0, n1.mul_add(t1, n2.mul_add(t2, n3 * t3)))
    }
}

impl Gen4D for Simplex {
    #[inline(always)]
    fn gen_4d<F: SimdF32>(&self, seed: F::I32, x: F, y: F, z: F, w: F) -> F {
        let f = F::splat(F4) * ((x + y) + (z + w));
        let x0 = (x + f).floor();
        let y0 = (y + f).floor();
        let z0 = (z + f).floor();
        let w0 = (w + f).floor();

        let px = F::I32::splat(primes::X);
        let py = F::I32::splat(primes::Y);
        let pz = F::I32::splat(primes::Z);
        let pw = F::I32::splat(primes::W);
        let i = x0.to_i32_trunc() * px;
        let j = y0.to_i32_trunc() * py;
        let k = z0.to_i32_trunc() * pz;
        let l = w0.to_i32_trunc() * pw;

        let g = F::splat(G4) * ((x0 + y0) + (z0 + w0));
        let x0 = x - (x0 - g);
        let y0 = y - (y0 - g);
        let z0 = z - (z0 - g);
        let w0 = w - (w0 - g);

        // Rank each axis 0..=3 by magnitude of its offset.
        let offsets = [x0, y0, z0, w0];
        let mut rank = [F::I32::splat(0); 4];
        for a in 0..4 {
            for b in (a + 1)..4 {
                let ge = offsets[a].cmp_ge(offsets[b]);
                rank[a] = rank[a].masked_increment(ge);
                rank[b] = rank[b].nmasked_increment(ge);
            }
        }

        let one = F::splat(1.0);
        let primes_v = [px, py, pz, pw];
        let base = [i, j, k, l];

        let mut value = F::splat(0.0);
        let mut contribute = |d: [F; 4], h: [F::I32; 4]| {
            let t = d
                .into_iter()
                .fold(F::splat(0.6), |acc, v| v.neg_mul_add(v, acc));
            let n = gradient_dot_4d(hash_primes(seed, h), d[0], d[1], d[2], d[3]);
            value = n.mul_add(falloff(t), value);
        };

        contribute(offsets, base);
        for step in 1..4 {
            let threshold = F::I32::splat(3 - step as i32);
            let mut d = offsets;
            let mut h = base;
            for axis in 0..4 {
                let m = rank[axis].cmp_gt(threshold);
                d[axis] = d[axis].masked_sub(one, m) + F::splat(G4 * step as f32);
                h[axis] = h[axis].masked_add(primes_v[axis], m);
            }
            contribute(d, h);
        }
        let last = offsets.map(|v| v + F::splat(G4 * 4.0 - 1.0));
        let last_h = [i + px, j + py, k + pz, l + pw];
        contribute(last, last_h);

        F::splat(27.0) * value
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::portable::{PF32, PI32};
    use crate::backend::scalar::{ScalarF32, ScalarI32};

    #[test_log::test]
    fn bounded_on_a_scatter_of_points() {
        let mut x = -20.0f32;
        while x < 20.0 {
            let y = x * 1.618 + 0.25;
            let z = 3.3 - x * 0.41;
            let v2 = Simplex.gen_2d(ScalarI32(7), ScalarF32(x), ScalarF32(y)).0;
            let v3 = Simplex.gen_3d(ScalarI32(7), ScalarF32(x), ScalarF32(y), ScalarF32(z)).0;
            let v4 = Simplex
                .gen_4d(ScalarI32(7), ScalarF32(x), ScalarF32(y), ScalarF32(z), ScalarF32(-x))
                .0;
            assert!(v2.abs() <= 1.05, "2d {} at {}", v2, x);
            assert!(v3.abs() <= 1.05, "3d {} at {}", v3, x);
            assert!(v4.abs() <= 1.05, "4d {} at {}", v4, x);
            x += 0.0731;
        }
    }

    #[test_log::test]
    fn not_constant() {
        let a = Simplex.gen_2d(ScalarI32(0), ScalarF32(0.3), ScalarF32(0.1)).0;
        let b = Simplex.gen_2d(ScalarI32(0), ScalarF32(5.7), ScalarF32(-2.2)).0;
        assert_ne!(a, b);
    }

    #[test_log::test]
    fn wide_lanes_match_scalar_4d() {
        let xs: [f32; 8] = [0.0, 0.5, -1.25, 7.75, 3.1, -9.9, 0.01, 42.0];
        let v = Simplex.gen_4d(
            PI32::<8>::splat(-5),
            PF32(xs),
            PF32(xs.map(|v| v * 0.5)),
            PF32([1.5; 8]),
            PF32(xs.map(|v| -v)),
        );
        for lane in 0..8 {
            let s = Simplex.gen_4d(
                ScalarI32(-5),
                ScalarF32(xs[lane]),
                ScalarF32(xs[lane] * 0.5),
                ScalarF32(1.5),
                ScalarF32(-xs[lane]),
            );
            assert_eq!(v.0[lane], s.0);
        }
    }
}
