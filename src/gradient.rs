//! Gradient dot products.
//!
//! A gradient is never stored: the hash bits pick axis roles, magnitudes and
//! signs through compare/select/xor chains, and only the dot product with
//! the corner offset is produced.

use crate::backend::{SimdF32, SimdI32};
use core::f32::consts::SQRT_2;

const ROOT3: f32 = 1.732_050_8;

/// Flips the sign of `v` wherever `sign` has bit 31 set.
#[inline(always)]
fn flip<F: SimdF32>(v: F, sign: F::I32) -> F {
    v ^ F::from_bits(sign)
}

#[inline(always)]
fn top_bit<I: SimdI32>(v: I) -> I {
    v & I::splat(i32::MIN)
}

/// 2D gradient dot.
///
/// Eight gradients: `(±(1+√2), ±1)` and `(±1, ±(1+√2))`. Bit 0 flips x, bit 1
/// flips y, bit 2 swaps the axes.
#[inline(always)]
pub fn gradient_dot_2d<F: SimdF32>(hash: F::I32, x: F, y: F) -> F {
    let x = flip(x, hash << 31);
    let y = flip(y, (hash >> 1) << 31);
    let bit2 = F::I32::splat(1 << 2);
    let swap = (hash & bit2).cmp_eq(bit2);
    let a = F::select(swap, y, x);
    let b = F::select(swap, x, y);
    a.mul_add(F::splat(1.0 + SQRT_2), b)
}

/// 3D gradient dot over the twelve cube-edge gradients.
#[inline(always)]
pub fn gradient_dot_3d<F: SimdF32>(hash: F::I32, x: F, y: F, z: F) -> F {
    let h13 = hash & F::I32::splat(13);

    // h < 8 ? x : y
    let u = F::select(h13.cmp_lt(F::I32::splat(8)), x, y);

    // h < 2 ? y : h == 12 ? x : z
    let v = F::select(h13.cmp_eq(F::I32::splat(12)), x, z);
    let v = F::select(h13.cmp_lt(F::I32::splat(2)), y, v);

    let u_sign = hash << 31;
    let v_sign = (hash & F::I32::splat(2)) << 30;
    flip(u, u_sign) + flip(v, v_sign)
}

/// 4D gradient dot over the 32 gradients with one zero component.
///
/// Bits 3..=4 pick which axis is dropped; the three highest bits of the hash
/// flip the signs of the remaining components.
#[inline(always)]
pub fn gradient_dot_4d<F: SimdF32>(hash: F::I32, x: F, y: F, z: F, w: F) -> F {
    let p = hash & F::I32::splat(3 << 3);
    let a = F::select(p.cmp_gt(F::I32::splat(0)), x, y);
    let b = F::select(p.cmp_gt(F::I32::splat(1 << 3)), y, z);
    let c = F::select(p.cmp_gt(F::I32::splat(2 << 3)), z, w);

    let a_sign = top_bit(hash);
    let b_sign = top_bit(hash << 1);
    let c_sign = top_bit(hash << 2);
    flip(a, a_sign) + flip(b, b_sign) + flip(c, c_sign)
}

/// 2D gradient dot over a near-isotropic set of length-2 gradients.
///
/// The low 22 bits of the hash are scaled by 4/3 into a bucket index
/// (truncated). Bit 2 of the index swaps the axes, bit 0 negates the minor
/// component, bit 1 selects the axis-aligned gradient (major ×2, minor 0)
/// over the diagonal one (major ×√3), bit 3 negates the result.
#[inline(always)]
pub fn gradient_dot_2d_fancy<F: SimdF32>(hash: F::I32, x: F, y: F) -> F {
    let bucket = F::from_i32(hash & F::I32::splat(0x3F_FFFF)) * F::splat(4.0 / 3.0);
    let index = bucket.to_i32_trunc();
    let zero = F::I32::splat(0);

    let swap = (index & F::I32::splat(1 << 2)).cmp_ne(zero);
    let a = F::select(swap, y, x);
    let b = F::select(swap, x, y);

    let b = flip(b, index << 31);

    let axis_aligned = (index & F::I32::splat(1 << 1)).cmp_ne(zero);
    let a = a * F::select(axis_aligned, F::splat(2.0), F::splat(ROOT3));
    let b = b.nmask_zero(axis_aligned);

    flip(a + b, (index >> 3) << 31)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::scalar::{ScalarF32, ScalarI32};

    fn dot2(hash: i32, x: f32, y: f32) -> f32 {
        gradient_dot_2d(ScalarI32(hash), ScalarF32(x), ScalarF32(y)).0
    }

    fn dot3(hash: i32, x: f32, y: f32, z: f32) -> f32 {
        gradient_dot_3d(ScalarI32(hash), ScalarF32(x), ScalarF32(y), ScalarF32(z)).0
    }

    fn dot4(hash: i32, v: [f32; 4]) -> f32 {
        gradient_dot_4d(
            ScalarI32(hash),
            ScalarF32(v[0]),
            ScalarF32(v[1]),
            ScalarF32(v[2]),
            ScalarF32(v[3]),
        )
        .0
    }

    #[test]
    fn gradients_2d_cover_eight_directions() {
        let k = 1.0 + SQRT_2;
        assert_eq!(dot2(0, 1.0, 0.0), k);
        assert_eq!(dot2(0, 0.0, 1.0), 1.0);
        assert_eq!(dot2(1, 1.0, 0.0), -k);
        assert_eq!(dot2(2, 0.0, 1.0), -1.0);
        assert_eq!(dot2(4, 0.0, 1.0), k);
        assert_eq!(dot2(4, 1.0, 0.0), 1.0);
    }

    #[test]
    fn gradients_3d_are_cube_edges() {
        for hash in 0..16 {
            let gx = dot3(hash, 1.0, 0.0, 0.0);
            let gy = dot3(hash, 0.0, 1.0, 0.0);
            let gz = dot3(hash, 0.0, 0.0, 1.0);
            let comps = [gx, gy, gz];
            assert_eq!(comps.iter().filter(|c| **c == 0.0).count(), 1, "hash {}", hash);
            assert!(comps.iter().all(|c| c.abs() == 0.0 || c.abs() == 1.0));
        }
    }

    #[test]
    fn gradients_4d_drop_one_axis() {
        for p in 0..4 {
            for signs in 0..8 {
                let hash = (p << 3) | (signs << 29);
                let comps: Vec<f32> = (0..4)
                    .map(|axis| {
                        let mut v = [0.0; 4];
                        v[axis] = 1.0;
                        dot4(hash, v)
                    })
                    .collect();
                assert_eq!(comps.iter().filter(|c| **c == 0.0).count(), 1);
                assert_eq!(comps.iter().map(|c| c.abs()).sum::<f32>(), 3.0);
            }
        }
    }

    #[test]
    fn fancy_gradients_have_expected_magnitudes() {
        for hash in (0..0x40_0000).step_by(9_973) {
            let gx = gradient_dot_2d_fancy(ScalarI32(hash), ScalarF32(1.0), ScalarF32(0.0)).0;
            let gy = gradient_dot_2d_fancy(ScalarI32(hash), ScalarF32(0.0), ScalarF32(1.0)).0;
            let len = (gx * gx + gy * gy).sqrt();
            assert!((len - 2.0).abs() < 1e-5, "hash {} -> ({}, {})", hash, gx, gy);
        }
    }

    #[test]
    fn zero_offset_gives_zero() {
        for hash in [0, 5, -1, i32::MAX, i32::MIN] {
            assert_eq!(dot2(hash, 0.0, 0.0), 0.0);
            assert_eq!(dot3(hash, 0.0, 0.0, 0.0), 0.0);
            assert_eq!(dot4(hash, [0.0; 4]), 0.0);
        }
    }
}
