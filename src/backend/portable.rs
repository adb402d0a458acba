//! Portable array backend.
//!
//! `Portable<N>` runs `N` lanes as plain arrays, one scalar operation per
//! lane. Every operation is bit-exact with [`Scalar`](super::Scalar), which
//! makes it the reference for checking that kernels and drivers behave the
//! same at W = 4, 8 and 16 on any host, with or without SIMD hardware.

use super::{Backend, CpuFeatures, MaskOps, Scalar, SimdF32, SimdI32, MAX_LANES};
use core::array;
use core::ops::*;

/// Array backend with `N` lanes.
#[derive(Copy, Clone, Debug, Default)]
pub struct Portable<const N: usize>;

/// 4-lane portable backend.
pub type Portable4 = Portable<4>;
/// 8-lane portable backend.
pub type Portable8 = Portable<8>;
/// 16-lane portable backend.
pub type Portable16 = Portable<16>;

impl<const N: usize> Backend for Portable<N> {
    const LANES: usize = {
        assert!(N >= 1 && N <= MAX_LANES, "portable lane count out of range");
        N
    };
    const HAS_FMA: bool = Scalar::HAS_FMA;
    const NAME: &'static str = "portable";
    const REQUIRED: CpuFeatures = CpuFeatures::empty();
    type Mask = PMask<N>;
    type F32 = PF32<N>;
    type I32 = PI32<N>;
}

/// `N`-lane mask.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct PMask<const N: usize>([u32; N]);

/// `N`-lane f32 vector.
#[derive(Copy, Clone, Debug, PartialEq)]
#[repr(transparent)]
pub struct PF32<const N: usize>(pub [f32; N]);

/// `N`-lane i32 vector.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[repr(transparent)]
pub struct PI32<const N: usize>(pub [i32; N]);

impl<const N: usize> Default for PMask<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

impl<const N: usize> Default for PF32<N> {
    fn default() -> Self {
        Self([0.0; N])
    }
}

impl<const N: usize> Default for PI32<N> {
    fn default() -> Self {
        Self([0; N])
    }
}

#[inline(always)]
fn lane_mask(b: bool) -> u32 {
    if b {
        !0
    } else {
        0
    }
}

impl<const N: usize> PF32<N> {
    #[inline(always)]
    fn map(self, f: impl Fn(f32) -> f32) -> Self {
        Self(array::from_fn(|i| f(self.0[i])))
    }

    #[inline(always)]
    fn zip(self, rhs: Self, f: impl Fn(f32, f32) -> f32) -> Self {
        Self(array::from_fn(|i| f(self.0[i], rhs.0[i])))
    }

    #[inline(always)]
    fn zip_bits(self, rhs: Self, f: impl Fn(u32, u32) -> u32) -> Self {
        Self(array::from_fn(|i| {
            f32::from_bits(f(self.0[i].to_bits(), rhs.0[i].to_bits()))
        }))
    }

    #[inline(always)]
    fn compare(self, rhs: Self, f: impl Fn(f32, f32) -> bool) -> PMask<N> {
        PMask(array::from_fn(|i| lane_mask(f(self.0[i], rhs.0[i]))))
    }
}

impl<const N: usize> PI32<N> {
    #[inline(always)]
    fn map(self, f: impl Fn(i32) -> i32) -> Self {
        Self(array::from_fn(|i| f(self.0[i])))
    }

    #[inline(always)]
    fn zip(self, rhs: Self, f: impl Fn(i32, i32) -> i32) -> Self {
        Self(array::from_fn(|i| f(self.0[i], rhs.0[i])))
    }

    #[inline(always)]
    fn compare(self, rhs: Self, f: impl Fn(i32, i32) -> bool) -> PMask<N> {
        PMask(array::from_fn(|i| lane_mask(f(self.0[i], rhs.0[i]))))
    }
}

// ============================================================================
// Mask
// ============================================================================

impl<const N: usize> MaskOps for PMask<N> {
    #[inline(always)]
    fn any(self) -> bool {
        self.0.iter().any(|&m| m != 0)
    }

    #[inline(always)]
    fn all(self) -> bool {
        self.0.iter().all(|&m| m != 0)
    }
}

impl<const N: usize> BitAnd for PMask<N> {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        Self(array::from_fn(|i| self.0[i] & rhs.0[i]))
    }
}

impl<const N: usize> BitOr for PMask<N> {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        Self(array::from_fn(|i| self.0[i] | rhs.0[i]))
    }
}

impl<const N: usize> BitXor for PMask<N> {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        Self(array::from_fn(|i| self.0[i] ^ rhs.0[i]))
    }
}

impl<const N: usize> Not for PMask<N> {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Self(self.0.map(|m| !m))
    }
}

// ============================================================================
// SimdF32
// ============================================================================

impl<const N: usize> SimdF32 for PF32<N> {
    type Mask = PMask<N>;
    type I32 = PI32<N>;
    const LANES: usize = N;

    #[inline(always)]
    fn splat(val: f32) -> Self {
        Self([val; N])
    }

    #[inline(always)]
    fn load(slice: &[f32]) -> Self {
        Self(array::from_fn(|i| slice[i]))
    }

    #[inline(always)]
    fn store(self, out: &mut [f32]) {
        out[..N].copy_from_slice(&self.0);
    }

    #[inline(always)]
    fn extract0(self) -> f32 {
        self.0[0]
    }

    #[inline(always)]
    fn extract(self, lane: usize) -> f32 {
        self.0[lane]
    }

    #[inline(always)]
    fn from_i32(v: PI32<N>) -> Self {
        Self(v.0.map(|x| x as f32))
    }

    #[inline(always)]
    fn from_bits(v: PI32<N>) -> Self {
        Self(v.0.map(|x| f32::from_bits(x as u32)))
    }

    #[inline(always)]
    fn to_bits(self) -> PI32<N> {
        PI32(self.0.map(|x| x.to_bits() as i32))
    }

    #[inline(always)]
    fn to_i32_round(self) -> PI32<N> {
        PI32(self.0.map(|x| x.round_ties_even() as i32))
    }

    #[inline(always)]
    fn to_i32_trunc(self) -> PI32<N> {
        PI32(self.0.map(|x| x as i32))
    }

    #[inline(always)]
    fn from_mask(mask: PMask<N>) -> Self {
        Self(mask.0.map(f32::from_bits))
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> PMask<N> {
        self.compare(rhs, |a, b| a == b)
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> PMask<N> {
        self.compare(rhs, |a, b| a != b)
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> PMask<N> {
        self.compare(rhs, |a, b| a < b)
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> PMask<N> {
        self.compare(rhs, |a, b| a <= b)
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> PMask<N> {
        self.compare(rhs, |a, b| a > b)
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> PMask<N> {
        self.compare(rhs, |a, b| a >= b)
    }

    #[inline(always)]
    fn select(mask: PMask<N>, if_true: Self, if_false: Self) -> Self {
        Self(array::from_fn(|i| {
            f32::from_bits(
                (if_true.0[i].to_bits() & mask.0[i]) | (if_false.0[i].to_bits() & !mask.0[i]),
            )
        }))
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| if a < b { a } else { b })
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| if a > b { a } else { b })
    }

    #[inline(always)]
    fn abs(self) -> Self {
        self.map(f32::abs)
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        self.map(f32::sqrt)
    }

    #[inline(always)]
    fn rsqrt(self) -> Self {
        self.map(|x| 1.0 / x.sqrt())
    }

    #[inline(always)]
    fn recip(self) -> Self {
        self.map(|x| 1.0 / x)
    }

    #[inline(always)]
    fn floor(self) -> Self {
        self.map(f32::floor)
    }

    #[inline(always)]
    fn ceil(self) -> Self {
        self.map(f32::ceil)
    }

    #[inline(always)]
    fn round(self) -> Self {
        self.map(f32::round_ties_even)
    }

    #[inline(always)]
    fn mul_add(self, b: Self, c: Self) -> Self {
        Self(array::from_fn(|i| {
            if Scalar::HAS_FMA {
                self.0[i].mul_add(b.0[i], c.0[i])
            } else {
                self.0[i] * b.0[i] + c.0[i]
            }
        }))
    }
}

// ============================================================================
// SimdI32
// ============================================================================

impl<const N: usize> SimdI32 for PI32<N> {
    type Mask = PMask<N>;
    const LANES: usize = N;

    #[inline(always)]
    fn splat(val: i32) -> Self {
        Self([val; N])
    }

    #[inline(always)]
    fn incremented() -> Self {
        Self(array::from_fn(|i| i as i32))
    }

    #[inline(always)]
    fn load(slice: &[i32]) -> Self {
        Self(array::from_fn(|i| slice[i]))
    }

    #[inline(always)]
    fn store(self, out: &mut [i32]) {
        out[..N].copy_from_slice(&self.0);
    }

    #[inline(always)]
    fn extract0(self) -> i32 {
        self.0[0]
    }

    #[inline(always)]
    fn from_mask(mask: PMask<N>) -> Self {
        Self(mask.0.map(|m| m as i32))
    }

    #[inline(always)]
    fn shr_logical(self, n: u32) -> Self {
        self.map(|x| ((x as u32) >> n) as i32)
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> PMask<N> {
        self.compare(rhs, |a, b| a == b)
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> PMask<N> {
        self.compare(rhs, |a, b| a > b)
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> PMask<N> {
        self.compare(rhs, |a, b| a < b)
    }

    #[inline(always)]
    fn select(mask: PMask<N>, if_true: Self, if_false: Self) -> Self {
        Self(array::from_fn(|i| {
            let m = mask.0[i] as i32;
            (if_true.0[i] & m) | (if_false.0[i] & !m)
        }))
    }
}

// ============================================================================
// Operator Implementations
// ============================================================================

impl<const N: usize> Add for PF32<N> {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a + b)
    }
}

impl<const N: usize> Sub for PF32<N> {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a - b)
    }
}

impl<const N: usize> Mul for PF32<N> {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a * b)
    }
}

impl<const N: usize> Div for PF32<N> {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a / b)
    }
}

impl<const N: usize> Neg for PF32<N> {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        self.map(|a| -a)
    }
}

impl<const N: usize> BitAnd for PF32<N> {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        self.zip_bits(rhs, |a, b| a & b)
    }
}

impl<const N: usize> BitOr for PF32<N> {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        self.zip_bits(rhs, |a, b| a | b)
    }
}

impl<const N: usize> BitXor for PF32<N> {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        self.zip_bits(rhs, |a, b| a ^ b)
    }
}

impl<const N: usize> Not for PF32<N> {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        self.map(|a| f32::from_bits(!a.to_bits()))
    }
}

impl<const N: usize> Add for PI32<N> {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        self.zip(rhs, i32::wrapping_add)
    }
}

impl<const N: usize> Sub for PI32<N> {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        self.zip(rhs, i32::wrapping_sub)
    }
}

impl<const N: usize> Mul for PI32<N> {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        self.zip(rhs, i32::wrapping_mul)
    }
}

impl<const N: usize> BitAnd for PI32<N> {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a & b)
    }
}

impl<const N: usize> BitOr for PI32<N> {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a | b)
    }
}

impl<const N: usize> BitXor for PI32<N> {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        self.zip(rhs, |a, b| a ^ b)
    }
}

impl<const N: usize> Not for PI32<N> {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        self.map(|a| !a)
    }
}

impl<const N: usize> Shl<u32> for PI32<N> {
    type Output = Self;
    #[inline(always)]
    fn shl(self, rhs: u32) -> Self {
        self.map(|a| a.wrapping_shl(rhs))
    }
}

impl<const N: usize> Shr<u32> for PI32<N> {
    type Output = Self;
    #[inline(always)]
    fn shr(self, rhs: u32) -> Self {
        self.map(|a| a.wrapping_shr(rhs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremented_counts_lanes() {
        let v = PI32::<8>::incremented();
        assert_eq!(v.0, [0, 1, 2, 3, 4, 5, 6, 7]);
    }

    #[test]
    fn select_is_per_lane() {
        let a = PF32::<4>([1.0, 2.0, 3.0, 4.0]);
        let b = PF32::<4>::splat(2.5);
        let picked = PF32::select(a.cmp_lt(b), a, b);
        assert_eq!(picked.0, [1.0, 2.0, 2.5, 2.5]);
    }

    #[test]
    fn reductions_fold_all_lanes() {
        let v = PF32::<16>(array::from_fn(|i| (i as f32 - 7.0) * if i % 2 == 0 { 1.0 } else { -1.0 }));
        let lanes = v.0;
        let min = lanes.iter().copied().fold(f32::INFINITY, f32::min);
        let max = lanes.iter().copied().fold(f32::NEG_INFINITY, f32::max);
        assert_eq!(v.reduce_min(), min);
        assert_eq!(v.reduce_max(), max);
    }

    #[test]
    fn masked_increment_matches_mask() {
        let idx = PI32::<4>::incremented();
        let mask = idx.cmp_gt(PI32::splat(1));
        assert_eq!(PI32::<4>::splat(10).masked_increment(mask).0, [10, 10, 11, 11]);
        assert_eq!(PI32::<4>::splat(10).nmasked_increment(mask).0, [11, 11, 10, 10]);
    }

    #[test]
    fn mask_any_all() {
        let idx = PI32::<4>::incremented();
        assert!(idx.cmp_gt(PI32::splat(2)).any());
        assert!(!idx.cmp_gt(PI32::splat(2)).all());
        assert!(idx.cmp_gt(PI32::splat(-1)).all());
    }
}
