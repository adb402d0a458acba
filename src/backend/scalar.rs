//! Scalar backend (1 lane - no SIMD).
//!
//! This is the reference every other backend is measured against: integer
//! and bitwise operations are exact, `rsqrt`/`recip` are computed exactly.

use super::{Backend, CpuFeatures, MaskOps, SimdF32, SimdI32};
use core::ops::*;

/// Scalar backend (1 lane).
#[derive(Copy, Clone, Debug, Default)]
pub struct Scalar;

impl Backend for Scalar {
    const LANES: usize = 1;
    const HAS_FMA: bool = cfg!(any(target_feature = "fma", target_arch = "aarch64"));
    const NAME: &'static str = "scalar";
    const REQUIRED: CpuFeatures = CpuFeatures::empty();
    type Mask = ScalarMask;
    type F32 = ScalarF32;
    type I32 = ScalarI32;
}

/// Single-lane mask, stored as an all-ones or all-zeros bit pattern.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct ScalarMask(u32);

impl ScalarMask {
    #[inline(always)]
    fn from_bool(b: bool) -> Self {
        Self(if b { !0 } else { 0 })
    }
}

/// Single-lane f32.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
#[repr(transparent)]
pub struct ScalarF32(pub f32);

/// Single-lane i32.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
#[repr(transparent)]
pub struct ScalarI32(pub i32);

// ============================================================================
// Mask
// ============================================================================

impl MaskOps for ScalarMask {
    #[inline(always)]
    fn any(self) -> bool {
        self.0 != 0
    }

    #[inline(always)]
    fn all(self) -> bool {
        self.0 != 0
    }
}

impl BitAnd for ScalarMask {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for ScalarMask {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitXor for ScalarMask {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for ScalarMask {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Self(!self.0)
    }
}

// ============================================================================
// SimdF32 for ScalarF32
// ============================================================================

impl SimdF32 for ScalarF32 {
    type Mask = ScalarMask;
    type I32 = ScalarI32;
    const LANES: usize = 1;

    #[inline(always)]
    fn splat(val: f32) -> Self {
        Self(val)
    }

    #[inline(always)]
    fn load(slice: &[f32]) -> Self {
        Self(slice[0])
    }

    #[inline(always)]
    fn store(self, out: &mut [f32]) {
        out[0] = self.0;
    }

    #[inline(always)]
    fn extract0(self) -> f32 {
        self.0
    }

    #[inline(always)]
    fn extract(self, lane: usize) -> f32 {
        assert!(lane == 0, "lane {} out of range for scalar backend", lane);
        self.0
    }

    #[inline(always)]
    fn from_i32(v: ScalarI32) -> Self {
        Self(v.0 as f32)
    }

    #[inline(always)]
    fn from_bits(v: ScalarI32) -> Self {
        Self(f32::from_bits(v.0 as u32))
    }

    #[inline(always)]
    fn to_bits(self) -> ScalarI32 {
        ScalarI32(self.0.to_bits() as i32)
    }

    #[inline(always)]
    fn to_i32_round(self) -> ScalarI32 {
        ScalarI32(self.0.round_ties_even() as i32)
    }

    #[inline(always)]
    fn to_i32_trunc(self) -> ScalarI32 {
        ScalarI32(self.0 as i32)
    }

    #[inline(always)]
    fn from_mask(mask: ScalarMask) -> Self {
        Self(f32::from_bits(mask.0))
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> ScalarMask {
        ScalarMask::from_bool(self.0 == rhs.0)
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> ScalarMask {
        ScalarMask::from_bool(self.0 != rhs.0)
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> ScalarMask {
        ScalarMask::from_bool(self.0 < rhs.0)
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> ScalarMask {
        ScalarMask::from_bool(self.0 <= rhs.0)
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> ScalarMask {
        ScalarMask::from_bool(self.0 > rhs.0)
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> ScalarMask {
        ScalarMask::from_bool(self.0 >= rhs.0)
    }

    #[inline(always)]
    fn select(mask: ScalarMask, if_true: Self, if_false: Self) -> Self {
        (if_true & Self::from_mask(mask)) | if_false.and_not(Self::from_mask(mask))
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        // Matches minps: the second operand wins on NaN.
        Self(if self.0 < rhs.0 { self.0 } else { rhs.0 })
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        Self(if self.0 > rhs.0 { self.0 } else { rhs.0 })
    }

    #[inline(always)]
    fn abs(self) -> Self {
        Self(self.0.abs())
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        Self(self.0.sqrt())
    }

    #[inline(always)]
    fn rsqrt(self) -> Self {
        Self(1.0 / self.0.sqrt())
    }

    #[inline(always)]
    fn recip(self) -> Self {
        Self(1.0 / self.0)
    }

    #[inline(always)]
    fn floor(self) -> Self {
        Self(self.0.floor())
    }

    #[inline(always)]
    fn ceil(self) -> Self {
        Self(self.0.ceil())
    }

    #[inline(always)]
    fn round(self) -> Self {
        Self(self.0.round_ties_even())
    }

    #[inline(always)]
    fn mul_add(self, b: Self, c: Self) -> Self {
        if Scalar::HAS_FMA {
            Self(self.0.mul_add(b.0, c.0))
        } else {
            Self(self.0 * b.0 + c.0)
        }
    }

    #[inline(always)]
    fn reduce_min(self) -> f32 {
        self.0
    }

    #[inline(always)]
    fn reduce_max(self) -> f32 {
        self.0
    }
}

// ============================================================================
// SimdI32 for ScalarI32
// ============================================================================

impl SimdI32 for ScalarI32 {
    type Mask = ScalarMask;
    const LANES: usize = 1;

    #[inline(always)]
    fn splat(val: i32) -> Self {
        Self(val)
    }

    #[inline(always)]
    fn incremented() -> Self {
        Self(0)
    }

    #[inline(always)]
    fn load(slice: &[i32]) -> Self {
        Self(slice[0])
    }

    #[inline(always)]
    fn store(self, out: &mut [i32]) {
        out[0] = self.0;
    }

    #[inline(always)]
    fn extract0(self) -> i32 {
        self.0
    }

    #[inline(always)]
    fn from_mask(mask: ScalarMask) -> Self {
        Self(mask.0 as i32)
    }

    #[inline(always)]
    fn shr_logical(self, n: u32) -> Self {
        Self(((self.0 as u32) >> n) as i32)
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> ScalarMask {
        ScalarMask::from_bool(self.0 == rhs.0)
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> ScalarMask {
        ScalarMask::from_bool(self.0 > rhs.0)
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> ScalarMask {
        ScalarMask::from_bool(self.0 < rhs.0)
    }

    #[inline(always)]
    fn select(mask: ScalarMask, if_true: Self, if_false: Self) -> Self {
        let m = Self::from_mask(mask);
        (if_true & m) | if_false.and_not(m)
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        Self(self.0.min(rhs.0))
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        Self(self.0.max(rhs.0))
    }
}

// ============================================================================
// Operator Implementations
// ============================================================================

impl Add for ScalarF32 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self(self.0 + rhs.0)
    }
}

impl Sub for ScalarF32 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0 - rhs.0)
    }
}

impl Mul for ScalarF32 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

impl Div for ScalarF32 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        Self(self.0 / rhs.0)
    }
}

impl Neg for ScalarF32 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        Self(-self.0)
    }
}

impl BitAnd for ScalarF32 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        Self(f32::from_bits(self.0.to_bits() & rhs.0.to_bits()))
    }
}

impl BitOr for ScalarF32 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        Self(f32::from_bits(self.0.to_bits() | rhs.0.to_bits()))
    }
}

impl BitXor for ScalarF32 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        Self(f32::from_bits(self.0.to_bits() ^ rhs.0.to_bits()))
    }
}

impl Not for ScalarF32 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Self(f32::from_bits(!self.0.to_bits()))
    }
}

// Lane arithmetic wraps, as the hash relies on.
impl Add for ScalarI32 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        Self(self.0.wrapping_add(rhs.0))
    }
}

impl Sub for ScalarI32 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        Self(self.0.wrapping_sub(rhs.0))
    }
}

impl Mul for ScalarI32 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        Self(self.0.wrapping_mul(rhs.0))
    }
}

impl BitAnd for ScalarI32 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for ScalarI32 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitXor for ScalarI32 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for ScalarI32 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Self(!self.0)
    }
}

impl Shl<u32> for ScalarI32 {
    type Output = Self;
    #[inline(always)]
    fn shl(self, rhs: u32) -> Self {
        Self(self.0.wrapping_shl(rhs))
    }
}

impl Shr<u32> for ScalarI32 {
    type Output = Self;
    #[inline(always)]
    fn shr(self, rhs: u32) -> Self {
        Self(self.0.wrapping_shr(rhs))
    }
}
