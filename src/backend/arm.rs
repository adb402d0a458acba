//! ARM NEON backend (4 lanes).

use super::{Backend, CpuFeatures, MaskOps, SimdF32, SimdI32};
use core::arch::aarch64::*;
use core::fmt::{Debug, Formatter};
use core::ops::*;

/// NEON Backend (4 lanes).
#[derive(Copy, Clone, Debug, Default)]
pub struct Neon;

impl Backend for Neon {
    const LANES: usize = 4;
    const HAS_FMA: bool = true;
    const NAME: &'static str = "neon";
    const REQUIRED: CpuFeatures = CpuFeatures::NEON;
    type Mask = Mask4;
    type F32 = F32x4;
    type I32 = I32x4;
}

// ============================================================================
// Mask4: NEON comparisons produce u32 lanes
// ============================================================================

/// 4-lane mask for ARM NEON.
///
/// Masks are stored as u32 vectors where each lane is either all-1s
/// (0xFFFFFFFF) or all-0s.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct Mask4(uint32x4_t);

impl Default for Mask4 {
    fn default() -> Self {
        unsafe { Self(vdupq_n_u32(0)) }
    }
}

impl Debug for Mask4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut arr = [0u32; 4];
        unsafe { vst1q_u32(arr.as_mut_ptr(), self.0) };
        let bits = arr
            .iter()
            .enumerate()
            .fold(0u32, |acc, (i, &m)| acc | (((m != 0) as u32) << i));
        write!(f, "Mask4({:04b})", bits)
    }
}

impl MaskOps for Mask4 {
    #[inline(always)]
    fn any(self) -> bool {
        unsafe { vmaxvq_u32(self.0) != 0 }
    }

    #[inline(always)]
    fn all(self) -> bool {
        unsafe { vminvq_u32(self.0) != 0 }
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        // vbic(a, b) computes a & !b
        unsafe { Self(vbicq_u32(self.0, rhs.0)) }
    }
}

impl BitAnd for Mask4 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(vandq_u32(self.0, rhs.0)) }
    }
}

impl BitOr for Mask4 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(vorrq_u32(self.0, rhs.0)) }
    }
}

impl BitXor for Mask4 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(veorq_u32(self.0, rhs.0)) }
    }
}

impl Not for Mask4 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        unsafe { Self(vmvnq_u32(self.0)) }
    }
}

// ============================================================================
// F32x4
// ============================================================================

/// 4-lane f32 SIMD vector for ARM NEON.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct F32x4(float32x4_t);

impl Default for F32x4 {
    fn default() -> Self {
        unsafe { Self(vdupq_n_f32(0.0)) }
    }
}

impl Debug for F32x4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut arr = [0.0f32; 4];
        self.store(&mut arr);
        write!(f, "F32x4({:?})", arr)
    }
}

impl F32x4 {
    #[inline(always)]
    fn bits(self) -> uint32x4_t {
        unsafe { vreinterpretq_u32_f32(self.0) }
    }

    #[inline(always)]
    fn from_u32(v: uint32x4_t) -> Self {
        unsafe { Self(vreinterpretq_f32_u32(v)) }
    }
}

impl SimdF32 for F32x4 {
    type Mask = Mask4;
    type I32 = I32x4;
    const LANES: usize = 4;

    #[inline(always)]
    fn splat(val: f32) -> Self {
        unsafe { Self(vdupq_n_f32(val)) }
    }

    #[inline(always)]
    fn load(slice: &[f32]) -> Self {
        assert!(slice.len() >= Self::LANES);
        unsafe { Self(vld1q_f32(slice.as_ptr())) }
    }

    #[inline(always)]
    fn store(self, out: &mut [f32]) {
        assert!(out.len() >= Self::LANES);
        unsafe { vst1q_f32(out.as_mut_ptr(), self.0) }
    }

    #[inline(always)]
    fn extract0(self) -> f32 {
        unsafe { vgetq_lane_f32(self.0, 0) }
    }

    #[inline(always)]
    fn from_i32(v: I32x4) -> Self {
        unsafe { Self(vcvtq_f32_s32(v.0)) }
    }

    #[inline(always)]
    fn from_bits(v: I32x4) -> Self {
        unsafe { Self(vreinterpretq_f32_s32(v.0)) }
    }

    #[inline(always)]
    fn to_bits(self) -> I32x4 {
        unsafe { I32x4(vreinterpretq_s32_f32(self.0)) }
    }

    #[inline(always)]
    fn to_i32_round(self) -> I32x4 {
        unsafe { I32x4(vcvtnq_s32_f32(self.0)) }
    }

    #[inline(always)]
    fn to_i32_trunc(self) -> I32x4 {
        unsafe { I32x4(vcvtq_s32_f32(self.0)) }
    }

    #[inline(always)]
    fn from_mask(mask: Mask4) -> Self {
        Self::from_u32(mask.0)
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(vceqq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(vmvnq_u32(vceqq_f32(self.0, rhs.0))) }
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(vcltq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(vcleq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(vcgtq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(vcgeq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn select(mask: Mask4, if_true: Self, if_false: Self) -> Self {
        unsafe { Self(vbslq_f32(mask.0, if_true.0, if_false.0)) }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(vminq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(vmaxq_f32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn abs(self) -> Self {
        unsafe { Self(vabsq_f32(self.0)) }
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        unsafe { Self(vsqrtq_f32(self.0)) }
    }

    #[inline(always)]
    fn rsqrt(self) -> Self {
        unsafe {
            let est = vrsqrteq_f32(self.0);
            // vrsqrtsq_f32(x, y) computes (3 - x * y) / 2; two steps from an
            // 8-bit estimate reach full precision.
            let est = vmulq_f32(est, vrsqrtsq_f32(self.0, vmulq_f32(est, est)));
            Self(vmulq_f32(est, vrsqrtsq_f32(self.0, vmulq_f32(est, est))))
        }
    }

    #[inline(always)]
    fn recip(self) -> Self {
        unsafe {
            let est = vrecpeq_f32(self.0);
            // vrecpsq_f32(x, y) computes 2 - x * y
            let est = vmulq_f32(est, vrecpsq_f32(self.0, est));
            Self(vmulq_f32(est, vrecpsq_f32(self.0, est)))
        }
    }

    #[inline(always)]
    fn floor(self) -> Self {
        unsafe { Self(vrndmq_f32(self.0)) }
    }

    #[inline(always)]
    fn ceil(self) -> Self {
        unsafe { Self(vrndpq_f32(self.0)) }
    }

    #[inline(always)]
    fn round(self) -> Self {
        unsafe { Self(vrndnq_f32(self.0)) }
    }

    #[inline(always)]
    fn mul_add(self, b: Self, c: Self) -> Self {
        // vfmaq_f32(c, a, b) computes a * b + c
        unsafe { Self(vfmaq_f32(c.0, self.0, b.0)) }
    }

    #[inline(always)]
    fn neg_mul_add(self, b: Self, c: Self) -> Self {
        // vfmsq_f32(c, a, b) computes c - a * b
        unsafe { Self(vfmsq_f32(c.0, self.0, b.0)) }
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self::from_u32(vbicq_u32(self.bits(), rhs.bits())) }
    }

    #[inline(always)]
    fn reduce_min(self) -> f32 {
        unsafe { vminvq_f32(self.0) }
    }

    #[inline(always)]
    fn reduce_max(self) -> f32 {
        unsafe { vmaxvq_f32(self.0) }
    }
}

impl Add for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(vaddq_f32(self.0, rhs.0)) }
    }
}

impl Sub for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(vsubq_f32(self.0, rhs.0)) }
    }
}

impl Mul for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(vmulq_f32(self.0, rhs.0)) }
    }
}

impl Div for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe { Self(vdivq_f32(self.0, rhs.0)) }
    }
}

impl Neg for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        unsafe { Self(vnegq_f32(self.0)) }
    }
}

impl BitAnd for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self::from_u32(vandq_u32(self.bits(), rhs.bits())) }
    }
}

impl BitOr for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self::from_u32(vorrq_u32(self.bits(), rhs.bits())) }
    }
}

impl BitXor for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self::from_u32(veorq_u32(self.bits(), rhs.bits())) }
    }
}

impl Not for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        unsafe { Self::from_u32(vmvnq_u32(self.bits())) }
    }
}

// ============================================================================
// I32x4
// ============================================================================

/// 4-lane i32 SIMD vector for ARM NEON.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct I32x4(int32x4_t);

impl Default for I32x4 {
    fn default() -> Self {
        unsafe { Self(vdupq_n_s32(0)) }
    }
}

impl Debug for I32x4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut arr = [0i32; 4];
        self.store(&mut arr);
        write!(f, "I32x4({:?})", arr)
    }
}

impl SimdI32 for I32x4 {
    type Mask = Mask4;
    const LANES: usize = 4;

    #[inline(always)]
    fn splat(val: i32) -> Self {
        unsafe { Self(vdupq_n_s32(val)) }
    }

    #[inline(always)]
    fn incremented() -> Self {
        const LANE_INDEX: [i32; 4] = [0, 1, 2, 3];
        unsafe { Self(vld1q_s32(LANE_INDEX.as_ptr())) }
    }

    #[inline(always)]
    fn load(slice: &[i32]) -> Self {
        assert!(slice.len() >= Self::LANES);
        unsafe { Self(vld1q_s32(slice.as_ptr())) }
    }

    #[inline(always)]
    fn store(self, out: &mut [i32]) {
        assert!(out.len() >= Self::LANES);
        unsafe { vst1q_s32(out.as_mut_ptr(), self.0) }
    }

    #[inline(always)]
    fn extract0(self) -> i32 {
        unsafe { vgetq_lane_s32(self.0, 0) }
    }

    #[inline(always)]
    fn from_mask(mask: Mask4) -> Self {
        unsafe { Self(vreinterpretq_s32_u32(mask.0)) }
    }

    #[inline(always)]
    fn shr_logical(self, n: u32) -> Self {
        // NEON shifts right by shifting left with a negative count.
        unsafe {
            let shifted = vshlq_u32(vreinterpretq_u32_s32(self.0), vdupq_n_s32(-(n as i32)));
            Self(vreinterpretq_s32_u32(shifted))
        }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(vceqq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(vcgtq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(vcltq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn select(mask: Mask4, if_true: Self, if_false: Self) -> Self {
        unsafe { Self(vbslq_s32(mask.0, if_true.0, if_false.0)) }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(vminq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(vmaxq_s32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self(vbicq_s32(self.0, rhs.0)) }
    }
}

impl Add for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(vaddq_s32(self.0, rhs.0)) }
    }
}

impl Sub for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(vsubq_s32(self.0, rhs.0)) }
    }
}

impl Mul for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(vmulq_s32(self.0, rhs.0)) }
    }
}

impl BitAnd for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(vandq_s32(self.0, rhs.0)) }
    }
}

impl BitOr for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(vorrq_s32(self.0, rhs.0)) }
    }
}

impl BitXor for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(veorq_s32(self.0, rhs.0)) }
    }
}

impl Not for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        unsafe { Self(vmvnq_s32(self.0)) }
    }
}

impl Shl<u32> for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn shl(self, rhs: u32) -> Self {
        unsafe { Self(vshlq_s32(self.0, vdupq_n_s32(rhs as i32))) }
    }
}

impl Shr<u32> for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn shr(self, rhs: u32) -> Self {
        unsafe { Self(vshlq_s32(self.0, vdupq_n_s32(-(rhs as i32)))) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shifts_match_scalar() {
        let v = I32x4::load(&[-16, 16, i32::MIN, 1]);
        let mut out = [0i32; 4];
        (v >> 2).store(&mut out);
        assert_eq!(out, [-4, 4, i32::MIN >> 2, 0]);
        v.shr_logical(28).store(&mut out);
        assert_eq!(out, [0xF, 0, 0x8, 0]);
        (v << 3).store(&mut out);
        assert_eq!(out, [-128, 128, 0, 8]);
    }

    #[test]
    fn round_convert_ties_to_even() {
        let v = F32x4::load(&[0.5, 1.5, 2.5, -2.5]);
        let mut out = [0i32; 4];
        v.to_i32_round().store(&mut out);
        assert_eq!(out, [0, 2, 2, -2]);
    }
}
