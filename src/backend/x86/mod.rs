//! x86_64 backends.
//!
//! [`Sse`] is always available on x86_64 (SSE2 is part of the baseline). Paths
//! that SSE4.1 makes cheaper (blend, floor, mullo, min/max) switch over when
//! the binary is compiled with `sse4.1`. [`Avx2`] and [`Avx512`] only exist
//! when the matching target feature is enabled at compile time.

use super::{Backend, CpuFeatures, MaskOps, SimdF32, SimdI32};
use core::arch::x86_64::*;
use core::fmt::{Debug, Formatter};
use core::ops::*;

#[cfg(target_feature = "avx2")]
mod avx2;
#[cfg(target_feature = "avx512f")]
mod avx512;

#[cfg(target_feature = "avx2")]
pub use avx2::{Avx2, F32x8, I32x8, Mask8};
#[cfg(target_feature = "avx512f")]
pub use avx512::{Avx512, F32x16, I32x16, Mask16};

// ============================================================================
// SSE Backend
// ============================================================================

/// SSE backend (4 lanes).
#[derive(Copy, Clone, Debug, Default)]
pub struct Sse;

impl Backend for Sse {
    const LANES: usize = 4;
    const HAS_FMA: bool = cfg!(target_feature = "fma");
    const NAME: &'static str = if cfg!(target_feature = "sse4.1") {
        "sse4.1"
    } else {
        "sse2"
    };
    const REQUIRED: CpuFeatures = CpuFeatures::compiled().intersection(
        CpuFeatures::SSE2
            .union(CpuFeatures::SSE41)
            .union(CpuFeatures::FMA),
    );
    type Mask = Mask4;
    type F32 = F32x4;
    type I32 = I32x4;
}

/// Horizontal min of 4 lanes.
#[inline(always)]
pub(super) unsafe fn hmin_ps(v: __m128) -> f32 {
    let m = _mm_min_ps(v, _mm_movehl_ps(v, v));
    let m = _mm_min_ps(m, _mm_shuffle_ps(m, m, 0x55));
    _mm_cvtss_f32(m)
}

/// Horizontal max of 4 lanes.
#[inline(always)]
pub(super) unsafe fn hmax_ps(v: __m128) -> f32 {
    let m = _mm_max_ps(v, _mm_movehl_ps(v, v));
    let m = _mm_max_ps(m, _mm_shuffle_ps(m, m, 0x55));
    _mm_cvtss_f32(m)
}

// ============================================================================
// Mask4 - 4-lane mask for SSE (float-based, no separate mask unit)
// ============================================================================

/// 4-lane mask for SSE.
///
/// Stored as a float vector where each lane is all-1s (true) or all-0s
/// (false), so it feeds `and`/`andnot`/`blendv` directly.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct Mask4(__m128);

impl Default for Mask4 {
    fn default() -> Self {
        unsafe { Self(_mm_setzero_ps()) }
    }
}

impl Debug for Mask4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "Mask4({:04b})", unsafe { _mm_movemask_ps(self.0) })
    }
}

impl MaskOps for Mask4 {
    #[inline(always)]
    fn any(self) -> bool {
        unsafe { _mm_movemask_ps(self.0) != 0 }
    }

    #[inline(always)]
    fn all(self) -> bool {
        unsafe { _mm_movemask_ps(self.0) == 0xF }
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self(_mm_andnot_ps(rhs.0, self.0)) }
    }
}

impl BitAnd for Mask4 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(_mm_and_ps(self.0, rhs.0)) }
    }
}

impl BitOr for Mask4 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(_mm_or_ps(self.0, rhs.0)) }
    }
}

impl BitXor for Mask4 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(_mm_xor_ps(self.0, rhs.0)) }
    }
}

impl Not for Mask4 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        unsafe {
            let all_ones = _mm_castsi128_ps(_mm_set1_epi32(-1));
            Self(_mm_xor_ps(self.0, all_ones))
        }
    }
}

// ============================================================================
// F32x4
// ============================================================================

/// 4-lane f32 SIMD vector for SSE.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct F32x4(__m128);

impl Default for F32x4 {
    fn default() -> Self {
        unsafe { Self(_mm_setzero_ps()) }
    }
}

impl Debug for F32x4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "F32x4({:?})", self.to_array())
    }
}

impl F32x4 {
    #[inline(always)]
    fn to_array(self) -> [f32; 4] {
        let mut arr = [0.0f32; 4];
        unsafe { _mm_storeu_ps(arr.as_mut_ptr(), self.0) };
        arr
    }
}

impl SimdF32 for F32x4 {
    type Mask = Mask4;
    type I32 = I32x4;
    const LANES: usize = 4;

    #[inline(always)]
    fn splat(val: f32) -> Self {
        unsafe { Self(_mm_set1_ps(val)) }
    }

    #[inline(always)]
    fn load(slice: &[f32]) -> Self {
        assert!(slice.len() >= Self::LANES);
        unsafe { Self(_mm_loadu_ps(slice.as_ptr())) }
    }

    #[inline(always)]
    fn store(self, out: &mut [f32]) {
        assert!(out.len() >= Self::LANES);
        unsafe { _mm_storeu_ps(out.as_mut_ptr(), self.0) }
    }

    #[inline(always)]
    fn extract0(self) -> f32 {
        unsafe { _mm_cvtss_f32(self.0) }
    }

    #[inline(always)]
    fn from_i32(v: I32x4) -> Self {
        unsafe { Self(_mm_cvtepi32_ps(v.0)) }
    }

    #[inline(always)]
    fn from_bits(v: I32x4) -> Self {
        unsafe { Self(_mm_castsi128_ps(v.0)) }
    }

    #[inline(always)]
    fn to_bits(self) -> I32x4 {
        unsafe { I32x4(_mm_castps_si128(self.0)) }
    }

    #[inline(always)]
    fn to_i32_round(self) -> I32x4 {
        // MXCSR default rounding: nearest, ties to even.
        unsafe { I32x4(_mm_cvtps_epi32(self.0)) }
    }

    #[inline(always)]
    fn to_i32_trunc(self) -> I32x4 {
        unsafe { I32x4(_mm_cvttps_epi32(self.0)) }
    }

    #[inline(always)]
    fn from_mask(mask: Mask4) -> Self {
        Self(mask.0)
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(_mm_cmpeq_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(_mm_cmpneq_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(_mm_cmplt_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(_mm_cmple_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(_mm_cmpgt_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> Mask4 {
        unsafe { Mask4(_mm_cmpge_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn select(mask: Mask4, if_true: Self, if_false: Self) -> Self {
        #[cfg(target_feature = "sse4.1")]
        unsafe {
            Self(_mm_blendv_ps(if_false.0, if_true.0, mask.0))
        }
        #[cfg(not(target_feature = "sse4.1"))]
        unsafe {
            // (mask & if_true) | (!mask & if_false)
            let t = _mm_and_ps(mask.0, if_true.0);
            let f = _mm_andnot_ps(mask.0, if_false.0);
            Self(_mm_or_ps(t, f))
        }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(_mm_min_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(_mm_max_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn abs(self) -> Self {
        unsafe { Self(_mm_andnot_ps(_mm_set1_ps(-0.0), self.0)) }
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        unsafe { Self(_mm_sqrt_ps(self.0)) }
    }

    #[inline(always)]
    fn rsqrt(self) -> Self {
        unsafe {
            // ~12-bit estimate, one Newton-Raphson step: y * (1.5 - 0.5 * x * y * y)
            let y = _mm_rsqrt_ps(self.0);
            let hx = _mm_mul_ps(self.0, _mm_set1_ps(0.5));
            let yy = _mm_mul_ps(y, y);
            Self(_mm_mul_ps(
                y,
                _mm_sub_ps(_mm_set1_ps(1.5), _mm_mul_ps(hx, yy)),
            ))
        }
    }

    #[inline(always)]
    fn recip(self) -> Self {
        unsafe {
            // ~12-bit estimate, one Newton-Raphson step: y * (2 - x * y)
            let y = _mm_rcp_ps(self.0);
            Self(_mm_mul_ps(
                y,
                _mm_sub_ps(_mm_set1_ps(2.0), _mm_mul_ps(self.0, y)),
            ))
        }
    }

    #[inline(always)]
    fn floor(self) -> Self {
        #[cfg(target_feature = "sse4.1")]
        unsafe {
            Self(_mm_floor_ps(self.0))
        }
        #[cfg(not(target_feature = "sse4.1"))]
        unsafe {
            // SSE2 floor emulation:
            // 1. Truncate toward zero
            let trunc = _mm_cvtepi32_ps(_mm_cvttps_epi32(self.0));
            // 2. Negative non-integers truncated the wrong way; subtract 1 where self < trunc
            let correction = _mm_and_ps(_mm_cmplt_ps(self.0, trunc), _mm_set1_ps(1.0));
            Self(_mm_sub_ps(trunc, correction))
        }
    }

    #[inline(always)]
    fn ceil(self) -> Self {
        #[cfg(target_feature = "sse4.1")]
        unsafe {
            Self(_mm_ceil_ps(self.0))
        }
        #[cfg(not(target_feature = "sse4.1"))]
        unsafe {
            let trunc = _mm_cvtepi32_ps(_mm_cvttps_epi32(self.0));
            let correction = _mm_and_ps(_mm_cmpgt_ps(self.0, trunc), _mm_set1_ps(1.0));
            Self(_mm_add_ps(trunc, correction))
        }
    }

    #[inline(always)]
    fn round(self) -> Self {
        #[cfg(target_feature = "sse4.1")]
        unsafe {
            Self(_mm_round_ps(
                self.0,
                _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC,
            ))
        }
        #[cfg(not(target_feature = "sse4.1"))]
        unsafe {
            Self(_mm_cvtepi32_ps(_mm_cvtps_epi32(self.0)))
        }
    }

    #[inline(always)]
    fn mul_add(self, b: Self, c: Self) -> Self {
        #[cfg(target_feature = "fma")]
        unsafe {
            Self(_mm_fmadd_ps(self.0, b.0, c.0))
        }
        #[cfg(not(target_feature = "fma"))]
        {
            // Fallback: separate mul + add (two roundings)
            self * b + c
        }
    }

    #[inline(always)]
    fn neg_mul_add(self, b: Self, c: Self) -> Self {
        #[cfg(target_feature = "fma")]
        unsafe {
            Self(_mm_fnmadd_ps(self.0, b.0, c.0))
        }
        #[cfg(not(target_feature = "fma"))]
        {
            c - self * b
        }
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self(_mm_andnot_ps(rhs.0, self.0)) }
    }

    #[inline(always)]
    fn reduce_min(self) -> f32 {
        unsafe { hmin_ps(self.0) }
    }

    #[inline(always)]
    fn reduce_max(self) -> f32 {
        unsafe { hmax_ps(self.0) }
    }
}

// Operators for F32x4
impl Add for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(_mm_add_ps(self.0, rhs.0)) }
    }
}

impl Sub for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(_mm_sub_ps(self.0, rhs.0)) }
    }
}

impl Mul for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(_mm_mul_ps(self.0, rhs.0)) }
    }
}

impl Div for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe { Self(_mm_div_ps(self.0, rhs.0)) }
    }
}

impl Neg for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        unsafe { Self(_mm_xor_ps(self.0, _mm_set1_ps(-0.0))) }
    }
}

impl BitAnd for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(_mm_and_ps(self.0, rhs.0)) }
    }
}

impl BitOr for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(_mm_or_ps(self.0, rhs.0)) }
    }
}

impl BitXor for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(_mm_xor_ps(self.0, rhs.0)) }
    }
}

impl Not for F32x4 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        unsafe {
            let all_ones = _mm_castsi128_ps(_mm_set1_epi32(-1));
            Self(_mm_xor_ps(self.0, all_ones))
        }
    }
}

// ============================================================================
// I32x4
// ============================================================================

/// 4-lane i32 SIMD vector for SSE.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct I32x4(__m128i);

impl Default for I32x4 {
    fn default() -> Self {
        unsafe { Self(_mm_setzero_si128()) }
    }
}

impl Debug for I32x4 {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "I32x4({:?})", self.to_array())
    }
}

impl I32x4 {
    #[inline(always)]
    fn to_array(self) -> [i32; 4] {
        let mut arr = [0i32; 4];
        unsafe { _mm_storeu_si128(arr.as_mut_ptr().cast(), self.0) };
        arr
    }

    #[inline(always)]
    fn mask(m: __m128i) -> Mask4 {
        unsafe { Mask4(_mm_castsi128_ps(m)) }
    }
}

impl SimdI32 for I32x4 {
    type Mask = Mask4;
    const LANES: usize = 4;

    #[inline(always)]
    fn splat(val: i32) -> Self {
        unsafe { Self(_mm_set1_epi32(val)) }
    }

    #[inline(always)]
    fn incremented() -> Self {
        unsafe { Self(_mm_setr_epi32(0, 1, 2, 3)) }
    }

    #[inline(always)]
    fn load(slice: &[i32]) -> Self {
        assert!(slice.len() >= Self::LANES);
        unsafe { Self(_mm_loadu_si128(slice.as_ptr().cast())) }
    }

    #[inline(always)]
    fn store(self, out: &mut [i32]) {
        assert!(out.len() >= Self::LANES);
        unsafe { _mm_storeu_si128(out.as_mut_ptr().cast(), self.0) }
    }

    #[inline(always)]
    fn extract0(self) -> i32 {
        unsafe { _mm_cvtsi128_si32(self.0) }
    }

    #[inline(always)]
    fn from_mask(mask: Mask4) -> Self {
        unsafe { Self(_mm_castps_si128(mask.0)) }
    }

    #[inline(always)]
    fn shr_logical(self, n: u32) -> Self {
        unsafe { Self(_mm_srl_epi32(self.0, _mm_cvtsi32_si128(n as i32))) }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> Mask4 {
        unsafe { Self::mask(_mm_cmpeq_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> Mask4 {
        unsafe { Self::mask(_mm_cmpgt_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> Mask4 {
        unsafe { Self::mask(_mm_cmplt_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn select(mask: Mask4, if_true: Self, if_false: Self) -> Self {
        unsafe {
            let m = _mm_castps_si128(mask.0);
            #[cfg(target_feature = "sse4.1")]
            {
                Self(_mm_blendv_epi8(if_false.0, if_true.0, m))
            }
            #[cfg(not(target_feature = "sse4.1"))]
            {
                let t = _mm_and_si128(m, if_true.0);
                let f = _mm_andnot_si128(m, if_false.0);
                Self(_mm_or_si128(t, f))
            }
        }
    }

    #[cfg(target_feature = "sse4.1")]
    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(_mm_min_epi32(self.0, rhs.0)) }
    }

    #[cfg(target_feature = "sse4.1")]
    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(_mm_max_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self(_mm_andnot_si128(rhs.0, self.0)) }
    }
}

impl Add for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(_mm_add_epi32(self.0, rhs.0)) }
    }
}

impl Sub for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(_mm_sub_epi32(self.0, rhs.0)) }
    }
}

impl Mul for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        #[cfg(target_feature = "sse4.1")]
        unsafe {
            Self(_mm_mullo_epi32(self.0, rhs.0))
        }
        #[cfg(not(target_feature = "sse4.1"))]
        unsafe {
            // SSE2 has no 32-bit mullo: multiply even and odd lanes as 64-bit
            // products, keep the low halves, then interleave.
            let even = _mm_mul_epu32(self.0, rhs.0);
            let odd = _mm_mul_epu32(_mm_srli_epi64(self.0, 32), _mm_srli_epi64(rhs.0, 32));
            Self(_mm_unpacklo_epi32(
                _mm_shuffle_epi32(even, 0x08),
                _mm_shuffle_epi32(odd, 0x08),
            ))
        }
    }
}

impl BitAnd for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(_mm_and_si128(self.0, rhs.0)) }
    }
}

impl BitOr for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(_mm_or_si128(self.0, rhs.0)) }
    }
}

impl BitXor for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(_mm_xor_si128(self.0, rhs.0)) }
    }
}

impl Not for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        unsafe { Self(_mm_xor_si128(self.0, _mm_set1_epi32(-1))) }
    }
}

impl Shl<u32> for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn shl(self, rhs: u32) -> Self {
        unsafe { Self(_mm_sll_epi32(self.0, _mm_cvtsi32_si128(rhs as i32))) }
    }
}

impl Shr<u32> for I32x4 {
    type Output = Self;
    #[inline(always)]
    fn shr(self, rhs: u32) -> Self {
        unsafe { Self(_mm_sra_epi32(self.0, _mm_cvtsi32_si128(rhs as i32))) }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mullo_wraps_like_scalar() {
        let a = I32x4::load(&[0x27d4eb2d, -7, i32::MAX, 123_456_789]);
        let b = I32x4::load(&[0x27d4eb2d, 3, 2, -987_654_321]);
        let mut out = [0i32; 4];
        (a * b).store(&mut out);
        assert_eq!(
            out,
            [
                0x27d4eb2d_i32.wrapping_mul(0x27d4eb2d),
                -21,
                i32::MAX.wrapping_mul(2),
                123_456_789_i32.wrapping_mul(-987_654_321),
            ]
        );
    }

    #[test]
    fn floor_and_round_negative_values() {
        let v = F32x4::load(&[-1.5, -0.5, 0.5, 2.5]);
        let mut out = [0.0f32; 4];
        v.floor().store(&mut out);
        assert_eq!(out, [-2.0, -1.0, 0.0, 2.0]);
        v.round().store(&mut out);
        assert_eq!(out, [-2.0, -0.0, 0.0, 2.0]);
        v.ceil().store(&mut out);
        assert_eq!(out, [-1.0, -0.0, 1.0, 3.0]);
    }

    #[test]
    fn refined_rsqrt_is_close() {
        let v = F32x4::load(&[1.0, 4.0, 0.25, 100.0]);
        let mut out = [0.0f32; 4];
        v.rsqrt().store(&mut out);
        for (got, want) in out.iter().zip([1.0f32, 0.5, 2.0, 0.1]) {
            assert!((got - want).abs() < 1e-5 * want, "{} vs {}", got, want);
        }
    }

    #[test]
    fn horizontal_reductions() {
        let v = F32x4::load(&[3.0, -8.0, 5.5, 1.0]);
        assert_eq!(v.reduce_min(), -8.0);
        assert_eq!(v.reduce_max(), 5.5);
    }
}
