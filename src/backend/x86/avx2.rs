//! AVX2 backend (8 lanes).

use super::{hmax_ps, hmin_ps};
use crate::backend::{Backend, CpuFeatures, MaskOps, SimdF32, SimdI32};
use core::arch::x86_64::*;
use core::fmt::{Debug, Formatter};
use core::ops::*;

/// AVX2 Backend (8 lanes).
#[derive(Copy, Clone, Debug, Default)]
pub struct Avx2;

impl Backend for Avx2 {
    const LANES: usize = 8;
    const HAS_FMA: bool = cfg!(target_feature = "fma");
    const NAME: &'static str = "avx2";
    const REQUIRED: CpuFeatures = CpuFeatures::compiled()
        .intersection(CpuFeatures::FMA)
        .union(CpuFeatures::AVX2);
    type Mask = Mask8;
    type F32 = F32x8;
    type I32 = I32x8;
}

// ============================================================================
// Mask8: float-domain compare result
// ============================================================================

/// 8-lane mask for AVX2, float-based like [`Mask4`](super::Mask4).
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct Mask8(__m256);

impl Default for Mask8 {
    fn default() -> Self {
        unsafe { Self(_mm256_setzero_ps()) }
    }
}

impl Debug for Mask8 {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "Mask8({:08b})", unsafe { _mm256_movemask_ps(self.0) })
    }
}

impl MaskOps for Mask8 {
    #[inline(always)]
    fn any(self) -> bool {
        unsafe { _mm256_movemask_ps(self.0) != 0 }
    }

    #[inline(always)]
    fn all(self) -> bool {
        unsafe { _mm256_movemask_ps(self.0) == 0xFF }
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_andnot_ps(rhs.0, self.0)) }
    }
}

impl BitAnd for Mask8 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_and_ps(self.0, rhs.0)) }
    }
}

impl BitOr for Mask8 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_or_ps(self.0, rhs.0)) }
    }
}

impl BitXor for Mask8 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_xor_ps(self.0, rhs.0)) }
    }
}

impl Not for Mask8 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        unsafe {
            let all_ones = _mm256_castsi256_ps(_mm256_set1_epi32(-1));
            Self(_mm256_xor_ps(self.0, all_ones))
        }
    }
}

// ============================================================================
// F32x8
// ============================================================================

/// 8-lane f32 SIMD vector for AVX2.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct F32x8(__m256);

impl Default for F32x8 {
    fn default() -> Self {
        unsafe { Self(_mm256_setzero_ps()) }
    }
}

impl Debug for F32x8 {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "F32x8({:?})", self.to_array())
    }
}

impl F32x8 {
    #[inline(always)]
    fn to_array(self) -> [f32; 8] {
        let mut arr = [0.0f32; 8];
        unsafe { _mm256_storeu_ps(arr.as_mut_ptr(), self.0) };
        arr
    }

    #[inline(always)]
    fn halves(self) -> (__m128, __m128) {
        unsafe {
            (
                _mm256_castps256_ps128(self.0),
                _mm256_extractf128_ps(self.0, 1),
            )
        }
    }
}

impl SimdF32 for F32x8 {
    type Mask = Mask8;
    type I32 = I32x8;
    const LANES: usize = 8;

    #[inline(always)]
    fn splat(val: f32) -> Self {
        unsafe { Self(_mm256_set1_ps(val)) }
    }

    #[inline(always)]
    fn load(slice: &[f32]) -> Self {
        assert!(slice.len() >= Self::LANES);
        unsafe { Self(_mm256_loadu_ps(slice.as_ptr())) }
    }

    #[inline(always)]
    fn store(self, out: &mut [f32]) {
        assert!(out.len() >= Self::LANES);
        unsafe { _mm256_storeu_ps(out.as_mut_ptr(), self.0) }
    }

    #[inline(always)]
    fn extract0(self) -> f32 {
        unsafe { _mm256_cvtss_f32(self.0) }
    }

    #[inline(always)]
    fn from_i32(v: I32x8) -> Self {
        unsafe { Self(_mm256_cvtepi32_ps(v.0)) }
    }

    #[inline(always)]
    fn from_bits(v: I32x8) -> Self {
        unsafe { Self(_mm256_castsi256_ps(v.0)) }
    }

    #[inline(always)]
    fn to_bits(self) -> I32x8 {
        unsafe { I32x8(_mm256_castps_si256(self.0)) }
    }

    #[inline(always)]
    fn to_i32_round(self) -> I32x8 {
        unsafe { I32x8(_mm256_cvtps_epi32(self.0)) }
    }

    #[inline(always)]
    fn to_i32_trunc(self) -> I32x8 {
        unsafe { I32x8(_mm256_cvttps_epi32(self.0)) }
    }

    #[inline(always)]
    fn from_mask(mask: Mask8) -> Self {
        Self(mask.0)
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> Mask8 {
        unsafe { Mask8(_mm256_cmp_ps(self.0, rhs.0, _CMP_EQ_OQ)) }
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> Mask8 {
        unsafe { Mask8(_mm256_cmp_ps(self.0, rhs.0, _CMP_NEQ_UQ)) }
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> Mask8 {
        unsafe { Mask8(_mm256_cmp_ps(self.0, rhs.0, _CMP_LT_OQ)) }
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> Mask8 {
        unsafe { Mask8(_mm256_cmp_ps(self.0, rhs.0, _CMP_LE_OQ)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> Mask8 {
        unsafe { Mask8(_mm256_cmp_ps(self.0, rhs.0, _CMP_GT_OQ)) }
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> Mask8 {
        unsafe { Mask8(_mm256_cmp_ps(self.0, rhs.0, _CMP_GE_OQ)) }
    }

    #[inline(always)]
    fn select(mask: Mask8, if_true: Self, if_false: Self) -> Self {
        unsafe { Self(_mm256_blendv_ps(if_false.0, if_true.0, mask.0)) }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_min_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_max_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn abs(self) -> Self {
        unsafe { Self(_mm256_andnot_ps(_mm256_set1_ps(-0.0), self.0)) }
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        unsafe { Self(_mm256_sqrt_ps(self.0)) }
    }

    #[inline(always)]
    fn rsqrt(self) -> Self {
        unsafe {
            let y = _mm256_rsqrt_ps(self.0);
            let hx = _mm256_mul_ps(self.0, _mm256_set1_ps(0.5));
            let yy = _mm256_mul_ps(y, y);
            Self(_mm256_mul_ps(
                y,
                _mm256_sub_ps(_mm256_set1_ps(1.5), _mm256_mul_ps(hx, yy)),
            ))
        }
    }

    #[inline(always)]
    fn recip(self) -> Self {
        unsafe {
            let y = _mm256_rcp_ps(self.0);
            Self(_mm256_mul_ps(
                y,
                _mm256_sub_ps(_mm256_set1_ps(2.0), _mm256_mul_ps(self.0, y)),
            ))
        }
    }

    #[inline(always)]
    fn floor(self) -> Self {
        unsafe { Self(_mm256_floor_ps(self.0)) }
    }

    #[inline(always)]
    fn ceil(self) -> Self {
        unsafe { Self(_mm256_ceil_ps(self.0)) }
    }

    #[inline(always)]
    fn round(self) -> Self {
        unsafe {
            Self(_mm256_round_ps(
                self.0,
                _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC,
            ))
        }
    }

    #[inline(always)]
    fn mul_add(self, b: Self, c: Self) -> Self {
        #[cfg(target_feature = "fma")]
        unsafe {
            Self(_mm256_fmadd_ps(self.0, b.0, c.0))
        }
        #[cfg(not(target_feature = "fma"))]
        {
            self * b + c
        }
    }

    #[inline(always)]
    fn neg_mul_add(self, b: Self, c: Self) -> Self {
        #[cfg(target_feature = "fma")]
        unsafe {
            Self(_mm256_fnmadd_ps(self.0, b.0, c.0))
        }
        #[cfg(not(target_feature = "fma"))]
        {
            c - self * b
        }
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_andnot_ps(rhs.0, self.0)) }
    }

    #[inline(always)]
    fn reduce_min(self) -> f32 {
        let (lo, hi) = self.halves();
        unsafe { hmin_ps(_mm_min_ps(lo, hi)) }
    }

    #[inline(always)]
    fn reduce_max(self) -> f32 {
        let (lo, hi) = self.halves();
        unsafe { hmax_ps(_mm_max_ps(lo, hi)) }
    }
}

impl Add for F32x8 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_add_ps(self.0, rhs.0)) }
    }
}

impl Sub for F32x8 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_sub_ps(self.0, rhs.0)) }
    }
}

impl Mul for F32x8 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_mul_ps(self.0, rhs.0)) }
    }
}

impl Div for F32x8 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_div_ps(self.0, rhs.0)) }
    }
}

impl Neg for F32x8 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        unsafe { Self(_mm256_xor_ps(self.0, _mm256_set1_ps(-0.0))) }
    }
}

impl BitAnd for F32x8 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_and_ps(self.0, rhs.0)) }
    }
}

impl BitOr for F32x8 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_or_ps(self.0, rhs.0)) }
    }
}

impl BitXor for F32x8 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_xor_ps(self.0, rhs.0)) }
    }
}

impl Not for F32x8 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        unsafe {
            let all_ones = _mm256_castsi256_ps(_mm256_set1_epi32(-1));
            Self(_mm256_xor_ps(self.0, all_ones))
        }
    }
}

// ============================================================================
// I32x8
// ============================================================================

/// 8-lane i32 SIMD vector for AVX2.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct I32x8(__m256i);

impl Default for I32x8 {
    fn default() -> Self {
        unsafe { Self(_mm256_setzero_si256()) }
    }
}

impl Debug for I32x8 {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut arr = [0i32; 8];
        self.store(&mut arr);
        write!(f, "I32x8({:?})", arr)
    }
}

#[inline(always)]
fn shift_count(n: u32) -> __m128i {
    unsafe { _mm_cvtsi32_si128(n as i32) }
}

#[inline(always)]
fn int_mask(m: __m256i) -> Mask8 {
    unsafe { Mask8(_mm256_castsi256_ps(m)) }
}

impl SimdI32 for I32x8 {
    type Mask = Mask8;
    const LANES: usize = 8;

    #[inline(always)]
    fn splat(val: i32) -> Self {
        unsafe { Self(_mm256_set1_epi32(val)) }
    }

    #[inline(always)]
    fn incremented() -> Self {
        unsafe { Self(_mm256_setr_epi32(0, 1, 2, 3, 4, 5, 6, 7)) }
    }

    #[inline(always)]
    fn load(slice: &[i32]) -> Self {
        assert!(slice.len() >= Self::LANES);
        unsafe { Self(_mm256_loadu_si256(slice.as_ptr().cast())) }
    }

    #[inline(always)]
    fn store(self, out: &mut [i32]) {
        assert!(out.len() >= Self::LANES);
        unsafe { _mm256_storeu_si256(out.as_mut_ptr().cast(), self.0) }
    }

    #[inline(always)]
    fn extract0(self) -> i32 {
        unsafe { _mm256_cvtsi256_si32(self.0) }
    }

    #[inline(always)]
    fn from_mask(mask: Mask8) -> Self {
        unsafe { Self(_mm256_castps_si256(mask.0)) }
    }

    #[inline(always)]
    fn shr_logical(self, n: u32) -> Self {
        unsafe { Self(_mm256_srl_epi32(self.0, shift_count(n))) }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> Mask8 {
        unsafe { int_mask(_mm256_cmpeq_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> Mask8 {
        unsafe { int_mask(_mm256_cmpgt_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> Mask8 {
        unsafe { int_mask(_mm256_cmpgt_epi32(rhs.0, self.0)) }
    }

    #[inline(always)]
    fn select(mask: Mask8, if_true: Self, if_false: Self) -> Self {
        unsafe {
            Self(_mm256_blendv_epi8(
                if_false.0,
                if_true.0,
                _mm256_castps_si256(mask.0),
            ))
        }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_min_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_max_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_andnot_si256(rhs.0, self.0)) }
    }
}

impl Add for I32x8 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_add_epi32(self.0, rhs.0)) }
    }
}

impl Sub for I32x8 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_sub_epi32(self.0, rhs.0)) }
    }
}

impl Mul for I32x8 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_mullo_epi32(self.0, rhs.0)) }
    }
}

impl BitAnd for I32x8 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_and_si256(self.0, rhs.0)) }
    }
}

impl BitOr for I32x8 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_or_si256(self.0, rhs.0)) }
    }
}

impl BitXor for I32x8 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(_mm256_xor_si256(self.0, rhs.0)) }
    }
}

impl Not for I32x8 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        unsafe { Self(_mm256_xor_si256(self.0, _mm256_set1_epi32(-1))) }
    }
}

impl Shl<u32> for I32x8 {
    type Output = Self;
    #[inline(always)]
    fn shl(self, rhs: u32) -> Self {
        unsafe { Self(_mm256_sll_epi32(self.0, shift_count(rhs))) }
    }
}

impl Shr<u32> for I32x8 {
    type Output = Self;
    #[inline(always)]
    fn shr(self, rhs: u32) -> Self {
        unsafe { Self(_mm256_sra_epi32(self.0, shift_count(rhs))) }
    }
}
