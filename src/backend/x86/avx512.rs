//! AVX-512 backend (16 lanes).
//!
//! Masks live in k-registers, so the masked arithmetic defaults are replaced
//! by the native `_mm512_mask_*` forms.

use crate::backend::{Backend, CpuFeatures, MaskOps, SimdF32, SimdI32};
use core::arch::x86_64::*;
use core::fmt::{Debug, Formatter};
use core::ops::*;

/// AVX512 Backend (16 lanes).
#[derive(Copy, Clone, Debug, Default)]
pub struct Avx512;

impl Backend for Avx512 {
    const LANES: usize = 16;
    const HAS_FMA: bool = true;
    const NAME: &'static str = "avx512";
    const REQUIRED: CpuFeatures = CpuFeatures::AVX512F;
    type Mask = Mask16;
    type F32 = F32x16;
    type I32 = I32x16;
}

// ============================================================================
// Mask16 - 16-lane native k-register mask for AVX-512
// ============================================================================

/// 16-lane mask, one bit per lane.
#[derive(Copy, Clone, Default)]
#[repr(transparent)]
pub struct Mask16(__mmask16);

impl Debug for Mask16 {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "Mask16({:016b})", self.0)
    }
}

impl MaskOps for Mask16 {
    #[inline(always)]
    fn any(self) -> bool {
        self.0 != 0
    }

    #[inline(always)]
    fn all(self) -> bool {
        self.0 == 0xFFFF
    }
}

impl BitAnd for Mask16 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        Self(self.0 & rhs.0)
    }
}

impl BitOr for Mask16 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        Self(self.0 | rhs.0)
    }
}

impl BitXor for Mask16 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        Self(self.0 ^ rhs.0)
    }
}

impl Not for Mask16 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        Self(!self.0)
    }
}

#[inline(always)]
fn ones() -> __m512i {
    unsafe { _mm512_set1_epi32(-1) }
}

#[inline(always)]
fn shift_count(n: u32) -> __m128i {
    unsafe { _mm_cvtsi32_si128(n as i32) }
}

// ============================================================================
// F32x16
// ============================================================================

/// 16-lane f32 SIMD vector for AVX-512.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct F32x16(__m512);

impl Default for F32x16 {
    fn default() -> Self {
        unsafe { Self(_mm512_setzero_ps()) }
    }
}

impl Debug for F32x16 {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "F32x16({:?})", self.to_array())
    }
}

impl F32x16 {
    #[inline(always)]
    fn to_array(self) -> [f32; 16] {
        let mut arr = [0.0f32; 16];
        unsafe { _mm512_storeu_ps(arr.as_mut_ptr(), self.0) };
        arr
    }

    // AVX-512F has no float bitwise ops; go through the integer domain.
    #[inline(always)]
    fn bits(self) -> __m512i {
        unsafe { _mm512_castps_si512(self.0) }
    }

    #[inline(always)]
    fn from_int(v: __m512i) -> Self {
        unsafe { Self(_mm512_castsi512_ps(v)) }
    }
}

impl SimdF32 for F32x16 {
    type Mask = Mask16;
    type I32 = I32x16;
    const LANES: usize = 16;

    #[inline(always)]
    fn splat(val: f32) -> Self {
        unsafe { Self(_mm512_set1_ps(val)) }
    }

    #[inline(always)]
    fn load(slice: &[f32]) -> Self {
        assert!(slice.len() >= Self::LANES);
        unsafe { Self(_mm512_loadu_ps(slice.as_ptr())) }
    }

    #[inline(always)]
    fn store(self, out: &mut [f32]) {
        assert!(out.len() >= Self::LANES);
        unsafe { _mm512_storeu_ps(out.as_mut_ptr(), self.0) }
    }

    #[inline(always)]
    fn extract0(self) -> f32 {
        self.to_array()[0]
    }

    #[inline(always)]
    fn from_i32(v: I32x16) -> Self {
        unsafe { Self(_mm512_cvtepi32_ps(v.0)) }
    }

    #[inline(always)]
    fn from_bits(v: I32x16) -> Self {
        unsafe { Self(_mm512_castsi512_ps(v.0)) }
    }

    #[inline(always)]
    fn to_bits(self) -> I32x16 {
        unsafe { I32x16(_mm512_castps_si512(self.0)) }
    }

    #[inline(always)]
    fn to_i32_round(self) -> I32x16 {
        unsafe { I32x16(_mm512_cvtps_epi32(self.0)) }
    }

    #[inline(always)]
    fn to_i32_trunc(self) -> I32x16 {
        unsafe { I32x16(_mm512_cvttps_epi32(self.0)) }
    }

    #[inline(always)]
    fn from_mask(mask: Mask16) -> Self {
        unsafe { Self(_mm512_castsi512_ps(_mm512_maskz_mov_epi32(mask.0, ones()))) }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> Mask16 {
        unsafe { Mask16(_mm512_cmp_ps_mask(self.0, rhs.0, _CMP_EQ_OQ)) }
    }

    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> Mask16 {
        unsafe { Mask16(_mm512_cmp_ps_mask(self.0, rhs.0, _CMP_NEQ_UQ)) }
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> Mask16 {
        unsafe { Mask16(_mm512_cmp_ps_mask(self.0, rhs.0, _CMP_LT_OQ)) }
    }

    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> Mask16 {
        unsafe { Mask16(_mm512_cmp_ps_mask(self.0, rhs.0, _CMP_LE_OQ)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> Mask16 {
        unsafe { Mask16(_mm512_cmp_ps_mask(self.0, rhs.0, _CMP_GT_OQ)) }
    }

    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> Mask16 {
        unsafe { Mask16(_mm512_cmp_ps_mask(self.0, rhs.0, _CMP_GE_OQ)) }
    }

    #[inline(always)]
    fn select(mask: Mask16, if_true: Self, if_false: Self) -> Self {
        // blend picks the second operand where the mask bit is set
        unsafe { Self(_mm512_mask_blend_ps(mask.0, if_false.0, if_true.0)) }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_min_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_max_ps(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn abs(self) -> Self {
        unsafe { Self(_mm512_abs_ps(self.0)) }
    }

    #[inline(always)]
    fn sqrt(self) -> Self {
        unsafe { Self(_mm512_sqrt_ps(self.0)) }
    }

    #[inline(always)]
    fn rsqrt(self) -> Self {
        unsafe {
            // 14-bit estimate, one Newton-Raphson step
            let y = _mm512_rsqrt14_ps(self.0);
            let hx = _mm512_mul_ps(self.0, _mm512_set1_ps(0.5));
            let yy = _mm512_mul_ps(y, y);
            Self(_mm512_mul_ps(y, _mm512_fnmadd_ps(hx, yy, _mm512_set1_ps(1.5))))
        }
    }

    #[inline(always)]
    fn recip(self) -> Self {
        unsafe {
            let y = _mm512_rcp14_ps(self.0);
            Self(_mm512_mul_ps(y, _mm512_fnmadd_ps(self.0, y, _mm512_set1_ps(2.0))))
        }
    }

    #[inline(always)]
    fn floor(self) -> Self {
        unsafe {
            Self(_mm512_roundscale_ps(
                self.0,
                _MM_FROUND_TO_NEG_INF | _MM_FROUND_NO_EXC,
            ))
        }
    }

    #[inline(always)]
    fn ceil(self) -> Self {
        unsafe {
            Self(_mm512_roundscale_ps(
                self.0,
                _MM_FROUND_TO_POS_INF | _MM_FROUND_NO_EXC,
            ))
        }
    }

    #[inline(always)]
    fn round(self) -> Self {
        unsafe {
            Self(_mm512_roundscale_ps(
                self.0,
                _MM_FROUND_TO_NEAREST_INT | _MM_FROUND_NO_EXC,
            ))
        }
    }

    #[inline(always)]
    fn mul_add(self, b: Self, c: Self) -> Self {
        unsafe { Self(_mm512_fmadd_ps(self.0, b.0, c.0)) }
    }

    #[inline(always)]
    fn neg_mul_add(self, b: Self, c: Self) -> Self {
        unsafe { Self(_mm512_fnmadd_ps(self.0, b.0, c.0)) }
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        // andnot(a, b) computes !a & b
        unsafe { Self::from_int(_mm512_andnot_si512(rhs.bits(), self.bits())) }
    }

    #[inline(always)]
    fn mask_zero(self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_maskz_mov_ps(mask.0, self.0)) }
    }

    #[inline(always)]
    fn nmask_zero(self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_maskz_mov_ps(!mask.0, self.0)) }
    }

    #[inline(always)]
    fn masked_add(self, rhs: Self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_mask_add_ps(self.0, mask.0, self.0, rhs.0)) }
    }

    #[inline(always)]
    fn masked_sub(self, rhs: Self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_mask_sub_ps(self.0, mask.0, self.0, rhs.0)) }
    }

    #[inline(always)]
    fn masked_mul(self, rhs: Self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_mask_mul_ps(self.0, mask.0, self.0, rhs.0)) }
    }

    #[inline(always)]
    fn nmasked_add(self, rhs: Self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_mask_add_ps(self.0, !mask.0, self.0, rhs.0)) }
    }

    #[inline(always)]
    fn nmasked_sub(self, rhs: Self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_mask_sub_ps(self.0, !mask.0, self.0, rhs.0)) }
    }

    #[inline(always)]
    fn nmasked_mul(self, rhs: Self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_mask_mul_ps(self.0, !mask.0, self.0, rhs.0)) }
    }

    #[inline(always)]
    fn reduce_min(self) -> f32 {
        unsafe { _mm512_reduce_min_ps(self.0) }
    }

    #[inline(always)]
    fn reduce_max(self) -> f32 {
        unsafe { _mm512_reduce_max_ps(self.0) }
    }
}

impl Add for F32x16 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_add_ps(self.0, rhs.0)) }
    }
}

impl Sub for F32x16 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_sub_ps(self.0, rhs.0)) }
    }
}

impl Mul for F32x16 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_mul_ps(self.0, rhs.0)) }
    }
}

impl Div for F32x16 {
    type Output = Self;
    #[inline(always)]
    fn div(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_div_ps(self.0, rhs.0)) }
    }
}

impl Neg for F32x16 {
    type Output = Self;
    #[inline(always)]
    fn neg(self) -> Self {
        self ^ Self::splat(-0.0)
    }
}

impl BitAnd for F32x16 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self::from_int(_mm512_and_si512(self.bits(), rhs.bits())) }
    }
}

impl BitOr for F32x16 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self::from_int(_mm512_or_si512(self.bits(), rhs.bits())) }
    }
}

impl BitXor for F32x16 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self::from_int(_mm512_xor_si512(self.bits(), rhs.bits())) }
    }
}

impl Not for F32x16 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        unsafe { Self::from_int(_mm512_xor_si512(self.bits(), ones())) }
    }
}

// ============================================================================
// I32x16
// ============================================================================

/// 16-lane i32 SIMD vector for AVX-512.
#[derive(Copy, Clone)]
#[repr(transparent)]
pub struct I32x16(__m512i);

impl Default for I32x16 {
    fn default() -> Self {
        unsafe { Self(_mm512_setzero_si512()) }
    }
}

impl Debug for I32x16 {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        let mut arr = [0i32; 16];
        self.store(&mut arr);
        write!(f, "I32x16({:?})", arr)
    }
}

impl SimdI32 for I32x16 {
    type Mask = Mask16;
    const LANES: usize = 16;

    #[inline(always)]
    fn splat(val: i32) -> Self {
        unsafe { Self(_mm512_set1_epi32(val)) }
    }

    #[inline(always)]
    fn incremented() -> Self {
        unsafe {
            Self(_mm512_setr_epi32(
                0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15,
            ))
        }
    }

    #[inline(always)]
    fn load(slice: &[i32]) -> Self {
        assert!(slice.len() >= Self::LANES);
        unsafe { Self(_mm512_loadu_si512(slice.as_ptr().cast())) }
    }

    #[inline(always)]
    fn store(self, out: &mut [i32]) {
        assert!(out.len() >= Self::LANES);
        unsafe { _mm512_storeu_si512(out.as_mut_ptr().cast(), self.0) }
    }

    #[inline(always)]
    fn extract0(self) -> i32 {
        unsafe { _mm_cvtsi128_si32(_mm512_castsi512_si128(self.0)) }
    }

    #[inline(always)]
    fn from_mask(mask: Mask16) -> Self {
        unsafe { Self(_mm512_maskz_mov_epi32(mask.0, ones())) }
    }

    #[inline(always)]
    fn shr_logical(self, n: u32) -> Self {
        unsafe { Self(_mm512_srl_epi32(self.0, shift_count(n))) }
    }

    #[inline(always)]
    fn cmp_eq(self, rhs: Self) -> Mask16 {
        unsafe { Mask16(_mm512_cmpeq_epi32_mask(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_gt(self, rhs: Self) -> Mask16 {
        unsafe { Mask16(_mm512_cmpgt_epi32_mask(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn cmp_lt(self, rhs: Self) -> Mask16 {
        unsafe { Mask16(_mm512_cmplt_epi32_mask(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn select(mask: Mask16, if_true: Self, if_false: Self) -> Self {
        unsafe { Self(_mm512_mask_blend_epi32(mask.0, if_false.0, if_true.0)) }
    }

    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_min_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_max_epi32(self.0, rhs.0)) }
    }

    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_andnot_si512(rhs.0, self.0)) }
    }

    #[inline(always)]
    fn mask_zero(self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_maskz_mov_epi32(mask.0, self.0)) }
    }

    #[inline(always)]
    fn nmask_zero(self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_maskz_mov_epi32(!mask.0, self.0)) }
    }

    #[inline(always)]
    fn masked_add(self, rhs: Self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_mask_add_epi32(self.0, mask.0, self.0, rhs.0)) }
    }

    #[inline(always)]
    fn masked_sub(self, rhs: Self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_mask_sub_epi32(self.0, mask.0, self.0, rhs.0)) }
    }

    #[inline(always)]
    fn masked_mul(self, rhs: Self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_mask_mullo_epi32(self.0, mask.0, self.0, rhs.0)) }
    }

    #[inline(always)]
    fn nmasked_add(self, rhs: Self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_mask_add_epi32(self.0, !mask.0, self.0, rhs.0)) }
    }

    #[inline(always)]
    fn nmasked_sub(self, rhs: Self, mask: Mask16) -> Self {
        unsafe { Self(_mm512_mask_sub_epi32(self.0, !mask.0, self.0, rhs.0)) }
    }

    #[inline(always)]
    fn masked_increment(self, mask: Mask16) -> Self {
        self.masked_add(Self::splat(1), mask)
    }

    #[inline(always)]
    fn nmasked_increment(self, mask: Mask16) -> Self {
        self.nmasked_add(Self::splat(1), mask)
    }
}

impl Add for I32x16 {
    type Output = Self;
    #[inline(always)]
    fn add(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_add_epi32(self.0, rhs.0)) }
    }
}

impl Sub for I32x16 {
    type Output = Self;
    #[inline(always)]
    fn sub(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_sub_epi32(self.0, rhs.0)) }
    }
}

impl Mul for I32x16 {
    type Output = Self;
    #[inline(always)]
    fn mul(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_mullo_epi32(self.0, rhs.0)) }
    }
}

impl BitAnd for I32x16 {
    type Output = Self;
    #[inline(always)]
    fn bitand(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_and_si512(self.0, rhs.0)) }
    }
}

impl BitOr for I32x16 {
    type Output = Self;
    #[inline(always)]
    fn bitor(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_or_si512(self.0, rhs.0)) }
    }
}

impl BitXor for I32x16 {
    type Output = Self;
    #[inline(always)]
    fn bitxor(self, rhs: Self) -> Self {
        unsafe { Self(_mm512_xor_si512(self.0, rhs.0)) }
    }
}

impl Not for I32x16 {
    type Output = Self;
    #[inline(always)]
    fn not(self) -> Self {
        unsafe { Self(_mm512_xor_si512(self.0, ones())) }
    }
}

impl Shl<u32> for I32x16 {
    type Output = Self;
    #[inline(always)]
    fn shl(self, rhs: u32) -> Self {
        unsafe { Self(_mm512_sll_epi32(self.0, shift_count(rhs))) }
    }
}

impl Shr<u32> for I32x16 {
    type Output = Self;
    #[inline(always)]
    fn shr(self, rhs: u32) -> Self {
        unsafe { Self(_mm512_sra_epi32(self.0, shift_count(rhs))) }
    }
}
