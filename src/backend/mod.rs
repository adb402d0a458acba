//! The vector-operation contract and the backends that implement it.
//!
//! This module defines the vector-operation contract every noise kernel is
//! written against. Implementations (scalar, portable arrays, SSE/AVX2/AVX-512,
//! NEON) live in submodules.
//!
//! # Architecture
//!
//! - [`Backend`] is a zero-sized marker chosen at compile time. It names the
//!   lane width and the three lane types: a float vector, an int vector and a
//!   mask.
//! - [`SimdF32`] / [`SimdI32`] carry the arithmetic, compare, select, bitwise,
//!   shift and convert primitives.
//! - [`MaskOps`] is the per-lane predicate. A mask lane is always all-ones or
//!   all-zeros, so it can be reinterpreted as a bitwise operand via
//!   [`SimdF32::from_mask`] / [`SimdI32::from_mask`].
//!
//! Masked arithmetic (`masked_add`, `nmasked_sub`, ...) has default
//! implementations built from `select`/bitwise ops; backends with native
//! masked instructions (AVX-512) override them.

use core::fmt::Debug;
use core::ops::{Add, BitAnd, BitOr, BitXor, Div, Mul, Neg, Not, Shl, Shr, Sub};

pub mod features;
pub mod portable;
pub mod scalar;

#[cfg(target_arch = "x86_64")]
pub mod x86;

#[cfg(target_arch = "aarch64")]
pub mod arm;

pub use features::CpuFeatures;
pub use portable::{Portable, Portable16, Portable4, Portable8};
pub use scalar::Scalar;

#[cfg(target_arch = "x86_64")]
pub use x86::Sse;

#[cfg(all(target_arch = "x86_64", target_feature = "avx2"))]
pub use x86::Avx2;

#[cfg(all(target_arch = "x86_64", target_feature = "avx512f"))]
pub use x86::Avx512;

#[cfg(target_arch = "aarch64")]
pub use arm::Neon;

/// Widest lane count any backend uses. Drivers size their stack scratch with it.
pub const MAX_LANES: usize = 16;

/// The widest backend compiled into this binary.
#[cfg(all(target_arch = "x86_64", target_feature = "avx512f"))]
pub type NativeBackend = Avx512;

/// The widest backend compiled into this binary.
#[cfg(all(
    target_arch = "x86_64",
    target_feature = "avx2",
    not(target_feature = "avx512f")
))]
pub type NativeBackend = Avx2;

/// The widest backend compiled into this binary.
#[cfg(all(
    target_arch = "x86_64",
    not(target_feature = "avx2"),
    not(target_feature = "avx512f")
))]
pub type NativeBackend = Sse;

/// The widest backend compiled into this binary.
#[cfg(target_arch = "aarch64")]
pub type NativeBackend = Neon;

/// The widest backend compiled into this binary.
#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
pub type NativeBackend = Scalar;

/// A backend provides the SIMD implementation for a specific lane width.
pub trait Backend: 'static + Copy + Clone + Send + Sync + Debug + Default {
    /// Number of lanes in every vector of this backend.
    const LANES: usize;

    /// Whether `mul_add` is a single fused instruction.
    ///
    /// When false, `mul_add` is a separate multiply then add (two roundings).
    const HAS_FMA: bool;

    /// Short human-readable name, used in log output.
    const NAME: &'static str;

    /// CPU features the instructions of this backend need at runtime.
    const REQUIRED: CpuFeatures;

    /// Per-lane predicate.
    type Mask: MaskOps;

    /// Float vector.
    type F32: SimdF32<Mask = Self::Mask, I32 = Self::I32>;

    /// Int vector.
    type I32: SimdI32<Mask = Self::Mask>;

    /// Static capability probe. Callers check this before selecting a backend;
    /// kernels never do.
    #[inline]
    fn is_supported() -> bool {
        CpuFeatures::detect().contains(Self::REQUIRED)
    }
}

/// Operations on native mask types.
pub trait MaskOps:
    Copy
    + Clone
    + Debug
    + Default
    + Send
    + Sync
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
{
    /// Check if any lane is set.
    fn any(self) -> bool;

    /// Check if all lanes are set.
    fn all(self) -> bool;

    /// `self & !rhs`.
    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        self & !rhs
    }
}

/// All SIMD operations for f32 lanes.
pub trait SimdF32:
    Copy
    + Clone
    + Debug
    + Default
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + Div<Output = Self>
    + Neg<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
{
    /// Native mask type for this width.
    type Mask: MaskOps;

    /// Int vector of the same width.
    type I32: SimdI32<Mask = Self::Mask>;

    /// Number of lanes.
    const LANES: usize;

    // =========================================================================
    // Broadcast / Load / Store
    // =========================================================================

    /// Splat a scalar across all lanes.
    fn splat(val: f32) -> Self;

    /// Unaligned load of `LANES` values from the start of `slice`.
    ///
    /// Panics if `slice` is shorter than `LANES`.
    fn load(slice: &[f32]) -> Self;

    /// Unaligned store of `LANES` values to the start of `out`.
    ///
    /// Panics if `out` is shorter than `LANES`.
    fn store(self, out: &mut [f32]);

    /// Load starting at element `offset`.
    #[inline(always)]
    fn load_at(slice: &[f32], offset: usize) -> Self {
        Self::load(&slice[offset..])
    }

    /// Store starting at element `offset`.
    #[inline(always)]
    fn store_at(self, out: &mut [f32], offset: usize) {
        self.store(&mut out[offset..])
    }

    /// Value of lane 0.
    fn extract0(self) -> f32;

    /// Value of lane `lane`.
    #[inline(always)]
    fn extract(self, lane: usize) -> f32 {
        let mut buf = [0.0f32; MAX_LANES];
        self.store(&mut buf);
        buf[lane]
    }

    // =========================================================================
    // Conversion / reinterpretation
    // =========================================================================

    /// Numeric conversion from int lanes.
    fn from_i32(v: Self::I32) -> Self;

    /// Reinterpret int lanes as float bits.
    fn from_bits(v: Self::I32) -> Self;

    /// Reinterpret float bits as int lanes.
    fn to_bits(self) -> Self::I32;

    /// Convert to int, rounding to nearest (ties to even).
    fn to_i32_round(self) -> Self::I32;

    /// Convert to int, truncating toward zero.
    fn to_i32_trunc(self) -> Self::I32;

    /// Reinterpret a mask as float lanes (all-ones or all-zeros bits).
    fn from_mask(mask: Self::Mask) -> Self;

    // =========================================================================
    // Comparisons (return native mask)
    // =========================================================================

    /// Equal.
    fn cmp_eq(self, rhs: Self) -> Self::Mask;
    /// Not equal.
    fn cmp_ne(self, rhs: Self) -> Self::Mask;
    /// Less than.
    fn cmp_lt(self, rhs: Self) -> Self::Mask;
    /// Less than or equal.
    fn cmp_le(self, rhs: Self) -> Self::Mask;
    /// Greater than.
    fn cmp_gt(self, rhs: Self) -> Self::Mask;
    /// Greater than or equal.
    fn cmp_ge(self, rhs: Self) -> Self::Mask;

    /// Conditional select: `mask ? if_true : if_false` per lane.
    fn select(mask: Self::Mask, if_true: Self, if_false: Self) -> Self;

    // =========================================================================
    // Arithmetic
    // =========================================================================

    /// Element-wise minimum.
    fn min(self, rhs: Self) -> Self;
    /// Element-wise maximum.
    fn max(self, rhs: Self) -> Self;
    /// Absolute value.
    fn abs(self) -> Self;
    /// Square root.
    fn sqrt(self) -> Self;
    /// Reciprocal square root (approximate on hardware backends).
    fn rsqrt(self) -> Self;
    /// Reciprocal (approximate on hardware backends).
    fn recip(self) -> Self;
    /// Round toward negative infinity.
    fn floor(self) -> Self;
    /// Round toward positive infinity.
    fn ceil(self) -> Self;
    /// Round to nearest, ties to even.
    fn round(self) -> Self;

    /// `self * b + c`. Fused when the backend has FMA.
    fn mul_add(self, b: Self, c: Self) -> Self;

    /// `c - self * b`. Fused when the backend has FMA.
    #[inline(always)]
    fn neg_mul_add(self, b: Self, c: Self) -> Self {
        (-self).mul_add(b, c)
    }

    /// `self & !rhs` on the raw bits.
    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        self & !rhs
    }

    // =========================================================================
    // Masked arithmetic
    // =========================================================================

    /// `mask ? self : 0`.
    #[inline(always)]
    fn mask_zero(self, mask: Self::Mask) -> Self {
        self & Self::from_mask(mask)
    }

    /// `mask ? 0 : self`.
    #[inline(always)]
    fn nmask_zero(self, mask: Self::Mask) -> Self {
        self.and_not(Self::from_mask(mask))
    }

    /// `mask ? self + rhs : self`.
    #[inline(always)]
    fn masked_add(self, rhs: Self, mask: Self::Mask) -> Self {
        self + rhs.mask_zero(mask)
    }

    /// `mask ? self - rhs : self`.
    #[inline(always)]
    fn masked_sub(self, rhs: Self, mask: Self::Mask) -> Self {
        self - rhs.mask_zero(mask)
    }

    /// `mask ? self * rhs : self`.
    #[inline(always)]
    fn masked_mul(self, rhs: Self, mask: Self::Mask) -> Self {
        Self::select(mask, self * rhs, self)
    }

    /// `mask ? self : self + rhs`.
    #[inline(always)]
    fn nmasked_add(self, rhs: Self, mask: Self::Mask) -> Self {
        self + rhs.nmask_zero(mask)
    }

    /// `mask ? self : self - rhs`.
    #[inline(always)]
    fn nmasked_sub(self, rhs: Self, mask: Self::Mask) -> Self {
        self - rhs.nmask_zero(mask)
    }

    /// `mask ? self : self * rhs`.
    #[inline(always)]
    fn nmasked_mul(self, rhs: Self, mask: Self::Mask) -> Self {
        Self::select(mask, self, self * rhs)
    }

    // =========================================================================
    // Horizontal reductions
    // =========================================================================

    /// Minimum across all lanes.
    #[inline(always)]
    fn reduce_min(self) -> f32 {
        let mut buf = [0.0f32; MAX_LANES];
        self.store(&mut buf);
        buf[1..Self::LANES]
            .iter()
            .fold(buf[0], |acc, &v| if v < acc { v } else { acc })
    }

    /// Maximum across all lanes.
    #[inline(always)]
    fn reduce_max(self) -> f32 {
        let mut buf = [0.0f32; MAX_LANES];
        self.store(&mut buf);
        buf[1..Self::LANES]
            .iter()
            .fold(buf[0], |acc, &v| if v > acc { v } else { acc })
    }
}

/// All SIMD operations for i32 lanes.
///
/// Arithmetic wraps on overflow. `>>` is an arithmetic shift, `shr_logical`
/// the logical one.
pub trait SimdI32:
    Copy
    + Clone
    + Debug
    + Default
    + Send
    + Sync
    + Add<Output = Self>
    + Sub<Output = Self>
    + Mul<Output = Self>
    + BitAnd<Output = Self>
    + BitOr<Output = Self>
    + BitXor<Output = Self>
    + Not<Output = Self>
    + Shl<u32, Output = Self>
    + Shr<u32, Output = Self>
{
    /// Native mask type for this width.
    type Mask: MaskOps;

    /// Number of lanes.
    const LANES: usize;

    /// Splat a scalar across all lanes.
    fn splat(val: i32) -> Self;

    /// `[0, 1, ..., LANES - 1]`.
    fn incremented() -> Self;

    /// Unaligned load of `LANES` values from the start of `slice`.
    fn load(slice: &[i32]) -> Self;

    /// Unaligned store of `LANES` values to the start of `out`.
    fn store(self, out: &mut [i32]);

    /// Value of lane 0.
    fn extract0(self) -> i32;

    /// Reinterpret a mask as int lanes (-1 or 0).
    fn from_mask(mask: Self::Mask) -> Self;

    /// Logical (zero-filling) right shift.
    fn shr_logical(self, n: u32) -> Self;

    /// Equal.
    fn cmp_eq(self, rhs: Self) -> Self::Mask;
    /// Greater than (signed).
    fn cmp_gt(self, rhs: Self) -> Self::Mask;
    /// Less than (signed).
    fn cmp_lt(self, rhs: Self) -> Self::Mask;

    /// Not equal.
    #[inline(always)]
    fn cmp_ne(self, rhs: Self) -> Self::Mask {
        !self.cmp_eq(rhs)
    }

    /// Greater than or equal (signed).
    #[inline(always)]
    fn cmp_ge(self, rhs: Self) -> Self::Mask {
        !self.cmp_lt(rhs)
    }

    /// Less than or equal (signed).
    #[inline(always)]
    fn cmp_le(self, rhs: Self) -> Self::Mask {
        !self.cmp_gt(rhs)
    }

    /// Conditional select: `mask ? if_true : if_false` per lane.
    fn select(mask: Self::Mask, if_true: Self, if_false: Self) -> Self;

    /// Element-wise signed minimum.
    #[inline(always)]
    fn min(self, rhs: Self) -> Self {
        Self::select(self.cmp_lt(rhs), self, rhs)
    }

    /// Element-wise signed maximum.
    #[inline(always)]
    fn max(self, rhs: Self) -> Self {
        Self::select(self.cmp_gt(rhs), self, rhs)
    }

    /// `self & !rhs`.
    #[inline(always)]
    fn and_not(self, rhs: Self) -> Self {
        self & !rhs
    }

    /// `mask ? self : 0`.
    #[inline(always)]
    fn mask_zero(self, mask: Self::Mask) -> Self {
        self & Self::from_mask(mask)
    }

    /// `mask ? 0 : self`.
    #[inline(always)]
    fn nmask_zero(self, mask: Self::Mask) -> Self {
        self.and_not(Self::from_mask(mask))
    }

    /// `mask ? self + rhs : self`.
    #[inline(always)]
    fn masked_add(self, rhs: Self, mask: Self::Mask) -> Self {
        self + rhs.mask_zero(mask)
    }

    /// `mask ? self - rhs : self`.
    #[inline(always)]
    fn masked_sub(self, rhs: Self, mask: Self::Mask) -> Self {
        self - rhs.mask_zero(mask)
    }

    /// `mask ? self * rhs : self`.
    #[inline(always)]
    fn masked_mul(self, rhs: Self, mask: Self::Mask) -> Self {
        Self::select(mask, self * rhs, self)
    }

    /// `mask ? self : self + rhs`.
    #[inline(always)]
    fn nmasked_add(self, rhs: Self, mask: Self::Mask) -> Self {
        self + rhs.nmask_zero(mask)
    }

    /// `mask ? self : self - rhs`.
    #[inline(always)]
    fn nmasked_sub(self, rhs: Self, mask: Self::Mask) -> Self {
        self - rhs.nmask_zero(mask)
    }

    /// `mask ? self + 1 : self`.
    #[inline(always)]
    fn masked_increment(self, mask: Self::Mask) -> Self {
        // A set mask lane reads as -1.
        self - Self::from_mask(mask)
    }

    /// `mask ? self : self + 1`.
    #[inline(always)]
    fn nmasked_increment(self, mask: Self::Mask) -> Self {
        self - Self::from_mask(!mask)
    }
}
